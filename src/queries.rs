//! Selection-driven filters and group-by aggregates over the loaded tables.
//!
//! Every query is a pure function of the tables and the selection values it
//! is given. An empty indicator set or an unknown state gives an empty
//! result, never an error.

use crate::reshape::pivot;
use crate::types::{
    CombinedRecord, CorrelationCell, CorrelationMatrix, IndicatorYearTotal, JoinedWideTable,
    Measure, PercentRow, RateSeries, RegionTotal, StateRankRow,
};
use crate::util::pearson;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// First year shown on the year slider.
pub const FIRST_SLIDER_YEAR: i32 = 2011;

fn in_set<S: AsRef<str>>(set: &[S], indicator: &str) -> bool {
    set.iter().any(|s| s.as_ref() == indicator)
}

/// Sum `measure` per region for one year over the selected indicators.
///
/// Used for STD cases and for SDH numerators alike; only the indicator set
/// and the measure change. Groups come back ordered by (Geography, Year, FIPS).
pub fn region_totals_for_year<S: AsRef<str>>(
    combined: &[CombinedRecord],
    year: i32,
    indicators: &[S],
    measure: Measure,
) -> Vec<RegionTotal> {
    let mut groups: BTreeMap<(String, i32, u32), f64> = BTreeMap::new();
    for r in combined {
        if r.year != year || !in_set(indicators, &r.indicator) {
            continue;
        }
        *groups.entry((r.geography.clone(), r.year, r.fips)).or_insert(0.0) +=
            measure.of_combined(r);
    }
    log::debug!(
        "{} totals for {}: {} regions",
        measure.column(),
        year,
        groups.len()
    );
    groups
        .into_iter()
        .map(|((geography, year, fips), total)| RegionTotal { geography, year, fips, total })
        .collect()
}

/// Sum `measure` per (indicator, year) across every region and year.
pub fn yearly_totals_by_indicator<S: AsRef<str>>(
    combined: &[CombinedRecord],
    indicators: &[S],
    measure: Measure,
) -> Vec<IndicatorYearTotal> {
    let mut groups: BTreeMap<(String, i32), f64> = BTreeMap::new();
    for r in combined.iter().filter(|r| in_set(indicators, &r.indicator)) {
        *groups.entry((r.indicator.clone(), r.year)).or_insert(0.0) += measure.of_combined(r);
    }
    groups
        .into_iter()
        .map(|((indicator, year), total)| IndicatorYearTotal { indicator, year, total })
        .collect()
}

/// States ranked by total cases for one year, largest first. States with
/// equal totals keep their alphabetical order.
pub fn state_ranking<S: AsRef<str>>(
    combined: &[CombinedRecord],
    year: i32,
    indicators: &[S],
) -> Vec<StateRankRow> {
    let mut groups: BTreeMap<String, f64> = BTreeMap::new();
    for r in combined {
        if r.year == year && in_set(indicators, &r.indicator) {
            *groups.entry(r.geography.clone()).or_insert(0.0) += r.cases;
        }
    }
    let mut rows: Vec<StateRankRow> = groups
        .into_iter()
        .map(|(state, cases)| StateRankRow { state, cases })
        .collect();
    // `sort_by` is stable.
    rows.sort_by(|a, b| b.cases.partial_cmp(&a.cases).unwrap_or(Ordering::Equal));
    rows
}

/// Rate per 100,000 for one state, one row per year and one column per
/// selected indicator (columns keep the indicator labels).
pub fn state_rate_series<S: AsRef<str>>(
    combined: &[CombinedRecord],
    state: &str,
    indicators: &[S],
) -> RateSeries {
    let entries = combined
        .iter()
        .filter(|r| r.geography == state && in_set(indicators, &r.indicator))
        .map(|r| (r.year, r.indicator.as_str(), Some(r.rate_per_100000)));
    pivot(entries, str::to_string)
}

/// Percent rows for one state in source order. Backs both the SDH line chart
/// and the SDH table.
pub fn state_indicator_percent_series<S: AsRef<str>>(
    combined: &[CombinedRecord],
    state: &str,
    indicators: &[S],
) -> Vec<PercentRow> {
    combined
        .iter()
        .filter(|r| r.geography == state && in_set(indicators, &r.indicator))
        .map(|r| PercentRow {
            year: r.year,
            indicator: r.indicator.clone(),
            percent: r.percent,
        })
        .collect()
}

/// Pearson correlation between every pair of indicator columns.
///
/// The matrix is symmetric by construction and the diagonal is exactly 1.0
/// for any column with variance. A zero-variance column (or one with fewer
/// than two values) yields NaN across its whole row and column.
pub fn correlation_matrix(joined: &JoinedWideTable) -> CorrelationMatrix {
    let n = joined.columns.len();
    let series: Vec<Vec<Option<f64>>> = (0..n)
        .map(|j| joined.rows.iter().map(|r| r.values[j]).collect())
        .collect();
    let defined: Vec<bool> = series.iter().map(|s| !pearson(s, s).is_nan()).collect();

    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        if !defined[i] {
            continue;
        }
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            if !defined[j] {
                continue;
            }
            let c = pearson(&series[i], &series[j]);
            values[i][j] = c;
            values[j][i] = c;
        }
    }
    CorrelationMatrix { columns: joined.columns.clone(), values }
}

/// Long form of the matrix, one cell per (var1, var2), grouped by `var2`.
pub fn melt_correlation(matrix: &CorrelationMatrix) -> Vec<CorrelationCell> {
    let mut cells = Vec::with_capacity(matrix.columns.len() * matrix.columns.len());
    for (j, var2) in matrix.columns.iter().enumerate() {
        for (i, var1) in matrix.columns.iter().enumerate() {
            let v = matrix.values[i][j];
            cells.push(CorrelationCell {
                var1: var1.clone(),
                var2: var2.clone(),
                correlation: if v.is_nan() { None } else { Some(v) },
            });
        }
    }
    cells
}

/// Slider bounds: 2011 up to the latest year in the data.
pub fn year_range(combined: &[CombinedRecord]) -> Option<(i32, i32)> {
    let max = combined.iter().map(|r| r.year).max()?;
    (max >= FIRST_SLIDER_YEAR).then_some((FIRST_SLIDER_YEAR, max))
}

/// Distinct state names in table order.
pub fn state_options(joined: &JoinedWideTable) -> Vec<String> {
    let mut seen = HashSet::new();
    joined
        .rows
        .iter()
        .filter(|r| seen.insert(r.key.geography.as_str()))
        .map(|r| r.key.geography.clone())
        .collect()
}
