//! Long-to-wide pivots, the STD/SDH join, and the combined long table.

use crate::types::{
    CombinedRecord, JoinedWideTable, LongRecord, Measure, Pivot, PivotRow, RegionYear, WideTable,
};
use crate::util::normalize_column_name;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Suffix given to an SDH column whose name is already taken on the STD side.
pub const SDH_CLASH_SUFFIX: &str = "_sdh";

fn add_cell(slot: &mut Option<f64>, value: Option<f64>) {
    *slot = match (*slot, value) {
        (Some(a), Some(b)) => Some(a + b),
        (a, b) => a.or(b),
    };
}

/// Pivot `(key, category, value)` triples to one column per named category.
///
/// Entries that land on the same `(key, column)` are summed. This covers both
/// duplicate source rows and distinct labels that `name` maps to the same
/// column. A cell that only ever received missing values stays `None`.
pub fn pivot<K, S, I, F>(entries: I, name: F) -> Pivot<K>
where
    K: Ord + Clone,
    S: AsRef<str>,
    I: IntoIterator<Item = (K, S, Option<f64>)>,
    F: Fn(&str) -> String,
{
    let mut columns: BTreeSet<String> = BTreeSet::new();
    let mut cells: BTreeMap<K, BTreeMap<String, Option<f64>>> = BTreeMap::new();
    for (key, category, value) in entries {
        let column = name(category.as_ref());
        columns.insert(column.clone());
        let slot = cells.entry(key).or_default().entry(column).or_insert(None);
        add_cell(slot, value);
    }

    let columns: Vec<String> = columns.into_iter().collect();
    let rows = cells
        .into_iter()
        .map(|(key, by_column)| PivotRow {
            key,
            values: columns
                .iter()
                .map(|c| by_column.get(c).copied().flatten())
                .collect(),
        })
        .collect();
    Pivot { columns, rows }
}

/// Pivot one cleaned source keyed by (FIPS, Geography, Year). Rows without a
/// year have no key and are skipped.
pub fn pivot_to_wide(long: &[LongRecord], measure: Measure) -> WideTable {
    let entries = long.iter().filter_map(|r| {
        let year = r.year?;
        let key = RegionYear { fips: r.fips, geography: r.geography.clone(), year };
        Some((key, r.indicator.as_str(), measure.of_long(r)))
    });
    pivot(entries, normalize_column_name)
}

/// Left join on (FIPS, Geography, Year). Every STD row survives; SDH-only
/// keys are dropped and unmatched SDH cells stay `None`.
pub fn join_wide(std_wide: &WideTable, sdh_wide: &WideTable) -> JoinedWideTable {
    let mut columns = std_wide.columns.clone();
    for c in &sdh_wide.columns {
        if std_wide.columns.contains(c) {
            columns.push(format!("{}{}", c, SDH_CLASH_SUFFIX));
        } else {
            columns.push(c.clone());
        }
    }

    let by_key: HashMap<&RegionYear, &PivotRow<RegionYear>> =
        sdh_wide.rows.iter().map(|r| (&r.key, r)).collect();
    let empty = vec![None; sdh_wide.columns.len()];

    let rows = std_wide
        .rows
        .iter()
        .map(|left| {
            let right = by_key.get(&left.key).map_or(&empty, |r| &r.values);
            let mut values = left.values.clone();
            values.extend(right.iter().copied());
            PivotRow { key: left.key.clone(), values }
        })
        .collect();

    Pivot { columns, rows }
}

fn fill(r: &LongRecord) -> CombinedRecord {
    CombinedRecord {
        fips: r.fips,
        geography: r.geography.clone(),
        year: r.year.unwrap_or(0),
        indicator: r.indicator.clone(),
        cases: r.cases.unwrap_or(0.0),
        rate_per_100000: r.rate_per_100000.unwrap_or(0.0),
        numerator: r.numerator.unwrap_or(0.0),
        percent: r.percent.unwrap_or(0.0),
    }
}

/// Row-wise union of both cleaned sources, STD first, with every missing
/// value (including a missing year) replaced by zero.
pub fn concat_long(std_long: &[LongRecord], sdh_long: &[LongRecord]) -> Vec<CombinedRecord> {
    std_long.iter().chain(sdh_long).map(fill).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(fips: u32, geo: &str, year: Option<i32>, indicator: &str, value: Option<f64>) -> LongRecord {
        LongRecord {
            fips,
            geography: geo.to_string(),
            year,
            indicator: indicator.to_string(),
            cases: value,
            rate_per_100000: None,
            numerator: value,
            percent: None,
        }
    }

    fn key(fips: u32, geo: &str, year: i32) -> RegionYear {
        RegionYear { fips, geography: geo.to_string(), year }
    }

    #[test]
    fn pivot_reproduces_group_sums() {
        let long = vec![
            rec(6, "California", Some(2015), "Gonorrhea", Some(10.0)),
            rec(6, "California", Some(2015), "Congenital Syphilis", Some(3.0)),
            rec(6, "California", Some(2016), "Gonorrhea", Some(20.0)),
            rec(1, "Alabama", Some(2015), "Gonorrhea", Some(7.0)),
        ];
        let wide = pivot_to_wide(&long, Measure::Cases);
        assert_eq!(wide.columns, vec!["congenital_syphilis", "gonorrhea"]);
        assert_eq!(wide.len(), 3);
        // Rows are ordered by FIPS first.
        assert_eq!(wide.rows[0].key, key(1, "Alabama", 2015));
        for r in &long {
            let k = key(r.fips, &r.geography, r.year.unwrap());
            assert_eq!(wide.get(&k, &normalize_column_name(&r.indicator)), r.cases);
        }
        assert_eq!(wide.get(&key(1, "Alabama", 2015), "congenital_syphilis"), None);
    }

    #[test]
    fn duplicate_cells_are_summed() {
        let long = vec![
            rec(6, "California", Some(2015), "Uninsured", Some(1.0)),
            rec(6, "California", Some(2015), "Uninsured", Some(2.5)),
            rec(6, "California", Some(2015), "uninsured", None),
            rec(6, "California", Some(2016), "Uninsured", None),
        ];
        let wide = pivot_to_wide(&long, Measure::Numerator);
        assert_eq!(wide.columns, vec!["uninsured"]);
        assert_eq!(wide.get(&key(6, "California", 2015), "uninsured"), Some(3.5));
        assert_eq!(wide.get(&key(6, "California", 2016), "uninsured"), None);
    }

    #[test]
    fn rows_without_year_are_left_out() {
        let long = vec![
            rec(6, "California", None, "Uninsured", Some(1.0)),
            rec(6, "California", Some(2015), "Uninsured", Some(2.0)),
        ];
        let wide = pivot_to_wide(&long, Measure::Numerator);
        assert_eq!(wide.len(), 1);
    }

    #[test]
    fn join_keeps_left_cardinality() {
        let std_long = vec![
            rec(6, "California", Some(2015), "Gonorrhea", Some(10.0)),
            rec(48, "Texas", Some(2015), "Gonorrhea", Some(12.0)),
        ];
        let sdh_long = vec![
            rec(6, "California", Some(2015), "Uninsured", Some(100.0)),
            rec(36, "New York", Some(2015), "Uninsured", Some(50.0)),
        ];
        let std_wide = pivot_to_wide(&std_long, Measure::Cases);
        let sdh_wide = pivot_to_wide(&sdh_long, Measure::Numerator);
        let joined = join_wide(&std_wide, &sdh_wide);

        assert_eq!(joined.len(), std_wide.len());
        assert_eq!(joined.columns, vec!["gonorrhea", "uninsured"]);
        assert!(joined.rows.iter().all(|r| r.key.geography != "New York"));
        assert_eq!(joined.get(&key(6, "California", 2015), "uninsured"), Some(100.0));
        assert_eq!(joined.get(&key(48, "Texas", 2015), "uninsured"), None);
        assert_eq!(joined.get(&key(48, "Texas", 2015), "gonorrhea"), Some(12.0));
    }

    #[test]
    fn join_renames_clashing_columns() {
        let left = pivot_to_wide(&[rec(6, "California", Some(2015), "Other", Some(1.0))], Measure::Cases);
        let right = pivot_to_wide(&[rec(6, "California", Some(2015), "Other", Some(2.0))], Measure::Numerator);
        let joined = join_wide(&left, &right);
        assert_eq!(joined.columns, vec!["other", "other_sdh"]);
        assert_eq!(joined.rows[0].values, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn concat_fills_missing_with_zero() {
        let mut std_row = rec(6, "California", Some(2015), "Gonorrhea", Some(10.0));
        std_row.numerator = None;
        std_row.rate_per_100000 = Some(25.0);
        let mut sdh_row = rec(6, "California", None, "Uninsured", Some(100.0));
        sdh_row.cases = None;
        sdh_row.percent = Some(9.5);

        let combined = concat_long(&[std_row], &[sdh_row]);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined[0].numerator, 0.0);
        assert_eq!(combined[0].percent, 0.0);
        assert_eq!(combined[0].rate_per_100000, 25.0);
        assert_eq!(combined[1].cases, 0.0);
        assert_eq!(combined[1].rate_per_100000, 0.0);
        assert_eq!(combined[1].year, 0);
        assert_eq!(combined[1].percent, 9.5);
    }
}
