use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::reshape::{concat_long, join_wide, pivot_to_wide};
use crate::types::{
    CombinedRecord, JoinedWideTable, LongRecord, Measure, RawSdhRow, RawStdRow,
};
use crate::util::{format_int, parse_f64_safe, parse_fips, parse_year};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// STD rows at or before this year are dropped at load time.
pub const MIN_YEAR_EXCLUSIVE: i32 = 2010;

const STD_COLUMNS: [&str; 6] = ["FIPS", "Geography", "Year", "Indicator", "Cases", "Rate per 100000"];
const SDH_COLUMNS: [&str; 6] = ["FIPS", "Geography", "Year", "Indicator", "Numerator", "Percent"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    /// Rows removed by the year filter (including unparsable years).
    pub year_filtered_rows: usize,
    /// Rows whose FIPS code is not an integer.
    pub invalid_region_rows: usize,
    /// Measure cells that could not be parsed and became missing.
    pub coerced_cells: usize,
}

/// Everything the dashboard renders from, built once per load.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub combined: Vec<CombinedRecord>,
    pub joined: JoinedWideTable,
    pub std_report: LoadReport,
    pub sdh_report: LoadReport,
}

fn read_rows<R: Read, T: DeserializeOwned>(
    reader: R,
    dataset: &str,
    required: &[&str],
) -> Result<Vec<T>> {
    // Both the column check and the serde renames match trimmed header names.
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| DashboardError::csv(dataset, e))?
        .clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(DashboardError::missing_column(dataset, *column));
        }
    }
    let mut rows = Vec::new();
    for result in rdr.deserialize::<T>() {
        rows.push(result.map_err(|e| DashboardError::csv(dataset, e))?);
    }
    Ok(rows)
}

/// Count a cell that held text but did not survive numeric cleanup.
fn coerce(cell: Option<&str>, coerced: &mut usize) -> Option<f64> {
    let value = parse_f64_safe(cell);
    if value.is_none() && cell.map_or(false, |c| !c.trim().is_empty()) {
        *coerced += 1;
    }
    value
}

/// Clean the STD indicator CSV and keep only years after 2010.
pub fn load_std<R: Read>(reader: R) -> Result<(Vec<LongRecord>, LoadReport)> {
    let raw: Vec<RawStdRow> = read_rows(reader, "STD", &STD_COLUMNS)?;
    let mut report = LoadReport { total_rows: raw.len(), ..Default::default() };
    let mut records = Vec::with_capacity(raw.len());

    for row in raw {
        let Some(fips) = parse_fips(row.fips.as_deref()) else {
            report.invalid_region_rows += 1;
            continue;
        };
        let year = match parse_year(row.year.as_deref()) {
            Some(y) if y > MIN_YEAR_EXCLUSIVE => y,
            _ => {
                report.year_filtered_rows += 1;
                continue;
            }
        };
        let cases = coerce(row.cases.as_deref(), &mut report.coerced_cells);
        let rate = coerce(row.rate_per_100000.as_deref(), &mut report.coerced_cells);
        records.push(LongRecord {
            fips,
            geography: row.geography.unwrap_or_default().trim().to_string(),
            year: Some(year),
            indicator: row.indicator.unwrap_or_default().trim().to_string(),
            cases,
            rate_per_100000: rate,
            numerator: None,
            percent: None,
        });
    }

    report.kept_rows = records.len();
    Ok((records, report))
}

/// Clean the social determinants CSV. No year filter is applied here; rows
/// with an unparsable year keep `year: None`.
pub fn load_sdh<R: Read>(reader: R) -> Result<(Vec<LongRecord>, LoadReport)> {
    let raw: Vec<RawSdhRow> = read_rows(reader, "SDH", &SDH_COLUMNS)?;
    let mut report = LoadReport { total_rows: raw.len(), ..Default::default() };
    let mut records = Vec::with_capacity(raw.len());

    for row in raw {
        let Some(fips) = parse_fips(row.fips.as_deref()) else {
            report.invalid_region_rows += 1;
            continue;
        };
        let numerator = coerce(row.numerator.as_deref(), &mut report.coerced_cells);
        let percent = coerce(row.percent.as_deref(), &mut report.coerced_cells);
        records.push(LongRecord {
            fips,
            geography: row.geography.unwrap_or_default().trim().to_string(),
            year: parse_year(row.year.as_deref()),
            indicator: row.indicator.unwrap_or_default().trim().to_string(),
            cases: None,
            rate_per_100000: None,
            numerator,
            percent,
        });
    }

    report.kept_rows = records.len();
    Ok((records, report))
}

fn log_report(dataset: &str, report: &LoadReport) {
    log::info!(
        "{}: {} rows read, {} kept",
        dataset,
        format_int(report.total_rows),
        format_int(report.kept_rows)
    );
    if report.year_filtered_rows > 0 {
        log::info!("{}: {} rows outside the year range", dataset, format_int(report.year_filtered_rows));
    }
    if report.invalid_region_rows > 0 {
        log::warn!("{}: {} rows dropped for an invalid FIPS code", dataset, format_int(report.invalid_region_rows));
    }
    if report.coerced_cells > 0 {
        log::warn!("{}: {} non-numeric cells treated as missing", dataset, format_int(report.coerced_cells));
    }
}

/// Load both datasets and build the combined long table and the joined wide
/// table.
pub fn load_from_readers<A: Read, B: Read>(std_src: A, sdh_src: B) -> Result<LoadedData> {
    let (std_long, std_report) = load_std(std_src)?;
    let (sdh_long, sdh_report) = load_sdh(sdh_src)?;
    log_report("STD", &std_report);
    log_report("SDH", &sdh_report);

    let std_wide = pivot_to_wide(&std_long, Measure::Cases);
    let sdh_wide = pivot_to_wide(&sdh_long, Measure::Numerator);
    let joined = join_wide(&std_wide, &sdh_wide);
    let combined = concat_long(&std_long, &sdh_long);
    log::info!(
        "Joined table: {} rows x {} indicator columns; combined table: {} rows",
        format_int(joined.len()),
        joined.columns.len(),
        format_int(combined.len())
    );

    Ok(LoadedData { combined, joined, std_report, sdh_report })
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| DashboardError::io(path, e))
}

pub fn load(config: &DashboardConfig) -> Result<LoadedData> {
    log::info!("Loading STD data from {}", config.std_csv.display());
    log::info!("Loading SDH data from {}", config.sdh_csv.display());
    load_from_readers(open(&config.std_csv)?, open(&config.sdh_csv)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STD_CSV: &str = "\
FIPS,Geography,Year,Indicator,Cases,Rate per 100000
6,California,2009,Gonorrhea,\"1,000\",10.0
6,California,2015,Gonorrhea,\"1,234\",31.5
6,California,2020 (COVID-19 Pandemic),Gonorrhea,N/A,40.2
6,California,not a year,Gonorrhea,5,1.0
xx,Nowhere,2015,Gonorrhea,5,1.0
";

    const SDH_CSV: &str = "\
FIPS,Geography,Year,Indicator,Numerator,Percent
6,California,2015,Uninsured,\"4,000,000\",10.5
6,California,2009,Uninsured,\"5,000,000\",12.5
6,California,unknown,Uninsured,7,1.0
";

    #[test]
    fn std_rows_are_cleaned_and_year_filtered() {
        let (rows, report) = load_std(STD_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, Some(2015));
        assert_eq!(rows[0].cases, Some(1234.0));
        assert_eq!(rows[0].rate_per_100000, Some(31.5));
        assert_eq!(rows[1].year, Some(2020));
        assert_eq!(rows[1].cases, None);
        assert_eq!(report.total_rows, 5);
        assert_eq!(report.year_filtered_rows, 2);
        assert_eq!(report.invalid_region_rows, 1);
        assert_eq!(report.coerced_cells, 1);
    }

    #[test]
    fn sdh_rows_keep_every_year() {
        let (rows, report) = load_sdh(SDH_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].numerator, Some(4_000_000.0));
        assert_eq!(rows[1].year, Some(2009));
        assert_eq!(rows[2].year, None);
        assert_eq!(report.year_filtered_rows, 0);
    }

    #[test]
    fn missing_column_is_fatal() {
        let csv = "FIPS,Geography,Year,Indicator,Cases\n6,California,2015,Gonorrhea,1\n";
        let err = load_std(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::MissingColumn { ref column, .. } if column == "Rate per 100000"
        ));
    }

    #[test]
    fn padded_headers_still_bind_to_fields() {
        let csv = "FIPS, Geography, Year, Indicator, Cases, Rate per 100000\n6,California,2015,Gonorrhea,\"1,234\",3.5\n";
        let (rows, report) = load_std(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(report.year_filtered_rows, 0);
        assert_eq!(rows[0].geography, "California");
        assert_eq!(rows[0].cases, Some(1234.0));
        assert_eq!(rows[0].rate_per_100000, Some(3.5));
    }

    #[test]
    fn builds_both_tables() {
        let data = load_from_readers(STD_CSV.as_bytes(), SDH_CSV.as_bytes()).unwrap();
        assert_eq!(data.joined.len(), 2);
        assert_eq!(data.combined.len(), 5);
        assert_eq!(data.joined.columns, vec!["gonorrhea", "uninsured"]);
    }
}
