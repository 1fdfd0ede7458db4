use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::util::format_number;

pub const STD_INDICATORS: [&str; 5] = [
    "Chlamydia",
    "Congenital Syphilis",
    "Early Non-Primary, Non-Secondary Syphilis",
    "Gonorrhea",
    "Primary and Secondary Syphilis",
];

pub const SDH_INDICATORS: [&str; 4] = [
    "Households living below the federal poverty level",
    "Population 25 years and older w/o HS diploma",
    "Uninsured",
    "Vacant housing",
];

/// One line of the STD indicator CSV, every cell kept as text.
#[derive(Debug, Deserialize)]
pub struct RawStdRow {
    #[serde(rename = "FIPS")]
    pub fips: Option<String>,
    #[serde(rename = "Geography")]
    pub geography: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Indicator")]
    pub indicator: Option<String>,
    #[serde(rename = "Cases")]
    pub cases: Option<String>,
    #[serde(rename = "Rate per 100000")]
    pub rate_per_100000: Option<String>,
}

/// One line of the social determinants CSV, every cell kept as text.
#[derive(Debug, Deserialize)]
pub struct RawSdhRow {
    #[serde(rename = "FIPS")]
    pub fips: Option<String>,
    #[serde(rename = "Geography")]
    pub geography: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Indicator")]
    pub indicator: Option<String>,
    #[serde(rename = "Numerator")]
    pub numerator: Option<String>,
    #[serde(rename = "Percent")]
    pub percent: Option<String>,
}

/// A cleaned long-form row from either source. Measures a source does not
/// carry are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    pub fips: u32,
    pub geography: String,
    pub year: Option<i32>,
    pub indicator: String,
    pub cases: Option<f64>,
    pub rate_per_100000: Option<f64>,
    pub numerator: Option<f64>,
    pub percent: Option<f64>,
}

/// A row of the combined long table: both sources unioned, gaps zero-filled.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRecord {
    pub fips: u32,
    pub geography: String,
    pub year: i32,
    pub indicator: String,
    pub cases: f64,
    pub rate_per_100000: f64,
    pub numerator: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    Cases,
    RatePer100000,
    Numerator,
    Percent,
}

impl Measure {
    /// Column label as it appears in the source CSVs.
    pub fn column(self) -> &'static str {
        match self {
            Measure::Cases => "Cases",
            Measure::RatePer100000 => "Rate per 100000",
            Measure::Numerator => "Numerator",
            Measure::Percent => "Percent",
        }
    }

    pub fn of_long(self, r: &LongRecord) -> Option<f64> {
        match self {
            Measure::Cases => r.cases,
            Measure::RatePer100000 => r.rate_per_100000,
            Measure::Numerator => r.numerator,
            Measure::Percent => r.percent,
        }
    }

    pub fn of_combined(self, r: &CombinedRecord) -> f64 {
        match self {
            Measure::Cases => r.cases,
            Measure::RatePer100000 => r.rate_per_100000,
            Measure::Numerator => r.numerator,
            Measure::Percent => r.percent,
        }
    }
}

/// Key of a wide table row. Ordering is (FIPS, Geography, Year).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RegionYear {
    #[serde(rename = "FIPS")]
    pub fips: u32,
    #[serde(rename = "Geography")]
    pub geography: String,
    #[serde(rename = "Year")]
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow<K> {
    pub key: K,
    pub values: Vec<Option<f64>>,
}

/// A long table pivoted to one column per category. Rows are sorted by key,
/// columns by name.
#[derive(Debug, Clone, PartialEq)]
pub struct Pivot<K> {
    pub columns: Vec<String>,
    pub rows: Vec<PivotRow<K>>,
}

impl<K: PartialEq> Pivot<K> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, key: &K, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.rows.iter().find(|r| &r.key == key)?.values[idx]
    }
}

pub type WideTable = Pivot<RegionYear>;

/// STD wide table left-joined with the SDH wide table.
pub type JoinedWideTable = WideTable;

/// Rate per 100,000 for one state, indexed by year, one column per indicator.
pub type RateSeries = Pivot<i32>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionTotal {
    pub geography: String,
    pub year: i32,
    pub fips: u32,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorYearTotal {
    pub indicator: String,
    pub year: i32,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct StateRankRow {
    #[serde(rename = "State")]
    #[tabled(rename = "State")]
    pub state: String,
    #[serde(rename = "Cases")]
    #[tabled(rename = "Cases", display_with = "display_count")]
    pub cases: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct PercentRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Determinants")]
    #[tabled(rename = "Determinants")]
    pub indicator: String,
    #[serde(rename = "Population Percent")]
    #[tabled(rename = "Population Percent", display_with = "display_percent")]
    pub percent: f64,
}

/// Square Pearson matrix; `values[i][j]` pairs `columns[i]` with `columns[j]`.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// One melted heatmap cell. `None` marks an undefined correlation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationCell {
    pub var1: String,
    pub var2: String,
    pub correlation: Option<f64>,
}

fn display_count(v: &f64) -> String {
    format_number(*v, 0)
}

fn display_percent(v: &f64) -> String {
    format_number(*v, 1)
}
