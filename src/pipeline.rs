//! One pass from a selection to every table and chart on the dashboard.
//!
//! The host calls [`render`] again after each change to the selection; the
//! loaded data is never modified.

use crate::charts::{self, ChartSpec, GeoSource};
use crate::config::DashboardConfig;
use crate::loader::LoadedData;
use crate::queries;
use crate::types::{Measure, PercentRow, StateRankRow, SDH_INDICATORS, STD_INDICATORS};
use serde::Serialize;

/// Values picked by the viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub year: i32,
    pub std_indicators: Vec<String>,
    pub sdh_indicators: Vec<String>,
    pub state: String,
    pub scatter_x: String,
    pub scatter_y: String,
}

impl Selection {
    /// Opening state: configured year, every indicator, the first state.
    pub fn default_for(data: &LoadedData, config: &DashboardConfig) -> Self {
        let year = match queries::year_range(&data.combined) {
            Some((min, max)) => config.default_year.clamp(min, max),
            None => config.default_year,
        };
        Self {
            year,
            std_indicators: STD_INDICATORS.iter().map(|s| s.to_string()).collect(),
            sdh_indicators: SDH_INDICATORS.iter().map(|s| s.to_string()).collect(),
            state: queries::state_options(&data.joined)
                .into_iter()
                .next()
                .unwrap_or_default(),
            scatter_x: STD_INDICATORS[0].to_string(),
            scatter_y: SDH_INDICATORS[1].to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardView {
    pub std_map: ChartSpec,
    pub sdh_map: ChartSpec,
    pub std_trend: ChartSpec,
    pub state_ranking: Vec<StateRankRow>,
    pub state_rates: ChartSpec,
    pub sdh_percent_chart: ChartSpec,
    pub sdh_percent_table: Vec<PercentRow>,
    pub heatmap: ChartSpec,
    pub scatter: ChartSpec,
}

impl DashboardView {
    /// Charts paired with the file stem they are exported under.
    pub fn charts(&self) -> Vec<(&'static str, &ChartSpec)> {
        vec![
            ("std_map", &self.std_map),
            ("sdh_map", &self.sdh_map),
            ("std_trend", &self.std_trend),
            ("state_rates", &self.state_rates),
            ("sdh_percent", &self.sdh_percent_chart),
            ("correlation_heatmap", &self.heatmap),
            ("scatterplot", &self.scatter),
        ]
    }
}

pub fn render(data: &LoadedData, geo: &GeoSource, selection: &Selection) -> DashboardView {
    let combined = &data.combined;
    let year = selection.year;
    let std_set = &selection.std_indicators;
    let sdh_set = &selection.sdh_indicators;
    log::debug!("Rendering dashboard for {:?}", selection);

    let std_totals = queries::region_totals_for_year(combined, year, std_set, Measure::Cases);
    let sdh_totals = queries::region_totals_for_year(combined, year, sdh_set, Measure::Numerator);
    let trend = queries::yearly_totals_by_indicator(combined, std_set, Measure::Cases);
    let ranking = queries::state_ranking(combined, year, std_set);
    let rates = queries::state_rate_series(combined, &selection.state, std_set);
    let percents = queries::state_indicator_percent_series(combined, &selection.state, sdh_set);
    let corr = queries::correlation_matrix(&data.joined);

    DashboardView {
        std_map: charts::std_cases_map(&std_totals, geo, year),
        sdh_map: charts::sdh_numerator_map(&sdh_totals, geo, year),
        std_trend: charts::trend_line(&trend, Measure::Cases),
        state_ranking: ranking,
        state_rates: charts::rate_bar(&rates, &selection.state),
        sdh_percent_chart: charts::percent_line(&percents, &selection.state),
        sdh_percent_table: percents,
        heatmap: charts::correlation_heatmap(&queries::melt_correlation(&corr)),
        scatter: charts::scatterplot(&data.joined, &selection.scatter_x, &selection.scatter_y),
    }
}
