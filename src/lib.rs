//! STD incidence vs. social determinants of health dashboard core.
//!
//! Loads the two state-level CSV datasets, reshapes them into a combined long
//! table and a joined wide table, answers the selection-driven queries the
//! dashboard needs, and binds the results to Vega-Lite chart specs for an
//! external renderer.

pub mod cache;
pub mod charts;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod queries;
pub mod reshape;
pub mod types;
pub mod util;

pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use loader::LoadedData;
pub use pipeline::{render, DashboardView, Selection};
