//! Dashboard configuration
//!
//! Read from `std_dashboard.toml` (or an explicit path), then overridden by
//! environment variables.

use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "std_dashboard.toml";

pub const ENV_STD_CSV: &str = "STD_DASHBOARD_STD_CSV";
pub const ENV_SDH_CSV: &str = "STD_DASHBOARD_SDH_CSV";
pub const ENV_OUTPUT_DIR: &str = "STD_DASHBOARD_OUTPUT_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// STD indicators by state
    #[serde(default = "default_std_csv")]
    pub std_csv: PathBuf,

    /// Social determinants of health by state
    #[serde(default = "default_sdh_csv")]
    pub sdh_csv: PathBuf,

    /// Where rendered chart specs are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Year selected when the dashboard first opens
    #[serde(default = "default_year")]
    pub default_year: i32,

    /// TopoJSON boundary source for the choropleths
    #[serde(default = "default_geo_url")]
    pub geo_url: String,

    #[serde(default = "default_geo_feature")]
    pub geo_feature: String,
}

fn default_std_csv() -> PathBuf {
    PathBuf::from("STD_by_state.csv")
}

fn default_sdh_csv() -> PathBuf {
    PathBuf::from("SD_health.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dashboard_out")
}

fn default_year() -> i32 {
    2016
}

fn default_geo_url() -> String {
    "https://cdn.jsdelivr.net/npm/vega-datasets@v1.29.0/data/us-10m.json".to_string()
}

fn default_geo_feature() -> String {
    "states".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            std_csv: default_std_csv(),
            sdh_csv: default_sdh_csv(),
            output_dir: default_output_dir(),
            default_year: default_year(),
            geo_url: default_geo_url(),
            geo_feature: default_geo_feature(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from file or use defaults, then apply env overrides.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::info!("Using default configuration");
                    Self::default()
                }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DashboardError::io(path, e))?;
        toml::from_str(&content)
            .map_err(|e| DashboardError::config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DashboardError::config(e.to_string()))
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_STD_CSV) {
            log::debug!("{} overrides std_csv", ENV_STD_CSV);
            self.std_csv = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_SDH_CSV) {
            log::debug!("{} overrides sdh_csv", ENV_SDH_CSV);
            self.sdh_csv = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_OUTPUT_DIR) {
            log::debug!("{} overrides output_dir", ENV_OUTPUT_DIR);
            self.output_dir = PathBuf::from(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config = DashboardConfig::from_toml("std_csv = \"data/std.csv\"\ndefault_year = 2019\n").unwrap();
        assert_eq!(config.std_csv, PathBuf::from("data/std.csv"));
        assert_eq!(config.default_year, 2019);
        assert_eq!(config.sdh_csv, PathBuf::from("SD_health.csv"));
        assert_eq!(config.geo_feature, "states");
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = DashboardConfig::from_toml("default_year = \"soon\"").unwrap_err();
        assert!(matches!(err, DashboardError::Config { .. }));
    }

    #[test]
    fn overrides_replace_paths() {
        let env: HashMap<&str, &str> =
            [(ENV_SDH_CSV, "/tmp/sdh.csv"), (ENV_OUTPUT_DIR, "/tmp/out")].into_iter().collect();
        let mut config = DashboardConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.std_csv, PathBuf::from("STD_by_state.csv"));
        assert_eq!(config.sdh_csv, PathBuf::from("/tmp/sdh.csv"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn explicit_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dash.toml");
        std::fs::write(&path, "output_dir = \"charts\"\n").unwrap();
        let config = DashboardConfig::load_from_file(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("charts"));
        assert!(DashboardConfig::load_from_file(&dir.path().join("missing.toml")).is_err());
    }
}
