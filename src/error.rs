//! Error type for loading and rendering the dashboard.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Input/Output error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {dataset}: {source}")]
    Csv {
        dataset: String,
        #[source]
        source: csv::Error,
    },

    #[error("Dataset {dataset} is missing required column '{column}'")]
    MissingColumn { dataset: String, column: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DashboardError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn csv<S: Into<String>>(dataset: S, source: csv::Error) -> Self {
        Self::Csv { dataset: dataset.into(), source }
    }

    pub fn missing_column<S: Into<String>, C: Into<String>>(dataset: S, column: C) -> Self {
        Self::MissingColumn { dataset: dataset.into(), column: column.into() }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
