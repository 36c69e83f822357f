use std::path::PathBuf;

use thiserror::Error;

use crate::config::OutputFormat;
use crate::model::FixtureSource;

/// Failures at the edges of the pipeline: reading inputs, checking them,
/// and writing the report. The occupancy mapper itself never fails.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{list} fixture #{index} in {origin} has no channel names")]
    EmptyFootprint {
        origin: String,
        list: FixtureSource,
        index: usize,
    },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("{0} output is not supported")]
    UnsupportedFormat(OutputFormat),

    #[error("failed to render report: {0}")]
    Render(#[from] std::fmt::Error),

    #[error("patch audit found {errors} error(s)")]
    AuditFailed { errors: usize },
}

impl PatchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PatchError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PatchError>;
