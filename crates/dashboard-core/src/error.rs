use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the lab dashboard crates.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A raw record could not be turned into a normalized record.
    #[error("Invalid record field {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A date value is present but matches no recognised format.
    #[error("Invalid date format: {0}")]
    DateParse(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    /// Shorthand for a [`DashboardError::Validation`] on `field`.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;
