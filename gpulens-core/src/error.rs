//! Error types for the gpulens core library.
//!
//! Uses `thiserror` for public API error types. Loader failures abort an
//! analysis; statistics failures are scoped to a single metric section.

use std::path::PathBuf;

/// Top-level error type for the gpulens core library.
#[derive(Debug, thiserror::Error)]
pub enum GpulensError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from turning uploaded bytes into a [`Table`](crate::table::Table).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Input is empty")]
    EmptyInput,

    #[error("Input looks like binary data (NUL byte at offset {offset})")]
    BinaryContent { offset: usize },

    #[error("Header row is missing or has no columns")]
    MissingHeader,

    #[error("Malformed CSV header: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
}

/// Errors from summarizing a single metric column.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    #[error("Column not found: {column}")]
    ColumnNotFound { column: String },

    #[error("No samples available for column: {column}")]
    EmptyDataset { column: String },

    #[error("Percentile {value} is outside [0, 100]")]
    PercentileRange { value: i64 },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `GpulensError`.
pub type Result<T> = std::result::Result<T, GpulensError>;
