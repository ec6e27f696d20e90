use std::path::PathBuf;

use thiserror::Error;

/// Usage errors raised by this crate itself.
///
/// Failures coming from the underlying readers and writers (I/O, GeoJSON,
/// CSV, Parquet, Shapefile) are propagated as `anyhow::Error` with context;
/// these variants travel inside the same `anyhow::Error` and can be recovered
/// with `err.downcast_ref::<DataError>()`.
#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("pattern '{pattern}' did not match any file")]
    NoMatches { pattern: String },

    #[error("worker count must be at least 1")]
    InvalidWorkerCount,

    #[error("max_features must be at least 1")]
    InvalidChunkSize,

    #[error("unsupported file extension: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("column '{column}' not found")]
    MissingColumn { column: String },

    #[error("column '{column}' holds non-numeric value '{value}'")]
    NotNumeric { column: String, value: String },

    #[error("no four-digit year in file name: {}", path.display())]
    MissingYear { path: PathBuf },
}
