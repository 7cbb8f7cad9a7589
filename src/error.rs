use std::io;

use thiserror::Error;

use crate::models::RecordKey;

/// Structural failures surfaced to the caller.
///
/// Per-record normalization problems are never errors; they end up as
/// [`UnfixedReason`](crate::models::UnfixedReason) values instead.
#[derive(Debug, Error)]
pub enum FixError {
    #[error("record {key} has no field '{field}'")]
    MissingField { key: RecordKey, field: String },
    #[error("column '{0}' not found in header row")]
    MissingColumn(String),
    #[error("duplicate primary key {0}")]
    DuplicateKey(RecordKey),
    #[error("record {key} has an invalid coordinate '{value}'")]
    InvalidCoordinate { key: RecordKey, value: String },
    #[error("invalid pattern for anomaly '{label}': {source}")]
    InvalidPattern {
        label: String,
        #[source]
        source: regex::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}
