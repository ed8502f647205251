//! Error types for the vitals metric store.

use thiserror::Error;

use crate::types::MetricKind;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while ingesting, querying, or persisting metrics.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown metric kind: {0}")]
    UnknownKind(String),

    #[error("metric id is empty")]
    EmptyId,

    #[error("invalid {kind} value: {raw}")]
    InvalidValue { kind: MetricKind, raw: String },

    #[error("gauge metric {0} has no value")]
    MissingValue(String),

    #[error("counter metric {0} has no delta")]
    MissingDelta(String),

    #[error("metric not found: {0}")]
    NotFound(String),

    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    /// True for errors caused by a malformed observation. Nothing is
    /// mutated when a validation error is reported.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StoreError::UnknownKind(_)
                | StoreError::EmptyId
                | StoreError::InvalidValue { .. }
                | StoreError::MissingValue(_)
                | StoreError::MissingDelta(_)
        )
    }

    /// True for disk read/write failures. These degrade durability, never
    /// availability.
    pub fn is_persistence(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::Encode(_))
    }
}
