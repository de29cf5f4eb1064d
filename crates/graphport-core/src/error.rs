//! Centralized error types for graphport.

use thiserror::Error;

/// Errors raised by a [`SourceAdapter`](crate::SourceAdapter).
#[derive(Error, Debug)]
pub enum SourceError {
    /// Connection or query failure. Always fatal for the run.
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Not found in source: {0}")]
    NotFound(String),

    #[error("Attribute '{attribute}' is not valid for class {class}")]
    InvalidAttribute { class: String, attribute: String },

    #[error("Unexpected value for attribute '{attribute}': expected {expected}")]
    UnexpectedValue { attribute: String, expected: String },
}

/// Result type for source reads.
pub type SourceResult<T> = Result<T, SourceError>;

impl SourceError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn unexpected(attribute: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::UnexpectedValue {
            attribute: attribute.into(),
            expected: expected.into(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors raised by a [`GraphSink`](crate::GraphSink).
#[derive(Error, Debug)]
pub enum SinkError {
    /// Node or edge malformed, or the destination refused the write.
    #[error("Sink rejected write: {0}")]
    Rejected(String),

    /// A constraint or index could not be established.
    #[error("Schema conflict: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for sink writes.
pub type SinkResult<T> = Result<T, SinkError>;

/// Main error type for an import run.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Source data error: {0}")]
    SourceData(String),

    #[error("Sink rejected {what}: {reason}")]
    SinkRejection { what: String, reason: String },

    #[error("Unknown type in schema description: {0}")]
    UnknownType(String),

    #[error("Schema description error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

impl ImportError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn sink(what: impl Into<String>, err: SinkError) -> Self {
        match err {
            SinkError::Io(e) => Self::Io(e),
            other => Self::SinkRejection {
                what: what.into(),
                reason: other.to_string(),
            },
        }
    }

    /// Whether this error must terminate the run.
    ///
    /// Only an instance of an undescribed type is recoverable: the referring
    /// instance keeps its node and the offending target is skipped.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UnknownType(_))
    }
}

impl From<SourceError> for ImportError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Unavailable(msg) => Self::SourceUnavailable(msg),
            other => Self::SourceData(other.to_string()),
        }
    }
}
