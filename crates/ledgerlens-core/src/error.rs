//! Error types for the statement parsing engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for statement parsing operations.
///
/// The pipeline is fail-open: shape and parse problems are carried as
/// warnings on stage outcomes, not errors. An `EngineError` reaching the
/// caller means either a configuration problem or a broken internal
/// invariant that makes the document's output untrustworthy.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Structural error: a pipeline-internal invariant was broken
    #[error("Structural error: {0}")]
    StructuralError(String),

    /// Parse error for a single value (recoverable at the row level)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Validation error: an emitted entity violates a schema invariant
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A bounding box with negative extent was encountered
    #[error("Invalid bounding box: width {width}, height {height}")]
    InvalidBoundingBox { width: f64, height: f64 },

    /// A fragment referenced a page number below 1
    #[error("Invalid page number: {0}")]
    InvalidPageNumber(u32),

    /// Export pre-check refused the transaction set
    #[error("Export rejected: {0}")]
    ExportRejected(String),
}

impl EngineError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a structural error.
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::StructuralError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Check whether the error is fatal for the document.
    ///
    /// Structural errors abort the current document; everything else is
    /// recoverable with degraded output.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::StructuralError(_) | Self::InvalidBoundingBox { .. } | Self::InvalidPageNumber(_)
        )
    }
}

/// Result type alias for statement parsing operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_errors_are_fatal() {
        assert!(EngineError::structural("boom").is_fatal());
        assert!(EngineError::InvalidBoundingBox {
            width: -1.0,
            height: 2.0
        }
        .is_fatal());
        assert!(EngineError::InvalidPageNumber(0).is_fatal());
    }

    #[test]
    fn test_parse_errors_are_recoverable() {
        assert!(!EngineError::parse("bad date").is_fatal());
        assert!(!EngineError::config("bad threshold").is_fatal());
    }
}
