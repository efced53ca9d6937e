//! Shared error type for pure core-layer failures.

use thiserror::Error;

/// Errors produced by core-layer validation and parsing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input failed a business-rule or shape check.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A value could not be parsed into a known enum or format.
    #[error("Parse error: {0}")]
    Parse(String),
}
