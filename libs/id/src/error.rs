//! Error types for ID parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating IDs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The ID string is empty.
    #[error("ID cannot be empty")]
    Empty,

    /// The ID has a prefix that belongs to another kind.
    #[error("invalid ID prefix: expected '{expected}', got '{actual}'")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },

    /// The numeric portion of the ID is not an integer.
    #[error("invalid ID number: {0}")]
    InvalidNumber(String),

    /// IDs are assigned by the store and start at 1.
    #[error("ID must be positive, got {0}")]
    NotPositive(i64),
}
