//! Error types for event handling.

use thiserror::Error;

/// Errors that can occur when handling events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    /// A required envelope field was not set on the builder.
    #[error("missing envelope field: {0}")]
    MissingField(&'static str),

    /// The subscriber fell behind and the bus dropped events.
    #[error("subscriber lagged, {0} events dropped")]
    Lagged(u64),

    /// The bus was dropped.
    #[error("event bus closed")]
    Closed,
}
