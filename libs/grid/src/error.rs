//! Error types for grid mutations and catalog construction.

use chrono::NaiveDate;
use thiserror::Error;

use crate::SlotStart;

/// Errors returned synchronously by grid mutations.
///
/// A rejected mutation never changes the matrix.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The target slot has already started (or the date is in the past).
    #[error("slot {slot} on {date} is locked")]
    SlotLocked { date: NaiveDate, slot: SlotStart },

    /// Malformed key, unknown slot, or a gesture issued out of order.
    #[error("rejected: {0}")]
    ValidationRejected(String),
}

impl GridError {
    /// Shorthand for a validation rejection.
    pub fn invalid(message: impl Into<String>) -> Self {
        GridError::ValidationRejected(message.into())
    }

    /// The reason reported to interaction controllers.
    pub fn rejection(&self) -> Rejection {
        match self {
            GridError::SlotLocked { .. } => Rejection::Locked,
            GridError::ValidationRejected(_) => Rejection::Invalid,
        }
    }

    /// Returns true if the mutation was refused by the lock policy.
    pub fn is_locked(&self) -> bool {
        matches!(self, GridError::SlotLocked { .. })
    }
}

/// Rejection reason exposed to interaction controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    Locked,
    Invalid,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Locked => write!(f, "locked"),
            Rejection::Invalid => write!(f, "invalid"),
        }
    }
}

/// Errors building a slot catalog or parsing slot times.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The hour range is empty or runs past midnight.
    #[error("invalid hour range {start}..{end}")]
    InvalidRange { start: u32, end: u32 },

    /// Granularity must be positive and fit inside the range.
    #[error("invalid granularity: {0} minutes")]
    InvalidGranularity(u32),

    /// The slot text is not a valid `HH:mm` time.
    #[error("invalid slot time: {0}")]
    InvalidSlot(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_mapping() {
        let locked = GridError::SlotLocked {
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            slot: SlotStart::new(9, 0).unwrap(),
        };
        assert_eq!(locked.rejection(), Rejection::Locked);
        assert!(locked.is_locked());
        assert_eq!(locked.to_string(), "slot 09:00 on 2026-03-02 is locked");

        let invalid = GridError::invalid("unknown slot");
        assert_eq!(invalid.rejection(), Rejection::Invalid);
        assert_eq!(Rejection::Invalid.to_string(), "invalid");
    }
}
