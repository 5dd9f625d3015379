//! Error types for loading and submitting roster days.

use chrono::NaiveDate;
use thiserror::Error;

/// Failures reported by a [`RosterStore`](crate::RosterStore).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered and refused the request.
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The store answered with a body we could not read.
    #[error("could not decode store response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Returns true if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Rejected { status, .. } => *status >= 500,
            StoreError::Decode(_) => false,
        }
    }
}

/// Reconciliation errors.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The store failed a submission. Local edits are kept.
    #[error("submission failed: {0}")]
    SyncFailed(#[source] StoreError),

    /// The store's answer did not pass validation; nothing was merged.
    #[error("invalid store response: {0}")]
    InvalidResponse(String),

    /// A submission for this date is already outstanding.
    #[error("a submission is already in flight")]
    SubmissionInFlight,

    /// The ticket does not belong to the outstanding submission.
    #[error("ticket {ticket} is not the outstanding submission")]
    StaleTicket { ticket: u64 },

    /// Loading a day or the reference data failed.
    #[error("failed to load {what}: {source}")]
    Load {
        what: String,
        #[source]
        source: StoreError,
    },
}

impl ReconcileError {
    pub(crate) fn load_day(date: NaiveDate, source: StoreError) -> Self {
        ReconcileError::Load {
            what: format!("roster for {date}"),
            source,
        }
    }
}
