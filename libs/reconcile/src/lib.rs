//! # roster-reconcile
//!
//! Keeps an optimistically edited roster day converged with the store.
//!
//! ## Design Principles
//!
//! - Edits apply locally first; the store confirms later
//! - Submissions carry full per-staff replacements, never diffs
//! - At most one submission per date is in flight
//! - A store answer is validated completely before any of it is merged
//! - Failures keep local edits and surface through [`SyncStatus`]
//!
//! ## Flow
//!
//! ```text
//! gesture -> DaySession -> GridEditor -> DayMatrix
//!                |                          |
//!                |   interaction end        v (events)
//!                +--> SubmissionTicket -> RosterStore::submit_day
//!                                              |
//!                     merge_response <---------'
//! ```

mod dto;
mod error;
mod merge;
mod navigator;
mod payload;
mod session;
mod state;
mod store;

pub use dto::{validate_day, DayEntryDto, ItemDto, StaffDay};
pub use error::{ReconcileError, StoreError};
pub use merge::{merge_response, MergeReport, ReconciliationMismatch};
pub use navigator::{NavigationPolicy, Roster};
pub use payload::build_payload;
pub use session::{load_matrix, DaySession};
pub use state::{SubmissionTicket, SyncPhase, SyncStatus};
pub use store::{RosterStore, StaffFilter};
