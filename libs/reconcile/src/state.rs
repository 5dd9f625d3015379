//! Sync state machine of one open day.
//!
//! ```text
//!   Clean --mutation--> Dirty --begin--> Syncing --ok--> Clean
//!                         ^                 |  \
//!                         |                 |   `--ok + queued follow-up--> Dirty
//!                         `----- error -----'   (Failed: Dirty with last_error)
//! ```
//!
//! At most one submission is outstanding. Mutations during `Syncing` queue a
//! follow-up instead of starting a second submission.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use roster_id::StaffId;
use serde::Serialize;
use tokio::sync::watch;

use crate::{DayEntryDto, ReconcileError};

/// Where a day stands relative to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// Local state matches the last confirmed submission.
    Clean,
    /// Local edits wait for submission.
    Dirty,
    /// A submission is outstanding.
    Syncing,
    /// The last submission failed; edits are kept and still pending.
    Failed,
}

impl SyncPhase {
    /// Whether local edits are waiting to be submitted.
    pub fn has_pending(&self) -> bool {
        matches!(self, SyncPhase::Dirty | SyncPhase::Failed)
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncPhase::Clean => "clean",
            SyncPhase::Dirty => "dirty",
            SyncPhase::Syncing => "syncing",
            SyncPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Snapshot published to status watchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub date: NaiveDate,
    pub phase: SyncPhase,

    /// Mutations arrived while a submission was in flight.
    pub follow_up_queued: bool,

    pub last_error: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl SyncStatus {
    fn clean(date: NaiveDate) -> Self {
        Self {
            date,
            phase: SyncPhase::Clean,
            follow_up_queued: false,
            last_error: None,
            last_synced_at: None,
        }
    }
}

/// An outstanding submission.
///
/// Issued by [`DaySession::begin_submission`](crate::DaySession::begin_submission)
/// and handed back with the store's answer.
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    pub(crate) id: u64,
    pub(crate) date: NaiveDate,
    pub(crate) payload: Vec<DayEntryDto>,
    pub(crate) touched: BTreeSet<StaffId>,
}

impl SubmissionTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Entries to send to the store.
    pub fn payload(&self) -> &[DayEntryDto] {
        &self.payload
    }

    /// Staff whose changes this submission carries.
    pub fn touched(&self) -> &BTreeSet<StaffId> {
        &self.touched
    }
}

/// Drives [`SyncPhase`] transitions and publishes them.
#[derive(Debug)]
pub(crate) struct SyncTracker {
    status: SyncStatus,
    next_ticket: u64,
    in_flight: Option<u64>,
    sender: watch::Sender<SyncStatus>,
}

impl SyncTracker {
    pub fn new(date: NaiveDate) -> Self {
        let status = SyncStatus::clean(date);
        let (sender, _) = watch::channel(status.clone());
        Self {
            status,
            next_ticket: 1,
            in_flight: None,
            sender,
        }
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn phase(&self) -> SyncPhase {
        self.status.phase
    }

    pub fn watch(&self) -> watch::Receiver<SyncStatus> {
        self.sender.subscribe()
    }

    /// An operator edit was accepted.
    pub fn record_mutation(&mut self) {
        match self.status.phase {
            SyncPhase::Clean | SyncPhase::Failed => self.status.phase = SyncPhase::Dirty,
            SyncPhase::Syncing => self.status.follow_up_queued = true,
            SyncPhase::Dirty => return,
        }
        self.publish();
    }

    /// Move to `Syncing` and issue a ticket id, if anything is pending.
    pub fn begin(&mut self) -> Result<Option<u64>, ReconcileError> {
        match self.status.phase {
            SyncPhase::Syncing => Err(ReconcileError::SubmissionInFlight),
            SyncPhase::Clean => Ok(None),
            SyncPhase::Dirty | SyncPhase::Failed => {
                let id = self.next_ticket;
                self.next_ticket += 1;
                self.in_flight = Some(id);
                self.status.phase = SyncPhase::Syncing;
                self.status.follow_up_queued = false;
                self.publish();
                Ok(Some(id))
            }
        }
    }

    /// Reject tickets that are not the outstanding one.
    pub fn check(&self, ticket: u64) -> Result<(), ReconcileError> {
        if self.in_flight == Some(ticket) {
            Ok(())
        } else {
            Err(ReconcileError::StaleTicket { ticket })
        }
    }

    pub fn succeed(&mut self) {
        self.in_flight = None;
        self.status.phase = if self.status.follow_up_queued {
            SyncPhase::Dirty
        } else {
            SyncPhase::Clean
        };
        self.status.follow_up_queued = false;
        self.status.last_error = None;
        self.status.last_synced_at = Some(Utc::now());
        self.publish();
    }

    pub fn fail(&mut self, error: String) {
        self.in_flight = None;
        self.status.phase = SyncPhase::Failed;
        self.status.follow_up_queued = false;
        self.status.last_error = Some(error);
        self.publish();
    }

    fn publish(&self) {
        self.sender.send_replace(self.status.clone());
    }
}
