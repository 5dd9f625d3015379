//! Event envelope - the common wrapper for all grid events.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::EventError;

/// Implemented by every payload that can travel on an [`EventBus`](crate::EventBus).
pub trait EventPayload: Clone + Send + 'static {
    /// Dotted event type name, e.g. `cell.assigned`.
    fn event_type(&self) -> &'static str;
}

/// Monotonic sequence number assigned by the bus that published the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventSeq(u64);

impl EventSeq {
    /// The first sequence number of a fresh bus.
    pub const FIRST: Self = Self(1);

    /// Creates a sequence number from a raw value.
    #[must_use]
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Returns the underlying value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl Default for EventSeq {
    fn default() -> Self {
        Self::FIRST
    }
}

impl std::fmt::Display for EventSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The event envelope - common metadata for all events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<P> {
    /// Bus-local monotonic sequence.
    pub seq: EventSeq,

    /// When the event was published.
    pub occurred_at: DateTime<Utc>,

    /// The roster date the event belongs to.
    pub date: NaiveDate,

    /// The event type (e.g., "cell.assigned", "row.reconciled").
    pub event_type: String,

    /// Event-specific payload.
    pub payload: P,
}

impl<P> EventEnvelope<P> {
    /// Creates a new event envelope builder.
    pub fn builder() -> EventEnvelopeBuilder<P> {
        EventEnvelopeBuilder::new()
    }
}

/// Builder for constructing event envelopes.
#[derive(Debug)]
pub struct EventEnvelopeBuilder<P> {
    seq: Option<EventSeq>,
    occurred_at: Option<DateTime<Utc>>,
    date: Option<NaiveDate>,
    event_type: Option<String>,
    payload: Option<P>,
}

impl<P> EventEnvelopeBuilder<P> {
    pub fn new() -> Self {
        Self {
            seq: None,
            occurred_at: None,
            date: None,
            event_type: None,
            payload: None,
        }
    }

    pub fn seq(mut self, seq: EventSeq) -> Self {
        self.seq = Some(seq);
        self
    }

    pub fn occurred_at(mut self, ts: DateTime<Utc>) -> Self {
        self.occurred_at = Some(ts);
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn payload(mut self, payload: P) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Builds the event envelope.
    ///
    /// `occurred_at` defaults to now; every other field is required.
    pub fn build(self) -> Result<EventEnvelope<P>, EventError> {
        Ok(EventEnvelope {
            seq: self.seq.ok_or(EventError::MissingField("seq"))?,
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now),
            date: self.date.ok_or(EventError::MissingField("date"))?,
            event_type: self
                .event_type
                .ok_or(EventError::MissingField("event_type"))?,
            payload: self.payload.ok_or(EventError::MissingField("payload"))?,
        })
    }
}

impl<P> Default for EventEnvelopeBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}
