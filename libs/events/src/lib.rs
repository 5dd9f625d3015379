//! # roster-events
//!
//! Change events and the observer interface for the roster grid.
//!
//! ## Design Principles
//!
//! - Events are immutable records of accepted grid changes
//! - Every event belongs to exactly one date (the day being edited)
//! - Events carry a per-bus monotonic sequence number
//! - Publishing never blocks and never fails because nobody is listening
//!
//! ## Event Envelope
//!
//! All events share a common envelope with:
//! - Ordering (`seq`)
//! - Scope (`date`)
//! - Classification (`event_type`, taken from the payload)
//! - Wall time (`occurred_at`)
//!
//! Payload types live with the component that emits them and implement
//! [`EventPayload`].

mod bus;
mod envelope;
mod error;

pub use bus::*;
pub use envelope::*;
pub use error::EventError;
