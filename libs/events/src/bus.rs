//! Broadcast bus that fans grid events out to subscribers.
//!
//! The bus is owned by the single session editing a date. Publishing is
//! synchronous and never waits on subscribers; slow subscribers observe
//! [`EventError::Lagged`] instead of stalling the editor.

use chrono::NaiveDate;
use tokio::sync::broadcast;
use tracing::trace;

use crate::{EventEnvelope, EventError, EventPayload, EventSeq};

/// Default number of buffered events per subscriber.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// Publisher half of the observer interface.
#[derive(Debug)]
pub struct EventBus<P> {
    sender: broadcast::Sender<EventEnvelope<P>>,
    next_seq: EventSeq,
}

impl<P: EventPayload> EventBus<P> {
    /// Create a bus with the given per-subscriber buffer.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            next_seq: EventSeq::FIRST,
        }
    }

    /// Wrap a payload in an envelope and fan it out.
    ///
    /// Returns the envelope that was published, whether or not anyone is
    /// subscribed.
    pub fn publish(&mut self, date: NaiveDate, payload: P) -> Result<EventEnvelope<P>, EventError> {
        let envelope = EventEnvelope::builder()
            .seq(self.next_seq)
            .date(date)
            .event_type(payload.event_type())
            .payload(payload)
            .build()?;
        self.next_seq = self.next_seq.next();

        let receivers = self.sender.send(envelope.clone()).unwrap_or(0);
        trace!(
            seq = %envelope.seq,
            event_type = %envelope.event_type,
            receivers,
            "Published event"
        );

        Ok(envelope)
    }

    /// Register a new subscriber. It sees events published from now on.
    pub fn subscribe(&self) -> Subscription<P> {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Sequence number the next event will carry.
    pub fn next_seq(&self) -> EventSeq {
        self.next_seq
    }
}

impl<P: EventPayload> Default for EventBus<P> {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

/// Subscriber half of the observer interface.
#[derive(Debug)]
pub struct Subscription<P> {
    receiver: broadcast::Receiver<EventEnvelope<P>>,
}

impl<P: EventPayload> Subscription<P> {
    /// Wait for the next event.
    pub async fn recv(&mut self) -> Result<EventEnvelope<P>, EventError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    /// Take the next event if one is already buffered.
    pub fn try_recv(&mut self) -> Result<Option<EventEnvelope<P>>, EventError> {
        match self.receiver.try_recv() {
            Ok(envelope) => Ok(Some(envelope)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Err(EventError::Lagged(n)),
            Err(broadcast::error::TryRecvError::Closed) => Err(EventError::Closed),
        }
    }

    /// Drain every buffered event.
    pub fn drain(&mut self) -> Result<Vec<EventEnvelope<P>>, EventError> {
        let mut out = Vec::new();
        while let Some(envelope) = self.try_recv()? {
            out.push(envelope);
        }
        Ok(out)
    }
}

fn map_recv_error(err: broadcast::error::RecvError) -> EventError {
    match err {
        broadcast::error::RecvError::Lagged(n) => EventError::Lagged(n),
        broadcast::error::RecvError::Closed => EventError::Closed,
    }
}
