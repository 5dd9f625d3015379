//! Time-slot catalog.
//!
//! A catalog is the fixed, ordered list of bookable intervals for a day.
//! It is generated once per granularity and never changes afterwards, so
//! every matrix built on it can rely on slot membership being stable.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// First hour of the default catalog.
pub const DEFAULT_START_HOUR: u32 = 7;

/// End hour (exclusive) of the default catalog.
pub const DEFAULT_END_HOUR: u32 = 19;

/// Default slot length.
pub const DEFAULT_GRANULARITY_MINUTES: u32 = 60;

/// Canonical `HH:mm` start time of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotStart(NaiveTime);

impl SlotStart {
    /// Build a slot start from hour and minute.
    pub fn new(hour: u32, minute: u32) -> Result<Self, CatalogError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| CatalogError::InvalidSlot(format!("{hour:02}:{minute:02}")))
    }

    /// Parse `HH:mm`, also accepting `HH:mm:ss` as sent by the store.
    ///
    /// Seconds are dropped; slot identity is minute-granular.
    pub fn parse(s: &str) -> Result<Self, CatalogError> {
        let s = s.trim();
        let time = NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S%.f"))
            .map_err(|_| CatalogError::InvalidSlot(s.to_string()))?;

        Self::new(time.hour(), time.minute())
    }

    /// The start as a time of day.
    pub fn time(&self) -> NaiveTime {
        self.0
    }

    /// Minutes since midnight.
    pub fn minutes(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }
}

impl fmt::Display for SlotStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0.hour(), self.0.minute())
    }
}

impl FromStr for SlotStart {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SlotStart {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotStart {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// One bookable interval: its canonical start plus a display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub field: SlotStart,
    pub label: String,
}

/// Ordered, immutable list of slots for a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCatalog {
    slots: Vec<TimeSlot>,
    granularity_minutes: u32,
}

impl SlotCatalog {
    /// Generate slots from `start_hour:00` up to (excluding) `end_hour:00`.
    pub fn generate(
        start_hour: u32,
        end_hour: u32,
        granularity_minutes: u32,
    ) -> Result<Self, CatalogError> {
        if start_hour >= end_hour || end_hour > 24 {
            return Err(CatalogError::InvalidRange {
                start: start_hour,
                end: end_hour,
            });
        }
        let span = (end_hour - start_hour) * 60;
        if granularity_minutes == 0 || granularity_minutes > span {
            return Err(CatalogError::InvalidGranularity(granularity_minutes));
        }

        Ok(Self::build(start_hour * 60, end_hour * 60, granularity_minutes))
    }

    fn build(start_minute: u32, end_minute: u32, granularity: u32) -> Self {
        let slots = (start_minute..end_minute)
            .step_by(granularity as usize)
            .filter_map(|m| {
                let field = SlotStart::new(m / 60, m % 60).ok()?;
                let label = slot_label(m, (m + granularity).min(end_minute));
                Some(TimeSlot { field, label })
            })
            .collect();

        Self {
            slots,
            granularity_minutes: granularity,
        }
    }

    /// Slot length in minutes.
    pub fn granularity_minutes(&self) -> u32 {
        self.granularity_minutes
    }

    /// Whether `slot` is one of the catalog's starts.
    pub fn contains(&self, slot: SlotStart) -> bool {
        self.position(slot).is_some()
    }

    /// Index of `slot` in catalog order.
    pub fn position(&self, slot: SlotStart) -> Option<usize> {
        self.slots.binary_search_by(|s| s.field.cmp(&slot)).ok()
    }

    /// Look up the full slot for a start.
    pub fn get(&self, slot: SlotStart) -> Option<&TimeSlot> {
        self.position(slot).map(|i| &self.slots[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeSlot> {
        self.slots.iter()
    }

    /// Slot starts in order.
    pub fn starts(&self) -> impl Iterator<Item = SlotStart> + '_ {
        self.slots.iter().map(|s| s.field)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for SlotCatalog {
    fn default() -> Self {
        Self::build(
            DEFAULT_START_HOUR * 60,
            DEFAULT_END_HOUR * 60,
            DEFAULT_GRANULARITY_MINUTES,
        )
    }
}

fn slot_label(start: u32, end: u32) -> String {
    if start % 60 == 0 && end % 60 == 0 {
        format!("{:02}-{:02}h", start / 60, end / 60)
    } else {
        format!(
            "{:02}:{:02}-{:02}:{:02}",
            start / 60,
            start % 60,
            end / 60,
            end % 60
        )
    }
}
