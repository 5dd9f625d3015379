//! Reference data and allocation records.
//!
//! Staff and locations come from the remote store and are never mutated
//! here. Presentation fields arriving in loose encodings (colors with or
//! without `#`, icons as byte arrays, base64 or data URLs) are normalized
//! once at this boundary.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::NaiveDate;
use roster_id::{ItemId, LocationId, StaffId};
use serde::{Deserialize, Serialize};

use crate::{GridError, SlotStart};

// =============================================================================
// Color
// =============================================================================

/// A `#rrggbb` (or `#rgb`) display color, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Color(String);

impl Color {
    pub fn parse(s: &str) -> Result<Self, GridError> {
        let hex = s.trim().trim_start_matches('#');
        let valid_len = hex.len() == 3 || hex.len() == 6;
        if !valid_len || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GridError::invalid(format!("invalid color '{s}'")));
        }
        Ok(Self(format!("#{}", hex.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Color {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Icon
// =============================================================================

/// Location icon as raw image bytes.
///
/// Cheap to clone; the bytes are shared.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Icon(Arc<[u8]>);

impl Icon {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into()))
    }

    /// Decode a base64 payload, with or without a `data:...;base64,` prefix.
    pub fn from_base64(s: &str) -> Result<Self, GridError> {
        let payload = match s.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => s,
        };
        BASE64
            .decode(payload.trim())
            .map(Self::from_bytes)
            .map_err(|e| GridError::invalid(format!("invalid icon encoding: {e}")))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Icon({} bytes)", self.0.len())
    }
}

impl Serialize for Icon {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Icon {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(IconVisitor)
    }
}

struct IconVisitor;

impl<'de> serde::de::Visitor<'de> for IconVisitor {
    type Value = Icon;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a byte array, a base64 string or a data URL")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Icon, E> {
        Icon::from_base64(v).map_err(E::custom)
    }

    fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Icon, E> {
        Ok(Icon::from_bytes(v))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Icon, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        // Java byte[] arrives signed; keep the bit pattern.
        while let Some(b) = seq.next_element::<i16>()? {
            if !(-128..=255).contains(&b) {
                return Err(serde::de::Error::custom(format!("icon byte out of range: {b}")));
            }
            bytes.push(b as u8);
        }
        Ok(Icon::from_bytes(bytes))
    }
}

// =============================================================================
// Reference Data
// =============================================================================

/// A person that can be rostered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: StaffId,

    /// Short display code shown as the row header.
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,
}

/// A service location staff can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,

    #[serde(default)]
    pub name: String,

    /// A blank color from the store means none.
    #[serde(
        default,
        deserialize_with = "optional_color",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<Color>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

fn optional_color<'de, D>(deserializer: D) -> Result<Option<Color>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(Color::parse)
        .transpose()
        .map_err(serde::de::Error::custom)
}

impl Location {
    /// Minimal location carrying only what an allocation needs.
    pub fn new(id: LocationId, color: Option<Color>, icon: Option<Icon>) -> Self {
        Self {
            id,
            name: String::new(),
            color,
            icon,
            active: true,
        }
    }
}

// =============================================================================
// Cells and Allocations
// =============================================================================

/// Composite key of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub staff_id: StaffId,
    pub slot: SlotStart,
}

impl CellKey {
    pub fn new(staff_id: StaffId, slot: SlotStart) -> Self {
        Self { staff_id, slot }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.staff_id, self.slot)
    }
}

impl FromStr for CellKey {
    type Err = GridError;

    /// Parses `staff@HH:mm`, e.g. `12@09:00`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (staff, slot) = s
            .split_once('@')
            .ok_or_else(|| GridError::invalid(format!("cell '{s}' is not staff@HH:mm")))?;
        let staff_id = staff
            .parse::<StaffId>()
            .map_err(|e| GridError::invalid(format!("cell '{s}': {e}")))?;
        let slot = slot
            .parse::<SlotStart>()
            .map_err(|e| GridError::invalid(format!("cell '{s}': {e}")))?;
        Ok(Self::new(staff_id, slot))
    }
}

/// One staff member's assignment to a location for a slot on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub staff_id: StaffId,
    pub date: NaiveDate,
    pub slot: SlotStart,
    pub location_id: LocationId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,

    /// Absent until the store confirms this exact placement.
    pub server_id: Option<ItemId>,
}

impl Allocation {
    /// A fresh, unconfirmed allocation of `location` at `key`.
    pub fn unconfirmed(key: CellKey, date: NaiveDate, location: &Location) -> Self {
        Self {
            staff_id: key.staff_id,
            date,
            slot: key.slot,
            location_id: location.id,
            color: location.color.clone(),
            icon: location.icon.clone(),
            server_id: None,
        }
    }

    pub fn key(&self) -> CellKey {
        CellKey::new(self.staff_id, self.slot)
    }

    /// Whether this allocation points at `location`.
    pub fn holds(&self, location: LocationId) -> bool {
        self.location_id == location
    }

    /// The location this allocation carries, as a paint/drag payload.
    pub fn location(&self) -> Location {
        Location::new(self.location_id, self.color.clone(), self.icon.clone())
    }
}
