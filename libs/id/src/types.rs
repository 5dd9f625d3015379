//! Typed ID definitions for roster resources.
//!
//! Reference data (staff, locations) and confirmed roster records each get
//! their own ID type. All of them are assigned by the remote store.

use crate::define_id;

// =============================================================================
// Reference Data
// =============================================================================

define_id!(StaffId, "staff");
define_id!(LocationId, "loc");

// =============================================================================
// Roster Records
// =============================================================================

// Server record for one staff member on one date.
define_id!(RosterId, "roster");

// Server record for one slot assignment inside a roster record.
define_id!(ItemId, "item");

// =============================================================================
// Tests
// =============================================================================
