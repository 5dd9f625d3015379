//! # roster-grid
//!
//! The allocation grid engine: which staff member is at which location in
//! each time slot of a day.
//!
//! ## Design Principles
//!
//! - One allocation per `(staff, slot)`; the matrix key enforces it
//! - Cells whose slot has started are read-only, re-evaluated on every call
//! - Mutations are synchronous and either apply completely or not at all
//! - Every accepted change is announced as a [`GridEvent`]
//! - Gesture state is an explicit [`SessionContext`], never global
//!
//! ## Layers
//!
//! - [`SlotCatalog`]: the ordered slots of a day
//! - [`LockPolicy`] + [`Clock`]: what may still be edited
//! - [`DayMatrix`]: allocations for one date
//! - [`GridEditor`]: toggle, paint and relocate gestures on a matrix
//! - [`WeekMatrix`]: read-only weekly aggregation

mod clock;
mod editor;
mod error;
mod event;
mod lock;
mod matrix;
mod model;
mod slot;
mod week;

pub use clock::{Clock, ManualClock, SystemClock};
pub use editor::{GridEditor, InteractionMode, SessionContext};
pub use error::{CatalogError, GridError, Rejection};
pub use event::GridEvent;
pub use lock::LockPolicy;
pub use matrix::{DayMatrix, MutationOutcome, StaffRow};
pub use model::{Allocation, CellKey, Color, Icon, Location, Staff};
pub use slot::{
    SlotCatalog, SlotStart, TimeSlot, DEFAULT_END_HOUR, DEFAULT_GRANULARITY_MINUTES,
    DEFAULT_START_HOUR,
};
pub use week::{week_bounds, StaffWeek, WeekMatrix};
