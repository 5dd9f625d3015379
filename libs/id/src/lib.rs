//! # roster-id
//!
//! Typed identifiers for the duty roster grid.
//!
//! ## Design Principles
//!
//! - IDs are assigned by the remote store; the grid never invents them
//! - IDs are typed so a staff id can never be passed where a location id is expected
//! - All IDs are positive integers on the wire
//! - Parsing accepts the bare number or a prefixed label (`staff_12`)
//!
//! ## ID Kinds
//!
//! - `StaffId` (`staff`): a person that can be rostered
//! - `LocationId` (`loc`): a service location (clinic, ward, post)
//! - `RosterId` (`roster`): the server record holding one staff member's day
//! - `ItemId` (`item`): one confirmed slot assignment inside a roster record

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;
