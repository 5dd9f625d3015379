//! # roster-testing
//!
//! Test support for the roster workspace: an in-memory store that behaves
//! like the remote one, plus fixtures.

pub mod fixtures;
mod store;

pub use store::{location, staff, InMemoryStore, StoreCall};
