//! Core data structures for Datachain Skein
//!
//! Shared primitives for the settlement engine: account identifiers, role
//! bitmasks, and the logical clock the issuance schedule runs on.

pub mod clock;
pub mod types;

// Re-exports
pub use clock::{Tick, TICKS_PER_ANNUM};
pub use types::{AccountId, ClusterId, MicroSkn, Role, RoleSet, TableIndex};
