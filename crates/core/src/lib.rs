//! Domain logic for cleaning compliance tracking.
//!
//! Everything here is synchronous and free of I/O: callers pass the current
//! instant and persist the returned decisions.

pub mod alert;
pub mod cleaning;
pub mod compliance;
pub mod equipment;
pub mod error;
pub mod roles;
pub mod token;
pub mod types;
