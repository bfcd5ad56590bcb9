//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to the repositories in `cleantrack_db` or to the
//! workflows in [`crate::engine`] and map errors via
//! [`AppError`](crate::error::AppError).

pub mod alert;
pub mod cleaning_log;
pub mod compliance;
pub mod equipment;
pub mod facility;
pub mod public;
pub mod token;
