//! Compliance workflows shared by handlers and background tasks.
//!
//! - [`cleaning`] -- transactional cleaning-log recording and reviewer validation.
//! - [`sweep`] -- classification of all active equipment and alert upkeep.
//! - [`report`] -- compliance snapshots and stored periodic reports.

pub mod cleaning;
pub mod report;
pub mod sweep;
