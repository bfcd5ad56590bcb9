//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO or insert payload
//! - Helpers that parse stored text columns into core enums

pub mod alert;
pub mod cleaning_log;
pub mod compliance_report;
pub mod equipment;
pub mod facility;
pub mod token_issuance;
pub mod user;
