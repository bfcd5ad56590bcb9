//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or `&mut PgConnection` inside a transaction) as the
//! first argument.

pub mod alert_repo;
pub mod cleaning_log_repo;
pub mod compliance_report_repo;
pub mod equipment_repo;
pub mod facility_repo;
pub mod token_issuance_repo;
pub mod user_repo;

pub use alert_repo::AlertRepo;
pub use cleaning_log_repo::CleaningLogRepo;
pub use compliance_report_repo::ComplianceReportRepo;
pub use equipment_repo::EquipmentRepo;
pub use facility_repo::FacilityRepo;
pub use token_issuance_repo::TokenIssuanceRepo;
pub use user_repo::UserRepo;
