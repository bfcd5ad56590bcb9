//! Cleaning log entity model and DTOs.

use cleantrack_core::cleaning::ValidationStatus;
use cleantrack_core::error::CoreError;
use cleantrack_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `cleaning_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CleaningLog {
    pub id: DbId,
    pub equipment_id: DbId,
    /// `None` for anonymous submissions through a public token.
    pub performed_by: Option<DbId>,
    pub started_at: Timestamp,
    pub completed_at: Timestamp,
    pub duration_minutes: i32,
    /// `manual`, `qr_scan`, or `temporary_token`.
    pub source: String,
    pub notes: Option<String>,
    pub evidence_url: Option<String>,
    pub chemicals_used: serde_json::Value,
    pub steps_completed: serde_json::Value,
    pub contact_time_met: bool,
    pub all_steps_completed: bool,
    pub issues_found: Option<String>,
    pub is_compliant: bool,
    pub validation_status: String,
    pub validated_by: Option<DbId>,
    pub validated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CleaningLog {
    pub fn validation_status(&self) -> Result<ValidationStatus, CoreError> {
        self.validation_status.parse()
    }
}

/// Insert payload for a cleaning log.
///
/// Built by the cleaning flow after the compliance verdict and initial
/// validation status have been computed.
#[derive(Debug, Clone)]
pub struct NewCleaningLog {
    pub equipment_id: DbId,
    pub performed_by: Option<DbId>,
    pub started_at: Timestamp,
    pub completed_at: Timestamp,
    pub duration_minutes: i32,
    pub source: String,
    pub notes: Option<String>,
    pub evidence_url: Option<String>,
    pub chemicals_used: serde_json::Value,
    pub steps_completed: serde_json::Value,
    pub contact_time_met: bool,
    pub all_steps_completed: bool,
    pub issues_found: Option<String>,
    pub is_compliant: bool,
    pub validation_status: String,
}
