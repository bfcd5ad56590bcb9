//! Stored compliance report model.

use cleantrack_core::compliance::ComplianceSummary;
use cleantrack_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `compliance_reports` table: a fleet snapshot taken at
/// `period_end`, plus activity counts for the period.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComplianceReport {
    pub id: DbId,
    pub period_start: Timestamp,
    pub period_end: Timestamp,
    pub total_equipment: i64,
    pub compliant: i64,
    pub due_soon: i64,
    pub overdue: i64,
    pub never_cleaned: i64,
    pub compliance_rate: f64,
    /// Non-rejected cleanings completed within the period.
    pub cleanings_completed: i64,
    pub active_alerts: i64,
    /// `None` for scheduled reports.
    pub generated_by: Option<DbId>,
    pub email_sent: bool,
    pub email_sent_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload for a report.
#[derive(Debug, Clone)]
pub struct CreateComplianceReport {
    pub period_start: Timestamp,
    pub period_end: Timestamp,
    pub summary: ComplianceSummary,
    pub cleanings_completed: i64,
    pub active_alerts: i64,
    pub generated_by: Option<DbId>,
}
