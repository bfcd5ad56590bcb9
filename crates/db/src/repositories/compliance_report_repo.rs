//! Repository for the `compliance_reports` table.

use cleantrack_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::compliance_report::{ComplianceReport, CreateComplianceReport};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, period_start, period_end, total_equipment, compliant, due_soon, \
                       overdue, never_cleaned, compliance_rate, cleanings_completed, \
                       active_alerts, generated_by, email_sent, email_sent_at, created_at, \
                       updated_at";

/// Default page size for [`ComplianceReportRepo::list`].
const DEFAULT_LIMIT: i64 = 52;

/// Provides persistence for periodic compliance reports.
pub struct ComplianceReportRepo;

impl ComplianceReportRepo {
    /// Store a report, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateComplianceReport,
    ) -> Result<ComplianceReport, sqlx::Error> {
        let query = format!(
            "INSERT INTO compliance_reports
                (period_start, period_end, total_equipment, compliant, due_soon, overdue,
                 never_cleaned, compliance_rate, cleanings_completed, active_alerts, generated_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ComplianceReport>(&query)
            .bind(input.period_start)
            .bind(input.period_end)
            .bind(input.summary.total_equipment)
            .bind(input.summary.compliant)
            .bind(input.summary.due_soon)
            .bind(input.summary.overdue)
            .bind(input.summary.never_cleaned)
            .bind(input.summary.compliance_rate)
            .bind(input.cleanings_completed)
            .bind(input.active_alerts)
            .bind(input.generated_by)
            .fetch_one(pool)
            .await
    }

    /// Find a report by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ComplianceReport>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM compliance_reports WHERE id = $1");
        sqlx::query_as::<_, ComplianceReport>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Newest reports first. `limit` defaults to a year of weekly reports.
    pub async fn list(
        pool: &PgPool,
        limit: Option<i64>,
    ) -> Result<Vec<ComplianceReport>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM compliance_reports
             ORDER BY period_end DESC, id DESC
             LIMIT $1"
        );
        sqlx::query_as::<_, ComplianceReport>(&query)
            .bind(limit.unwrap_or(DEFAULT_LIMIT))
            .fetch_all(pool)
            .await
    }

    /// Record that the report email went out.
    pub async fn mark_email_sent(pool: &PgPool, id: DbId, at: Timestamp) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE compliance_reports SET email_sent = TRUE, email_sent_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(pool)
            .await?;
        Ok(())
    }
}
