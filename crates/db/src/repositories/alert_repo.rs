//! Repository for the `compliance_alerts` table.
//!
//! Deduplication of open alerts relies on the partial unique index
//! `uq_compliance_alerts_open_per_type`; status changes are compare-and-set
//! against the lifecycle's [`allowed_sources`] so concurrent actors cannot
//! both win.

use cleantrack_core::alert::{allowed_sources, AlertAction, AlertStatus, OpenOutcome};
use cleantrack_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::alert::{AlertFilter, ComplianceAlert, CreateAlert};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, equipment_id, alert_type, severity, title, message, suggested_action, \
                       status, acknowledged_by, acknowledged_at, resolved_by, resolved_at, \
                       resolution_notes, dismissed_by, dismissed_at, related_cleaning_log_id, \
                       email_sent, email_sent_at, due_by, created_at, updated_at";

/// SQL predicate matching open alerts. Must match the predicate of
/// `uq_compliance_alerts_open_per_type` for `ON CONFLICT` to infer the index.
const OPEN_PREDICATE: &str = "status IN ('active', 'acknowledged')";

/// Attempts before giving up when the conflicting alert closes mid-open.
const OPEN_ATTEMPTS: usize = 3;

/// Provides persistence for compliance alerts.
pub struct AlertRepo;

impl AlertRepo {
    /// Open an alert unless one of the same type is already open for the
    /// equipment.
    ///
    /// Safe under concurrent sweeps: the insert is `ON CONFLICT DO NOTHING`
    /// against the partial unique index, followed by a lookup of the winner.
    pub async fn open_if_absent(
        pool: &PgPool,
        input: &CreateAlert,
    ) -> Result<OpenOutcome<ComplianceAlert>, sqlx::Error> {
        let insert = format!(
            "INSERT INTO compliance_alerts
                (equipment_id, alert_type, severity, title, message, suggested_action,
                 due_by, related_cleaning_log_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (equipment_id, alert_type) WHERE {OPEN_PREDICATE} DO NOTHING
             RETURNING {COLUMNS}"
        );

        for _ in 0..OPEN_ATTEMPTS {
            let created = sqlx::query_as::<_, ComplianceAlert>(&insert)
                .bind(input.equipment_id)
                .bind(&input.alert_type)
                .bind(&input.severity)
                .bind(&input.title)
                .bind(&input.message)
                .bind(&input.suggested_action)
                .bind(input.due_by)
                .bind(input.related_cleaning_log_id)
                .fetch_optional(pool)
                .await?;

            if let Some(alert) = created {
                return Ok(OpenOutcome::Created(alert));
            }

            if let Some(existing) =
                Self::find_open(pool, input.equipment_id, &input.alert_type).await?
            {
                return Ok(OpenOutcome::AlreadyOpen(existing));
            }
            // The conflicting alert was closed between the two statements.
        }

        Err(sqlx::Error::RowNotFound)
    }

    /// The open alert of the given type for the equipment, if any.
    pub async fn find_open(
        pool: &PgPool,
        equipment_id: DbId,
        alert_type: &str,
    ) -> Result<Option<ComplianceAlert>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM compliance_alerts
             WHERE equipment_id = $1 AND alert_type = $2 AND {OPEN_PREDICATE}"
        );
        sqlx::query_as::<_, ComplianceAlert>(&query)
            .bind(equipment_id)
            .bind(alert_type)
            .fetch_optional(pool)
            .await
    }

    /// All open alerts for one equipment item.
    pub async fn list_open_for_equipment(
        pool: &PgPool,
        equipment_id: DbId,
    ) -> Result<Vec<ComplianceAlert>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM compliance_alerts
             WHERE equipment_id = $1 AND {OPEN_PREDICATE}
             ORDER BY id"
        );
        sqlx::query_as::<_, ComplianceAlert>(&query)
            .bind(equipment_id)
            .fetch_all(pool)
            .await
    }

    /// Find an alert by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ComplianceAlert>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM compliance_alerts WHERE id = $1");
        sqlx::query_as::<_, ComplianceAlert>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List alerts matching the filter, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &AlertFilter,
    ) -> Result<Vec<ComplianceAlert>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM compliance_alerts
             WHERE ($1::TEXT IS NULL OR status = $1)
               AND ($2::BIGINT IS NULL OR equipment_id = $2)
               AND ($3::TEXT IS NULL OR alert_type = $3)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ComplianceAlert>(&query)
            .bind(&filter.status)
            .bind(filter.equipment_id)
            .bind(&filter.alert_type)
            .fetch_all(pool)
            .await
    }

    /// Count alerts currently in `status`.
    pub async fn count_with_status(pool: &PgPool, status: AlertStatus) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM compliance_alerts WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    // -----------------------------------------------------------------------
    // Compare-and-set transitions
    // -----------------------------------------------------------------------

    /// `active -> acknowledged`. Returns `None` if the alert was not active.
    pub async fn acknowledge(
        pool: &PgPool,
        id: DbId,
        actor: DbId,
        at: Timestamp,
    ) -> Result<Option<ComplianceAlert>, sqlx::Error> {
        let query = format!(
            "UPDATE compliance_alerts
             SET status = 'acknowledged', acknowledged_by = $2, acknowledged_at = $3
             WHERE id = $1 AND status = ANY($4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ComplianceAlert>(&query)
            .bind(id)
            .bind(actor)
            .bind(at)
            .bind(expected_statuses(AlertAction::Acknowledge))
            .fetch_optional(pool)
            .await
    }

    /// `active | acknowledged -> resolved`. `actor` is `None` for automated
    /// resolution by the sweep.
    pub async fn resolve(
        pool: &PgPool,
        id: DbId,
        actor: Option<DbId>,
        notes: Option<&str>,
        at: Timestamp,
    ) -> Result<Option<ComplianceAlert>, sqlx::Error> {
        let query = format!(
            "UPDATE compliance_alerts
             SET status = 'resolved', resolved_by = $2, resolved_at = $3, resolution_notes = $4
             WHERE id = $1 AND status = ANY($5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ComplianceAlert>(&query)
            .bind(id)
            .bind(actor)
            .bind(at)
            .bind(notes)
            .bind(expected_statuses(AlertAction::Resolve))
            .fetch_optional(pool)
            .await
    }

    /// `active -> dismissed`. Returns `None` if the alert was not active.
    pub async fn dismiss(
        pool: &PgPool,
        id: DbId,
        actor: DbId,
        at: Timestamp,
    ) -> Result<Option<ComplianceAlert>, sqlx::Error> {
        let query = format!(
            "UPDATE compliance_alerts
             SET status = 'dismissed', dismissed_by = $2, dismissed_at = $3
             WHERE id = $1 AND status = ANY($4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ComplianceAlert>(&query)
            .bind(id)
            .bind(actor)
            .bind(at)
            .bind(expected_statuses(AlertAction::Dismiss))
            .fetch_optional(pool)
            .await
    }

    /// Record that the notification email went out.
    pub async fn mark_email_sent(pool: &PgPool, id: DbId, at: Timestamp) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE compliance_alerts SET email_sent = TRUE, email_sent_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// Status names a compare-and-set update for `action` may start from.
fn expected_statuses(action: AlertAction) -> Vec<&'static str> {
    allowed_sources(action).iter().map(|s| s.as_str()).collect()
}
