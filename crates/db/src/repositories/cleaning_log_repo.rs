//! Repository for the `cleaning_logs` table.

use cleantrack_core::cleaning::ValidationStatus;
use cleantrack_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::cleaning_log::{CleaningLog, NewCleaningLog};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, equipment_id, performed_by, started_at, completed_at, duration_minutes, \
                       source, notes, evidence_url, chemicals_used, steps_completed, \
                       contact_time_met, all_steps_completed, issues_found, is_compliant, \
                       validation_status, validated_by, validated_at, created_at, updated_at";

/// Default page size when listing logs.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Provides persistence for cleaning logs.
///
/// Logs are immutable after insert except for the reviewer validation fields.
pub struct CleaningLogRepo;

impl CleaningLogRepo {
    /// Insert a log inside the caller's transaction.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &NewCleaningLog,
    ) -> Result<CleaningLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO cleaning_logs
                (equipment_id, performed_by, started_at, completed_at, duration_minutes, source,
                 notes, evidence_url, chemicals_used, steps_completed, contact_time_met,
                 all_steps_completed, issues_found, is_compliant, validation_status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CleaningLog>(&query)
            .bind(input.equipment_id)
            .bind(input.performed_by)
            .bind(input.started_at)
            .bind(input.completed_at)
            .bind(input.duration_minutes)
            .bind(&input.source)
            .bind(&input.notes)
            .bind(&input.evidence_url)
            .bind(&input.chemicals_used)
            .bind(&input.steps_completed)
            .bind(input.contact_time_met)
            .bind(input.all_steps_completed)
            .bind(&input.issues_found)
            .bind(input.is_compliant)
            .bind(&input.validation_status)
            .fetch_one(conn)
            .await
    }

    /// Most recent `completed_at` across all logs for the equipment.
    ///
    /// Rejected logs still count for the spam window.
    pub async fn latest_completed_at(
        conn: &mut PgConnection,
        equipment_id: DbId,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        let row: (Option<Timestamp>,) =
            sqlx::query_as("SELECT MAX(completed_at) FROM cleaning_logs WHERE equipment_id = $1")
                .bind(equipment_id)
                .fetch_one(conn)
                .await?;
        Ok(row.0)
    }

    /// Most recent `completed_at` among logs a reviewer has not rejected.
    pub async fn latest_accepted_completed_at(
        conn: &mut PgConnection,
        equipment_id: DbId,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        let row: (Option<Timestamp>,) = sqlx::query_as(
            "SELECT MAX(completed_at) FROM cleaning_logs
             WHERE equipment_id = $1 AND validation_status <> $2",
        )
        .bind(equipment_id)
        .bind(ValidationStatus::Rejected.as_str())
        .fetch_one(conn)
        .await?;
        Ok(row.0)
    }

    /// Find a log by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<CleaningLog>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cleaning_logs WHERE id = $1");
        sqlx::query_as::<_, CleaningLog>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Newest-first logs for one equipment item.
    pub async fn list_for_equipment(
        pool: &PgPool,
        equipment_id: DbId,
        limit: Option<i64>,
    ) -> Result<Vec<CleaningLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cleaning_logs
             WHERE equipment_id = $1
             ORDER BY completed_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, CleaningLog>(&query)
            .bind(equipment_id)
            .bind(limit.unwrap_or(DEFAULT_LIST_LIMIT))
            .fetch_all(pool)
            .await
    }

    /// Move a log from `from` to `to` if it is still in `from`.
    ///
    /// Returns `None` when the row is missing or another reviewer got there
    /// first.
    pub async fn set_validation(
        conn: &mut PgConnection,
        id: DbId,
        from: ValidationStatus,
        to: ValidationStatus,
        validated_by: DbId,
        validated_at: Timestamp,
    ) -> Result<Option<CleaningLog>, sqlx::Error> {
        let query = format!(
            "UPDATE cleaning_logs
             SET validation_status = $3, validated_by = $4, validated_at = $5
             WHERE id = $1 AND validation_status = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CleaningLog>(&query)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(validated_by)
            .bind(validated_at)
            .fetch_optional(conn)
            .await
    }

    /// Count logs completed in `[since, until)` per validation status.
    pub async fn count_by_status_between(
        pool: &PgPool,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT validation_status, COUNT(*) FROM cleaning_logs
             WHERE completed_at >= $1 AND completed_at < $2
             GROUP BY validation_status
             ORDER BY validation_status",
        )
        .bind(since)
        .bind(until)
        .fetch_all(pool)
        .await
    }
}
