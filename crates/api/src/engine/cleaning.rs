//! Cleaning log recording and reviewer validation.
//!
//! Every submission path (authenticated form, persisted QR token, temporary
//! token) goes through [`record_cleaning`], which serializes on the equipment
//! row so the spam-window check, the insert, and the `last_cleaned_at`
//! update commit together.

use chrono::Utc;
use cleantrack_core::cleaning::{
    initial_validation_status, validation_transition, CleaningSource, ValidationStatus,
};
use cleantrack_core::compliance::{self, check_cleaning_window, validate_cleaning_times};
use cleantrack_core::error::CoreError;
use cleantrack_core::types::{DbId, Timestamp};
use cleantrack_db::models::cleaning_log::{CleaningLog, NewCleaningLog};
use cleantrack_db::repositories::{CleaningLogRepo, EquipmentRepo, TokenIssuanceRepo};
use cleantrack_events::{ComplianceEvent, EventBus};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

/// A validated cleaning submission, ready to be recorded.
#[derive(Debug, Clone)]
pub struct CleaningSubmission {
    pub equipment_id: DbId,
    /// `None` for anonymous public-token submissions.
    pub performed_by: Option<DbId>,
    pub source: CleaningSource,
    /// The public token used, if any. Marked as used in the audit table.
    pub token: Option<String>,
    pub started_at: Timestamp,
    pub completed_at: Timestamp,
    pub notes: Option<String>,
    pub evidence_url: Option<String>,
    pub chemicals_used: Vec<String>,
    pub steps_completed: Vec<String>,
    pub contact_time_met: bool,
    pub all_steps_completed: bool,
    pub issues_found: Option<String>,
}

/// The stored log plus the schedule it produced.
#[derive(Debug, Serialize)]
pub struct RecordedCleaning {
    pub cleaning_log: CleaningLog,
    pub next_due_at: Timestamp,
}

/// Record a cleaning inside one transaction.
///
/// Fails with [`CoreError::DuplicateCleaningWindow`] when another log for the
/// same equipment completed within the last hour of this one.
pub async fn record_cleaning(
    pool: &PgPool,
    event_bus: &EventBus,
    submission: CleaningSubmission,
    now: Timestamp,
) -> AppResult<RecordedCleaning> {
    validate_cleaning_times(submission.started_at, submission.completed_at, now)?;

    let equipment_id = submission.equipment_id;
    let mut tx = pool.begin().await?;

    let equipment = EquipmentRepo::find_for_update(&mut *tx, equipment_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Equipment",
            id: equipment_id,
        }))?;
    if !equipment.is_active {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Equipment {equipment_id} is inactive"
        ))));
    }

    let latest = CleaningLogRepo::latest_completed_at(&mut *tx, equipment_id).await?;
    check_cleaning_window(equipment_id, latest, submission.completed_at)?;

    let outcome = compliance::record_cleaning(&equipment.schedule(), submission.completed_at);
    let validation_status = initial_validation_status(
        submission.contact_time_met,
        submission.all_steps_completed,
        submission.issues_found.as_deref(),
    );

    let log = CleaningLogRepo::insert(
        &mut *tx,
        &NewCleaningLog {
            equipment_id,
            performed_by: submission.performed_by,
            started_at: submission.started_at,
            completed_at: submission.completed_at,
            duration_minutes: compliance::duration_minutes(
                submission.started_at,
                submission.completed_at,
            ),
            source: submission.source.as_str().to_string(),
            notes: submission.notes,
            evidence_url: submission.evidence_url,
            chemicals_used: serde_json::json!(submission.chemicals_used),
            steps_completed: serde_json::json!(submission.steps_completed),
            contact_time_met: submission.contact_time_met,
            all_steps_completed: submission.all_steps_completed,
            issues_found: submission.issues_found,
            is_compliant: outcome.is_compliant,
            validation_status: validation_status.as_str().to_string(),
        },
    )
    .await?;

    EquipmentRepo::set_last_cleaned(&mut *tx, equipment_id, Some(outcome.last_cleaned_at))
        .await?;

    if let Some(token) = &submission.token {
        TokenIssuanceRepo::mark_used(&mut *tx, token, now).await?;
    }

    tx.commit().await?;

    tracing::info!(
        cleaning_log_id = log.id,
        equipment_id,
        source = %submission.source,
        performed_by = ?log.performed_by,
        is_compliant = log.is_compliant,
        validation_status = %log.validation_status,
        "Cleaning recorded"
    );

    event_bus.publish(ComplianceEvent::CleaningRecorded {
        cleaning_log_id: log.id,
        equipment_id,
        facility_id: equipment.facility_id,
        equipment_name: equipment.name,
        serial_number: equipment.serial_number,
        is_compliant: log.is_compliant,
        source: log.source.clone(),
        performed_by: log.performed_by,
        completed_at: log.completed_at,
        occurred_at: Utc::now(),
    });

    Ok(RecordedCleaning {
        cleaning_log: log,
        next_due_at: outcome.next_due_at,
    })
}

/// Apply a reviewer verdict to a cleaning log.
///
/// Rejecting a log recomputes the equipment's `last_cleaned_at` from its
/// latest non-rejected log, which may clear it.
pub async fn review_cleaning(
    pool: &PgPool,
    log_id: DbId,
    to: ValidationStatus,
    reviewer: DbId,
    now: Timestamp,
) -> AppResult<CleaningLog> {
    let log = CleaningLogRepo::find_by_id(pool, log_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "CleaningLog",
            id: log_id,
        }))?;
    let from = log.validation_status()?;
    validation_transition(from, to)?;

    let mut tx = pool.begin().await?;
    EquipmentRepo::find_for_update(&mut *tx, log.equipment_id).await?;

    let updated = CleaningLogRepo::set_validation(&mut *tx, log_id, from, to, reviewer, now)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(format!(
                "Cleaning log {log_id} was reviewed concurrently"
            )))
        })?;

    if to == ValidationStatus::Rejected {
        let last = CleaningLogRepo::latest_accepted_completed_at(&mut *tx, log.equipment_id).await?;
        EquipmentRepo::set_last_cleaned(&mut *tx, log.equipment_id, last).await?;
    }

    tx.commit().await?;

    tracing::info!(
        cleaning_log_id = log_id,
        equipment_id = log.equipment_id,
        reviewer,
        from = %from,
        to = %to,
        "Cleaning log reviewed"
    );

    Ok(updated)
}
