//! Handlers for cleaning logs submitted by authenticated staff and for
//! reviewer validation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use cleantrack_core::cleaning::{CleaningSource, ValidationStatus};
use cleantrack_core::types::{DbId, Timestamp};
use cleantrack_db::models::cleaning_log::CleaningLog;
use cleantrack_db::repositories::CleaningLogRepo;
use serde::Deserialize;
use validator::Validate;

use crate::engine::cleaning::{self, CleaningSubmission, RecordedCleaning};
use crate::error::AppResult;
use crate::handlers::equipment::find_equipment;
use crate::middleware::rbac::{RequireAuth, RequireLogCleaning, RequireReviewCleanings};
use crate::response::DataResponse;
use crate::state::AppState;

/// Upper bound for `?limit=` on log listings.
const MAX_LIST_LIMIT: i64 = 500;

/// Checklist and evidence fields shared by every submission path.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CleaningDetails {
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    #[validate(url)]
    pub evidence_url: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub chemicals_used: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub steps_completed: Vec<String>,
    #[serde(default)]
    pub contact_time_met: bool,
    #[serde(default)]
    pub all_steps_completed: bool,
    #[validate(length(max = 5000))]
    pub issues_found: Option<String>,
}

/// Body of `POST /equipment/{id}/cleaning-logs`.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitCleaning {
    /// Defaults to `completed_at`.
    pub started_at: Option<Timestamp>,
    /// Defaults to the time of the request.
    pub completed_at: Option<Timestamp>,
    #[serde(flatten)]
    #[validate(nested)]
    pub details: CleaningDetails,
}

impl CleaningDetails {
    /// Build a submission from these details.
    pub fn into_submission(
        self,
        equipment_id: DbId,
        performed_by: Option<DbId>,
        source: CleaningSource,
        token: Option<String>,
        started_at: Timestamp,
        completed_at: Timestamp,
    ) -> CleaningSubmission {
        CleaningSubmission {
            equipment_id,
            performed_by,
            source,
            token,
            started_at,
            completed_at,
            notes: self.notes,
            evidence_url: self.evidence_url,
            chemicals_used: self.chemicals_used,
            steps_completed: self.steps_completed,
            contact_time_met: self.contact_time_met,
            all_steps_completed: self.all_steps_completed,
            issues_found: self.issues_found,
        }
    }
}

/// Body of `POST /cleaning-logs/{id}/validation`.
#[derive(Debug, Deserialize)]
pub struct ReviewCleaning {
    pub status: ValidationStatus,
}

/// Query parameters for the log listing.
#[derive(Debug, Default, Deserialize)]
pub struct CleaningLogQuery {
    pub limit: Option<i64>,
}

/// POST /api/v1/equipment/{id}/cleaning-logs
pub async fn create(
    RequireLogCleaning(user): RequireLogCleaning,
    State(state): State<AppState>,
    Path(equipment_id): Path<DbId>,
    Json(input): Json<SubmitCleaning>,
) -> AppResult<(StatusCode, Json<DataResponse<RecordedCleaning>>)> {
    input.validate()?;
    let now = Utc::now();
    let completed_at = input.completed_at.unwrap_or(now);
    let started_at = input.started_at.unwrap_or(completed_at);

    let submission = input.details.into_submission(
        equipment_id,
        Some(user.user_id),
        CleaningSource::Manual,
        None,
        started_at,
        completed_at,
    );
    let recorded = cleaning::record_cleaning(&state.pool, &state.event_bus, submission, now).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: recorded })))
}

/// GET /api/v1/equipment/{id}/cleaning-logs
pub async fn list_for_equipment(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(equipment_id): Path<DbId>,
    Query(params): Query<CleaningLogQuery>,
) -> AppResult<Json<DataResponse<Vec<CleaningLog>>>> {
    find_equipment(&state, equipment_id).await?;
    let limit = params.limit.map(|l| l.clamp(1, MAX_LIST_LIMIT));
    let logs = CleaningLogRepo::list_for_equipment(&state.pool, equipment_id, limit).await?;
    Ok(Json(DataResponse { data: logs }))
}

/// POST /api/v1/cleaning-logs/{id}/validation
pub async fn review(
    RequireReviewCleanings(user): RequireReviewCleanings,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewCleaning>,
) -> AppResult<Json<DataResponse<CleaningLog>>> {
    let log =
        cleaning::review_cleaning(&state.pool, id, input.status, user.user_id, Utc::now()).await?;
    Ok(Json(DataResponse { data: log }))
}
