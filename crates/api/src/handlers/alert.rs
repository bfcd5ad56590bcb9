//! Handlers for the `/alerts` resource.
//!
//! Transitions are checked against the lifecycle first so callers get a
//! precise `INVALID_TRANSITION` error, then applied with a compare-and-set
//! update so concurrent actors cannot both win.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use cleantrack_core::alert::{transition, AlertAction, AlertStatus, AlertType};
use cleantrack_core::error::CoreError;
use cleantrack_core::types::DbId;
use cleantrack_db::models::alert::{AlertFilter, ComplianceAlert};
use cleantrack_db::repositories::AlertRepo;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAuth, RequireManageAlerts};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /alerts/{id}/resolve`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ResolveAlert {
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

/// GET /api/v1/alerts
pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Query(filter): Query<AlertFilter>,
) -> AppResult<Json<DataResponse<Vec<ComplianceAlert>>>> {
    if let Some(status) = &filter.status {
        status.parse::<AlertStatus>()?;
    }
    if let Some(alert_type) = &filter.alert_type {
        alert_type.parse::<AlertType>()?;
    }
    let alerts = AlertRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: alerts }))
}

/// POST /api/v1/alerts/{id}/acknowledge
pub async fn acknowledge(
    RequireManageAlerts(user): RequireManageAlerts,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ComplianceAlert>>> {
    let alert = apply(&state, &user, id, AlertAction::Acknowledge, None).await?;
    Ok(Json(DataResponse { data: alert }))
}

/// POST /api/v1/alerts/{id}/resolve
pub async fn resolve(
    RequireManageAlerts(user): RequireManageAlerts,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ResolveAlert>,
) -> AppResult<Json<DataResponse<ComplianceAlert>>> {
    input.validate()?;
    let alert = apply(&state, &user, id, AlertAction::Resolve, input.notes.as_deref()).await?;
    Ok(Json(DataResponse { data: alert }))
}

/// POST /api/v1/alerts/{id}/dismiss
pub async fn dismiss(
    RequireManageAlerts(user): RequireManageAlerts,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ComplianceAlert>>> {
    let alert = apply(&state, &user, id, AlertAction::Dismiss, None).await?;
    Ok(Json(DataResponse { data: alert }))
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

async fn apply(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
    action: AlertAction,
    notes: Option<&str>,
) -> AppResult<ComplianceAlert> {
    let current = find_alert(state, id).await?;
    transition(current.status()?, action)?;

    let now = Utc::now();
    let updated = match action {
        AlertAction::Acknowledge => AlertRepo::acknowledge(&state.pool, id, user.user_id, now).await?,
        AlertAction::Resolve => {
            AlertRepo::resolve(&state.pool, id, Some(user.user_id), notes, now).await?
        }
        AlertAction::Dismiss => AlertRepo::dismiss(&state.pool, id, user.user_id, now).await?,
    };

    match updated {
        Some(alert) => {
            tracing::info!(
                alert_id = id,
                user_id = user.user_id,
                action = action.as_str(),
                "Alert transitioned"
            );
            Ok(alert)
        }
        // Lost the race: report against the status that won.
        None => {
            let latest = find_alert(state, id).await?;
            Err(AppError::Core(CoreError::InvalidTransition {
                from: latest.status,
                action: action.as_str(),
            }))
        }
    }
}

async fn find_alert(state: &AppState, id: DbId) -> AppResult<ComplianceAlert> {
    AlertRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ComplianceAlert",
            id,
        }))
}
