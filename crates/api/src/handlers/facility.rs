//! Handlers for the `/facilities` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use cleantrack_db::models::facility::{CreateFacility, Facility};
use cleantrack_db::repositories::FacilityRepo;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::rbac::{RequireAuth, RequireManageEquipment};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/facilities
pub async fn create(
    RequireManageEquipment(user): RequireManageEquipment,
    State(state): State<AppState>,
    Json(input): Json<CreateFacility>,
) -> AppResult<(StatusCode, Json<DataResponse<Facility>>)> {
    input.validate()?;
    let facility = FacilityRepo::create(&state.pool, &input).await?;
    tracing::info!(facility_id = facility.id, user_id = user.user_id, "Facility created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: facility })))
}

/// GET /api/v1/facilities
pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Facility>>>> {
    let facilities = FacilityRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: facilities }))
}
