//! Handlers for the `/equipment` resource.
//!
//! Every equipment read is annotated with its current compliance state so
//! clients never recompute due times themselves.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use cleantrack_core::compliance::{classify, validate_cleaning_frequency, CompliancePolicy, ComplianceState};
use cleantrack_core::equipment::{validate_category, validate_serial_number};
use cleantrack_core::error::CoreError;
use cleantrack_core::types::{DbId, Timestamp};
use cleantrack_db::models::equipment::{CreateEquipment, Equipment, UpdateEquipment};
use cleantrack_db::repositories::{EquipmentRepo, FacilityRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAuth, RequireManageEquipment};
use crate::response::DataResponse;
use crate::state::AppState;

/// Equipment plus its compliance classification at request time.
#[derive(Debug, Serialize)]
pub struct EquipmentView {
    #[serde(flatten)]
    pub equipment: Equipment,
    pub compliance_state: ComplianceState,
    pub next_due_at: Option<Timestamp>,
    pub has_public_token: bool,
}

impl EquipmentView {
    pub fn new(equipment: Equipment, now: Timestamp, policy: &CompliancePolicy) -> Self {
        let classification = classify(&equipment.schedule(), now, policy);
        Self {
            has_public_token: equipment.public_token.is_some(),
            equipment,
            compliance_state: classification.state,
            next_due_at: classification.next_due_at,
        }
    }
}

/// Query parameters for the equipment listing.
#[derive(Debug, Default, Deserialize)]
pub struct EquipmentQuery {
    pub facility_id: Option<DbId>,
}

/// Load equipment or fail with 404.
pub(crate) async fn find_equipment(state: &AppState, id: DbId) -> AppResult<Equipment> {
    EquipmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Equipment",
            id,
        }))
}

/// POST /api/v1/equipment
pub async fn create(
    RequireManageEquipment(user): RequireManageEquipment,
    State(state): State<AppState>,
    Json(input): Json<CreateEquipment>,
) -> AppResult<(StatusCode, Json<DataResponse<EquipmentView>>)> {
    input.validate()?;
    validate_serial_number(&input.serial_number)?;
    if let Some(category) = &input.category {
        validate_category(category)?;
    }
    if let Some(hours) = input.cleaning_frequency_hours {
        validate_cleaning_frequency(hours)?;
    }

    FacilityRepo::find_by_id(&state.pool, input.facility_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Facility",
            id: input.facility_id,
        }))?;

    let equipment = EquipmentRepo::create(&state.pool, &input).await?;
    tracing::info!(
        equipment_id = equipment.id,
        facility_id = equipment.facility_id,
        user_id = user.user_id,
        "Equipment created"
    );

    let view = EquipmentView::new(equipment, Utc::now(), &state.compliance_policy);
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /api/v1/equipment
pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<EquipmentQuery>,
) -> AppResult<Json<DataResponse<Vec<EquipmentView>>>> {
    let now = Utc::now();
    let items = EquipmentRepo::list(&state.pool, params.facility_id)
        .await?
        .into_iter()
        .map(|e| EquipmentView::new(e, now, &state.compliance_policy))
        .collect();
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/equipment/{id}
pub async fn get_by_id(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<EquipmentView>>> {
    let equipment = find_equipment(&state, id).await?;
    let view = EquipmentView::new(equipment, Utc::now(), &state.compliance_policy);
    Ok(Json(DataResponse { data: view }))
}

/// PUT /api/v1/equipment/{id}
pub async fn update(
    RequireManageEquipment(user): RequireManageEquipment,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEquipment>,
) -> AppResult<Json<DataResponse<EquipmentView>>> {
    input.validate()?;
    if let Some(category) = &input.category {
        validate_category(category)?;
    }
    if let Some(hours) = input.cleaning_frequency_hours {
        validate_cleaning_frequency(hours)?;
    }

    let equipment = EquipmentRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Equipment",
            id,
        }))?;
    tracing::info!(equipment_id = id, user_id = user.user_id, "Equipment updated");

    let view = EquipmentView::new(equipment, Utc::now(), &state.compliance_policy);
    Ok(Json(DataResponse { data: view }))
}
