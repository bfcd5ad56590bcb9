//! Unauthenticated endpoints reached through equipment tokens (QR labels
//! and temporary links).
//!
//! The token is the only credential. Validation is stateless; the audit
//! table is updated best-effort and never consulted.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use cleantrack_core::cleaning::CleaningSource;
use cleantrack_core::compliance::{classify, ComplianceState};
use cleantrack_core::error::CoreError;
use cleantrack_core::token::{describe, TokenInfo};
use cleantrack_core::types::{DbId, Timestamp};
use cleantrack_db::models::equipment::Equipment;
use cleantrack_db::repositories::{EquipmentRepo, TokenIssuanceRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::engine::cleaning::{self, RecordedCleaning};
use crate::error::{AppError, AppResult};
use crate::handlers::cleaning_log::CleaningDetails;
use crate::handlers::token::token_prefix;
use crate::response::DataResponse;
use crate::state::AppState;

/// What a token holder may see about the equipment.
#[derive(Debug, Serialize)]
pub struct PublicEquipment {
    pub id: DbId,
    pub name: String,
    pub serial_number: String,
    pub category: String,
    pub location: Option<String>,
    pub compliance_state: ComplianceState,
    pub last_cleaned_at: Option<Timestamp>,
    pub next_due_at: Option<Timestamp>,
}

/// Response body of `GET /public/tokens/{token}`.
#[derive(Debug, Serialize)]
pub struct PublicTokenView {
    pub token: TokenInfo,
    /// Source a submission with this token will be recorded under.
    pub source: CleaningSource,
    pub equipment: PublicEquipment,
}

/// Body of `POST /public/tokens/{token}/cleaning-logs`. The cleaning is
/// recorded as completed at the time of the request.
#[derive(Debug, Deserialize, Validate)]
pub struct PublicCleaningSubmission {
    /// Defaults to the time of the request.
    pub started_at: Option<Timestamp>,
    #[serde(flatten)]
    #[validate(nested)]
    pub details: CleaningDetails,
}

/// GET /api/v1/public/tokens/{token}
pub async fn describe_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<PublicTokenView>>> {
    let now = Utc::now();
    let equipment = authorize(&state, &token, now).await?;

    if let Err(e) = TokenIssuanceRepo::record_access(&state.pool, &token).await {
        tracing::warn!(error = %e, token_prefix = token_prefix(&token), "Failed to record token access");
    }

    let info = describe(&token, now).ok_or(AppError::Core(CoreError::InvalidToken))?;
    let classification = classify(&equipment.schedule(), now, &state.compliance_policy);

    Ok(Json(DataResponse {
        data: PublicTokenView {
            token: info,
            source: source_for(&equipment, &token),
            equipment: PublicEquipment {
                id: equipment.id,
                name: equipment.name,
                serial_number: equipment.serial_number,
                category: equipment.category,
                location: equipment.location,
                compliance_state: classification.state,
                last_cleaned_at: equipment.last_cleaned_at,
                next_due_at: classification.next_due_at,
            },
        },
    }))
}

/// POST /api/v1/public/tokens/{token}/cleaning-logs
pub async fn submit_cleaning(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(input): Json<PublicCleaningSubmission>,
) -> AppResult<(StatusCode, Json<DataResponse<RecordedCleaning>>)> {
    input.validate()?;
    let now = Utc::now();
    let equipment = authorize(&state, &token, now).await?;
    let source = source_for(&equipment, &token);

    let submission = input.details.into_submission(
        equipment.id,
        None,
        source,
        Some(token),
        input.started_at.unwrap_or(now),
        now,
    );
    let recorded = cleaning::record_cleaning(&state.pool, &state.event_bus, submission, now).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: recorded })))
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Validate the token and load the active equipment it names.
async fn authorize(state: &AppState, token: &str, now: Timestamp) -> AppResult<Equipment> {
    let equipment_id = state.token_signer.check(token, now).map_err(|reason| {
        tracing::debug!(?reason, token_prefix = token_prefix(token), "Public token rejected");
        AppError::Core(CoreError::InvalidToken)
    })?;

    EquipmentRepo::find_by_id(&state.pool, equipment_id)
        .await?
        .filter(|e| e.is_active)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Equipment",
            id: equipment_id,
        }))
}

/// Tokens matching the one stored on the equipment come from its QR label.
///
/// Tokens carry no policy: a temporary token issued in the same second as
/// the label token, with the same TTL, is byte-identical to it and is
/// recorded as a QR scan. Both grant the same access until the same expiry.
fn source_for(equipment: &Equipment, token: &str) -> CleaningSource {
    if equipment.public_token.as_deref() == Some(token) {
        CleaningSource::QrScan
    } else {
        CleaningSource::TemporaryToken
    }
}
