//! Handlers for equipment token issuance.
//!
//! Both endpoints sign through the same [`TokenSigner`]; the
//! [`TokenPolicy`] decides the TTL and whether the token is stored on the
//! equipment row. Every issuance is recorded in `token_issuances` for audit.
//!
//! [`TokenSigner`]: cleantrack_core::token::TokenSigner

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use cleantrack_core::error::CoreError;
use cleantrack_core::token::TokenPolicy;
use cleantrack_core::types::{DbId, Timestamp};
use cleantrack_db::models::token_issuance::{CreateTokenIssuance, TokenIssuance};
use cleantrack_db::repositories::{EquipmentRepo, TokenIssuanceRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::handlers::equipment::find_equipment;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireExportData, RequireManageEquipment};
use crate::response::DataResponse;
use crate::state::AppState;

/// Characters of a token that may appear in logs.
const LOGGED_PREFIX_LEN: usize = 8;

/// A freshly issued token. This is the only response that carries the
/// token itself.
#[derive(Debug, Serialize)]
pub struct IssuedTokenResponse {
    pub equipment_id: DbId,
    pub token: String,
    /// `temporary` or `persisted`.
    pub policy: &'static str,
    pub ttl_minutes: i64,
    pub expires_at: Timestamp,
    /// Path of the public cleaning form for this token.
    pub public_path: String,
}

/// The loggable prefix of a token.
pub fn token_prefix(token: &str) -> &str {
    token.get(..LOGGED_PREFIX_LEN).unwrap_or(token)
}

/// POST /api/v1/equipment/{id}/public-token
///
/// Issue a token and store it on the equipment row, replacing any previous
/// one. Meant for printed QR labels.
pub async fn issue_public_token(
    RequireManageEquipment(user): RequireManageEquipment,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    headers: HeaderMap,
) -> AppResult<(StatusCode, Json<DataResponse<IssuedTokenResponse>>)> {
    let policy = state.persisted_token_policy();
    let issued = issue(&state, &user, id, policy, &headers).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: issued })))
}

/// POST /api/v1/equipment/{id}/temporary-token
///
/// Issue a short-lived token that is not stored on the equipment.
pub async fn issue_temporary_token(
    RequireManageEquipment(user): RequireManageEquipment,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    headers: HeaderMap,
) -> AppResult<(StatusCode, Json<DataResponse<IssuedTokenResponse>>)> {
    let issued = issue(&state, &user, id, TokenPolicy::temporary(), &headers).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: issued })))
}

/// GET /api/v1/equipment/{id}/token-issuances
///
/// Issuance and usage history, newest first. Token values are never
/// included.
pub async fn list_issuances(
    RequireExportData(_user): RequireExportData,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<TokenIssuance>>>> {
    find_equipment(&state, id).await?;
    let issuances = TokenIssuanceRepo::list_for_equipment(&state.pool, id).await?;
    Ok(Json(DataResponse { data: issuances }))
}

async fn issue(
    state: &AppState,
    user: &AuthUser,
    equipment_id: DbId,
    policy: TokenPolicy,
    headers: &HeaderMap,
) -> AppResult<IssuedTokenResponse> {
    let equipment = find_equipment(state, equipment_id).await?;
    if !equipment.is_active {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Equipment {equipment_id} is inactive"
        ))));
    }

    let now = Utc::now();
    let issued = state
        .token_signer
        .issue(equipment_id, policy.ttl_minutes, now)?;
    let ttl_minutes = i32::try_from(policy.ttl_minutes).map_err(|_| {
        AppError::Core(CoreError::Validation(format!(
            "Token TTL of {} minutes cannot be recorded",
            policy.ttl_minutes
        )))
    })?;

    if policy.persists_on_equipment() {
        EquipmentRepo::set_public_token(&state.pool, equipment_id, &issued.token, now)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Equipment",
                id: equipment_id,
            }))?;
    }

    TokenIssuanceRepo::create(
        &state.pool,
        &CreateTokenIssuance {
            equipment_id,
            token: issued.token.clone(),
            issued_by: Some(user.user_id),
            policy: policy.kind.as_str().to_string(),
            ttl_minutes,
            expires_at: issued.expires_at,
            issued_from_ip: client_ip(headers),
        },
    )
    .await?;

    tracing::info!(
        equipment_id,
        user_id = user.user_id,
        policy = policy.kind.as_str(),
        ttl_minutes = policy.ttl_minutes,
        token_prefix = token_prefix(&issued.token),
        "Equipment token issued"
    );

    Ok(IssuedTokenResponse {
        equipment_id,
        public_path: format!("/api/v1/public/tokens/{}", issued.token),
        token: issued.token,
        policy: policy.kind.as_str(),
        ttl_minutes: policy.ttl_minutes,
        expires_at: issued.expires_at,
    })
}

/// First address in `X-Forwarded-For`, if present.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
