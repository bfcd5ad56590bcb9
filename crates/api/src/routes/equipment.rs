//! Route definitions for the `/equipment` resource.
//!
//! Also nests token issuance and cleaning logs under `/equipment/{id}/...`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{cleaning_log, equipment, token};
use crate::state::AppState;

/// Routes mounted at `/equipment`.
///
/// ```text
/// GET    /                                  -> list
/// POST   /                                  -> create
/// GET    /{id}                              -> get_by_id
/// PUT    /{id}                              -> update
/// POST   /{id}/public-token                 -> issue_public_token
/// POST   /{id}/temporary-token              -> issue_temporary_token
/// GET    /{id}/cleaning-logs                -> list_for_equipment
/// POST   /{id}/cleaning-logs                -> create
/// GET    /{id}/token-issuances              -> list_issuances
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(equipment::list).post(equipment::create))
        .route("/{id}", get(equipment::get_by_id).put(equipment::update))
        .route("/{id}/public-token", post(token::issue_public_token))
        .route("/{id}/temporary-token", post(token::issue_temporary_token))
        .route(
            "/{id}/cleaning-logs",
            get(cleaning_log::list_for_equipment).post(cleaning_log::create),
        )
        .route("/{id}/token-issuances", get(token::list_issuances))
}
