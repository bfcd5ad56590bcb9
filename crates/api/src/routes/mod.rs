pub mod alert;
pub mod cleaning_log;
pub mod compliance;
pub mod equipment;
pub mod facility;
pub mod health;
pub mod public;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /facilities                                      list, create
///
/// /equipment                                       list, create
/// /equipment/{id}                                  get, update
/// /equipment/{id}/public-token                     issue persisted token (POST)
/// /equipment/{id}/temporary-token                  issue 5-minute token (POST)
/// /equipment/{id}/cleaning-logs                    list, submit
/// /equipment/{id}/token-issuances                  token audit trail
///
/// /cleaning-logs/{id}/validation                   reviewer verdict (POST)
///
/// /alerts                                          list
/// /alerts/{id}/acknowledge                         acknowledge (POST)
/// /alerts/{id}/resolve                             resolve (POST)
/// /alerts/{id}/dismiss                             dismiss (POST)
///
/// /compliance/summary                              fleet summary
/// /compliance/reports                              list, generate (POST, admin)
/// /compliance/sweep                                run sweep now (POST, admin)
///
/// /public/tokens/{token}                           describe token (no auth)
/// /public/tokens/{token}/cleaning-logs             anonymous submission (POST, no auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/facilities", facility::router())
        .nest("/equipment", equipment::router())
        .nest("/cleaning-logs", cleaning_log::router())
        .nest("/alerts", alert::router())
        .nest("/compliance", compliance::router())
        .nest("/public", public::router())
}
