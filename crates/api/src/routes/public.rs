//! Route definitions for token-authenticated public endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::public;
use crate::state::AppState;

/// Routes mounted at `/public`. No bearer token required.
///
/// ```text
/// GET    /tokens/{token}                    -> describe_token
/// POST   /tokens/{token}/cleaning-logs      -> submit_cleaning
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tokens/{token}", get(public::describe_token))
        .route("/tokens/{token}/cleaning-logs", post(public::submit_cleaning))
}
