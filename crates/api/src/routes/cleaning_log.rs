//! Route definitions for the `/cleaning-logs` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::cleaning_log;
use crate::state::AppState;

/// Routes mounted at `/cleaning-logs`.
///
/// ```text
/// POST   /{id}/validation                   -> review
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/validation", post(cleaning_log::review))
}
