//! Route definitions for the `/alerts` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::alert;
use crate::state::AppState;

/// Routes mounted at `/alerts`.
///
/// ```text
/// GET    /                                  -> list (?status=, ?equipment_id=, ?alert_type=)
/// POST   /{id}/acknowledge                  -> acknowledge
/// POST   /{id}/resolve                      -> resolve
/// POST   /{id}/dismiss                      -> dismiss
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(alert::list))
        .route("/{id}/acknowledge", post(alert::acknowledge))
        .route("/{id}/resolve", post(alert::resolve))
        .route("/{id}/dismiss", post(alert::dismiss))
}
