//! Route definitions for the `/compliance` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::compliance;
use crate::state::AppState;

/// Routes mounted at `/compliance`.
///
/// ```text
/// GET    /summary                           -> summary
/// GET    /reports                           -> list_reports
/// POST   /reports                           -> generate (admin only)
/// POST   /sweep                             -> sweep (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(compliance::summary))
        .route(
            "/reports",
            get(compliance::list_reports).post(compliance::generate),
        )
        .route("/sweep", post(compliance::sweep))
}
