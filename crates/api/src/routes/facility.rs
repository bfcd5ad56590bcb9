//! Route definitions for the `/facilities` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::facility;
use crate::state::AppState;

/// Routes mounted at `/facilities`.
///
/// ```text
/// GET    /                                  -> list
/// POST   /                                  -> create
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(facility::list).post(facility::create))
}
