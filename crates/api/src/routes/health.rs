//! Liveness endpoint: database reachability plus the state of the
//! background compliance sweep.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::engine::sweep::LastSweep;
use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database is unreachable or the last
    /// sweep could not update every equipment item.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Seconds between scheduled compliance sweeps.
    pub sweep_interval_secs: u64,
    /// `null` until the first sweep of this process completes.
    pub last_sweep: Option<LastSweep>,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = cleantrack_db::health_check(&state.pool).await.is_ok();
    let last_sweep = state.sweep_status.last().await;

    let sweep_failed = last_sweep.as_ref().is_some_and(|s| s.report.failures > 0);
    let status = if db_healthy && !sweep_failed { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        sweep_interval_secs: state.config.sweep_interval_secs,
        last_sweep,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
