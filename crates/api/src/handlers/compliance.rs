//! Handlers for fleet-level compliance reporting and the on-demand sweep.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use cleantrack_db::models::compliance_report::ComplianceReport;
use cleantrack_db::repositories::ComplianceReportRepo;
use serde::Deserialize;
use validator::Validate;

use crate::engine::report::{generate_report, snapshot, ComplianceSnapshot};
use crate::engine::sweep::{run_sweep, SweepReport};
use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireViewReports};
use crate::response::DataResponse;
use crate::state::AppState;

/// Days covered by the recent-cleanings breakdown of the live summary.
const RECENT_CLEANING_DAYS: i64 = 30;

/// Query parameters for `GET /compliance/reports`.
#[derive(Debug, Deserialize, Validate)]
pub struct ReportListParams {
    #[validate(range(min = 1, max = 520))]
    pub limit: Option<i64>,
}

/// GET /api/v1/compliance/summary
pub async fn summary(
    RequireViewReports(_user): RequireViewReports,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ComplianceSnapshot>>> {
    let now = Utc::now();
    let data = snapshot(
        &state.pool,
        &state.compliance_policy,
        now - Duration::days(RECENT_CLEANING_DAYS),
        now,
    )
    .await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/compliance/reports
///
/// Stored periodic reports, newest first.
pub async fn list_reports(
    RequireViewReports(_user): RequireViewReports,
    State(state): State<AppState>,
    Query(params): Query<ReportListParams>,
) -> AppResult<Json<DataResponse<Vec<ComplianceReport>>>> {
    params.validate()?;
    let reports = ComplianceReportRepo::list(&state.pool, params.limit).await?;
    Ok(Json(DataResponse { data: reports }))
}

/// POST /api/v1/compliance/reports
///
/// Generate and send a report for the last reporting period now.
pub async fn generate(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<DataResponse<ComplianceReport>>)> {
    tracing::info!(user_id = user.user_id, "Manual compliance report requested");
    let now = Utc::now();
    let report = generate_report(
        &state.pool,
        &state.event_bus,
        &state.compliance_policy,
        now - state.report_period(),
        now,
        Some(user.user_id),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: report })))
}

/// POST /api/v1/compliance/sweep
///
/// Run the compliance sweep now instead of waiting for the next tick.
pub async fn sweep(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SweepReport>>> {
    tracing::info!(user_id = user.user_id, "Manual compliance sweep requested");
    let report = run_sweep(
        &state.pool,
        &state.event_bus,
        &state.compliance_policy,
        Utc::now(),
    )
    .await?;
    state.sweep_status.record(&report).await;
    Ok(Json(DataResponse { data: report }))
}
