//! Periodic compliance sweep.
//!
//! Runs [`run_sweep`] on a fixed interval using `tokio::time::interval`.
//! The first tick fires immediately so alerts are current after a restart.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cleantrack_core::compliance::CompliancePolicy;
use cleantrack_events::EventBus;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::engine::sweep::{run_sweep, SweepStatus};

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(
    pool: PgPool,
    event_bus: Arc<EventBus>,
    policy: CompliancePolicy,
    status: Arc<SweepStatus>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        warning_percent = policy.warning_percent,
        "Compliance sweep job started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Compliance sweep job stopping");
                break;
            }
            _ = ticker.tick() => {
                match run_sweep(&pool, &event_bus, &policy, Utc::now()).await {
                    Ok(report) => status.record(&report).await,
                    Err(e) => tracing::error!(error = %e, "Compliance sweep failed"),
                }
            }
        }
    }
}
