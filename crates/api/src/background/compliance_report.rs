//! Periodic compliance report.
//!
//! Every `interval` a report covering the elapsed interval is stored and
//! published for email delivery. Unlike the sweep, the first report is sent
//! one full interval after startup, so restarts do not resend it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cleantrack_core::compliance::CompliancePolicy;
use cleantrack_events::EventBus;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::engine::report::generate_report;

/// Run the report loop until `cancel` is triggered.
pub async fn run(
    pool: PgPool,
    event_bus: Arc<EventBus>,
    policy: CompliancePolicy,
    interval: Duration,
    cancel: CancellationToken,
) {
    let period = match chrono::Duration::from_std(interval) {
        Ok(period) => period,
        Err(e) => {
            tracing::error!(error = %e, "Invalid compliance report interval, job not started");
            return;
        }
    };

    tracing::info!(interval_secs = interval.as_secs(), "Compliance report job started");

    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Compliance report job stopping");
                break;
            }
            _ = ticker.tick() => {
                let now = Utc::now();
                if let Err(e) = generate_report(&pool, &event_bus, &policy, now - period, now, None).await {
                    tracing::error!(error = %e, "Compliance report failed");
                }
            }
        }
    }
}
