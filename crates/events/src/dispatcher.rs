//! Notification dispatcher.
//!
//! [`NotificationDispatcher`] subscribes to the [`EventBus`](crate::bus::EventBus),
//! resolves recipients for each event (active admins plus the facility's
//! managers, or every active admin and manager for fleet-wide reports), and
//! sends the rendered email through a [`NotificationSink`].
//! Delivery is best-effort: failures are logged and never affect the state
//! change that produced the event.

use std::sync::Arc;

use chrono::Utc;
use cleantrack_db::repositories::{AlertRepo, ComplianceReportRepo, UserRepo};
use cleantrack_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::ComplianceEvent;
use crate::delivery::email::NotificationSink;
use crate::message::EmailMessage;

/// Background service that emails compliance events to facility staff.
pub struct NotificationDispatcher {
    pool: DbPool,
    /// `None` when SMTP is not configured.
    sink: Option<Arc<dyn NotificationSink>>,
}

impl NotificationDispatcher {
    pub fn new(pool: DbPool, sink: Option<Arc<dyn NotificationSink>>) -> Self {
        Self { pool, sink }
    }

    /// Run the dispatch loop until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<ComplianceEvent>) {
        if self.sink.is_none() {
            tracing::warn!("SMTP not configured, compliance emails will be skipped");
        }

        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.handle(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = event.event_type(),
                            equipment_id = event.equipment_id(),
                            "Failed to dispatch notification"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification dispatcher lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification dispatcher shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver one event. Returns how many recipients were emailed.
    pub async fn handle(&self, event: &ComplianceEvent) -> Result<usize, sqlx::Error> {
        let Some(message) = EmailMessage::for_event(event) else {
            return Ok(0);
        };
        let Some(sink) = &self.sink else {
            tracing::debug!(event_type = event.event_type(), "No email sink, skipping");
            return Ok(0);
        };

        let recipients = match event.facility_id() {
            Some(facility_id) => UserRepo::alert_recipients(&self.pool, facility_id).await?,
            None => UserRepo::report_recipients(&self.pool).await?,
        };
        if recipients.is_empty() {
            tracing::warn!(
                facility_id = event.facility_id(),
                event_type = event.event_type(),
                "No recipients for compliance notification"
            );
            return Ok(0);
        }

        let mut sent = 0;
        for recipient in &recipients {
            match sink.send(&recipient.email, &message).await {
                Ok(()) => sent += 1,
                Err(e) => tracing::warn!(
                    user_id = recipient.id,
                    error = %e,
                    event_type = event.event_type(),
                    "Failed to send notification email"
                ),
            }
        }

        if sent > 0 {
            match event {
                ComplianceEvent::AlertOpened { alert_id, .. } => {
                    AlertRepo::mark_email_sent(&self.pool, *alert_id, Utc::now()).await?;
                }
                ComplianceEvent::SummaryReady { report_id, .. } => {
                    ComplianceReportRepo::mark_email_sent(&self.pool, *report_id, Utc::now()).await?;
                }
                _ => {}
            }
        }

        tracing::info!(
            event_type = event.event_type(),
            sent,
            recipients = recipients.len(),
            "Compliance notification dispatched"
        );
        Ok(sent)
    }
}
