//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`ComplianceEvent`]s. It is
//! shared via `Arc<EventBus>` across the application. Publishing never
//! blocks.

use cleantrack_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// ComplianceEvent
// ---------------------------------------------------------------------------

/// Something that happened which facility staff may need to hear about.
///
/// Events are recipient-agnostic; the dispatcher decides who is told.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum ComplianceEvent {
    /// The sweep opened a new alert.
    #[serde(rename = "alert.opened")]
    AlertOpened {
        alert_id: DbId,
        equipment_id: DbId,
        facility_id: DbId,
        alert_type: String,
        severity: String,
        title: String,
        message: String,
        suggested_action: Option<String>,
        due_by: Option<Timestamp>,
        occurred_at: Timestamp,
    },

    /// The sweep closed an alert because the equipment is compliant again.
    #[serde(rename = "alert.auto_resolved")]
    AlertAutoResolved {
        alert_id: DbId,
        equipment_id: DbId,
        facility_id: DbId,
        alert_type: String,
        title: String,
        occurred_at: Timestamp,
    },

    /// A cleaning log was stored.
    #[serde(rename = "cleaning.recorded")]
    CleaningRecorded {
        cleaning_log_id: DbId,
        equipment_id: DbId,
        facility_id: DbId,
        equipment_name: String,
        serial_number: String,
        is_compliant: bool,
        source: String,
        performed_by: Option<DbId>,
        completed_at: Timestamp,
        occurred_at: Timestamp,
    },

    /// A periodic compliance report was stored and is ready to send.
    #[serde(rename = "compliance.summary_ready")]
    SummaryReady {
        report_id: DbId,
        period_start: Timestamp,
        period_end: Timestamp,
        total_equipment: i64,
        compliant: i64,
        due_soon: i64,
        overdue: i64,
        never_cleaned: i64,
        compliance_rate: f64,
        cleanings_completed: i64,
        active_alerts: i64,
        occurred_at: Timestamp,
    },
}

impl ComplianceEvent {
    /// Dot-separated event name, e.g. `"alert.opened"`.
    pub fn event_type(&self) -> &'static str {
        match self {
            ComplianceEvent::AlertOpened { .. } => "alert.opened",
            ComplianceEvent::AlertAutoResolved { .. } => "alert.auto_resolved",
            ComplianceEvent::CleaningRecorded { .. } => "cleaning.recorded",
            ComplianceEvent::SummaryReady { .. } => "compliance.summary_ready",
        }
    }

    /// The facility the event concerns. `None` for fleet-wide events.
    pub fn facility_id(&self) -> Option<DbId> {
        match self {
            ComplianceEvent::AlertOpened { facility_id, .. }
            | ComplianceEvent::AlertAutoResolved { facility_id, .. }
            | ComplianceEvent::CleaningRecorded { facility_id, .. } => Some(*facility_id),
            ComplianceEvent::SummaryReady { .. } => None,
        }
    }

    /// The equipment the event concerns. `None` for fleet-wide events.
    pub fn equipment_id(&self) -> Option<DbId> {
        match self {
            ComplianceEvent::AlertOpened { equipment_id, .. }
            | ComplianceEvent::AlertAutoResolved { equipment_id, .. }
            | ComplianceEvent::CleaningRecorded { equipment_id, .. } => Some(*equipment_id),
            ComplianceEvent::SummaryReady { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use cleantrack_events::bus::EventBus;
///
/// let bus = EventBus::default();
/// let _rx = bus.subscribe();
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ComplianceEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unconsumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: ComplianceEvent) {
        tracing::debug!(
            event_type = event.event_type(),
            equipment_id = event.equipment_id(),
            "Publishing event"
        );
        // A send error only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ComplianceEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
