//! Compliance sweep.
//!
//! Classifies every active equipment item and carries out the alert intents
//! produced by [`plan_sweep`]. Safe to run concurrently with itself: opening
//! is deduplicated by the database and auto-resolution is compare-and-set.

use chrono::Utc;
use cleantrack_core::alert::{plan_sweep, AlertType, OpenAlertRef, OpenOutcome, SweepIntent, SweepSubject};
use cleantrack_core::compliance::{classify, CompliancePolicy};
use cleantrack_core::types::{DbId, Timestamp};
use cleantrack_db::models::alert::{ComplianceAlert, CreateAlert};
use cleantrack_db::models::equipment::Equipment;
use cleantrack_db::repositories::{AlertRepo, EquipmentRepo};
use cleantrack_events::{ComplianceEvent, EventBus};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::RwLock;

/// Counters for one sweep run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub equipment_checked: usize,
    pub alerts_opened: usize,
    pub alerts_already_open: usize,
    pub alerts_auto_resolved: usize,
    /// Equipment items whose alerts could not be updated.
    pub failures: usize,
}

/// The most recent completed sweep.
#[derive(Debug, Clone, Serialize)]
pub struct LastSweep {
    pub finished_at: Timestamp,
    #[serde(flatten)]
    pub report: SweepReport,
}

/// Tracks the outcome of the latest sweep, whether scheduled or manual.
///
/// Thread-safe via interior `RwLock`; shared through `AppState`.
#[derive(Debug, Default)]
pub struct SweepStatus {
    last: RwLock<Option<LastSweep>>,
}

impl SweepStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `report` as the latest sweep, finished now.
    pub async fn record(&self, report: &SweepReport) {
        *self.last.write().await = Some(LastSweep {
            finished_at: Utc::now(),
            report: report.clone(),
        });
    }

    /// The latest completed sweep, if any has run since startup.
    pub async fn last(&self) -> Option<LastSweep> {
        self.last.read().await.clone()
    }
}

/// Run one sweep over all active equipment at `now`.
///
/// A failure on one item is logged and counted; the sweep moves on to the
/// next item. Only failing to list equipment aborts the run.
pub async fn run_sweep(
    pool: &PgPool,
    event_bus: &EventBus,
    policy: &CompliancePolicy,
    now: Timestamp,
) -> Result<SweepReport, sqlx::Error> {
    let equipment = EquipmentRepo::list_active(pool).await?;
    let mut report = SweepReport::default();

    for item in &equipment {
        report.equipment_checked += 1;
        if let Err(e) = sweep_one(pool, event_bus, policy, item, now, &mut report).await {
            report.failures += 1;
            tracing::error!(error = %e, equipment_id = item.id, "Sweep failed for equipment");
        }
    }

    tracing::info!(
        equipment_checked = report.equipment_checked,
        alerts_opened = report.alerts_opened,
        alerts_already_open = report.alerts_already_open,
        alerts_auto_resolved = report.alerts_auto_resolved,
        failures = report.failures,
        "Compliance sweep finished"
    );

    Ok(report)
}

async fn sweep_one(
    pool: &PgPool,
    event_bus: &EventBus,
    policy: &CompliancePolicy,
    equipment: &Equipment,
    now: Timestamp,
    report: &mut SweepReport,
) -> Result<(), sqlx::Error> {
    let classification = classify(&equipment.schedule(), now, policy);

    let open_alerts: Vec<OpenAlertRef> = AlertRepo::list_open_for_equipment(pool, equipment.id)
        .await?
        .iter()
        .filter_map(open_alert_ref)
        .collect();

    let subject = SweepSubject {
        equipment_id: equipment.id,
        name: &equipment.name,
        serial_number: &equipment.serial_number,
        last_cleaned_at: equipment.last_cleaned_at,
    };

    for intent in plan_sweep(&subject, &classification, &open_alerts, now) {
        match intent {
            SweepIntent::Open(new_alert) => {
                match AlertRepo::open_if_absent(pool, &CreateAlert::from(new_alert)).await? {
                    OpenOutcome::Created(alert) => {
                        report.alerts_opened += 1;
                        tracing::info!(
                            alert_id = alert.id,
                            equipment_id = equipment.id,
                            alert_type = %alert.alert_type,
                            state = %classification.state,
                            "Compliance alert opened"
                        );
                        event_bus.publish(opened_event(&alert, equipment.facility_id));
                    }
                    OpenOutcome::AlreadyOpen(alert) => {
                        report.alerts_already_open += 1;
                        tracing::debug!(
                            alert_id = alert.id,
                            equipment_id = equipment.id,
                            "Alert already open"
                        );
                    }
                }
            }
            SweepIntent::AutoResolve { alert_id, notes } => {
                // `None` means someone closed it in the meantime.
                if let Some(alert) =
                    AlertRepo::resolve(pool, alert_id, None, Some(&notes), now).await?
                {
                    report.alerts_auto_resolved += 1;
                    tracing::info!(alert_id, equipment_id = equipment.id, "Alert auto-resolved");
                    event_bus.publish(ComplianceEvent::AlertAutoResolved {
                        alert_id,
                        equipment_id: equipment.id,
                        facility_id: equipment.facility_id,
                        alert_type: alert.alert_type,
                        title: alert.title,
                        occurred_at: Utc::now(),
                    });
                }
            }
        }
    }

    Ok(())
}

fn open_alert_ref(alert: &ComplianceAlert) -> Option<OpenAlertRef> {
    match alert.alert_type.parse::<AlertType>() {
        Ok(alert_type) => Some(OpenAlertRef {
            id: alert.id,
            alert_type,
        }),
        Err(e) => {
            tracing::warn!(alert_id = alert.id, error = %e, "Skipping alert with unknown type");
            None
        }
    }
}

fn opened_event(alert: &ComplianceAlert, facility_id: DbId) -> ComplianceEvent {
    ComplianceEvent::AlertOpened {
        alert_id: alert.id,
        equipment_id: alert.equipment_id,
        facility_id,
        alert_type: alert.alert_type.clone(),
        severity: alert.severity.clone(),
        title: alert.title.clone(),
        message: alert.message.clone(),
        suggested_action: alert.suggested_action.clone(),
        due_by: alert.due_by,
        occurred_at: Utc::now(),
    }
}
