//! Compliance reporting.
//!
//! [`snapshot`] gathers the fleet classification, open alert counts, and the
//! cleaning activity of a period. [`generate_report`] stores a snapshot in
//! `compliance_reports` and publishes it so the dispatcher can email it to
//! admins and managers.

use std::collections::BTreeMap;

use chrono::Utc;
use cleantrack_core::alert::AlertStatus;
use cleantrack_core::cleaning::ValidationStatus;
use cleantrack_core::compliance::{classify, CompliancePolicy, ComplianceSummary};
use cleantrack_core::types::{DbId, Timestamp};
use cleantrack_db::models::compliance_report::{ComplianceReport, CreateComplianceReport};
use cleantrack_db::repositories::{AlertRepo, CleaningLogRepo, ComplianceReportRepo, EquipmentRepo};
use cleantrack_events::{ComplianceEvent, EventBus};
use serde::Serialize;
use sqlx::PgPool;

/// Fleet compliance at a point in time plus cleaning activity since
/// `period_start`.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceSnapshot {
    #[serde(flatten)]
    pub summary: ComplianceSummary,
    pub active_alerts: i64,
    pub acknowledged_alerts: i64,
    /// Cleanings completed in the period, keyed by validation status.
    pub recent_cleanings: BTreeMap<String, i64>,
    pub period_start: Timestamp,
    pub generated_at: Timestamp,
}

impl ComplianceSnapshot {
    /// Cleanings in the period that were not rejected by a reviewer.
    pub fn cleanings_completed(&self) -> i64 {
        self.recent_cleanings
            .iter()
            .filter(|(status, _)| status.as_str() != ValidationStatus::Rejected.as_str())
            .map(|(_, count)| count)
            .sum()
    }
}

/// Classify every active equipment item at `now` and count activity in
/// `[period_start, now)`.
pub async fn snapshot(
    pool: &PgPool,
    policy: &CompliancePolicy,
    period_start: Timestamp,
    now: Timestamp,
) -> Result<ComplianceSnapshot, sqlx::Error> {
    let states = EquipmentRepo::list_active(pool)
        .await?
        .iter()
        .map(|e| classify(&e.schedule(), now, policy).state)
        .collect::<Vec<_>>();

    let active_alerts = AlertRepo::count_with_status(pool, AlertStatus::Active).await?;
    let acknowledged_alerts = AlertRepo::count_with_status(pool, AlertStatus::Acknowledged).await?;

    let recent_cleanings = CleaningLogRepo::count_by_status_between(pool, period_start, now)
        .await?
        .into_iter()
        .collect();

    Ok(ComplianceSnapshot {
        summary: ComplianceSummary::from_states(states),
        active_alerts,
        acknowledged_alerts,
        recent_cleanings,
        period_start,
        generated_at: now,
    })
}

/// Store a report covering `[period_start, now)` and publish it.
///
/// `generated_by` is `None` for the scheduled job.
pub async fn generate_report(
    pool: &PgPool,
    event_bus: &EventBus,
    policy: &CompliancePolicy,
    period_start: Timestamp,
    now: Timestamp,
    generated_by: Option<DbId>,
) -> Result<ComplianceReport, sqlx::Error> {
    let snapshot = snapshot(pool, policy, period_start, now).await?;
    let cleanings_completed = snapshot.cleanings_completed();

    let report = ComplianceReportRepo::create(
        pool,
        &CreateComplianceReport {
            period_start,
            period_end: now,
            summary: snapshot.summary,
            cleanings_completed,
            active_alerts: snapshot.active_alerts,
            generated_by,
        },
    )
    .await?;

    tracing::info!(
        report_id = report.id,
        total_equipment = report.total_equipment,
        overdue = report.overdue,
        compliance_rate = report.compliance_rate,
        cleanings_completed = report.cleanings_completed,
        "Compliance report generated"
    );

    event_bus.publish(ComplianceEvent::SummaryReady {
        report_id: report.id,
        period_start: report.period_start,
        period_end: report.period_end,
        total_equipment: report.total_equipment,
        compliant: report.compliant,
        due_soon: report.due_soon,
        overdue: report.overdue,
        never_cleaned: report.never_cleaned,
        compliance_rate: report.compliance_rate,
        cleanings_completed: report.cleanings_completed,
        active_alerts: report.active_alerts,
        occurred_at: Utc::now(),
    });

    Ok(report)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use cleantrack_core::compliance::ComplianceState;

    use super::*;

    #[test]
    fn test_rejected_cleanings_do_not_count_as_completed() {
        let at = Utc.with_ymd_and_hms(2026, 3, 8, 6, 0, 0).unwrap();
        let snapshot = ComplianceSnapshot {
            summary: ComplianceSummary::from_states(Vec::<ComplianceState>::new()),
            active_alerts: 0,
            acknowledged_alerts: 0,
            recent_cleanings: BTreeMap::from([
                ("approved".to_string(), 5),
                ("flagged".to_string(), 1),
                ("pending".to_string(), 2),
                ("rejected".to_string(), 3),
            ]),
            period_start: at,
            generated_at: at,
        };
        assert_eq!(snapshot.cleanings_completed(), 8);
    }
}
