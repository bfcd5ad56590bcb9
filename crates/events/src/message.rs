//! Plain-text email rendering for compliance events.

use cleantrack_core::types::Timestamp;

use crate::bus::ComplianceEvent;

/// Prefix on every notification subject line.
pub const SUBJECT_PREFIX: &str = "[CleanTrack]";

/// A rendered notification email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    /// Render the email for an event, or `None` when the event does not
    /// warrant one. Compliant cleanings are not emailed.
    pub fn for_event(event: &ComplianceEvent) -> Option<Self> {
        match event {
            ComplianceEvent::AlertOpened {
                alert_type,
                severity,
                title,
                message,
                suggested_action,
                due_by,
                ..
            } => {
                let mut body = format!("{message}\n\nType: {alert_type}\nSeverity: {severity}\n");
                if let Some(due) = due_by {
                    body.push_str(&format!("Due by: {}\n", fmt_time(*due)));
                }
                if let Some(action) = suggested_action {
                    body.push_str(&format!("\nSuggested action: {action}\n"));
                }
                Some(Self {
                    subject: format!("{SUBJECT_PREFIX} {title}"),
                    body,
                })
            }

            ComplianceEvent::AlertAutoResolved {
                title, occurred_at, ..
            } => Some(Self {
                subject: format!("{SUBJECT_PREFIX} Resolved: {title}"),
                body: format!(
                    "The alert \"{title}\" was resolved automatically at {} after a \
                     compliant cleaning was recorded.\n",
                    fmt_time(*occurred_at)
                ),
            }),

            ComplianceEvent::CleaningRecorded {
                is_compliant: true, ..
            } => None,

            ComplianceEvent::CleaningRecorded {
                equipment_name,
                serial_number,
                completed_at,
                source,
                ..
            } => Some(Self {
                subject: format!("{SUBJECT_PREFIX} Late cleaning: {equipment_name}"),
                body: format!(
                    "Equipment {equipment_name} (S/N: {serial_number}) was cleaned at {} \
                     after its cleaning was already due.\nSource: {source}\n\n\
                     Review the cleaning schedule for this equipment.\n",
                    fmt_time(*completed_at)
                ),
            }),

            ComplianceEvent::SummaryReady {
                period_start,
                period_end,
                total_equipment,
                compliant,
                due_soon,
                overdue,
                never_cleaned,
                compliance_rate,
                cleanings_completed,
                active_alerts,
                ..
            } => Some(Self {
                subject: format!(
                    "{SUBJECT_PREFIX} Compliance summary: {compliance_rate:.1}% compliant"
                ),
                body: format!(
                    "Compliance summary for {} to {}\n\n\
                     Total equipment: {total_equipment}\n\
                     Compliant: {compliant}\n\
                     Due soon: {due_soon}\n\
                     Overdue: {overdue}\n\
                     Never cleaned: {never_cleaned}\n\
                     Compliance rate: {compliance_rate:.1}%\n\n\
                     Cleanings completed: {cleanings_completed}\n\
                     Active alerts: {active_alerts}\n",
                    fmt_time(*period_start),
                    fmt_time(*period_end)
                ),
            }),
        }
    }
}

fn fmt_time(t: Timestamp) -> String {
    t.format("%Y-%m-%d %H:%M UTC").to_string()
}
