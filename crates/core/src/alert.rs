//! Compliance alert lifecycle.
//!
//! An alert is opened by the compliance sweep and then moved by people
//! (acknowledge, resolve, dismiss) or closed automatically once the
//! equipment is compliant again. At most one alert per
//! `(equipment, alert_type)` may be open at a time; the persistence layer
//! enforces that with a partial unique index, and opening an already-open
//! alert is reported as [`OpenOutcome::AlreadyOpen`].

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::compliance::{Classification, ComplianceState};
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Hours granted to clean an overdue item before the alert's `due_by`.
pub const OVERDUE_GRACE_HOURS: i64 = 24;

/// Note recorded when the sweep closes an alert.
pub const AUTO_RESOLVE_NOTE: &str =
    "Automatically resolved: equipment is compliant after a recorded cleaning.";

/* --------------------------------------------------------------------------
Enumerations
-------------------------------------------------------------------------- */

macro_rules! string_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| CoreError::Validation(format!("Invalid {} '{s}'", $label)))
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
    Dismissed,
}

string_enum!(AlertStatus, "alert status", {
    Active => "active",
    Acknowledged => "acknowledged",
    Resolved => "resolved",
    Dismissed => "dismissed",
});

impl AlertStatus {
    /// Open alerts block a new alert of the same type for the same equipment.
    pub fn is_open(self) -> bool {
        matches!(self, AlertStatus::Active | AlertStatus::Acknowledged)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Overdue,
    DueSoon,
    Missed,
    Incomplete,
    ProtocolViolation,
    EquipmentIssue,
}

string_enum!(AlertType, "alert type", {
    Overdue => "overdue",
    DueSoon => "due_soon",
    Missed => "missed",
    Incomplete => "incomplete",
    ProtocolViolation => "protocol_violation",
    EquipmentIssue => "equipment_issue",
});

impl AlertType {
    /// Types the sweep opens and closes on its own.
    pub fn is_schedule_driven(self) -> bool {
        matches!(self, AlertType::Overdue | AlertType::DueSoon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

string_enum!(Severity, "severity", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

/// A human (or automated) action on an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    Acknowledge,
    Resolve,
    Dismiss,
}

impl AlertAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertAction::Acknowledge => "acknowledge",
            AlertAction::Resolve => "resolve",
            AlertAction::Dismiss => "dismiss",
        }
    }
}

/* --------------------------------------------------------------------------
Transitions
-------------------------------------------------------------------------- */

/// Apply `action` to an alert in status `from`.
///
/// - acknowledge: only from `active`
/// - resolve: from `active` or `acknowledged`
/// - dismiss: only from `active`
pub fn transition(from: AlertStatus, action: AlertAction) -> Result<AlertStatus, CoreError> {
    use AlertAction::*;
    use AlertStatus::*;
    match (from, action) {
        (Active, Acknowledge) => Ok(Acknowledged),
        (Active | Acknowledged, Resolve) => Ok(Resolved),
        (Active, Dismiss) => Ok(Dismissed),
        _ => Err(CoreError::InvalidTransition {
            from: from.as_str().to_string(),
            action: action.as_str(),
        }),
    }
}

/// Statuses from which `action` is allowed. The alert repository uses these
/// as the expected statuses of its compare-and-set updates.
pub fn allowed_sources(action: AlertAction) -> &'static [AlertStatus] {
    match action {
        AlertAction::Acknowledge | AlertAction::Dismiss => &[AlertStatus::Active],
        AlertAction::Resolve => &[AlertStatus::Active, AlertStatus::Acknowledged],
    }
}

/// Result of opening an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome<A> {
    /// A new `active` alert was created.
    Created(A),
    /// An alert of the same type was already open for the equipment.
    AlreadyOpen(A),
}

impl<A> OpenOutcome<A> {
    pub fn is_created(&self) -> bool {
        matches!(self, OpenOutcome::Created(_))
    }

    pub fn alert(&self) -> &A {
        match self {
            OpenOutcome::Created(a) | OpenOutcome::AlreadyOpen(a) => a,
        }
    }

    pub fn into_alert(self) -> A {
        match self {
            OpenOutcome::Created(a) | OpenOutcome::AlreadyOpen(a) => a,
        }
    }
}

/* --------------------------------------------------------------------------
Sweep planning
-------------------------------------------------------------------------- */

/// Fields needed to open a new alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAlert {
    pub equipment_id: DbId,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub suggested_action: String,
    pub due_by: Option<Timestamp>,
}

/// Equipment identity used in alert text.
#[derive(Debug, Clone, Copy)]
pub struct SweepSubject<'a> {
    pub equipment_id: DbId,
    pub name: &'a str,
    pub serial_number: &'a str,
    pub last_cleaned_at: Option<Timestamp>,
}

/// An open alert as seen by the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenAlertRef {
    pub id: DbId,
    pub alert_type: AlertType,
}

/// What the persistence layer should do for one equipment item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepIntent {
    /// Open the alert unless one of the same type is already open.
    Open(NewAlert),
    /// Resolve an open alert with an automated note.
    AutoResolve { alert_id: DbId, notes: String },
}

/// Decide which alerts to open or close for one classified equipment item.
///
/// Overdue and never-cleaned items get an `overdue` alert; due-soon items get
/// a `due_soon` alert; compliant items have every open schedule-driven alert
/// auto-resolved. Open intents are emitted even when an alert of the same type
/// is already open, so that the persistence layer's deduplication reports
/// [`OpenOutcome::AlreadyOpen`].
pub fn plan_sweep(
    subject: &SweepSubject<'_>,
    classification: &Classification,
    open_alerts: &[OpenAlertRef],
    now: Timestamp,
) -> Vec<SweepIntent> {
    match classification.state {
        ComplianceState::Overdue | ComplianceState::NeverCleaned => {
            vec![SweepIntent::Open(overdue_alert(subject, now))]
        }
        ComplianceState::DueSoon => {
            vec![SweepIntent::Open(due_soon_alert(subject, classification.next_due_at))]
        }
        ComplianceState::Compliant => open_alerts
            .iter()
            .filter(|a| a.alert_type.is_schedule_driven())
            .map(|a| SweepIntent::AutoResolve {
                alert_id: a.id,
                notes: AUTO_RESOLVE_NOTE.to_string(),
            })
            .collect(),
    }
}

fn overdue_alert(subject: &SweepSubject<'_>, now: Timestamp) -> NewAlert {
    let last_cleaned = subject
        .last_cleaned_at
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    NewAlert {
        equipment_id: subject.equipment_id,
        alert_type: AlertType::Overdue,
        severity: Severity::High,
        title: format!("Overdue Cleaning: {}", subject.name),
        message: format!(
            "Equipment {} (S/N: {}) is overdue for cleaning. Last cleaned: {last_cleaned}",
            subject.name, subject.serial_number
        ),
        suggested_action: "Schedule immediate cleaning to maintain compliance.".to_string(),
        due_by: Some(now + Duration::hours(OVERDUE_GRACE_HOURS)),
    }
}

fn due_soon_alert(subject: &SweepSubject<'_>, next_due_at: Option<Timestamp>) -> NewAlert {
    let due = next_due_at
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    NewAlert {
        equipment_id: subject.equipment_id,
        alert_type: AlertType::DueSoon,
        severity: Severity::Medium,
        title: format!("Cleaning Due Soon: {}", subject.name),
        message: format!(
            "Equipment {} (S/N: {}) requires cleaning soon. Due: {due}",
            subject.name, subject.serial_number
        ),
        suggested_action: "Schedule cleaning before the due time.".to_string(),
        due_by: next_due_at,
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
