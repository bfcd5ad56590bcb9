//! Cleaning log sources and the reviewer validation state machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Source
-------------------------------------------------------------------------- */

/// How a cleaning log was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningSource {
    /// Authenticated staff form.
    Manual,
    /// Public link from the QR label persisted on the equipment.
    QrScan,
    /// Public link from an on-demand temporary token.
    TemporaryToken,
}

impl CleaningSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CleaningSource::Manual => "manual",
            CleaningSource::QrScan => "qr_scan",
            CleaningSource::TemporaryToken => "temporary_token",
        }
    }
}

impl fmt::Display for CleaningSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/* --------------------------------------------------------------------------
Validation status
-------------------------------------------------------------------------- */

/// Reviewer verdict on a cleaning log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pending,
    Approved,
    Rejected,
    Flagged,
}

impl ValidationStatus {
    pub const ALL: [ValidationStatus; 4] = [
        ValidationStatus::Pending,
        ValidationStatus::Approved,
        ValidationStatus::Rejected,
        ValidationStatus::Flagged,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ValidationStatus::Pending => "pending",
            ValidationStatus::Approved => "approved",
            ValidationStatus::Rejected => "rejected",
            ValidationStatus::Flagged => "flagged",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValidationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid validation status '{s}'. Must be one of: pending, approved, rejected, flagged"
                ))
            })
    }
}

/// Status assigned when a log is created.
///
/// Logs whose checklist is fully satisfied and that report no issues are
/// approved automatically; everything else waits for a reviewer.
pub fn initial_validation_status(
    contact_time_met: bool,
    all_steps_completed: bool,
    issues_found: Option<&str>,
) -> ValidationStatus {
    let has_issues = issues_found.is_some_and(|text| !text.trim().is_empty());
    if contact_time_met && all_steps_completed && !has_issues {
        ValidationStatus::Approved
    } else {
        ValidationStatus::Pending
    }
}

/// Check a reviewer transition from `from` to `to`.
///
/// Pending logs may be approved, rejected, or flagged. Flagged logs may be
/// approved or rejected. Everything else is an invalid transition.
pub fn validation_transition(
    from: ValidationStatus,
    to: ValidationStatus,
) -> Result<ValidationStatus, CoreError> {
    use ValidationStatus::*;
    match (from, to) {
        (Pending, Approved | Rejected | Flagged) | (Flagged, Approved | Rejected) => Ok(to),
        _ => Err(CoreError::InvalidTransition {
            from: from.as_str().to_string(),
            action: review_action(to),
        }),
    }
}

fn review_action(to: ValidationStatus) -> &'static str {
    match to {
        ValidationStatus::Pending => "reset to pending",
        ValidationStatus::Approved => "approve",
        ValidationStatus::Rejected => "reject",
        ValidationStatus::Flagged => "flag",
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_clean_checklist_is_auto_approved() {
        assert_eq!(initial_validation_status(true, true, None), ValidationStatus::Approved);
        assert_eq!(initial_validation_status(true, true, Some("  ")), ValidationStatus::Approved);
    }

    #[test]
    fn test_missed_contact_time_stays_pending() {
        assert_eq!(initial_validation_status(false, true, None), ValidationStatus::Pending);
    }

    #[test]
    fn test_incomplete_steps_stay_pending() {
        assert_eq!(initial_validation_status(true, false, None), ValidationStatus::Pending);
    }

    #[test]
    fn test_reported_issues_stay_pending() {
        assert_eq!(
            initial_validation_status(true, true, Some("Cracked housing")),
            ValidationStatus::Pending
        );
    }

    #[test]
    fn test_pending_can_move_to_any_verdict() {
        for to in [ValidationStatus::Approved, ValidationStatus::Rejected, ValidationStatus::Flagged] {
            assert_eq!(validation_transition(ValidationStatus::Pending, to).unwrap(), to);
        }
    }

    #[test]
    fn test_flagged_can_be_approved_or_rejected() {
        assert!(validation_transition(ValidationStatus::Flagged, ValidationStatus::Approved).is_ok());
        assert!(validation_transition(ValidationStatus::Flagged, ValidationStatus::Rejected).is_ok());
        assert!(validation_transition(ValidationStatus::Flagged, ValidationStatus::Flagged).is_err());
    }

    #[test]
    fn test_final_statuses_cannot_change() {
        for from in [ValidationStatus::Approved, ValidationStatus::Rejected] {
            for to in ValidationStatus::ALL {
                assert_matches!(
                    validation_transition(from, to),
                    Err(CoreError::InvalidTransition { .. })
                );
            }
        }
    }

    #[test]
    fn test_cannot_reset_to_pending() {
        assert_matches!(
            validation_transition(ValidationStatus::Pending, ValidationStatus::Pending),
            Err(CoreError::InvalidTransition { from, action: "reset to pending" }) if from == "pending"
        );
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        assert_eq!("flagged".parse::<ValidationStatus>().unwrap(), ValidationStatus::Flagged);
        assert_matches!("maybe".parse::<ValidationStatus>(), Err(CoreError::Validation(_)));
    }
}
