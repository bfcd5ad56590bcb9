//! Cleaning schedule evaluation.
//!
//! Classifies equipment against its cleaning frequency, decides whether a new
//! cleaning was on time, and enforces the per-equipment spam window. All
//! functions are pure and take the current instant explicitly.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Minimum spacing between two cleaning logs for the same equipment.
pub const CLEANING_WINDOW_MINUTES: i64 = 60;

/// Default due-soon warning window, as a percentage of the cleaning frequency.
pub const DEFAULT_WARNING_PERCENT: u32 = 20;

/// Upper bound for a configured cleaning frequency (one year).
pub const MAX_CLEANING_FREQUENCY_HOURS: i32 = 24 * 366;

/* --------------------------------------------------------------------------
Types
-------------------------------------------------------------------------- */

/// Compliance state of a single piece of equipment at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceState {
    NeverCleaned,
    Compliant,
    DueSoon,
    Overdue,
}

impl ComplianceState {
    pub const ALL: [ComplianceState; 4] = [
        ComplianceState::NeverCleaned,
        ComplianceState::Compliant,
        ComplianceState::DueSoon,
        ComplianceState::Overdue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComplianceState::NeverCleaned => "never_cleaned",
            ComplianceState::Compliant => "compliant",
            ComplianceState::DueSoon => "due_soon",
            ComplianceState::Overdue => "overdue",
        }
    }
}

impl fmt::Display for ComplianceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComplianceState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown compliance state '{s}'")))
    }
}

/// The scheduling fields of an equipment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleaningSchedule {
    pub cleaning_frequency_hours: i32,
    pub last_cleaned_at: Option<Timestamp>,
}

impl CleaningSchedule {
    /// When the next cleaning is due, or `None` if never cleaned.
    pub fn next_due_at(&self) -> Option<Timestamp> {
        self.last_cleaned_at
            .map(|last| last + Duration::hours(i64::from(self.cleaning_frequency_hours)))
    }
}

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub state: ComplianceState,
    pub next_due_at: Option<Timestamp>,
}

/// Tunable evaluation parameters, built once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompliancePolicy {
    /// Due-soon window as a percentage of the cleaning frequency.
    pub warning_percent: u32,
}

impl Default for CompliancePolicy {
    fn default() -> Self {
        Self {
            warning_percent: DEFAULT_WARNING_PERCENT,
        }
    }
}

impl CompliancePolicy {
    pub fn new(warning_percent: u32) -> Result<Self, CoreError> {
        if warning_percent > 100 {
            return Err(CoreError::Validation(format!(
                "Warning percent must be between 0 and 100, got {warning_percent}"
            )));
        }
        Ok(Self { warning_percent })
    }

    /// Length of the due-soon window for the given frequency.
    pub fn warning_window(&self, cleaning_frequency_hours: i32) -> Duration {
        let frequency_minutes = i64::from(cleaning_frequency_hours) * 60;
        Duration::minutes(frequency_minutes * i64::from(self.warning_percent) / 100)
    }
}

/// What to persist after a cleaning is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleaningOutcome {
    /// Whether the cleaning happened no later than the previous due time.
    pub is_compliant: bool,
    pub last_cleaned_at: Timestamp,
    pub next_due_at: Timestamp,
}

/* --------------------------------------------------------------------------
Evaluation
-------------------------------------------------------------------------- */

/// Classify equipment at `now`.
///
/// Overdue once `now` is strictly past the due time; due-soon once the time
/// remaining is within the policy's warning window.
pub fn classify(schedule: &CleaningSchedule, now: Timestamp, policy: &CompliancePolicy) -> Classification {
    let Some(next_due_at) = schedule.next_due_at() else {
        return Classification {
            state: ComplianceState::NeverCleaned,
            next_due_at: None,
        };
    };

    let state = if now > next_due_at {
        ComplianceState::Overdue
    } else if next_due_at - now <= policy.warning_window(schedule.cleaning_frequency_hours) {
        ComplianceState::DueSoon
    } else {
        ComplianceState::Compliant
    };

    Classification {
        state,
        next_due_at: Some(next_due_at),
    }
}

/// Evaluate a new cleaning completed at `completed_at`.
///
/// The first cleaning of an item is always compliant. Later cleanings are
/// compliant when they finish no later than the due time computed from the
/// schedule before this cleaning.
pub fn record_cleaning(schedule: &CleaningSchedule, completed_at: Timestamp) -> CleaningOutcome {
    let is_compliant = schedule
        .next_due_at()
        .map_or(true, |due| completed_at <= due);

    let last_cleaned_at = match schedule.last_cleaned_at {
        Some(previous) if previous > completed_at => previous,
        _ => completed_at,
    };

    CleaningOutcome {
        is_compliant,
        last_cleaned_at,
        next_due_at: last_cleaned_at
            + Duration::hours(i64::from(schedule.cleaning_frequency_hours)),
    }
}

/// Reject a cleaning that lands within the spam window of the latest one.
///
/// `latest_completed_at` is the most recent `completed_at` among existing logs
/// for the equipment. Exactly one window apart is still rejected.
pub fn check_cleaning_window(
    equipment_id: DbId,
    latest_completed_at: Option<Timestamp>,
    completed_at: Timestamp,
) -> Result<(), CoreError> {
    let window_start = completed_at - Duration::minutes(CLEANING_WINDOW_MINUTES);
    match latest_completed_at {
        Some(latest) if latest >= window_start => {
            Err(CoreError::DuplicateCleaningWindow { equipment_id })
        }
        _ => Ok(()),
    }
}

/// Validate the start/end instants of a submitted cleaning.
pub fn validate_cleaning_times(
    started_at: Timestamp,
    completed_at: Timestamp,
    now: Timestamp,
) -> Result<(), CoreError> {
    if completed_at < started_at {
        return Err(CoreError::Validation(
            "completed_at must not be before started_at".to_string(),
        ));
    }
    if completed_at > now {
        return Err(CoreError::Validation(
            "completed_at must not be in the future".to_string(),
        ));
    }
    Ok(())
}

/// Whole minutes between start and completion.
pub fn duration_minutes(started_at: Timestamp, completed_at: Timestamp) -> i32 {
    i32::try_from((completed_at - started_at).num_minutes()).unwrap_or(i32::MAX)
}

/// Validate a configured cleaning frequency.
pub fn validate_cleaning_frequency(hours: i32) -> Result<(), CoreError> {
    if hours <= 0 || hours > MAX_CLEANING_FREQUENCY_HOURS {
        return Err(CoreError::Validation(format!(
            "cleaning_frequency_hours must be between 1 and {MAX_CLEANING_FREQUENCY_HOURS}, got {hours}"
        )));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Summary
-------------------------------------------------------------------------- */

/// Fleet-level compliance counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceSummary {
    pub total_equipment: i64,
    pub never_cleaned: i64,
    pub compliant: i64,
    pub due_soon: i64,
    pub overdue: i64,
    /// Percentage of equipment that is compliant or due-soon, one decimal.
    /// An empty fleet counts as fully compliant.
    pub compliance_rate: f64,
}

impl ComplianceSummary {
    pub fn from_states(states: impl IntoIterator<Item = ComplianceState>) -> Self {
        let (mut never_cleaned, mut compliant, mut due_soon, mut overdue) = (0, 0, 0, 0);
        for state in states {
            match state {
                ComplianceState::NeverCleaned => never_cleaned += 1,
                ComplianceState::Compliant => compliant += 1,
                ComplianceState::DueSoon => due_soon += 1,
                ComplianceState::Overdue => overdue += 1,
            }
        }

        let total_equipment = never_cleaned + compliant + due_soon + overdue;
        let compliance_rate = if total_equipment == 0 {
            100.0
        } else {
            let rate = (compliant + due_soon) as f64 / total_equipment as f64 * 100.0;
            (rate * 10.0).round() / 10.0
        };

        Self {
            total_equipment,
            never_cleaned,
            compliant,
            due_soon,
            overdue,
            compliance_rate,
        }
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    fn schedule(hours: i32, last: Option<Timestamp>) -> CleaningSchedule {
        CleaningSchedule {
            cleaning_frequency_hours: hours,
            last_cleaned_at: last,
        }
    }

    // -- classify -------------------------------------------------------------

    #[test]
    fn test_never_cleaned_has_no_due_time() {
        let c = classify(&schedule(24, None), t0(), &CompliancePolicy::default());
        assert_eq!(c.state, ComplianceState::NeverCleaned);
        assert_eq!(c.next_due_at, None);
    }

    #[test]
    fn test_daily_item_states_over_time() {
        // Cleaned at t0 with a 24h frequency: due at t0+24h, warning from t0+19h12m.
        let s = schedule(24, Some(t0()));
        let policy = CompliancePolicy::default();

        let at = |hours: i64, minutes: i64| {
            classify(&s, t0() + Duration::hours(hours) + Duration::minutes(minutes), &policy)
        };

        assert_eq!(at(10, 0).state, ComplianceState::Compliant);
        assert_eq!(at(19, 11).state, ComplianceState::Compliant);
        assert_eq!(at(19, 12).state, ComplianceState::DueSoon);
        assert_eq!(at(24, 0).state, ComplianceState::DueSoon);
        assert_eq!(at(25, 0).state, ComplianceState::Overdue);
        assert_eq!(at(25, 0).next_due_at, Some(t0() + Duration::hours(24)));
    }

    #[test]
    fn test_one_second_past_due_is_overdue() {
        let s = schedule(8, Some(t0()));
        let c = classify(&s, t0() + Duration::hours(8) + Duration::seconds(1), &CompliancePolicy::default());
        assert_eq!(c.state, ComplianceState::Overdue);
    }

    #[test]
    fn test_classification_is_monotonic_in_time() {
        let s = schedule(12, Some(t0()));
        let policy = CompliancePolicy::default();
        let rank = |state: ComplianceState| match state {
            ComplianceState::Compliant => 0,
            ComplianceState::DueSoon => 1,
            ComplianceState::Overdue => 2,
            ComplianceState::NeverCleaned => unreachable!(),
        };

        let mut previous = 0;
        for minute in (0..=24 * 60).step_by(7) {
            let state = classify(&s, t0() + Duration::minutes(minute), &policy).state;
            assert!(rank(state) >= previous, "regressed at minute {minute}");
            previous = rank(state);
        }
    }

    #[test]
    fn test_zero_percent_window_skips_due_soon() {
        let s = schedule(24, Some(t0()));
        let policy = CompliancePolicy::new(0).unwrap();
        assert_eq!(classify(&s, t0() + Duration::hours(23), &policy).state, ComplianceState::Compliant);
        assert_eq!(classify(&s, t0() + Duration::hours(24), &policy).state, ComplianceState::DueSoon);
    }

    #[test]
    fn test_policy_rejects_percent_above_hundred() {
        assert_matches!(CompliancePolicy::new(101), Err(CoreError::Validation(_)));
        assert!(CompliancePolicy::new(100).is_ok());
    }

    #[test]
    fn test_warning_window_is_fraction_of_frequency() {
        let policy = CompliancePolicy::default();
        assert_eq!(policy.warning_window(24), Duration::minutes(288));
        assert_eq!(policy.warning_window(1), Duration::minutes(12));
    }

    // -- record_cleaning ------------------------------------------------------

    #[test]
    fn test_first_cleaning_is_compliant() {
        let outcome = record_cleaning(&schedule(24, None), t0());
        assert!(outcome.is_compliant);
        assert_eq!(outcome.last_cleaned_at, t0());
        assert_eq!(outcome.next_due_at, t0() + Duration::hours(24));
    }

    #[test]
    fn test_cleaning_on_due_time_is_compliant() {
        let s = schedule(24, Some(t0()));
        assert!(record_cleaning(&s, t0() + Duration::hours(24)).is_compliant);
    }

    #[test]
    fn test_late_cleaning_is_not_compliant_but_advances_schedule() {
        let s = schedule(24, Some(t0()));
        let late = t0() + Duration::hours(26);
        let outcome = record_cleaning(&s, late);
        assert!(!outcome.is_compliant);
        assert_eq!(outcome.last_cleaned_at, late);
        assert_eq!(outcome.next_due_at, late + Duration::hours(24));
    }

    #[test]
    fn test_overdue_item_becomes_compliant_after_cleaning() {
        let s = schedule(24, Some(t0()));
        let now = t0() + Duration::hours(25);
        assert_eq!(classify(&s, now, &CompliancePolicy::default()).state, ComplianceState::Overdue);

        let outcome = record_cleaning(&s, now);
        let after = schedule(24, Some(outcome.last_cleaned_at));
        assert_eq!(classify(&after, now, &CompliancePolicy::default()).state, ComplianceState::Compliant);
    }

    #[test]
    fn test_record_never_moves_last_cleaned_backwards() {
        let s = schedule(24, Some(t0()));
        let outcome = record_cleaning(&s, t0() - Duration::hours(3));
        assert_eq!(outcome.last_cleaned_at, t0());
    }

    // -- check_cleaning_window ------------------------------------------------

    #[test]
    fn test_no_previous_cleaning_passes_window() {
        assert!(check_cleaning_window(1, None, t0()).is_ok());
    }

    #[test]
    fn test_sixty_minutes_apart_is_rejected() {
        let result = check_cleaning_window(9, Some(t0()), t0() + Duration::minutes(60));
        assert_matches!(result, Err(CoreError::DuplicateCleaningWindow { equipment_id: 9 }));
    }

    #[test]
    fn test_sixty_one_minutes_apart_is_accepted() {
        assert!(check_cleaning_window(9, Some(t0()), t0() + Duration::minutes(61)).is_ok());
    }

    #[test]
    fn test_backdated_cleaning_before_latest_is_rejected() {
        let result = check_cleaning_window(9, Some(t0()), t0() - Duration::hours(5));
        assert_matches!(result, Err(CoreError::DuplicateCleaningWindow { .. }));
    }

    // -- validate_cleaning_times ----------------------------------------------

    #[test]
    fn test_completed_before_started_is_invalid() {
        let result = validate_cleaning_times(t0(), t0() - Duration::minutes(1), t0());
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg.contains("started_at"));
    }

    #[test]
    fn test_completed_in_future_is_invalid() {
        let result = validate_cleaning_times(t0(), t0() + Duration::minutes(5), t0());
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg.contains("future"));
    }

    #[test]
    fn test_instant_cleaning_is_valid() {
        assert!(validate_cleaning_times(t0(), t0(), t0()).is_ok());
    }

    #[test]
    fn test_duration_in_whole_minutes() {
        assert_eq!(duration_minutes(t0(), t0() + Duration::seconds(15 * 60 + 59)), 15);
    }

    #[test]
    fn test_frequency_bounds() {
        assert!(validate_cleaning_frequency(1).is_ok());
        assert!(validate_cleaning_frequency(0).is_err());
        assert!(validate_cleaning_frequency(-4).is_err());
        assert!(validate_cleaning_frequency(MAX_CLEANING_FREQUENCY_HOURS + 1).is_err());
    }

    // -- summary --------------------------------------------------------------

    #[test]
    fn test_summary_counts_and_rate() {
        use ComplianceState::*;
        let summary = ComplianceSummary::from_states([Compliant, Compliant, DueSoon, Overdue, NeverCleaned, Overdue]);
        assert_eq!(summary.total_equipment, 6);
        assert_eq!(summary.compliant, 2);
        assert_eq!(summary.due_soon, 1);
        assert_eq!(summary.overdue, 2);
        assert_eq!(summary.never_cleaned, 1);
        assert_eq!(summary.compliance_rate, 50.0);
    }

    #[test]
    fn test_summary_rounds_to_one_decimal() {
        use ComplianceState::*;
        let summary = ComplianceSummary::from_states([Compliant, Overdue, Overdue]);
        assert_eq!(summary.compliance_rate, 33.3);
    }

    #[test]
    fn test_empty_fleet_is_fully_compliant() {
        let summary = ComplianceSummary::from_states(std::iter::empty());
        assert_eq!(summary.total_equipment, 0);
        assert_eq!(summary.compliance_rate, 100.0);
    }

    #[test]
    fn test_state_names_round_trip() {
        for state in ComplianceState::ALL {
            assert_eq!(state.as_str().parse::<ComplianceState>().unwrap(), state);
        }
    }
}
