// Message module
// Recoverable issues surfaced to the host as localizable messages

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How loudly the host should present a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageAppearance {
    Information,
    Warning,
    Danger,
}

/// Everything the engine recovers from locally and reports instead.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TimeTableIssue {
    #[error("the end of the time table must be after its start")]
    EndBeforeStart,
    #[error("time steps must be positive, got {step_minutes} minutes")]
    NonPositiveStep { step_minutes: i64 },
    #[error("{requested_minutes} minute steps do not fit the day, using {corrected_minutes} minutes")]
    UnfittingStep {
        requested_minutes: i64,
        corrected_minutes: i64,
    },
    #[error("{count} item(s) lie outside the visible time frame")]
    ItemsOutsideRange { count: usize },
    #[error("{count} item(s) start and end at the same time")]
    ItemsWithDegenerateRange { count: usize },
    #[error("selected time slots can only be deselected from the outer border")]
    DeselectFromOuterBorder,
}

impl TimeTableIssue {
    pub fn appearance(&self) -> MessageAppearance {
        match self {
            TimeTableIssue::EndBeforeStart | TimeTableIssue::NonPositiveStep { .. } => {
                MessageAppearance::Danger
            }
            TimeTableIssue::UnfittingStep { .. } | TimeTableIssue::ItemsWithDegenerateRange { .. } => {
                MessageAppearance::Warning
            }
            TimeTableIssue::ItemsOutsideRange { .. } | TimeTableIssue::DeselectFromOuterBorder => {
                MessageAppearance::Information
            }
        }
    }
}

/// A message key plus parameters, localized by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTableMessage {
    pub appearance: MessageAppearance,
    pub issue: TimeTableIssue,
}

impl From<TimeTableIssue> for TimeTableMessage {
    fn from(issue: TimeTableIssue) -> Self {
        Self {
            appearance: issue.appearance(),
            issue,
        }
    }
}

impl TimeTableMessage {
    pub fn message_key(&self) -> &'static str {
        match self.issue {
            TimeTableIssue::EndBeforeStart => "timetable.endDateAfterStartDate",
            TimeTableIssue::NonPositiveStep { .. } => "timetable.nonPositiveTimeSteps",
            TimeTableIssue::UnfittingStep { .. } => "timetable.unfittingTimeSlot",
            TimeTableIssue::ItemsOutsideRange { .. } => "timetable.itemsOutsideTimeFrame",
            TimeTableIssue::ItemsWithDegenerateRange { .. } => "timetable.itemsWithSameStartAndEnd",
            TimeTableIssue::DeselectFromOuterBorder => "timetable.deselectFromOuterBorder",
        }
    }

    pub fn message_values(&self) -> Vec<(&'static str, i64)> {
        match self.issue {
            TimeTableIssue::NonPositiveStep { step_minutes } => vec![("timeSteps", step_minutes)],
            TimeTableIssue::UnfittingStep {
                requested_minutes,
                corrected_minutes,
            } => vec![
                ("requestedTimeSteps", requested_minutes),
                ("timeSteps", corrected_minutes),
            ],
            TimeTableIssue::ItemsOutsideRange { count }
            | TimeTableIssue::ItemsWithDegenerateRange { count } => {
                vec![("itemCount", i64::try_from(count).unwrap_or(i64::MAX))]
            }
            TimeTableIssue::EndBeforeStart | TimeTableIssue::DeselectFromOuterBorder => Vec::new(),
        }
    }
}

impl std::fmt::Display for TimeTableMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.issue, self.message_key())
    }
}
