// UI models module
// Zoom levels of the time table

use serde::{Deserialize, Serialize};

use crate::utils::date::TimeUnit;

/// Zoom level of the time table. `Hours` slices every day into steps,
/// the other views use one slot per calendar unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    #[default]
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl ViewType {
    /// Calendar unit covered by one slot, `None` for the stepped hours view.
    pub fn slot_unit(self) -> Option<TimeUnit> {
        match self {
            ViewType::Hours => None,
            ViewType::Days => Some(TimeUnit::Day),
            ViewType::Weeks => Some(TimeUnit::Week),
            ViewType::Months => Some(TimeUnit::Month),
            ViewType::Years => Some(TimeUnit::Year),
        }
    }

    /// Whether a single slot never spans more than one calendar day.
    pub fn is_intraday(self) -> bool {
        matches!(self, ViewType::Hours | ViewType::Days)
    }
}
