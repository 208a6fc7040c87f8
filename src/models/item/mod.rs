// Item module
// Time-ranged bookings placed into group rows

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Capability the placement engine needs from a booking.
pub trait TimeTableItem: Clone {
    type Key: Clone + PartialEq + std::fmt::Debug;

    fn key(&self) -> &Self::Key;
    fn start(&self) -> NaiveDateTime;
    fn end(&self) -> NaiveDateTime;

    /// Equal (or inverted) start and end, never placed into a row.
    fn has_degenerate_range(&self) -> bool {
        self.end() <= self.start()
    }

    /// Half-open overlap; touching endpoints do not overlap.
    fn overlaps<T: TimeTableItem>(&self, other: &T) -> bool {
        self.start() < other.end() && self.end() > other.start()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub key: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Booking {
    /// Create a booking.
    ///
    /// # Arguments
    /// * `key` - Identifier, unique within its group
    /// * `title` - Display title
    /// * `start` - Booking start
    /// * `end` - Booking end, not before `start` (equal is allowed and flagged later)
    ///
    /// # Examples
    /// ```
    /// use time_table_engine::models::item::Booking;
    /// use chrono::NaiveDate;
    ///
    /// let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
    /// let booking = Booking::new("b-1", "Standup", start, start + chrono::Duration::minutes(15)).unwrap();
    /// assert_eq!(booking.duration().num_minutes(), 15);
    /// ```
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Self, String> {
        if end < start {
            return Err("Booking end time must not be before its start time".to_string());
        }

        Ok(Self {
            key: key.into(),
            title: title.into(),
            start,
            end,
        })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl TimeTableItem for Booking {
    type Key = String;

    fn key(&self) -> &String {
        &self.key
    }

    fn start(&self) -> NaiveDateTime {
        self.start
    }

    fn end(&self) -> NaiveDateTime {
        self.end
    }
}
