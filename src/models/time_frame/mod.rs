// Time frame module
// The recurring intraday window shown for every day of the time table

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::date::{at_minute_of_day, CalendarClock, MINUTES_PER_DAY, SECONDS_PER_DAY};

/// Daily visible window, `start_hour:start_minute` up to `end_hour:end_minute`.
///
/// An end of `24:00` means the window runs to the following midnight.
/// `one_day_minutes` is the window length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TimeFrameDay {
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
    pub one_day_minutes: i64,
}

impl TimeFrameDay {
    /// Derive the window from the time of day of the range bounds.
    ///
    /// An end at midnight is read as `24:00`. An end at or before the start
    /// time of day would cross midnight and is clamped to `23:59`; if that
    /// still leaves no room the window runs to `24:00`.
    pub fn from_range(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        let start_of_window = start.minute_of_day();
        let mut end_of_window = end.minute_of_day();

        if end_of_window == 0 {
            end_of_window = MINUTES_PER_DAY;
        } else if end_of_window <= start_of_window {
            end_of_window = MINUTES_PER_DAY - 1;
        }
        if end_of_window <= start_of_window {
            end_of_window = MINUTES_PER_DAY;
        }

        Self::from_minutes(start_of_window, end_of_window)
    }

    fn from_minutes(start_of_window: i64, end_of_window: i64) -> Self {
        Self {
            start_hour: (start_of_window / 60) as u32,
            start_minute: (start_of_window % 60) as u32,
            end_hour: (end_of_window / 60) as u32,
            end_minute: (end_of_window % 60) as u32,
            one_day_minutes: end_of_window - start_of_window,
        }
    }

    pub fn start_minute_of_day(&self) -> i64 {
        i64::from(self.start_hour) * 60 + i64::from(self.start_minute)
    }

    pub fn end_minute_of_day(&self) -> i64 {
        i64::from(self.end_hour) * 60 + i64::from(self.end_minute)
    }

    pub fn window_start(&self, date: NaiveDate) -> NaiveDateTime {
        at_minute_of_day(date, self.start_minute_of_day())
    }

    pub fn window_end(&self, date: NaiveDate) -> NaiveDateTime {
        at_minute_of_day(date, self.end_minute_of_day())
    }

    /// Seconds of `[from, to)` that fall inside some day's window.
    pub fn visible_seconds_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> i64 {
        if to <= from {
            return 0;
        }

        let from_second = second_of_day(from);
        let to_second = second_of_day(to);
        let days_apart = (to.date() - from.date()).num_days();

        if days_apart == 0 {
            return self.visible_in_day(from_second, to_second);
        }

        self.visible_in_day(from_second, SECONDS_PER_DAY)
            + (days_apart - 1) * self.one_day_minutes * 60
            + self.visible_in_day(0, to_second)
    }

    fn visible_in_day(&self, from_second: i64, to_second: i64) -> i64 {
        let window_start = self.start_minute_of_day() * 60;
        let window_end = self.end_minute_of_day() * 60;
        (to_second.min(window_end) - from_second.max(window_start)).max(0)
    }

    /// Later of `start` and its day's window start. A start at or after the
    /// window end rolls forward to the next day's window start.
    pub fn clip_start(&self, start: NaiveDateTime) -> NaiveDateTime {
        let day = start.date();
        let window_start = self.window_start(day);
        if start < window_start {
            return window_start;
        }
        if start >= self.window_end(day) {
            return self.window_start(day + Duration::days(1));
        }
        start
    }

    /// Earlier of `end` and its day's window end. Midnight, and any end at or
    /// before the day's window start, belongs to the previous day's window.
    pub fn clip_end(&self, end: NaiveDateTime) -> NaiveDateTime {
        let day = end.date();
        if end <= self.window_start(day) {
            let previous_end = self.window_end(day - Duration::days(1));
            return previous_end.min(end);
        }
        self.window_end(day).min(end)
    }

    /// Whether the time of day of `instant` lies before the window start.
    pub fn is_before_window(&self, instant: NaiveDateTime) -> bool {
        instant.minute_of_day() < self.start_minute_of_day()
    }
}

fn second_of_day(instant: NaiveDateTime) -> i64 {
    (instant - instant.start_of(crate::utils::date::TimeUnit::Day)).num_seconds()
}
