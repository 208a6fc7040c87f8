// Date utility functions
// Calendar clock contract used by every layout algorithm

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: i64 = 24 * 60;
pub const SECONDS_PER_DAY: i64 = MINUTES_PER_DAY * 60;

/// Granularity used by [`CalendarClock`] arithmetic and truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

/// Immutable, comparable timestamp operations the time table relies on.
///
/// Weeks start on Monday for [`CalendarClock::start_of`]; use
/// [`start_of_week`] when the host configures another first weekday.
pub trait CalendarClock: Copy + Ord {
    /// Add `amount` units (negative amounts subtract). Month and year
    /// arithmetic clamps the day to the end of shorter months.
    fn add(self, amount: i64, unit: TimeUnit) -> Self;

    /// Whole units from `other` to `self`, truncated toward zero.
    fn diff(self, other: Self, unit: TimeUnit) -> i64;

    /// Truncate to the first instant of the containing unit.
    fn start_of(self, unit: TimeUnit) -> Self;

    /// Minutes elapsed since midnight.
    fn minute_of_day(self) -> i64;

    fn is_same(self, other: Self, unit: TimeUnit) -> bool {
        self.start_of(unit) == other.start_of(unit)
    }

    fn is_before(self, other: Self, unit: TimeUnit) -> bool {
        self.start_of(unit) < other.start_of(unit)
    }

    fn is_after(self, other: Self, unit: TimeUnit) -> bool {
        self.start_of(unit) > other.start_of(unit)
    }
}

impl CalendarClock for NaiveDateTime {
    fn add(self, amount: i64, unit: TimeUnit) -> Self {
        let shifted = match unit {
            TimeUnit::Minute => Duration::try_minutes(amount).and_then(|d| self.checked_add_signed(d)),
            TimeUnit::Hour => Duration::try_hours(amount).and_then(|d| self.checked_add_signed(d)),
            TimeUnit::Day => Duration::try_days(amount).and_then(|d| self.checked_add_signed(d)),
            TimeUnit::Week => Duration::try_weeks(amount).and_then(|d| self.checked_add_signed(d)),
            TimeUnit::Month => add_months(self, amount),
            TimeUnit::Year => amount.checked_mul(12).and_then(|months| add_months(self, months)),
        };

        shifted.unwrap_or_else(|| {
            log::error!("Clock overflow adding {} {:?} to {}", amount, unit, self);
            if amount < 0 {
                NaiveDateTime::MIN
            } else {
                NaiveDateTime::MAX
            }
        })
    }

    fn diff(self, other: Self, unit: TimeUnit) -> i64 {
        let delta = self - other;
        match unit {
            TimeUnit::Minute => delta.num_minutes(),
            TimeUnit::Hour => delta.num_hours(),
            TimeUnit::Day => delta.num_days(),
            TimeUnit::Week => delta.num_weeks(),
            TimeUnit::Month => month_diff(self, other),
            TimeUnit::Year => month_diff(self, other) / 12,
        }
    }

    fn start_of(self, unit: TimeUnit) -> Self {
        let date = self.date();
        match unit {
            TimeUnit::Minute => date.and_hms_opt(self.hour(), self.minute(), 0).unwrap_or(self),
            TimeUnit::Hour => date.and_hms_opt(self.hour(), 0, 0).unwrap_or(self),
            TimeUnit::Day => date.and_time(NaiveTime::MIN),
            TimeUnit::Week => start_of_week(date, Weekday::Mon).and_time(NaiveTime::MIN),
            TimeUnit::Month => date.with_day(1).unwrap_or(date).and_time(NaiveTime::MIN),
            TimeUnit::Year => date.with_ordinal(1).unwrap_or(date).and_time(NaiveTime::MIN),
        }
    }

    fn minute_of_day(self) -> i64 {
        i64::from(self.hour()) * 60 + i64::from(self.minute())
    }
}

fn add_months(value: NaiveDateTime, amount: i64) -> Option<NaiveDateTime> {
    let months = Months::new(u32::try_from(amount.unsigned_abs()).ok()?);
    if amount < 0 {
        value.checked_sub_months(months)
    } else {
        value.checked_add_months(months)
    }
}

fn month_diff(later: NaiveDateTime, earlier: NaiveDateTime) -> i64 {
    if later < earlier {
        return -month_diff(earlier, later);
    }

    let mut months = i64::from(later.year() - earlier.year()) * 12
        + i64::from(later.month())
        - i64::from(earlier.month());
    // A partial month does not count.
    if months > 0 && earlier.add(months, TimeUnit::Month) > later {
        months -= 1;
    }
    months
}

/// First day of the week containing `date`, for the given first weekday.
pub fn start_of_week(date: NaiveDate, first_day: Weekday) -> NaiveDate {
    let offset = (7 + date.weekday().num_days_from_monday() - first_day.num_days_from_monday()) % 7;
    date - Duration::days(i64::from(offset))
}

/// Weekday configured as `0 = Sunday, 1 = Monday, ...`, the settings encoding.
pub fn weekday_from_index(index: u8) -> Weekday {
    match index % 7 {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Midnight at the start of `date` shifted by `minutes` (may reach the next day).
pub fn at_minute_of_day(date: NaiveDate, minutes: i64) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN).add(minutes, TimeUnit::Minute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn add_handles_every_unit() {
        let base = at(2023, 1, 31, 8, 0);
        assert_eq!(base.add(90, TimeUnit::Minute), at(2023, 1, 31, 9, 30));
        assert_eq!(base.add(-2, TimeUnit::Hour), at(2023, 1, 31, 6, 0));
        assert_eq!(base.add(1, TimeUnit::Day), at(2023, 2, 1, 8, 0));
        assert_eq!(base.add(1, TimeUnit::Week), at(2023, 2, 7, 8, 0));
        // Clamped to the end of February.
        assert_eq!(base.add(1, TimeUnit::Month), at(2023, 2, 28, 8, 0));
        assert_eq!(base.add(-1, TimeUnit::Year), at(2022, 1, 31, 8, 0));
    }

    #[test]
    fn diff_truncates_partial_units() {
        let a = at(2023, 1, 1, 8, 0);
        let b = at(2023, 3, 1, 7, 59);
        assert_eq!(b.diff(a, TimeUnit::Month), 1);
        assert_eq!(b.diff(a, TimeUnit::Day), 58);
        assert_eq!(a.diff(b, TimeUnit::Month), -1);
        assert_eq!(at(2023, 1, 1, 10, 0).diff(a, TimeUnit::Minute), 120);
    }

    #[test]
    fn start_of_truncates() {
        let value = at(2023, 6, 15, 13, 47);
        assert_eq!(value.start_of(TimeUnit::Hour), at(2023, 6, 15, 13, 0));
        assert_eq!(value.start_of(TimeUnit::Day), at(2023, 6, 15, 0, 0));
        // 2023-06-15 is a Thursday.
        assert_eq!(value.start_of(TimeUnit::Week), at(2023, 6, 12, 0, 0));
        assert_eq!(value.start_of(TimeUnit::Month), at(2023, 6, 1, 0, 0));
        assert_eq!(value.start_of(TimeUnit::Year), at(2023, 1, 1, 0, 0));
    }

    #[test]
    fn comparisons_respect_granularity() {
        let morning = at(2023, 6, 15, 8, 0);
        let evening = at(2023, 6, 15, 20, 0);
        assert!(morning.is_same(evening, TimeUnit::Day));
        assert!(morning.is_before(evening, TimeUnit::Hour));
        assert!(!morning.is_before(evening, TimeUnit::Day));
        assert!(evening.is_after(morning, TimeUnit::Minute));
    }

    #[test]
    fn week_start_follows_configured_weekday() {
        let thursday = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
        assert_eq!(
            start_of_week(thursday, weekday_from_index(0)),
            NaiveDate::from_ymd_opt(2023, 6, 11).unwrap()
        );
        assert_eq!(
            start_of_week(thursday, weekday_from_index(1)),
            NaiveDate::from_ymd_opt(2023, 6, 12).unwrap()
        );
    }
}
