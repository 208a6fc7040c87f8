// Test fixtures - reusable test data
// Provides consistent groups, bookings and configs across all test files

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use time_table_engine::models::group::Group;
use time_table_engine::models::item::Booking;
use time_table_engine::models::settings::{SchedulerSettings, TimeTableConfig};
use time_table_engine::models::ui::ViewType;
use time_table_engine::services::render_scheduler::{PixelSpan, ViewportSnapshot};
use time_table_engine::services::time_table::GroupEntry;

/// Sample dates for testing
pub mod dates {
    use super::*;

    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    /// Jan 1, 2023 (a Sunday) at the given time
    pub fn jan_1_2023(hour: u32, minute: u32) -> NaiveDateTime {
        at(2023, 1, 1, hour, minute)
    }

    /// Monday Jan 2, 2023 at the given time
    pub fn monday(hour: u32, minute: u32) -> NaiveDateTime {
        at(2023, 1, 2, hour, minute)
    }
}

/// Sample bookings
pub mod bookings {
    use super::*;

    pub fn booking(key: &str, start: NaiveDateTime, end: NaiveDateTime) -> Booking {
        Booking::new(key, format!("Booking {}", key), start, end).unwrap()
    }

    /// Two overlapping bookings and one after them, all on Monday
    pub fn busy_monday() -> Vec<Booking> {
        vec![
            booking("standup", dates::monday(9, 0), dates::monday(10, 0)),
            booking("review", dates::monday(9, 30), dates::monday(11, 0)),
            booking("lunch", dates::monday(12, 0), dates::monday(13, 0)),
        ]
    }
}

/// Sample groups
pub mod groups {
    use super::*;

    pub fn room(id: &str) -> Group {
        Group::new(id, format!("Room {}", id)).unwrap()
    }

    pub fn rooms(count: usize) -> Vec<GroupEntry<Group, Booking>> {
        (0..count)
            .map(|i| GroupEntry::new(room(&format!("room-{}", i)), bookings::busy_monday()))
            .collect()
    }
}

/// Monday to Friday 08:00 - 18:00 in hourly slots, no overscan
pub fn work_week_config() -> TimeTableConfig {
    TimeTableConfig {
        start: dates::monday(8, 0),
        end: dates::at(2023, 1, 6, 18, 0),
        step_minutes: 60,
        view_type: ViewType::Hours,
        render_batch_size: 4,
        scheduler: SchedulerSettings {
            overscan_px: 0.0,
            ..SchedulerSettings::default()
        },
        ..TimeTableConfig::default()
    }
}

/// Groups of equal height stacked from the top, viewport at `[top, bottom)`
pub fn viewport(group_count: usize, row_height: f64, top: f64, bottom: f64) -> ViewportSnapshot {
    ViewportSnapshot::stacked(PixelSpan::new(top, bottom), &vec![row_height; group_count])
}
