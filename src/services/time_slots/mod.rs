// Time slot generator
// Turns the configured range into the immutable slot grid of a time table

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::message::{TimeTableIssue, TimeTableMessage};
use crate::models::time_frame::TimeFrameDay;
use crate::models::ui::ViewType;
use crate::utils::date::{start_of_week, weekday_from_index, CalendarClock, TimeUnit};

/// The slot grid of one time table. Never mutated once built; a change of
/// range, step or view produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSlots {
    slots: Vec<NaiveDateTime>,
    time_frame: TimeFrameDay,
    view_type: ViewType,
    /// Effective step for the hours view, the window length otherwise.
    slot_minutes: i64,
    message: Option<TimeTableMessage>,
}

impl TimeSlots {
    fn empty(view_type: ViewType, time_frame: TimeFrameDay, issue: TimeTableIssue) -> Self {
        Self {
            slots: Vec::new(),
            time_frame,
            view_type,
            slot_minutes: 0,
            message: Some(issue.into()),
        }
    }

    pub fn slots(&self) -> &[NaiveDateTime] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn time_frame(&self) -> &TimeFrameDay {
        &self.time_frame
    }

    pub fn view_type(&self) -> ViewType {
        self.view_type
    }

    pub fn slot_minutes(&self) -> i64 {
        self.slot_minutes
    }

    /// Warning or error raised while generating, if any.
    pub fn message(&self) -> Option<&TimeTableMessage> {
        self.message.as_ref()
    }

    pub fn slot_start(&self, index: usize) -> Option<NaiveDateTime> {
        self.slots.get(index).copied()
    }

    /// Exclusive end of a slot: one step later for hours, the window start of
    /// the next calendar unit otherwise.
    pub fn slot_end(&self, index: usize) -> Option<NaiveDateTime> {
        let start = self.slot_start(index)?;
        let end = match self.view_type.slot_unit() {
            None => start.add(self.slot_minutes, TimeUnit::Minute),
            Some(unit) => self
                .time_frame
                .window_start(start.date().add(1, unit)),
        };
        Some(end)
    }

    /// Seconds of a slot that are inside the daily window.
    pub fn slot_visible_seconds(&self, index: usize) -> i64 {
        match (self.slot_start(index), self.slot_end(index)) {
            (Some(start), Some(end)) => self.time_frame.visible_seconds_between(start, end),
            _ => 0,
        }
    }

    /// First instant covered by the grid.
    pub fn range_start(&self) -> Option<NaiveDateTime> {
        self.slots.first().copied()
    }

    /// Exclusive end of the last slot.
    pub fn range_end(&self) -> Option<NaiveDateTime> {
        self.slot_end(self.slots.len().checked_sub(1)?)
    }

    /// Index of the last slot starting at or before `instant`.
    pub fn last_slot_at_or_before(&self, instant: NaiveDateTime) -> Option<usize> {
        self.slots
            .partition_point(|slot| *slot <= instant)
            .checked_sub(1)
    }

    /// Index of the last slot starting strictly before `instant`.
    pub fn last_slot_before(&self, instant: NaiveDateTime) -> Option<usize> {
        self.slots.partition_point(|slot| *slot < instant).checked_sub(1)
    }
}

/// Build the slot grid for a range, step and view.
///
/// Invalid input never fails: the result is an empty grid carrying a danger
/// message, so the host can render an explanatory state.
pub fn generate_time_slots(
    start: NaiveDateTime,
    end: NaiveDateTime,
    step_minutes: i64,
    view_type: ViewType,
    first_day_of_week: u8,
) -> TimeSlots {
    if end <= start {
        log::warn!("Time table end {} is not after start {}", end, start);
        return TimeSlots::empty(view_type, TimeFrameDay::default(), TimeTableIssue::EndBeforeStart);
    }

    let time_frame = TimeFrameDay::from_range(start, end);

    if step_minutes <= 0 {
        log::warn!("Time table step of {} minutes is not positive", step_minutes);
        return TimeSlots::empty(
            view_type,
            time_frame,
            TimeTableIssue::NonPositiveStep { step_minutes },
        );
    }

    match view_type.slot_unit() {
        None => hours_view_slots(start, end, step_minutes, time_frame),
        Some(unit) => unit_view_slots(start, end, view_type, unit, time_frame, first_day_of_week),
    }
}

fn hours_view_slots(
    start: NaiveDateTime,
    end: NaiveDateTime,
    step_minutes: i64,
    time_frame: TimeFrameDay,
) -> TimeSlots {
    let one_day = time_frame.one_day_minutes;
    let mut step = step_minutes;
    let mut message = None;

    if one_day % step != 0 {
        step = fitting_step(one_day, step_minutes);
        log::warn!(
            "Step of {} minutes does not fit a {} minute day, using {}",
            step_minutes,
            one_day,
            step
        );
        message = Some(
            TimeTableIssue::UnfittingStep {
                requested_minutes: step_minutes,
                corrected_minutes: step,
            }
            .into(),
        );
    }

    let slots_per_day = one_day / step;
    let mut slots = Vec::new();
    for day in visible_days(start.date(), end, &time_frame) {
        let window_start = time_frame.window_start(day);
        slots.extend((0..slots_per_day).map(|k| window_start.add(k * step, TimeUnit::Minute)));
    }

    log::debug!("Generated {} hour slots of {} minutes", slots.len(), step);

    TimeSlots {
        slots,
        time_frame,
        view_type: ViewType::Hours,
        slot_minutes: step,
        message,
    }
}

fn unit_view_slots(
    start: NaiveDateTime,
    end: NaiveDateTime,
    view_type: ViewType,
    unit: TimeUnit,
    time_frame: TimeFrameDay,
    first_day_of_week: u8,
) -> TimeSlots {
    let first_unit_day = match unit {
        TimeUnit::Week => start_of_week(start.date(), weekday_from_index(first_day_of_week)),
        _ => start.start_of(unit).date(),
    };

    let mut slots = Vec::new();
    let mut unit_day = first_unit_day;
    loop {
        let slot = time_frame.window_start(unit_day);
        if slot >= end {
            break;
        }
        slots.push(slot);
        unit_day = unit_day.add(1, unit);
    }

    log::debug!("Generated {} {:?} slots", slots.len(), view_type);

    TimeSlots {
        slots,
        time_frame,
        view_type,
        slot_minutes: time_frame.one_day_minutes,
        message: None,
    }
}

/// Largest step below the requested one that tiles the day without remainder.
fn fitting_step(one_day_minutes: i64, requested: i64) -> i64 {
    (1..requested.min(one_day_minutes + 1))
        .rev()
        .find(|candidate| one_day_minutes % candidate == 0)
        .unwrap_or(1)
}

/// Days from `first` on whose window starts before `end`.
fn visible_days(
    first: NaiveDate,
    end: NaiveDateTime,
    time_frame: &TimeFrameDay,
) -> impl Iterator<Item = NaiveDate> + '_ {
    first
        .iter_days()
        .take_while(move |day| time_frame.window_start(*day) < end)
}

/// Clock arithmetic on calendar dates, used when stepping through units.
trait DateStep {
    fn add(self, amount: i64, unit: TimeUnit) -> Self;
}

impl DateStep for NaiveDate {
    fn add(self, amount: i64, unit: TimeUnit) -> Self {
        self.and_time(chrono::NaiveTime::MIN).add(amount, unit).date()
    }
}
