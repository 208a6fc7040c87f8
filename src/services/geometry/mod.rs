// Geometry calculator
// Sub-slot fractions for items that only partly cover their slots

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::services::time_slots::TimeSlots;

/// Horizontal placement of an item in slot units, relative to its start
/// slot. `width` exceeds 1 when the item spans several slots.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ItemGeometry {
    pub left: f64,
    pub width: f64,
}

/// Compute `{ left, width }` of an item assigned to `start_slot`.
///
/// The item is clipped to the daily window first; hidden minutes between
/// days are not counted. Negative results indicate malformed input, they are
/// logged and clamped to zero.
pub fn item_geometry(
    item_start: NaiveDateTime,
    item_end: NaiveDateTime,
    start_slot: usize,
    slots: &TimeSlots,
) -> ItemGeometry {
    let time_frame = slots.time_frame();
    let clipped_start = time_frame.clip_start(item_start);
    let clipped_end = time_frame.clip_end(item_end);

    let start_position = slot_position(clipped_start, slots);
    let end_position = slot_position(clipped_end, slots);

    let mut left = start_position - start_slot as f64;
    let mut width = end_position - start_position;

    if left < 0.0 {
        log::error!(
            "Negative left {} for item {} - {} in slot {}, clamping",
            left,
            item_start,
            item_end,
            start_slot
        );
        left = 0.0;
    }
    if width < 0.0 {
        log::error!(
            "Negative width {} for item {} - {} in slot {}, clamping",
            width,
            item_start,
            item_end,
            start_slot
        );
        width = 0.0;
    }

    ItemGeometry { left, width }
}

/// Fractional slot index of `instant`: the containing slot plus the share of
/// that slot's visible minutes already elapsed.
pub fn slot_position(instant: NaiveDateTime, slots: &TimeSlots) -> f64 {
    let Some(index) = slots.last_slot_at_or_before(instant) else {
        return 0.0;
    };
    let (Some(slot_start), Some(slot_end)) = (slots.slot_start(index), slots.slot_end(index)) else {
        return index as f64;
    };

    let slot_seconds = slots.slot_visible_seconds(index);
    if slot_seconds <= 0 {
        log::error!("Slot {} has no visible minutes", index);
        return index as f64;
    }

    let elapsed = slots
        .time_frame()
        .visible_seconds_between(slot_start, instant.min(slot_end));
    index as f64 + (elapsed as f64 / slot_seconds as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ui::ViewType;
    use crate::services::time_slots::generate_time_slots;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn approx(actual: ItemGeometry, left: f64, width: f64) {
        assert!(
            (actual.left - left).abs() < 1e-9 && (actual.width - width).abs() < 1e-9,
            "expected left={} width={}, got {:?}",
            left,
            width,
            actual
        );
    }

    #[test]
    fn item_on_slot_boundaries() {
        let slots = generate_time_slots(at(1, 8, 0), at(1, 11, 0), 60, ViewType::Hours, 1);
        assert_eq!(slots.len(), 3);
        approx(item_geometry(at(1, 8, 0), at(1, 10, 0), 0, &slots), 0.0, 2.0);
    }

    #[test]
    fn item_starting_mid_slot() {
        let slots = generate_time_slots(at(1, 8, 0), at(1, 18, 0), 60, ViewType::Hours, 1);
        approx(item_geometry(at(1, 15, 30), at(1, 17, 30), 7, &slots), 0.5, 2.0);
    }

    #[test]
    fn clipped_to_the_window() {
        let slots = generate_time_slots(at(1, 8, 0), at(1, 18, 0), 60, ViewType::Hours, 1);
        approx(item_geometry(at(1, 6, 0), at(1, 9, 30), 0, &slots), 0.0, 1.5);
        approx(item_geometry(at(1, 16, 45), at(1, 23, 0), 8, &slots), 0.75, 1.25);
    }

    #[test]
    fn hidden_night_hours_are_skipped() {
        let slots = generate_time_slots(at(1, 8, 0), at(2, 18, 0), 60, ViewType::Hours, 1);
        // 17:00-18:00 on day one plus 08:00-09:00 on day two.
        approx(item_geometry(at(1, 17, 0), at(2, 9, 0), 9, &slots), 0.0, 2.0);
        // Ends at midnight: counts to the end of the first day's window.
        approx(item_geometry(at(1, 16, 0), at(2, 0, 0), 8, &slots), 0.0, 2.0);
    }

    #[test]
    fn days_view_uses_window_length() {
        let slots = generate_time_slots(at(1, 8, 0), at(4, 18, 0), 60, ViewType::Days, 1);
        approx(item_geometry(at(1, 13, 0), at(2, 13, 0), 0, &slots), 0.5, 1.0);
    }

    #[test]
    fn wrong_start_slot_is_clamped() {
        let slots = generate_time_slots(at(1, 8, 0), at(1, 18, 0), 60, ViewType::Hours, 1);
        let geometry = item_geometry(at(1, 9, 0), at(1, 10, 0), 5, &slots);
        assert_eq!(geometry.left, 0.0);
        assert!(geometry.width >= 0.0);
    }
}
