// Property-based tests for slot generation, packing and selection
// Random ranges, steps and item sets must keep the layout invariants

mod fixtures;

use std::sync::Arc;

use chrono::Duration;
use fixtures::{bookings, dates};
use proptest::prelude::*;
use time_table_engine::models::item::{Booking, TimeTableItem};
use time_table_engine::models::ui::ViewType;
use time_table_engine::services::placement::{place_group_items, ItemStatus};
use time_table_engine::services::selection::{SelectionInteraction, SelectionStore};
use time_table_engine::services::time_slots::generate_time_slots;

fn view_type() -> impl Strategy<Value = ViewType> {
    prop_oneof![
        Just(ViewType::Hours),
        Just(ViewType::Days),
        Just(ViewType::Weeks),
        Just(ViewType::Months),
        Just(ViewType::Years),
    ]
}

/// Bookings within the first week of 2023, some of them zero length.
fn booking_set() -> impl Strategy<Value = Vec<Booking>> {
    prop::collection::vec((0..7 * 24 * 4i64, 0..16i64), 0..30).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (start_quarter, quarters))| {
                let start = dates::jan_1_2023(0, 0) + Duration::minutes(start_quarter * 15);
                bookings::booking(&format!("b{}", i), start, start + Duration::minutes(quarters * 15))
            })
            .collect()
    })
}

proptest! {
    /// Property: a valid range always yields a non-empty, strictly increasing grid
    #[test]
    fn prop_slots_strictly_increase(
        start_hour in 0..23u32,
        length_hours in 1..200i64,
        step in 1..240i64,
        view in view_type(),
    ) {
        let start = dates::jan_1_2023(start_hour, 0);
        let end = start + Duration::hours(length_hours);
        let slots = generate_time_slots(start, end, step, view, 1);

        prop_assert!(!slots.is_empty());
        prop_assert!(slots.slots().windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert!(slots.slots().iter().all(|slot| *slot < end));
    }

    /// Property: hour slots tile every visible day exactly
    #[test]
    fn prop_hour_step_divides_the_day(start_hour in 0..23u32, end_hour in 1..24u32, step in 1..300i64) {
        prop_assume!(end_hour > start_hour);
        let slots = generate_time_slots(
            dates::monday(start_hour, 0),
            dates::monday(end_hour, 0),
            step,
            ViewType::Hours,
            1,
        );

        let one_day = slots.time_frame().one_day_minutes;
        prop_assert_eq!(one_day % slots.slot_minutes(), 0);
        prop_assert!(slots.slot_minutes() <= step);
        prop_assert_eq!(slots.message().is_some(), one_day % step != 0);
    }

    /// Property: items sharing a row never overlap
    #[test]
    fn prop_rows_never_overlap(items in booking_set(), step in prop::sample::select(vec![15i64, 30, 60, 120])) {
        let slots = generate_time_slots(dates::monday(8, 0), dates::at(2023, 1, 6, 18, 0), step, ViewType::Hours, 1);
        let placement = place_group_items(&items, &slots);

        for row in &placement.rows {
            for (i, a) in row.iter().enumerate() {
                for b in row.iter().skip(i + 1) {
                    prop_assert!(!a.item.overlaps(&b.item));
                }
            }
            prop_assert!(row.windows(2).all(|pair| pair[0].item.start() <= pair[1].item.start()));
        }

        let accounted = placement.placed_count()
            + placement.items_outside_range.len()
            + placement.items_with_degenerate_range.len();
        prop_assert_eq!(accounted, items.len());
    }

    /// Property: placed entries sit inside the grid with non-negative geometry
    #[test]
    fn prop_geometry_is_non_negative(items in booking_set()) {
        let slots = generate_time_slots(dates::monday(8, 0), dates::at(2023, 1, 6, 18, 0), 60, ViewType::Hours, 1);
        let placement = place_group_items(&items, &slots);

        for entry in placement.rows.iter().flatten() {
            prop_assert_eq!(entry.status, ItemStatus::In);
            prop_assert!(entry.start_slot <= entry.end_slot);
            prop_assert!(entry.end_slot < slots.len());
            prop_assert!(entry.geometry.left >= 0.0);
            prop_assert!(entry.geometry.width >= 0.0);
        }
    }

    /// Property: packing the same input twice gives the same rows
    #[test]
    fn prop_packing_is_deterministic(items in booking_set()) {
        let slots = Arc::new(generate_time_slots(dates::jan_1_2023(0, 0), dates::at(2023, 1, 8, 0, 0), 60, ViewType::Hours, 1));
        prop_assert_eq!(place_group_items(&items, &slots), place_group_items(&items, &slots));
    }

    /// Property: whatever the clicks, the selection stays one contiguous run
    #[test]
    fn prop_selection_stays_contiguous(
        events in prop::collection::vec((0..3u8, 0..10usize), 1..40),
    ) {
        let slots = Arc::new(generate_time_slots(dates::monday(8, 0), dates::monday(18, 0), 60, ViewType::Hours, 1));
        let mut store = SelectionStore::new();
        store.sync_structure(&slots, false);

        for (kind, slot) in events {
            let interaction = match kind {
                0 => SelectionInteraction::Click,
                1 => SelectionInteraction::Drag,
                _ => SelectionInteraction::DragEnd,
            };
            store.handle(interaction, "room", slot);

            if let Some(selection) = store.selection() {
                let run = selection.slots();
                prop_assert!(!run.is_empty());
                prop_assert!(run.windows(2).all(|pair| pair[1] == pair[0] + 1));
            }
        }
    }
}
