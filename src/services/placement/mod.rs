// Item placement engine
// Classifies one group's items against the slot grid and packs them into rows

use serde::Serialize;

use crate::models::item::TimeTableItem;
use crate::models::message::{TimeTableIssue, TimeTableMessage};
use crate::services::geometry::{item_geometry, ItemGeometry};
use crate::services::time_slots::TimeSlots;

mod cache;

pub use cache::PlacementCache;

/// Where an item lies relative to the visible time frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Before,
    In,
    After,
}

/// Slot span of one item. `end_slot` is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotSpan {
    pub start_slot: usize,
    pub end_slot: usize,
    pub status: ItemStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRowEntry<I> {
    pub item: I,
    pub start_slot: usize,
    pub end_slot: usize,
    pub status: ItemStatus,
    pub geometry: ItemGeometry,
}

impl<I> ItemRowEntry<I> {
    /// Number of slots the entry touches.
    pub fn slot_count(&self) -> usize {
        self.end_slot + 1 - self.start_slot
    }
}

/// Row stack of one group plus the items that could not be placed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupPlacement<I> {
    pub rows: Vec<Vec<ItemRowEntry<I>>>,
    pub items_outside_range: Vec<I>,
    pub items_with_degenerate_range: Vec<I>,
}

impl<I> Default for GroupPlacement<I> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            items_outside_range: Vec::new(),
            items_with_degenerate_range: Vec::new(),
        }
    }
}

impl<I> GroupPlacement<I> {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn placed_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Data quality notices for the host, at most one per kind.
    pub fn messages(&self) -> Vec<TimeTableMessage> {
        let mut messages = Vec::new();
        if !self.items_outside_range.is_empty() {
            messages.push(
                TimeTableIssue::ItemsOutsideRange {
                    count: self.items_outside_range.len(),
                }
                .into(),
            );
        }
        if !self.items_with_degenerate_range.is_empty() {
            messages.push(
                TimeTableIssue::ItemsWithDegenerateRange {
                    count: self.items_with_degenerate_range.len(),
                }
                .into(),
            );
        }
        messages
    }
}

/// Classify an item against the grid.
///
/// `Before`/`After` mean nothing of the item is visible: it ends before the
/// grid starts, starts after it ends, or sits in the hidden part of a day.
/// Callers filter degenerate items first.
pub fn classify_item<I: TimeTableItem>(item: &I, slots: &TimeSlots) -> SlotSpan {
    let outside = |status| SlotSpan {
        start_slot: 0,
        end_slot: 0,
        status,
    };

    let (Some(range_start), Some(range_end)) = (slots.range_start(), slots.range_end()) else {
        return outside(ItemStatus::After);
    };

    if item.end() <= range_start {
        return outside(ItemStatus::Before);
    }
    if item.start() >= range_end {
        let last = slots.len() - 1;
        return SlotSpan {
            start_slot: last,
            end_slot: last,
            status: ItemStatus::After,
        };
    }

    let time_frame = slots.time_frame();
    let clipped_start = time_frame.clip_start(item.start()).max(range_start);
    let clipped_end = time_frame.clip_end(item.end()).min(range_end);

    if clipped_end <= clipped_start {
        let status = if time_frame.is_before_window(item.start()) {
            ItemStatus::Before
        } else {
            ItemStatus::After
        };
        let anchor = slots.last_slot_at_or_before(item.start()).unwrap_or(0);
        return SlotSpan {
            start_slot: anchor,
            end_slot: anchor,
            status,
        };
    }

    let start_slot = slots.last_slot_at_or_before(clipped_start).unwrap_or(0);
    let end_slot = slots
        .last_slot_before(clipped_end)
        .unwrap_or(start_slot)
        .max(start_slot);

    SlotSpan {
        start_slot,
        end_slot,
        status: ItemStatus::In,
    }
}

/// Lay out one group's items.
///
/// Packing is greedy first-fit in the given item order: each item goes into
/// the first row (in creation order) where it overlaps nothing, otherwise a
/// new row is opened. Rows are sorted by start afterwards, which never moves
/// an item to another row.
pub fn place_group_items<I: TimeTableItem>(items: &[I], slots: &TimeSlots) -> GroupPlacement<I> {
    let mut placement = GroupPlacement::default();

    if slots.is_empty() {
        return placement;
    }

    for item in items {
        if item.has_degenerate_range() {
            if item.end() < item.start() {
                log::warn!("Item {:?} ends before it starts", item.key());
            }
            placement.items_with_degenerate_range.push(item.clone());
            continue;
        }

        let span = classify_item(item, slots);
        if span.status != ItemStatus::In {
            placement.items_outside_range.push(item.clone());
            continue;
        }

        let entry = ItemRowEntry {
            item: item.clone(),
            start_slot: span.start_slot,
            end_slot: span.end_slot,
            status: span.status,
            geometry: item_geometry(item.start(), item.end(), span.start_slot, slots),
        };

        let free_row = placement
            .rows
            .iter_mut()
            .find(|row| !row.iter().any(|other| other.item.overlaps(item)));
        match free_row {
            Some(row) => row.push(entry),
            None => placement.rows.push(vec![entry]),
        }
    }

    for row in &mut placement.rows {
        row.sort_by_key(|entry| entry.item.start());
    }

    if !placement.items_outside_range.is_empty() || !placement.items_with_degenerate_range.is_empty() {
        log::info!(
            "{} item(s) outside the time frame, {} with an empty range",
            placement.items_outside_range.len(),
            placement.items_with_degenerate_range.len()
        );
    }

    placement
}
