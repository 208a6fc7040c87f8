// Selection state machine
// Contiguous slot selection of one group, driven by click and drag events

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::message::{TimeTableIssue, TimeTableMessage};
use crate::services::time_slots::TimeSlots;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionInteraction {
    Click,
    Drag,
    DragEnd,
}

/// Selected slots of one group, always ascending and contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSelection {
    group_id: String,
    slots: Vec<usize>,
}

impl SlotSelection {
    fn single(group_id: &str, slot: usize) -> Self {
        Self::spanning(group_id, slot, slot)
    }

    fn spanning(group_id: &str, from: usize, to: usize) -> Self {
        Self {
            group_id: group_id.to_string(),
            slots: (from.min(to)..=from.max(to)).collect(),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    pub fn first_slot(&self) -> usize {
        self.slots[0]
    }

    pub fn last_slot(&self) -> usize {
        self.slots[self.slots.len() - 1]
    }

    pub fn contains(&self, slot: usize) -> bool {
        self.first_slot() <= slot && slot <= self.last_slot()
    }
}

/// Time range covered by a finished selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRangeSelection {
    pub group_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The selection changed (including becoming idle).
    Changed,
    Unchanged,
    /// The interaction is not allowed; the message explains why.
    Rejected(TimeTableMessage),
}

/// Callback receiving a finished drag selection. Returning `true` clears it.
pub type SelectionCallback = Box<dyn FnMut(&TimeRangeSelection) -> bool>;

pub struct SelectionStore {
    selection: Option<SlotSelection>,
    /// Anchor slot while a drag is in progress.
    drag_anchor: Option<usize>,
    on_selected: Option<SelectionCallback>,
    slots: Option<Arc<TimeSlots>>,
    interactions_disabled: bool,
}

impl fmt::Debug for SelectionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionStore")
            .field("selection", &self.selection)
            .field("drag_anchor", &self.drag_anchor)
            .field("has_callback", &self.on_selected.is_some())
            .field("interactions_disabled", &self.interactions_disabled)
            .finish()
    }
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionStore {
    pub fn new() -> Self {
        Self {
            selection: None,
            drag_anchor: None,
            on_selected: None,
            slots: None,
            interactions_disabled: false,
        }
    }

    pub fn set_on_selected(&mut self, callback: Option<SelectionCallback>) {
        self.on_selected = callback;
    }

    pub fn selection(&self) -> Option<&SlotSelection> {
        self.selection.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.selection.is_none()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    pub fn clear(&mut self) {
        self.selection = None;
        self.drag_anchor = None;
    }

    /// Adopt the current grid and interaction flag. Any change forces the
    /// machine back to idle; returns whether a selection was dropped.
    pub fn sync_structure(&mut self, slots: &Arc<TimeSlots>, interactions_disabled: bool) -> bool {
        let same_grid = self
            .slots
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, slots));
        if same_grid && self.interactions_disabled == interactions_disabled {
            return false;
        }

        self.slots = Some(Arc::clone(slots));
        self.interactions_disabled = interactions_disabled;
        let had_selection = self.selection.is_some();
        self.clear();
        if had_selection {
            log::debug!("Structure changed, selection cleared");
        }
        had_selection
    }

    /// Time range of the current selection.
    pub fn selected_range(&self) -> Option<TimeRangeSelection> {
        let selection = self.selection.as_ref()?;
        let slots = self.slots.as_ref()?;
        Some(TimeRangeSelection {
            group_id: selection.group_id.clone(),
            start: slots.slot_start(selection.first_slot())?,
            end: slots.slot_end(selection.last_slot())?,
        })
    }

    pub fn handle(
        &mut self,
        interaction: SelectionInteraction,
        group_id: &str,
        slot: usize,
    ) -> SelectionOutcome {
        let slot_count = self.slots.as_ref().map_or(0, |slots| slots.len());
        if slot >= slot_count {
            log::error!(
                "Selection event for slot {} outside of {} slots, ignoring",
                slot,
                slot_count
            );
            return SelectionOutcome::Unchanged;
        }

        match interaction {
            SelectionInteraction::Click => self.click(group_id, slot),
            SelectionInteraction::Drag => self.drag(group_id, slot),
            SelectionInteraction::DragEnd => self.drag_end(group_id, slot),
        }
    }

    fn click(&mut self, group_id: &str, slot: usize) -> SelectionOutcome {
        self.drag_anchor = None;

        let Some(current) = self.selection.as_mut().filter(|s| s.group_id == group_id) else {
            self.selection = Some(SlotSelection::single(group_id, slot));
            return SelectionOutcome::Changed;
        };

        let (first, last) = (current.first_slot(), current.last_slot());

        if current.contains(slot) {
            let is_boundary = slot == first || slot == last;
            if !is_boundary {
                return SelectionOutcome::Rejected(TimeTableIssue::DeselectFromOuterBorder.into());
            }
            if current.slots.len() <= 2 {
                self.selection = None;
            } else if slot == first {
                current.slots.remove(0);
            } else {
                current.slots.pop();
            }
            return SelectionOutcome::Changed;
        }

        if slot + 1 == first {
            current.slots.insert(0, slot);
        } else if slot == last + 1 {
            current.slots.push(slot);
        } else {
            self.selection = Some(SlotSelection::single(group_id, slot));
        }
        SelectionOutcome::Changed
    }

    fn drag(&mut self, group_id: &str, slot: usize) -> SelectionOutcome {
        let anchor = match self.drag_anchor {
            Some(anchor) => anchor,
            None => {
                self.drag_anchor = Some(slot);
                self.selection = Some(SlotSelection::single(group_id, slot));
                return SelectionOutcome::Changed;
            }
        };

        let same_group = self
            .selection
            .as_ref()
            .is_some_and(|selection| selection.group_id == group_id);
        if !same_group {
            log::debug!("Drag left group, ignoring slot {} of {}", slot, group_id);
            return SelectionOutcome::Unchanged;
        }

        let next = SlotSelection::spanning(group_id, anchor, slot);
        if self.selection.as_ref() == Some(&next) {
            return SelectionOutcome::Unchanged;
        }
        self.selection = Some(next);
        SelectionOutcome::Changed
    }

    fn drag_end(&mut self, group_id: &str, slot: usize) -> SelectionOutcome {
        let mut outcome = SelectionOutcome::Unchanged;
        let finished_drag = self.drag_anchor.is_some();
        if finished_drag {
            // A release over another group leaves the run as it is.
            outcome = self.drag(group_id, slot);
            self.drag_anchor = None;
        }

        let Some(range) = self
            .selected_range()
            .filter(|range| finished_drag || range.group_id == group_id)
        else {
            return outcome;
        };

        if let Some(callback) = self.on_selected.as_mut() {
            if callback(&range) {
                self.selection = None;
                return SelectionOutcome::Changed;
            }
        }
        outcome
    }
}
