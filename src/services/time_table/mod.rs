// Time table instance
// Per-instance context tying the grid, placements, selection and scheduler together

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::group::TimeTableGroup;
use crate::models::item::TimeTableItem;
use crate::models::message::{TimeTableIssue, TimeTableMessage};
use crate::models::settings::TimeTableConfig;
use crate::models::time_frame::TimeFrameDay;
use crate::services::placement::{GroupPlacement, PlacementCache};
use crate::services::render_scheduler::{PassStatus, RenderScheduler, ViewportProbe};
use crate::services::selection::{
    SelectionCallback, SelectionInteraction, SelectionOutcome, SelectionStore, SlotSelection,
    TimeRangeSelection,
};
use crate::services::time_slots::{generate_time_slots, TimeSlots};
use crate::utils::date::is_weekend;

mod registry;

pub use registry::TimeTableRegistry;

/// Host veto for interactions on a cell: `(group_id, slot_start, slot_end)`.
pub type CellGuard = Box<dyn Fn(&str, NaiveDateTime, NaiveDateTime) -> bool>;

/// A group together with its current item list. Replace the `Arc` to signal
/// that the items changed.
#[derive(Debug, Clone)]
pub struct GroupEntry<G, I> {
    pub group: G,
    pub items: Arc<Vec<I>>,
}

impl<G, I> GroupEntry<G, I> {
    pub fn new(group: G, items: Vec<I>) -> Self {
        Self {
            group,
            items: Arc::new(items),
        }
    }
}

/// How the host should paint a group right now.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupView<I> {
    Live(Arc<GroupPlacement<I>>),
    Placeholder,
}

impl<I> GroupView<I> {
    pub fn is_live(&self) -> bool {
        matches!(self, GroupView::Live(_))
    }

    pub fn placement(&self) -> Option<&Arc<GroupPlacement<I>>> {
        match self {
            GroupView::Live(placement) => Some(placement),
            GroupView::Placeholder => None,
        }
    }
}

/// Result of one [`TimeTable::tick`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TickReport {
    pub pass: PassStatus,
    pub expanded: Vec<usize>,
    pub collapsed: Vec<usize>,
    pub recomputed: Vec<usize>,
    /// Live group indexes once the scheduler has settled.
    pub settled_live: Option<Vec<usize>>,
}

#[derive(Debug, Serialize)]
pub struct GroupSnapshot<'a, I> {
    pub id: &'a str,
    pub live: bool,
    pub placement: Option<&'a GroupPlacement<I>>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Serialize)]
pub struct RenderSnapshot<'a, I> {
    pub slots: &'a [NaiveDateTime],
    pub time_frame: &'a TimeFrameDay,
    pub live_range: Option<(usize, usize)>,
    pub groups: Vec<GroupSnapshot<'a, I>>,
    pub selection: Option<TimeRangeSelection>,
    pub messages: Vec<TimeTableMessage>,
}

pub struct TimeTable<G, I> {
    config: TimeTableConfig,
    slots: Arc<TimeSlots>,
    groups: Vec<GroupEntry<G, I>>,
    placements: PlacementCache<I>,
    rendered: Vec<Option<Arc<GroupPlacement<I>>>>,
    selection: SelectionStore,
    scheduler: RenderScheduler,
    cell_guard: Option<CellGuard>,
}

impl<G, I> fmt::Debug for TimeTable<G, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeTable")
            .field("config", &self.config)
            .field("slots", &self.slots.len())
            .field("groups", &self.groups.len())
            .field("selection", &self.selection)
            .field("scheduler", &self.scheduler)
            .field("has_cell_guard", &self.cell_guard.is_some())
            .finish()
    }
}

fn build_slots(config: &TimeTableConfig) -> Arc<TimeSlots> {
    Arc::new(generate_time_slots(
        config.start,
        config.end,
        config.step_minutes,
        config.view_type,
        config.first_day_of_week,
    ))
}

impl<G: TimeTableGroup, I: TimeTableItem> TimeTable<G, I> {
    pub fn new(config: TimeTableConfig, groups: Vec<GroupEntry<G, I>>) -> Self {
        let slots = build_slots(&config);
        let mut selection = SelectionStore::new();
        selection.sync_structure(&slots, config.disable_weekend_interactions);
        let scheduler = RenderScheduler::new(
            groups.len(),
            config.render_batch_size,
            config.scheduler.clone(),
        );

        Self {
            rendered: vec![None; groups.len()],
            config,
            slots,
            groups,
            placements: PlacementCache::new(),
            selection,
            scheduler,
            cell_guard: None,
        }
    }

    pub fn config(&self) -> &TimeTableConfig {
        &self.config
    }

    /// The current grid. Pointer identity changes only when it is regenerated.
    pub fn slots(&self) -> &Arc<TimeSlots> {
        &self.slots
    }

    pub fn groups(&self) -> &[GroupEntry<G, I>] {
        &self.groups
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn group_index(&self, group_id: &str) -> Option<usize> {
        self.groups.iter().position(|entry| entry.group.id() == group_id)
    }

    /// Apply a new configuration. Structural changes regenerate the grid,
    /// clear the selection and requeue every live group.
    pub fn set_config(&mut self, config: TimeTableConfig) {
        let structural = self.config.is_structural_change(&config);
        self.scheduler.set_batch_size(config.render_batch_size);
        self.scheduler.set_settings(config.scheduler.clone());
        self.config = config;

        if structural {
            log::info!(
                "Time table range changed to {} - {} ({:?}, {} min)",
                self.config.start,
                self.config.end,
                self.config.view_type,
                self.config.step_minutes
            );
            self.slots = build_slots(&self.config);
            self.placements.clear();
            self.rendered.iter_mut().for_each(|rendered| *rendered = None);
            self.scheduler.invalidate_all();
        }

        self.selection
            .sync_structure(&self.slots, self.config.disable_weekend_interactions);
    }

    /// Install or remove the host's cell guard. Any change clears the selection.
    pub fn set_cell_guard(&mut self, guard: Option<CellGuard>) {
        self.cell_guard = guard;
        self.selection.clear();
    }

    pub fn set_on_selected(&mut self, callback: Option<SelectionCallback>) {
        self.selection.set_on_selected(callback);
    }

    /// Replace the group list. Groups whose item list changed are marked
    /// dirty; unchanged groups keep their placement.
    pub fn set_groups(&mut self, groups: Vec<GroupEntry<G, I>>) {
        let mut dirty = Vec::new();
        let mut moved = Vec::new();
        for (index, entry) in groups.iter().enumerate() {
            let Some(old) = self.groups.get(index) else {
                dirty.push(index);
                continue;
            };
            if old.group.id() != entry.group.id() {
                moved.push(index);
                dirty.push(index);
            } else if !Arc::ptr_eq(&old.items, &entry.items) || old.items.len() != entry.items.len() {
                dirty.push(index);
            }
        }

        self.groups = groups;
        self.placements
            .retain_groups(self.groups.iter().map(|entry| entry.group.id()));
        self.scheduler.resize(self.groups.len());
        self.rendered.resize(self.groups.len(), None);

        // Another group now sits at these rows; its old placement must not be painted.
        for index in moved {
            self.rendered[index] = None;
        }
        for index in dirty {
            self.scheduler.mark_dirty(index);
        }

        let selected_group_gone = self
            .selection
            .selection()
            .is_some_and(|selection| self.group_index(selection.group_id()).is_none());
        if selected_group_gone {
            self.selection.clear();
        }
    }

    /// Replace the items of one group.
    pub fn set_group_items(&mut self, index: usize, items: Arc<Vec<I>>) {
        let Some(entry) = self.groups.get_mut(index) else {
            log::error!("Items for unknown group index {}, ignoring", index);
            return;
        };
        if Arc::ptr_eq(&entry.items, &items) && entry.items.len() == items.len() {
            return;
        }
        entry.items = items;
        self.scheduler.mark_dirty(index);
    }

    pub fn notify_scroll(&mut self, now: Instant) {
        self.scheduler.notify_scroll(now);
    }

    /// Ask for a new range pass, e.g. after group heights changed.
    pub fn request_layout(&mut self) {
        self.scheduler.request_pass();
    }

    /// Run one scheduling step and lay out the groups it selected.
    pub fn tick(&mut self, now: Instant, probe: Option<&dyn ViewportProbe>) -> TickReport {
        let tick = self.scheduler.tick(now, probe);

        for index in tick.collapsed.iter() {
            if let Some(rendered) = self.rendered.get_mut(*index) {
                *rendered = None;
            }
        }
        for index in tick.expanded.iter().chain(tick.recomputed.iter()) {
            self.lay_out_group(*index);
        }

        TickReport {
            pass: tick.pass,
            expanded: tick.expanded,
            collapsed: tick.collapsed,
            recomputed: tick.recomputed,
            settled_live: tick.settled_live,
        }
    }

    fn lay_out_group(&mut self, index: usize) {
        let (Some(entry), Some(rendered)) = (self.groups.get(index), self.rendered.get_mut(index)) else {
            log::error!("Layout requested for unknown group index {}", index);
            return;
        };
        *rendered = Some(
            self.placements
                .placement_for(entry.group.id(), &entry.items, &self.slots),
        );
    }

    pub fn group_view(&self, index: usize) -> GroupView<I> {
        match self.rendered.get(index) {
            Some(Some(placement)) => GroupView::Live(Arc::clone(placement)),
            _ => GroupView::Placeholder,
        }
    }

    pub fn live_groups(&self) -> Vec<usize> {
        self.scheduler.live_groups()
    }

    pub fn live_range(&self) -> Option<(usize, usize)> {
        self.scheduler.live_range()
    }

    /// Whether interactions on `slot` of the group are blocked.
    pub fn is_cell_disabled(&self, group_index: usize, slot: usize) -> bool {
        let (Some(entry), Some(start), Some(end)) = (
            self.groups.get(group_index),
            self.slots.slot_start(slot),
            self.slots.slot_end(slot),
        ) else {
            return true;
        };

        if self.config.disable_weekend_interactions
            && self.config.view_type.is_intraday()
            && is_weekend(start.date())
        {
            return true;
        }

        self.cell_guard
            .as_ref()
            .is_some_and(|guard| guard(entry.group.id(), start, end))
    }

    pub fn click(&mut self, group_index: usize, slot: usize) -> SelectionOutcome {
        self.interact(SelectionInteraction::Click, group_index, slot)
    }

    pub fn drag_move(&mut self, group_index: usize, slot: usize) -> SelectionOutcome {
        self.interact(SelectionInteraction::Drag, group_index, slot)
    }

    pub fn drag_end(&mut self, group_index: usize, slot: usize) -> SelectionOutcome {
        self.interact(SelectionInteraction::DragEnd, group_index, slot)
    }

    fn interact(
        &mut self,
        interaction: SelectionInteraction,
        group_index: usize,
        slot: usize,
    ) -> SelectionOutcome {
        let Some(group_id) = self
            .groups
            .get(group_index)
            .map(|entry| entry.group.id().to_string())
        else {
            log::error!("{:?} on unknown group index {}, ignoring", interaction, group_index);
            return SelectionOutcome::Unchanged;
        };

        if self.is_cell_disabled(group_index, slot) {
            log::debug!("{:?} on disabled cell {}/{}", interaction, group_id, slot);
            return SelectionOutcome::Unchanged;
        }

        self.selection.handle(interaction, &group_id, slot)
    }

    pub fn selection(&self) -> Option<&SlotSelection> {
        self.selection.selection()
    }

    pub fn selected_range(&self) -> Option<TimeRangeSelection> {
        self.selection.selected_range()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Messages for the host: grid problems plus data quality notices of the
    /// groups laid out so far.
    pub fn messages(&self) -> Vec<TimeTableMessage> {
        let mut messages: Vec<TimeTableMessage> = self.slots.message().cloned().into_iter().collect();

        let (outside, degenerate) = self
            .rendered
            .iter()
            .flatten()
            .fold((0, 0), |(outside, degenerate), placement| {
                (
                    outside + placement.items_outside_range.len(),
                    degenerate + placement.items_with_degenerate_range.len(),
                )
            });
        if outside > 0 {
            messages.push(TimeTableIssue::ItemsOutsideRange { count: outside }.into());
        }
        if degenerate > 0 {
            messages.push(TimeTableIssue::ItemsWithDegenerateRange { count: degenerate }.into());
        }
        messages
    }

    pub fn render_snapshot(&self) -> RenderSnapshot<'_, I> {
        RenderSnapshot {
            slots: self.slots.slots(),
            time_frame: self.slots.time_frame(),
            live_range: self.live_range(),
            groups: self
                .groups
                .iter()
                .zip(self.rendered.iter())
                .map(|(entry, rendered)| GroupSnapshot {
                    id: entry.group.id(),
                    live: rendered.is_some(),
                    placement: rendered.as_deref(),
                })
                .collect(),
            selection: self.selected_range(),
            messages: self.messages(),
        }
    }
}

impl<G: TimeTableGroup, I: TimeTableItem + Serialize> TimeTable<G, I> {
    /// The render snapshot as JSON, for hosts that paint out of process.
    pub fn snapshot_json(&self) -> Result<String> {
        serde_json::to_string(&self.render_snapshot()).context("Failed to serialize time table snapshot")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::group::Group;
    use crate::models::item::Booking;
    use crate::models::settings::SchedulerSettings;
    use crate::models::ui::ViewType;
    use crate::services::render_scheduler::{PixelSpan, ViewportSnapshot};
    use chrono::NaiveDate;
    use std::time::Duration;

    // 2023-01-02 is a Monday.
    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn config() -> TimeTableConfig {
        TimeTableConfig {
            start: at(2, 8, 0),
            end: at(8, 18, 0),
            step_minutes: 60,
            view_type: ViewType::Hours,
            render_batch_size: 10,
            scheduler: SchedulerSettings {
                overscan_px: 0.0,
                ..SchedulerSettings::default()
            },
            ..TimeTableConfig::default()
        }
    }

    fn entry(id: &str, items: Vec<Booking>) -> GroupEntry<Group, Booking> {
        GroupEntry::new(Group::new(id, id.to_uppercase()).unwrap(), items)
    }

    fn booking(key: &str, start: NaiveDateTime, end: NaiveDateTime) -> Booking {
        Booking::new(key, key, start, end).unwrap()
    }

    fn table(groups: usize) -> TimeTable<Group, Booking> {
        let entries = (0..groups)
            .map(|i| {
                entry(
                    &format!("g{}", i),
                    vec![booking(&format!("b{}", i), at(2, 9, 0), at(2, 10, 0))],
                )
            })
            .collect();
        TimeTable::new(config(), entries)
    }

    fn view(groups: usize, bottom: f64) -> ViewportSnapshot {
        ViewportSnapshot::stacked(PixelSpan::new(0.0, bottom), &vec![50.0; groups])
    }

    #[test]
    fn tick_lays_out_only_visible_groups() {
        let mut table = table(10);
        let report = table.tick(Instant::now(), Some(&view(10, 100.0)));

        assert_eq!(report.expanded, vec![0, 1]);
        assert_eq!(report.settled_live, Some(vec![0, 1]));
        assert!(table.group_view(0).is_live());
        assert_eq!(table.group_view(5), GroupView::Placeholder);
    }

    #[test]
    fn weekend_cells_are_disabled() {
        let mut table = table(1);
        // Slot 50 is Saturday 2023-01-07 08:00.
        assert!(table.is_cell_disabled(0, 50));
        assert_eq!(table.click(0, 50), SelectionOutcome::Unchanged);
        assert!(table.selection().is_none());

        assert_eq!(table.click(0, 3), SelectionOutcome::Changed);
    }

    #[test]
    fn cell_guard_vetoes_interactions() {
        let mut table = table(2);
        table.set_cell_guard(Some(Box::new(|group_id: &str, start: NaiveDateTime, _end: NaiveDateTime| {
            group_id == "g1" && start.format("%H").to_string() == "12"
        })));

        assert!(table.is_cell_disabled(1, 4));
        assert!(!table.is_cell_disabled(0, 4));
        assert_eq!(table.drag_move(1, 4), SelectionOutcome::Unchanged);
    }

    #[test]
    fn structural_change_resets_selection_and_grid() {
        let mut table = table(2);
        let now = Instant::now();
        table.tick(now, Some(&view(2, 100.0)));
        table.click(0, 2);
        let old_slots = Arc::clone(table.slots());

        table.set_config(TimeTableConfig {
            step_minutes: 30,
            ..config()
        });

        assert!(!Arc::ptr_eq(&old_slots, table.slots()));
        assert!(table.selection().is_none());
        assert_eq!(table.group_view(0), GroupView::Placeholder);

        let report = table.tick(now + Duration::from_millis(100), Some(&view(2, 100.0)));
        assert_eq!(report.recomputed, vec![0, 1]);
        let placement = table.group_view(0).placement().cloned().unwrap();
        assert_eq!(placement.rows[0][0].start_slot, 2);
    }

    #[test]
    fn batch_size_change_is_not_structural() {
        let mut table = table(2);
        table.click(0, 2);
        let old_slots = Arc::clone(table.slots());

        table.set_config(TimeTableConfig {
            render_batch_size: 1,
            ..config()
        });

        assert!(Arc::ptr_eq(&old_slots, table.slots()));
        assert!(table.selection().is_some());
    }

    #[test]
    fn changed_items_recompute_only_their_group() {
        let mut table = table(3);
        let now = Instant::now();
        table.tick(now, Some(&view(3, 500.0)));
        let untouched = table.group_view(0).placement().cloned().unwrap();

        table.set_group_items(
            2,
            Arc::new(vec![
                booking("x", at(2, 9, 0), at(2, 11, 0)),
                booking("y", at(2, 10, 0), at(2, 12, 0)),
            ]),
        );
        let report = table.tick(now, Some(&view(3, 500.0)));

        assert_eq!(report.recomputed, vec![2]);
        assert!(Arc::ptr_eq(&untouched, table.group_view(0).placement().unwrap()));
        assert_eq!(table.group_view(2).placement().unwrap().row_count(), 2);
    }

    #[test]
    fn reordered_groups_never_show_another_groups_rows() {
        let mut table = TimeTable::new(
            TimeTableConfig {
                render_batch_size: 1,
                ..config()
            },
            vec![
                entry(
                    "busy",
                    vec![
                        booking("a", at(2, 9, 0), at(2, 10, 0)),
                        booking("b", at(2, 9, 0), at(2, 11, 0)),
                    ],
                ),
                entry("quiet", Vec::new()),
            ],
        );
        let now = Instant::now();
        table.tick(now, Some(&view(2, 100.0)));
        table.tick(now, Some(&view(2, 100.0)));
        assert_eq!(table.group_view(0).placement().unwrap().placed_count(), 2);

        let swapped = vec![table.groups()[1].clone(), table.groups()[0].clone()];
        table.set_groups(swapped);

        assert_eq!(table.group_view(0), GroupView::Placeholder);
        assert_eq!(table.group_view(1), GroupView::Placeholder);

        let report = table.tick(now, Some(&view(2, 100.0)));
        assert_eq!(report.recomputed, vec![0]);
        assert_eq!(table.group_view(0).placement().unwrap().placed_count(), 0);
        table.tick(now, Some(&view(2, 100.0)));
        assert_eq!(table.group_view(1).placement().unwrap().placed_count(), 2);
    }

    #[test]
    fn removing_the_selected_group_clears_selection() {
        let mut table = table(2);
        table.click(1, 2);
        let keep = table.groups()[0].clone();

        table.set_groups(vec![keep]);

        assert!(table.selection().is_none());
        assert_eq!(table.group_count(), 1);
    }

    #[test]
    fn messages_aggregate_live_groups() {
        let mut table = TimeTable::new(
            config(),
            vec![
                entry("a", vec![booking("early", at(1, 9, 0), at(1, 10, 0))]),
                entry("b", vec![booking("empty", at(2, 9, 0), at(2, 9, 0))]),
            ],
        );
        table.tick(Instant::now(), Some(&view(2, 100.0)));

        let keys: Vec<&str> = table.messages().iter().map(|m| m.message_key()).collect();
        assert_eq!(
            keys,
            vec!["timetable.itemsOutsideTimeFrame", "timetable.itemsWithSameStartAndEnd"]
        );
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut table = table(2);
        table.tick(Instant::now(), Some(&view(2, 50.0)));
        table.click(0, 1);

        let json: serde_json::Value = serde_json::from_str(&table.snapshot_json().unwrap()).unwrap();

        assert_eq!(json["groups"][0]["live"], true);
        assert_eq!(json["groups"][1]["live"], false);
        assert_eq!(json["selection"]["start"], "2023-01-02T09:00:00");
        assert_eq!(json["time_frame"]["one_day_minutes"], 600);
    }
}
