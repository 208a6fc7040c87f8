use std::collections::HashMap;
use std::sync::Arc;

use super::{place_group_items, GroupPlacement};
use crate::models::item::TimeTableItem;
use crate::services::time_slots::TimeSlots;

struct CachedPlacement<I> {
    items: Arc<Vec<I>>,
    len: usize,
    placement: Arc<GroupPlacement<I>>,
}

/// Per-instance memo of group placements.
///
/// A group is laid out again only when its item list changes by pointer or
/// length; otherwise the previous `Arc` is handed back so hosts can skip
/// repainting by comparing pointers. A new slot grid drops everything.
pub struct PlacementCache<I> {
    slots: Option<Arc<TimeSlots>>,
    entries: HashMap<String, CachedPlacement<I>>,
    computations: u64,
}

impl<I> Default for PlacementCache<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> std::fmt::Debug for PlacementCache<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacementCache")
            .field("groups", &self.entries.len())
            .field("computations", &self.computations)
            .finish()
    }
}

impl<I> PlacementCache<I> {
    pub fn new() -> Self {
        Self {
            slots: None,
            entries: HashMap::new(),
            computations: 0,
        }
    }

    /// Number of times the placement engine actually ran.
    pub fn computations(&self) -> u64 {
        self.computations
    }

    pub fn contains(&self, group_id: &str) -> bool {
        self.entries.contains_key(group_id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.slots = None;
    }

    /// Forget groups that are no longer part of the table.
    pub fn retain_groups<'a>(&mut self, group_ids: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::HashSet<&str> = group_ids.into_iter().collect();
        self.entries.retain(|id, _| keep.contains(id.as_str()));
    }
}

impl<I: TimeTableItem> PlacementCache<I> {
    /// Cached placement for a group, computing it if the items or the grid
    /// changed since the last call.
    pub fn placement_for(
        &mut self,
        group_id: &str,
        items: &Arc<Vec<I>>,
        slots: &Arc<TimeSlots>,
    ) -> Arc<GroupPlacement<I>> {
        let same_grid = self
            .slots
            .as_ref()
            .is_some_and(|cached| Arc::ptr_eq(cached, slots));
        if !same_grid {
            if !self.entries.is_empty() {
                log::debug!("Slot grid changed, dropping {} cached placements", self.entries.len());
            }
            self.entries.clear();
            self.slots = Some(Arc::clone(slots));
        }

        if let Some(cached) = self.entries.get(group_id) {
            if Arc::ptr_eq(&cached.items, items) && cached.len == items.len() {
                return Arc::clone(&cached.placement);
            }
        }

        let placement = Arc::new(place_group_items(items, slots));
        self.computations += 1;
        self.entries.insert(
            group_id.to_string(),
            CachedPlacement {
                items: Arc::clone(items),
                len: items.len(),
                placement: Arc::clone(&placement),
            },
        );
        placement
    }

    /// Whether `placement_for` would recompute this group.
    pub fn is_stale(&self, group_id: &str, items: &Arc<Vec<I>>, slots: &Arc<TimeSlots>) -> bool {
        let same_grid = self
            .slots
            .as_ref()
            .is_some_and(|cached| Arc::ptr_eq(cached, slots));
        match self.entries.get(group_id) {
            Some(cached) if same_grid => {
                !Arc::ptr_eq(&cached.items, items) || cached.len != items.len()
            }
            _ => true,
        }
    }
}
