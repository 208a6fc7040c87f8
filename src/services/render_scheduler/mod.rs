// Viewport render scheduler
// Decides which groups are fully laid out and which stay placeholders

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::models::settings::SchedulerSettings;

mod viewport;

#[cfg(test)]
pub use viewport::MockViewportProbe;
pub use viewport::{PixelSpan, ViewportProbe, ViewportSnapshot};

/// Pending change of one group's render state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Expand,
    Collapse,
    Recompute,
}

/// What happened to the range pass during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassStatus {
    /// Nothing requested a pass.
    #[default]
    Idle,
    /// A pass is requested but the quiet period or idle gap has not elapsed.
    Waiting,
    /// The probe could not measure everything yet; retried next tick.
    Deferred,
    Ran,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SchedulerTick {
    pub pass: PassStatus,
    pub expanded: Vec<usize>,
    pub collapsed: Vec<usize>,
    pub recomputed: Vec<usize>,
    /// Live groups, reported once all pending transitions are applied.
    pub settled_live: Option<Vec<usize>>,
}

impl SchedulerTick {
    pub fn applied_count(&self) -> usize {
        self.expanded.len() + self.collapsed.len() + self.recomputed.len()
    }
}

#[derive(Debug)]
pub struct RenderScheduler {
    settings: SchedulerSettings,
    batch_size: usize,
    group_count: usize,
    live: BTreeSet<usize>,
    target: Option<(usize, usize)>,
    pending: BTreeMap<usize, Transition>,
    dirty_placeholders: BTreeSet<usize>,
    needs_pass: bool,
    last_scroll_at: Option<Instant>,
    last_pass_at: Option<Instant>,
    passes: u64,
}

impl RenderScheduler {
    pub fn new(group_count: usize, batch_size: usize, settings: SchedulerSettings) -> Self {
        Self {
            settings,
            batch_size: batch_size.max(1),
            group_count,
            live: BTreeSet::new(),
            target: None,
            pending: BTreeMap::new(),
            dirty_placeholders: BTreeSet::new(),
            needs_pass: true,
            last_scroll_at: None,
            last_pass_at: None,
            passes: 0,
        }
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size.max(1);
    }

    pub fn set_settings(&mut self, settings: SchedulerSettings) {
        self.settings = settings;
    }

    /// Number of range passes run so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn is_live(&self, index: usize) -> bool {
        self.live.contains(&index)
    }

    pub fn live_groups(&self) -> Vec<usize> {
        self.live.iter().copied().collect()
    }

    /// Range chosen by the last pass; groups converge to it batch by batch.
    pub fn live_range(&self) -> Option<(usize, usize)> {
        self.target
    }

    pub fn is_dirty(&self, index: usize) -> bool {
        self.dirty_placeholders.contains(&index)
            || self.pending.get(&index) == Some(&Transition::Recompute)
    }

    pub fn has_pending_work(&self) -> bool {
        self.needs_pass || !self.pending.is_empty()
    }

    pub fn notify_scroll(&mut self, now: Instant) {
        self.last_scroll_at = Some(now);
        self.needs_pass = true;
    }

    /// Ask for a range pass without a scroll event (group heights changed).
    pub fn request_pass(&mut self) {
        self.needs_pass = true;
    }

    /// Item data of a group changed.
    pub fn mark_dirty(&mut self, index: usize) {
        if index >= self.group_count {
            log::error!(
                "Dirty marker for unknown group {} of {}, ignoring",
                index,
                self.group_count
            );
            return;
        }

        match self.pending.get(&index) {
            // Expansion computes from scratch anyway.
            Some(Transition::Expand) | Some(Transition::Recompute) => {}
            Some(Transition::Collapse) => {
                self.dirty_placeholders.insert(index);
            }
            None if self.live.contains(&index) => {
                self.pending.insert(index, Transition::Recompute);
            }
            None => {
                self.dirty_placeholders.insert(index);
            }
        }
    }

    /// The group list changed length. State for removed groups is dropped.
    pub fn resize(&mut self, group_count: usize) {
        if group_count == self.group_count {
            return;
        }

        log::debug!("Group count {} -> {}", self.group_count, group_count);
        self.group_count = group_count;
        self.live.retain(|index| *index < group_count);
        self.pending.retain(|index, _| *index < group_count);
        self.dirty_placeholders.retain(|index| *index < group_count);
        self.target = self.target.and_then(|(first, last)| {
            let last_index = group_count.checked_sub(1)?;
            (first <= last_index).then(|| (first, last.min(last_index)))
        });
        self.needs_pass = true;
    }

    /// The slot grid changed: every live group must be laid out again and
    /// queued recomputations for the old grid are obsolete.
    pub fn invalidate_all(&mut self) {
        self.pending.retain(|_, transition| *transition != Transition::Recompute);
        self.dirty_placeholders.clear();
        for index in &self.live {
            self.pending.entry(*index).or_insert(Transition::Recompute);
        }
        self.needs_pass = true;
    }

    /// Run one scheduling step: a range pass if one is due, then at most
    /// `batch_size` transitions in ascending group order.
    pub fn tick(&mut self, now: Instant, probe: Option<&dyn ViewportProbe>) -> SchedulerTick {
        let mut tick = SchedulerTick {
            pass: self.run_pass_if_due(now, probe),
            ..SchedulerTick::default()
        };

        let batch: Vec<(usize, Transition)> = self
            .pending
            .iter()
            .take(self.batch_size)
            .map(|(index, transition)| (*index, *transition))
            .collect();

        for (index, transition) in batch {
            self.pending.remove(&index);
            match transition {
                Transition::Expand => {
                    self.live.insert(index);
                    self.dirty_placeholders.remove(&index);
                    tick.expanded.push(index);
                }
                Transition::Collapse => {
                    self.live.remove(&index);
                    tick.collapsed.push(index);
                }
                Transition::Recompute => tick.recomputed.push(index),
            }
        }

        let did_work = tick.pass == PassStatus::Ran || tick.applied_count() > 0;
        if did_work && self.pending.is_empty() {
            let live = self.live_groups();
            log::debug!("Render batch settled, live groups {:?}", live);
            tick.settled_live = Some(live);
        }

        tick
    }

    fn run_pass_if_due(&mut self, now: Instant, probe: Option<&dyn ViewportProbe>) -> PassStatus {
        if !self.needs_pass {
            return PassStatus::Idle;
        }

        let debounce = Duration::from_millis(self.settings.debounce_ms);
        if self
            .last_scroll_at
            .is_some_and(|last| now.saturating_duration_since(last) < debounce)
        {
            return PassStatus::Waiting;
        }

        let idle_interval = Duration::from_millis(self.settings.idle_interval_ms);
        if self
            .last_pass_at
            .is_some_and(|last| now.saturating_duration_since(last) < idle_interval)
        {
            return PassStatus::Waiting;
        }

        let Some(probe) = probe else {
            log::debug!("No viewport probe yet, deferring render pass");
            return PassStatus::Deferred;
        };

        match viewport::visible_range(probe, self.group_count, self.settings.overscan_px) {
            Err(missing) => {
                log::debug!("Bounds of group {} not committed, deferring render pass", missing);
                PassStatus::Deferred
            }
            Ok(range) => {
                self.apply_range(range);
                self.needs_pass = false;
                self.last_pass_at = Some(now);
                self.passes += 1;
                PassStatus::Ran
            }
        }
    }

    fn apply_range(&mut self, range: Option<(usize, usize)>) {
        self.target = range;
        let desired: BTreeSet<usize> = range
            .map(|(first, last)| (first..=last).collect())
            .unwrap_or_default();

        let mut next = BTreeMap::new();
        for index in &desired {
            if !self.live.contains(index) {
                next.insert(*index, Transition::Expand);
            } else if self.pending.get(index) == Some(&Transition::Recompute)
                || self.dirty_placeholders.remove(index)
            {
                next.insert(*index, Transition::Recompute);
            }
        }
        for index in self.live.difference(&desired) {
            if self.pending.get(index) == Some(&Transition::Recompute) {
                self.dirty_placeholders.insert(*index);
            }
            next.insert(*index, Transition::Collapse);
        }

        log::debug!(
            "Render range {:?}: {} transition(s) queued",
            range,
            next.len()
        );
        self.pending = next;
    }
}
