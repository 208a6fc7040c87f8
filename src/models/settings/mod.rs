// Settings module
// Host configuration of one time table instance

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::ui::ViewType;

pub const DEFAULT_RENDER_BATCH_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeTableConfig {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub step_minutes: i64,
    pub view_type: ViewType,
    pub disable_weekend_interactions: bool,
    pub render_batch_size: usize,
    /// 0 = Sunday, 1 = Monday, ...
    pub first_day_of_week: u8,
    pub scheduler: SchedulerSettings,
}

impl Default for TimeTableConfig {
    fn default() -> Self {
        let epoch = NaiveDateTime::default();
        Self {
            start: epoch + Duration::hours(8),
            end: epoch + Duration::hours(18),
            step_minutes: 30,
            view_type: ViewType::Hours,
            disable_weekend_interactions: true,
            render_batch_size: DEFAULT_RENDER_BATCH_SIZE,
            first_day_of_week: 1,
            scheduler: SchedulerSettings::default(),
        }
    }
}

/// Timing of the viewport render scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Quiet period after the last scroll event before a pass runs.
    pub debounce_ms: u64,
    /// Minimum gap between two passes.
    pub idle_interval_ms: u64,
    /// Extra pixels above and below the viewport treated as visible.
    pub overscan_px: f64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            idle_interval_ms: 16,
            overscan_px: 200.0,
        }
    }
}

impl TimeTableConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("Failed to parse time table config")?;
        if config.render_batch_size == 0 {
            log::warn!("render_batch_size of 0 would stall rendering, using 1");
            return Ok(Self {
                render_batch_size: 1,
                ..config
            });
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read time table config {:?}", path))?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize time table config")
    }

    /// Whether a change from `self` to `other` regenerates the slot array.
    pub fn is_structural_change(&self, other: &Self) -> bool {
        self.start != other.start
            || self.end != other.end
            || self.step_minutes != other.step_minutes
            || self.view_type != other.view_type
            || self.first_day_of_week != other.first_day_of_week
    }
}
