use serde::{Deserialize, Serialize};

/// Vertical pixel extent, `top` inclusive and `bottom` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelSpan {
    pub top: f64,
    pub bottom: f64,
}

impl PixelSpan {
    pub fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }

    pub fn intersects(&self, other: &PixelSpan) -> bool {
        self.top < other.bottom && self.bottom > other.top
    }

    pub fn expanded(&self, margin: f64) -> PixelSpan {
        PixelSpan {
            top: self.top - margin,
            bottom: self.bottom + margin,
        }
    }
}

/// Host side of the viewport contract: where the visible area is and where
/// each group's rendered rows or placeholder currently sit.
///
/// Returning `None` means the host has not committed that layout yet.
#[cfg_attr(test, mockall::automock)]
pub trait ViewportProbe {
    fn viewport(&self) -> Option<PixelSpan>;
    fn group_span(&self, group_index: usize) -> Option<PixelSpan>;
}

/// A plain snapshot of committed bounds, the usual probe for hosts that
/// measure once per frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewportSnapshot {
    pub viewport: PixelSpan,
    pub group_spans: Vec<PixelSpan>,
}

impl ViewportSnapshot {
    /// Snapshot of groups stacked top to bottom with the given heights.
    pub fn stacked(viewport: PixelSpan, heights: &[f64]) -> Self {
        let mut top = 0.0;
        let group_spans = heights
            .iter()
            .map(|height| {
                let span = PixelSpan::new(top, top + height);
                top += height;
                span
            })
            .collect();
        Self { viewport, group_spans }
    }
}

impl ViewportProbe for ViewportSnapshot {
    fn viewport(&self) -> Option<PixelSpan> {
        Some(self.viewport)
    }

    fn group_span(&self, group_index: usize) -> Option<PixelSpan> {
        self.group_spans.get(group_index).copied()
    }
}

/// Inclusive `[first, last]` range of group indexes intersecting the
/// (overscanned) viewport. `Err` carries the first group index the probe
/// could not measure yet.
pub(super) fn visible_range(
    probe: &dyn ViewportProbe,
    group_count: usize,
    overscan_px: f64,
) -> Result<Option<(usize, usize)>, usize> {
    let Some(viewport) = probe.viewport() else {
        return Err(0);
    };
    let window = viewport.expanded(overscan_px.max(0.0));

    let mut first = None;
    let mut last = None;
    for index in 0..group_count {
        let Some(span) = probe.group_span(index) else {
            return Err(index);
        };
        if span.intersects(&window) {
            first.get_or_insert(index);
            last = Some(index);
        }
    }

    Ok(first.zip(last))
}
