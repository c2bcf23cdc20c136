//! Bubble chart scaling
//!
//! Fixation durations map to bubble radii through a multiplier chosen so the
//! longest fixation in view is `radius_scale` wider than the shortest.
//! Degenerate inputs (no records, or all durations equal) yield the sentinel
//! instead of a division by zero.

use serde::Serialize;

use crate::config::{MetricsConfig, DEFAULT_CLICK_RADIUS, DEFAULT_RADIUS_SCALE};
use crate::types::{EventRecord, FixationRecord};

/// Marks a value that could not be computed from degenerate input
pub const DEGENERATE_SENTINEL: f64 = f64::INFINITY;

pub fn is_degenerate(value: f64) -> bool {
    value == DEGENERATE_SENTINEL
}

/// Radius scaling parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BubbleScale {
    pub radius_scale: f64,
    /// Radius factor for mouse clicks, relative to the multiplier
    pub click_radius: f64,
}

impl Default for BubbleScale {
    fn default() -> Self {
        Self {
            radius_scale: DEFAULT_RADIUS_SCALE,
            click_radius: DEFAULT_CLICK_RADIUS,
        }
    }
}

impl From<&MetricsConfig> for BubbleScale {
    fn from(config: &MetricsConfig) -> Self {
        Self {
            radius_scale: config.radius_scale,
            click_radius: config.click_radius,
        }
    }
}

/// `radius_scale / (max(duration) - min(duration))` over the records
pub fn duration_multiplier(records: &[FixationRecord], radius_scale: f64) -> f64 {
    let mut durations = records.iter().map(|r| r.duration);
    let Some(first) = durations.next() else {
        return DEGENERATE_SENTINEL;
    };
    let (min, max) = durations.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));

    if max == min {
        return DEGENERATE_SENTINEL;
    }
    radius_scale / (max - min)
}

/// Scaled radius; a degenerate multiplier gives a degenerate radius
pub fn radius(value: f64, multiplier: f64) -> f64 {
    if is_degenerate(multiplier) {
        return DEGENERATE_SENTINEL;
    }
    value * multiplier
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointSource {
    Fixation,
    Click,
}

/// One bubble: screen position plus radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BubblePoint {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub source: PointSource,
}

/// Bubble dataset for one slot view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubbleSet {
    pub multiplier: f64,
    pub points: Vec<BubblePoint>,
}

impl BubbleSet {
    pub fn fixation_points(&self) -> impl Iterator<Item = &BubblePoint> {
        self.points
            .iter()
            .filter(|p| p.source == PointSource::Fixation)
    }

    pub fn click_points(&self) -> impl Iterator<Item = &BubblePoint> {
        self.points.iter().filter(|p| p.source == PointSource::Click)
    }
}

/// Build bubbles for fixations plus mouse-button clicks.
///
/// The multiplier is computed over exactly the fixations given, so callers
/// window and trim before calling. Clicks are drawn at a fixed radius of
/// `click_radius * multiplier` at their (data1, data2) position.
pub fn bubble_points(
    fixations: &[FixationRecord],
    events: &[EventRecord],
    scale: BubbleScale,
) -> BubbleSet {
    let multiplier = duration_multiplier(fixations, scale.radius_scale);

    let fixation_points = fixations.iter().map(|f| BubblePoint {
        x: f.x,
        y: f.y,
        r: radius(f.duration, multiplier),
        source: PointSource::Fixation,
    });

    let click_points = events
        .iter()
        .filter(|e| e.payload.is_mouse_button())
        .filter_map(|e| {
            Some(BubblePoint {
                x: e.payload.data1(),
                y: e.payload.data2()?,
                r: radius(scale.click_radius, multiplier),
                source: PointSource::Click,
            })
        });

    BubbleSet {
        multiplier,
        points: fixation_points.chain(click_points).collect(),
    }
}
