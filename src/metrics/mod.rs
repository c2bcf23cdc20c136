//! Derived metrics
//!
//! Pure functions over corpus records: time windows, bubble radius scaling,
//! radar normalization and timeline labels. Nothing here touches a data
//! source or mutates the corpus.

mod radar;
mod scaling;
mod timeline;
mod window;

pub use radar::{normalize_value, round2, AverageMode, MetricVector, RadarChart, RadarStats};
pub use scaling::{
    bubble_points, duration_multiplier, is_degenerate, radius, BubblePoint, BubbleScale,
    BubbleSet, PointSource, DEGENERATE_SENTINEL,
};
pub use timeline::{event_message, event_messages, humanize_ms};
pub use window::{tail, time_extent, ExclusiveWindow, LookAheadWindow, TimeWindow};
