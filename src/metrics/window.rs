//! Time windows over timed records

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_LOOK_AHEAD_MS;
use crate::types::Timed;

/// A predicate over record times
pub trait TimeWindow {
    fn contains(&self, time: f64) -> bool;

    /// Records inside the window, in input order
    fn select<T: Timed + Clone>(&self, records: &[T]) -> Vec<T> {
        records
            .iter()
            .filter(|record| self.contains(record.time()))
            .cloned()
            .collect()
    }
}

/// Open interval `min < time < max`, used by the static bubble chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExclusiveWindow {
    pub min: f64,
    pub max: f64,
}

impl ExclusiveWindow {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl TimeWindow for ExclusiveWindow {
    fn contains(&self, time: f64) -> bool {
        time > self.min && time < self.max
    }
}

/// Playback window `lo + offset < time <= hi + offset`.
///
/// The slider range is shifted forward by the offset so playback shows what
/// is about to happen rather than what just happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LookAheadWindow {
    pub lo: f64,
    pub hi: f64,
    pub offset: f64,
}

impl LookAheadWindow {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self::with_offset(lo, hi, DEFAULT_LOOK_AHEAD_MS)
    }

    pub fn with_offset(lo: f64, hi: f64, offset: f64) -> Self {
        Self { lo, hi, offset }
    }
}

impl TimeWindow for LookAheadWindow {
    fn contains(&self, time: f64) -> bool {
        time > self.lo + self.offset && time <= self.hi + self.offset
    }
}

/// Largest record time, the upper bound of the time slider
pub fn time_extent<T: Timed>(records: &[T]) -> Option<f64> {
    records.iter().map(Timed::time).reduce(f64::max)
}

/// The last `amount` records; an amount of zero keeps everything
pub fn tail<T>(records: &[T], amount: usize) -> &[T] {
    if amount == 0 || amount >= records.len() {
        return records;
    }
    &records[records.len() - amount..]
}
