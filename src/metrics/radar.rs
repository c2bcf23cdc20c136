//! Radar chart normalization
//!
//! Each participant contributes a vector of generated fixation metrics (the
//! known vocabulary entries, in file order). Vectors are folded into running
//! averages and element-wise extents across participants, then every value is
//! scaled into 0-1 against those extents.
//!
//! The default average is the pairwise fold `avg = (p + avg) / 2`, seeded
//! with the first participant. It weights later participants more heavily
//! and is NOT the arithmetic mean; charts built on it depend on participant
//! order. `AverageMode::ArithmeticMean` is available as an explicit opt-in.

use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::error::GazeError;
use crate::schema::{is_known_metric, unit_for};
use crate::types::{GeneratedStat, ParticipantId, RecordKind, VisualizationCondition};

use super::scaling::DEGENERATE_SENTINEL;

/// How per-participant vectors are combined into the average series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AverageMode {
    /// `avg = (p + avg) / 2` in participant order
    #[default]
    PairwiseFold,
    ArithmeticMean,
}

/// Known metrics of one generated slot, in file order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricVector {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl MetricVector {
    pub fn from_stats(stats: &[GeneratedStat]) -> Self {
        let (labels, values) = stats
            .iter()
            .filter(|stat| is_known_metric(&stat.description))
            .map(|stat| (stat.description.clone(), stat.value))
            .unzip();
        Self { labels, values }
    }

    /// Unit of each label, empty for unitless metrics
    pub fn units(&self) -> Vec<&'static str> {
        self.labels
            .iter()
            .map(|label| unit_for(label).unwrap_or_default())
            .collect()
    }
}

/// Cross-participant averages and element-wise extents
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RadarStats {
    pub average: Vec<f64>,
    pub max: Vec<f64>,
    pub min: Vec<f64>,
    pub participants: usize,
    pub mode: AverageMode,
}

impl RadarStats {
    /// Fold vectors in the given order.
    ///
    /// Vectors may differ in length; an index first seen in a later vector is
    /// seeded from that vector.
    pub fn fold<'a, I>(vectors: I, mode: AverageMode) -> Self
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        let mut stats = RadarStats {
            mode,
            ..Default::default()
        };
        let mut sums: Vec<f64> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();

        for vector in vectors {
            stats.participants += 1;
            for (i, &value) in vector.iter().enumerate() {
                if i == stats.average.len() {
                    stats.average.push(value);
                    stats.max.push(value);
                    stats.min.push(value);
                    sums.push(0.0);
                    counts.push(0);
                }

                stats.average[i] = (value + stats.average[i]) / 2.0;
                stats.max[i] = stats.max[i].max(value);
                stats.min[i] = stats.min[i].min(value);
                sums[i] += value;
                counts[i] += 1;
            }
        }

        if mode == AverageMode::ArithmeticMean {
            stats.average = sums
                .iter()
                .zip(&counts)
                .map(|(sum, &count)| sum / count as f64)
                .collect();
        }

        stats
    }

    /// Scale a vector against the global extents
    pub fn normalize(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| match (self.max.get(i), self.min.get(i)) {
                (Some(&max), Some(&min)) => normalize_value(value, max, min),
                _ => DEGENERATE_SENTINEL,
            })
            .collect()
    }

    pub fn normalized_average(&self) -> Vec<f64> {
        self.normalize(&self.average)
    }
}

/// `(value - min) / (max - min)` rounded to two decimals.
///
/// A zero value stays zero regardless of the extents; otherwise equal extents
/// give the sentinel.
pub fn normalize_value(value: f64, max: f64, min: f64) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    if max == min {
        return DEGENERATE_SENTINEL;
    }
    round2((value - min) / (max - min))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Radar dataset for one participant against the whole corpus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarChart {
    pub participant: ParticipantId,
    pub condition: VisualizationCondition,
    pub labels: Vec<String>,
    pub units: Vec<&'static str>,
    /// Participant's unscaled values
    pub raw: Vec<f64>,
    pub normalized: Vec<f64>,
    /// Normalized cross-participant average
    pub average: Vec<f64>,
    pub stats: RadarStats,
}

impl RadarChart {
    /// Build from the generated fixation stats of every loaded participant,
    /// folded in corpus order
    pub fn build(
        corpus: &Corpus,
        participant: &ParticipantId,
        condition: VisualizationCondition,
        mode: AverageMode,
    ) -> Result<Self, GazeError> {
        let own = MetricVector::from_stats(corpus.generated(
            participant,
            condition,
            RecordKind::Fxd,
        )?);

        let vectors = corpus
            .participants()
            .iter()
            .map(|p| {
                corpus
                    .generated(p, condition, RecordKind::Fxd)
                    .map(|stats| MetricVector::from_stats(stats).values)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let stats = RadarStats::fold(vectors.iter().map(Vec::as_slice), mode);

        Ok(Self {
            participant: participant.clone(),
            condition,
            units: own.units(),
            normalized: stats.normalize(&own.values),
            average: stats.normalized_average(),
            labels: own.labels,
            raw: own.values,
            stats,
        })
    }
}
