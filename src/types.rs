//! Core types for the eyegaze-flux corpus
//!
//! This module defines the records produced by the line parsers and the keys
//! used to index them: participants, visualization conditions and record kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::EventKey;

/// Participant identifiers in canonical order. The set has gaps (no p8, p9,
/// p22, p26 or p29); cross-participant folds iterate in exactly this order.
pub const DEFAULT_PARTICIPANTS: [&str; 31] = [
    "p1", "p2", "p3", "p4", "p5", "p6", "p7", "p10", "p11", "p12", "p13", "p14", "p15", "p16",
    "p17", "p18", "p19", "p20", "p21", "p23", "p24", "p25", "p27", "p28", "p30", "p31", "p32",
    "p33", "p34", "p35", "p36",
];

/// Opaque participant identifier (e.g. "p3")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical participant list
    pub fn defaults() -> Vec<ParticipantId> {
        DEFAULT_PARTICIPANTS
            .iter()
            .map(|id| ParticipantId::new(*id))
            .collect()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Visualization presentation mode shown to a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationCondition {
    Graph,
    Tree,
}

impl VisualizationCondition {
    pub const ALL: [VisualizationCondition; 2] =
        [VisualizationCondition::Graph, VisualizationCondition::Tree];

    /// Name used in data file paths
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualizationCondition::Graph => "graph",
            VisualizationCondition::Tree => "tree",
        }
    }

    /// Numeric code used by the metadata table
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(VisualizationCondition::Graph),
            2 => Some(VisualizationCondition::Tree),
            _ => None,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "graph" => Some(VisualizationCondition::Graph),
            "tree" => Some(VisualizationCondition::Tree),
            _ => None,
        }
    }
}

impl fmt::Display for VisualizationCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of raw record file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordKind {
    /// Fixation data (FXD)
    Fxd,
    /// Interaction event data (EVD)
    Evd,
    /// Gaze-zone data (GZD); format undefined, parsing is not implemented
    Gzd,
}

impl RecordKind {
    /// Kinds the load pipeline fetches and parses
    pub const LOADABLE: [RecordKind; 2] = [RecordKind::Fxd, RecordKind::Evd];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Fxd => "FXD",
            RecordKind::Evd => "EVD",
            RecordKind::Gzd => "GZD",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single gaze fixation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixationRecord {
    pub id: i64,
    /// Session time (ms)
    pub time: f64,
    /// Dwell duration (ms)
    pub duration: f64,
    /// Screen position (px)
    pub x: f64,
    pub y: f64,
}

/// A discrete interaction event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Session time (ms)
    pub time: f64,
    /// Free-form event label as written by the tracker (e.g. "LMouseButton")
    pub tag: String,
    pub payload: EventPayload,
}

impl EventRecord {
    pub fn event_key(&self) -> EventKey {
        self.payload.event_key()
    }
}

/// Trailing fields of an event, one variant per event key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum EventPayload {
    SlowSlide { data1: f64, description: String },
    HideSlide { data1: f64, description: String },
    Keyboard { data1: f64, data2: f64, description: String },
    LeftMouseButton { data1: f64, data2: f64 },
    RightMouseButton { data1: f64, data2: f64 },
}

impl EventPayload {
    pub fn event_key(&self) -> EventKey {
        match self {
            EventPayload::SlowSlide { .. } => EventKey::SlowSlide,
            EventPayload::HideSlide { .. } => EventKey::HideSlide,
            EventPayload::Keyboard { .. } => EventKey::Keyboard,
            EventPayload::LeftMouseButton { .. } => EventKey::LeftMouseButton,
            EventPayload::RightMouseButton { .. } => EventKey::RightMouseButton,
        }
    }

    pub fn data1(&self) -> f64 {
        match self {
            EventPayload::SlowSlide { data1, .. }
            | EventPayload::HideSlide { data1, .. }
            | EventPayload::Keyboard { data1, .. }
            | EventPayload::LeftMouseButton { data1, .. }
            | EventPayload::RightMouseButton { data1, .. } => *data1,
        }
    }

    pub fn data2(&self) -> Option<f64> {
        match self {
            EventPayload::Keyboard { data2, .. }
            | EventPayload::LeftMouseButton { data2, .. }
            | EventPayload::RightMouseButton { data2, .. } => Some(*data2),
            _ => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            EventPayload::SlowSlide { description, .. }
            | EventPayload::HideSlide { description, .. }
            | EventPayload::Keyboard { description, .. } => Some(description),
            _ => None,
        }
    }

    /// Mouse button events carry a screen position in data1/data2
    pub fn is_mouse_button(&self) -> bool {
        matches!(
            self,
            EventPayload::LeftMouseButton { .. } | EventPayload::RightMouseButton { .. }
        )
    }
}

/// Precomputed scalar summary metric for a participant/condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedStat {
    pub description: String,
    pub value: f64,
}

/// Ontology the participant worked with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ontology {
    Conference,
    Biomedical,
}

impl Ontology {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Ontology::Conference),
            2 => Some(Ontology::Biomedical),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Ontology::Conference => "Conference",
            Ontology::Biomedical => "Biomedical",
        }
    }
}

/// One row of the shared participant metadata table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantMetadata {
    pub participant_id: ParticipantId,
    pub ontology: Ontology,
    pub visualization: VisualizationCondition,
    /// Task success fraction (0-1)
    pub success: f64,
}

impl ParticipantMetadata {
    /// Task success as a percentage with three decimals, e.g. "87.500%"
    pub fn success_label(&self) -> String {
        format!("{:.3}%", self.success * 100.0)
    }
}

/// Any record time-windowing can select on
pub trait Timed {
    fn time(&self) -> f64;
}

impl Timed for FixationRecord {
    fn time(&self) -> f64 {
        self.time
    }
}

impl Timed for EventRecord {
    fn time(&self) -> f64 {
        self.time
    }
}
