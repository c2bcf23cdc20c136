//! Pipeline orchestration
//!
//! This module provides the load API for eyegaze-flux. It drives a data
//! source through the full pipeline, from raw text to an immutable corpus.
//!
//! Pipeline stages:
//! 1. Metadata table - fetched once, grouped by participant
//! 2. Metadata check - every requested participant must have rows
//! 3. Raw slots - fetched and parsed per participant, condition and kind
//! 4. Generated slots - fetched and parsed alongside each raw slot
//! 5. Corpus - built and paired with a load report
//!
//! Fetches are strictly sequential and in participant order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapters::{parse_slot, EventAdapter, FixationAdapter, ParseStats};
use crate::config::LoaderConfig;
use crate::corpus::{Corpus, CorpusBuilder};
use crate::error::GazeError;
use crate::generated::parse_generated_text;
use crate::metadata::MetadataTable;
use crate::source::{DataSource, FsSource, SlotKey, TextOrigin};
use crate::types::{ParticipantId, RecordKind, VisualizationCondition};

/// A built corpus plus the report of how it was built
#[derive(Debug)]
pub struct LoadOutcome {
    pub corpus: Corpus,
    pub report: LoadReport,
}

/// Outcome of one fetched slot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotStatus {
    Loaded { records: usize, stats: ParseStats },
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotReport {
    #[serde(flatten)]
    pub slot: SlotKey,
    pub origin: TextOrigin,
    #[serde(flatten)]
    pub status: SlotStatus,
}

impl SlotReport {
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, SlotStatus::Loaded { .. })
    }
}

/// Per-slot account of a load, so callers can decide whether partial data
/// is good enough
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub corpus_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub participants: Vec<ParticipantId>,
    pub conditions: Vec<VisualizationCondition>,
    /// Metadata groups dropped while parsing the table
    pub metadata_dropped: usize,
    pub slots: Vec<SlotReport>,
}

impl LoadReport {
    /// True when every slot was fetched
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(SlotReport::is_loaded)
    }

    pub fn unavailable(&self) -> impl Iterator<Item = &SlotReport> {
        self.slots.iter().filter(|slot| !slot.is_loaded())
    }

    /// Lines dropped across all loaded slots
    pub fn dropped_lines(&self) -> usize {
        self.slots
            .iter()
            .map(|slot| match &slot.status {
                SlotStatus::Loaded { stats, .. } => stats.dropped(),
                SlotStatus::Unavailable { .. } => 0,
            })
            .sum()
    }

    /// Serialize the report as pretty JSON
    pub fn to_json(&self) -> Result<String, GazeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Load participants from a source into a new corpus.
///
/// # Arguments
/// * `source` - Where metadata and slot text come from
/// * `participants` - Participants in fold order; duplicates are ignored
/// * `conditions` - Conditions to load for each participant
///
/// # Returns
/// The corpus and its load report. Fails with `MissingMetadata` before any
/// slot is fetched if a participant has no metadata rows, and with
/// `SourceUnavailable` if the metadata table itself cannot be fetched.
pub fn load(
    source: &dyn DataSource,
    participants: &[ParticipantId],
    conditions: &[VisualizationCondition],
) -> Result<LoadOutcome, GazeError> {
    run_load(source, participants, conditions, &AtomicBool::new(false))
}

/// Load everything a configuration names from the filesystem
pub fn load_from_config(config: &LoaderConfig) -> Result<LoadOutcome, GazeError> {
    config.validate()?;
    let source = FsSource::new(config.clone());
    load(&source, &config.participants, &config.conditions)
}

/// Loader bound to one source, with a cancellation flag another thread can
/// raise between slots.
pub struct CorpusLoader<S: DataSource> {
    source: S,
    cancel: Arc<AtomicBool>,
}

impl<S: DataSource> CorpusLoader<S> {
    pub fn new(source: S) -> Self {
        Self::with_cancel_flag(source, Arc::new(AtomicBool::new(false)))
    }

    /// Create a loader sharing an existing cancellation flag
    pub fn with_cancel_flag(source: S, cancel: Arc<AtomicBool>) -> Self {
        Self { source, cancel }
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run a load; a raised flag yields `Cancelled` and no corpus
    pub fn load(
        &self,
        participants: &[ParticipantId],
        conditions: &[VisualizationCondition],
    ) -> Result<LoadOutcome, GazeError> {
        run_load(&self.source, participants, conditions, &self.cancel)
    }
}

impl CorpusLoader<FsSource> {
    pub fn from_config(config: LoaderConfig) -> Result<Self, GazeError> {
        config.validate()?;
        Ok(Self::new(FsSource::new(config)))
    }
}

fn run_load(
    source: &dyn DataSource,
    participants: &[ParticipantId],
    conditions: &[VisualizationCondition],
    cancel: &AtomicBool,
) -> Result<LoadOutcome, GazeError> {
    let started_at = Utc::now();
    let participants = dedup(participants);
    let conditions = dedup(conditions);

    check_cancelled(cancel)?;

    // Stage 1: metadata table; failure here is fatal
    let mut table = MetadataTable::parse(&source.metadata_table()?);
    if table.dropped > 0 {
        warn!(dropped = table.dropped, "Metadata table had unusable groups");
    }

    // Stage 2: every participant must be known before any slot is fetched
    if let Some(missing) = participants.iter().find(|p| !table.contains(p)) {
        return Err(GazeError::MissingMetadata(missing.clone()));
    }

    let mut builder = CorpusBuilder::new();
    let mut slots = Vec::new();

    for participant in &participants {
        let metadata = table.take(participant).unwrap_or_default();
        builder.participant(participant, metadata);

        for &condition in &conditions {
            for kind in RecordKind::LOADABLE {
                let key = SlotKey::new(participant.clone(), condition, kind);

                // Stage 3: raw records
                check_cancelled(cancel)?;
                slots.push(load_raw_slot(source, &key, &mut builder)?);

                // Stage 4: generated stats
                check_cancelled(cancel)?;
                slots.push(load_generated_slot(source, &key, &mut builder)?);
            }
        }
    }

    // Stage 5: build
    let corpus = builder.build();
    let report = LoadReport {
        corpus_id: corpus.id(),
        started_at,
        finished_at: Utc::now(),
        participants,
        conditions,
        metadata_dropped: table.dropped,
        slots,
    };

    info!(
        corpus_id = %report.corpus_id,
        participants = report.participants.len(),
        unavailable = report.unavailable().count(),
        dropped_lines = report.dropped_lines(),
        "Corpus loaded"
    );

    Ok(LoadOutcome { corpus, report })
}

fn load_raw_slot(
    source: &dyn DataSource,
    key: &SlotKey,
    builder: &mut CorpusBuilder,
) -> Result<SlotReport, GazeError> {
    let text = match source.raw_text(key) {
        Ok(text) => text,
        Err(e) => return unavailable(key, TextOrigin::Raw, e),
    };

    let (records, stats) = match key.kind {
        RecordKind::Fxd => {
            let parsed = parse_slot(&FixationAdapter, &text)?;
            let count = parsed.records.len();
            builder.fixations(&key.participant, key.condition, parsed.records);
            (count, parsed.stats)
        }
        RecordKind::Evd => {
            let parsed = parse_slot(&EventAdapter, &text)?;
            let count = parsed.records.len();
            builder.events(&key.participant, key.condition, parsed.records);
            (count, parsed.stats)
        }
        RecordKind::Gzd => return Err(GazeError::UnsupportedRecordKind(key.kind)),
    };

    info!(
        slot = %key,
        records,
        dropped = stats.dropped(),
        "Loaded raw slot"
    );

    Ok(SlotReport {
        slot: key.clone(),
        origin: TextOrigin::Raw,
        status: SlotStatus::Loaded { records, stats },
    })
}

fn load_generated_slot(
    source: &dyn DataSource,
    key: &SlotKey,
    builder: &mut CorpusBuilder,
) -> Result<SlotReport, GazeError> {
    let text = match source.generated_text(key) {
        Ok(text) => text,
        Err(e) => return unavailable(key, TextOrigin::Generated, e),
    };

    let (generated, stats) = parse_generated_text(&text);
    let records = generated.len();
    builder.generated(&key.participant, key.condition, key.kind, generated);

    info!(slot = %key, records, "Loaded generated slot");

    Ok(SlotReport {
        slot: key.clone(),
        origin: TextOrigin::Generated,
        status: SlotStatus::Loaded { records, stats },
    })
}

/// Record a recoverable fetch failure; anything else aborts the load
fn unavailable(
    key: &SlotKey,
    origin: TextOrigin,
    error: GazeError,
) -> Result<SlotReport, GazeError> {
    match error {
        GazeError::SourceUnavailable(reason) => {
            warn!(slot = %key, origin = ?origin, %reason, "Slot unavailable");
            Ok(SlotReport {
                slot: key.clone(),
                origin,
                status: SlotStatus::Unavailable { reason },
            })
        }
        other => Err(other),
    }
}

fn check_cancelled(cancel: &AtomicBool) -> Result<(), GazeError> {
    if cancel.load(Ordering::SeqCst) {
        return Err(GazeError::Cancelled);
    }
    Ok(())
}

/// Keep the first occurrence of each item, preserving order
fn dedup<T: Clone + Eq + std::hash::Hash>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use pretty_assertions::assert_eq;

    const METADATA: &str = "Participant,Ontology,Visualization,Success\n\
                            p1,1,1,0.75\n\
                            p1,1,2,0.5\n\
                            p2,2,1,1\n";

    fn key(participant: &str, condition: VisualizationCondition, kind: RecordKind) -> SlotKey {
        SlotKey::new(participant.into(), condition, kind)
    }

    fn sample_source() -> MemorySource {
        let graph = VisualizationCondition::Graph;
        let mut source = MemorySource::new().with_metadata(METADATA);
        source
            .insert_raw(
                key("p1", graph, RecordKind::Fxd),
                "1 100 10 5 6\n2 200 20 7 8\n3 300 30 9\nbad line\n",
            )
            .insert_raw(
                key("p1", graph, RecordKind::Evd),
                "150 LMouseButton 1 640 480\n160 Mystery 42 1 2\n",
            )
            .insert_generated(
                key("p1", graph, RecordKind::Fxd),
                "mean duration:20:scanpath duration:600\n",
            )
            .insert_raw(key("p2", graph, RecordKind::Fxd), "1 50 40 1 1\n");
        source
    }

    #[test]
    fn test_load_builds_corpus_and_report() {
        let source = sample_source();
        let outcome = load(
            &source,
            &["p1".into(), "p2".into()],
            &[VisualizationCondition::Graph],
        )
        .unwrap();

        let corpus = &outcome.corpus;
        let p1 = ParticipantId::new("p1");
        assert_eq!(corpus.participants().len(), 2);
        assert_eq!(
            corpus
                .fixations(&p1, VisualizationCondition::Graph)
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            corpus
                .events(&p1, VisualizationCondition::Graph)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            corpus
                .generated(&p1, VisualizationCondition::Graph, RecordKind::Fxd)
                .unwrap()
                .len(),
            2
        );
        assert_eq!(corpus.metadata(&p1).unwrap().len(), 2);

        let report = &outcome.report;
        assert_eq!(report.corpus_id, corpus.id());
        // 2 participants x 1 condition x 2 kinds x (raw + generated)
        assert_eq!(report.slots.len(), 8);
        assert!(!report.is_complete());
        assert_eq!(report.dropped_lines(), 3);
    }

    #[test]
    fn test_unavailable_slots_are_recorded() {
        let source = sample_source();
        let outcome = load(&source, &["p2".into()], &[VisualizationCondition::Graph]).unwrap();

        let unavailable: Vec<_> = outcome.report.unavailable().collect();
        assert_eq!(unavailable.len(), 3);
        assert!(unavailable
            .iter()
            .all(|slot| matches!(slot.status, SlotStatus::Unavailable { .. })));
        assert!(outcome
            .corpus
            .events(&"p2".into(), VisualizationCondition::Graph)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_missing_metadata_aborts_before_fetching() {
        let source = sample_source();
        let result = load(
            &source,
            &["p1".into(), "p7".into()],
            &VisualizationCondition::ALL,
        );

        match result {
            Err(GazeError::MissingMetadata(id)) => assert_eq!(id.as_str(), "p7"),
            other => panic!("expected MissingMetadata, got {:?}", other.map(|o| o.report)),
        }
        assert_eq!(source.fetches(), 0);
    }

    #[test]
    fn test_missing_metadata_table_is_fatal() {
        let source = MemorySource::new();
        assert!(matches!(
            load(&source, &["p1".into()], &VisualizationCondition::ALL),
            Err(GazeError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn test_duplicates_ignored_and_order_kept() {
        let source = sample_source();
        let outcome = load(
            &source,
            &["p2".into(), "p1".into(), "p2".into()],
            &[VisualizationCondition::Graph, VisualizationCondition::Graph],
        )
        .unwrap();

        let ids: Vec<&str> = outcome
            .corpus
            .participants()
            .iter()
            .map(ParticipantId::as_str)
            .collect();
        assert_eq!(ids, vec!["p2", "p1"]);
        assert_eq!(outcome.report.slots.len(), 8);
        assert_eq!(outcome.report.conditions, vec![VisualizationCondition::Graph]);
    }

    #[test]
    fn test_cancelled_load_exposes_no_corpus() {
        let loader = CorpusLoader::new(sample_source());
        loader.cancel();

        let result = loader.load(&["p1".into()], &VisualizationCondition::ALL);
        assert!(matches!(result, Err(GazeError::Cancelled)));
        assert_eq!(loader.source().fetches(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_timed_out_slot_is_recorded() {
        use crate::source::make_fifo;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::write(
            root.join("Project_2_Additional_Participant_Data.csv"),
            "header\np1,1,1,0.5\n",
        )
        .unwrap();
        std::fs::create_dir_all(root.join("raw/p1")).unwrap();
        std::fs::write(root.join("raw/p1/p1.graphFXD.txt"), "1 100 20 5 6\n").unwrap();
        // Opening a pipe with no writer never completes
        make_fifo(&root.join("raw/p1/p1.graphEVD.txt"));

        let source = FsSource::new(LoaderConfig {
            data_root: root.to_path_buf(),
            fetch_timeout_ms: 250,
            ..Default::default()
        });
        let outcome = load(&source, &["p1".into()], &[VisualizationCondition::Graph]).unwrap();

        let raw_events = outcome
            .report
            .slots
            .iter()
            .find(|s| s.origin == TextOrigin::Raw && s.slot.kind == RecordKind::Evd)
            .unwrap();
        match &raw_events.status {
            SlotStatus::Unavailable { reason } => assert!(reason.contains("timed out")),
            other => panic!("expected Unavailable, got {:?}", other),
        }

        let raw_fixations = outcome
            .report
            .slots
            .iter()
            .find(|s| s.origin == TextOrigin::Raw && s.slot.kind == RecordKind::Fxd)
            .unwrap();
        assert!(raw_fixations.is_loaded());
        assert_eq!(
            outcome
                .corpus
                .fixations(&"p1".into(), VisualizationCondition::Graph)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_report_serializes_slot_status() {
        let source = sample_source();
        let outcome = load(&source, &["p2".into()], &[VisualizationCondition::Graph]).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&outcome.report.to_json().unwrap()).unwrap();
        let first = &json["slots"][0];
        assert_eq!(first["participant"], "p2");
        assert_eq!(first["condition"], "graph");
        assert_eq!(first["kind"], "FXD");
        assert_eq!(first["origin"], "raw");
        assert_eq!(first["status"], "loaded");
        assert_eq!(first["records"], 1);
        assert_eq!(json["slots"][1]["status"], "unavailable");
    }
}
