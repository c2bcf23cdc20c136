//! Corpus index
//!
//! The corpus is the read-only, nested store of everything a load produced:
//! per participant, raw records and generated stats for each condition, plus
//! metadata rows. A `Corpus` is built once through `CorpusBuilder` and exposes
//! no mutation afterwards. `CorpusStore` swaps whole corpora atomically.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::error::GazeError;
use crate::types::{
    EventRecord, FixationRecord, GeneratedStat, ParticipantId, ParticipantMetadata, RecordKind,
    VisualizationCondition,
};

/// Raw records of one participant under one condition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionRecords {
    pub fixations: Vec<FixationRecord>,
    pub events: Vec<EventRecord>,
}

/// Everything loaded for one participant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipantData {
    raw: HashMap<VisualizationCondition, ConditionRecords>,
    generated: HashMap<(VisualizationCondition, RecordKind), Vec<GeneratedStat>>,
    metadata: Vec<ParticipantMetadata>,
}

/// Borrowed view of one raw slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordSlice<'a> {
    Fixations(&'a [FixationRecord]),
    Events(&'a [EventRecord]),
}

impl RecordSlice<'_> {
    pub fn len(&self) -> usize {
        match self {
            RecordSlice::Fixations(records) => records.len(),
            RecordSlice::Events(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable indexed corpus
#[derive(Debug, Clone)]
pub struct Corpus {
    id: Uuid,
    loaded_at: DateTime<Utc>,
    participants: Vec<ParticipantId>,
    data: HashMap<ParticipantId, ParticipantData>,
}

impl Corpus {
    /// Unique id of this corpus generation
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Participants in the order they were loaded
    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    fn participant(&self, participant: &ParticipantId) -> Result<&ParticipantData, GazeError> {
        self.data
            .get(participant)
            .ok_or_else(|| GazeError::UnknownParticipant(participant.clone()))
    }

    /// Raw records of a slot. Gaze-zone data is not implemented and is an error.
    pub fn records(
        &self,
        participant: &ParticipantId,
        condition: VisualizationCondition,
        kind: RecordKind,
    ) -> Result<RecordSlice<'_>, GazeError> {
        match kind {
            RecordKind::Fxd => Ok(RecordSlice::Fixations(
                self.fixations(participant, condition)?,
            )),
            RecordKind::Evd => Ok(RecordSlice::Events(self.events(participant, condition)?)),
            RecordKind::Gzd => Err(GazeError::UnsupportedRecordKind(kind)),
        }
    }

    pub fn fixations(
        &self,
        participant: &ParticipantId,
        condition: VisualizationCondition,
    ) -> Result<&[FixationRecord], GazeError> {
        let data = self.participant(participant)?;
        Ok(data
            .raw
            .get(&condition)
            .map(|slot| slot.fixations.as_slice())
            .unwrap_or(&[]))
    }

    pub fn events(
        &self,
        participant: &ParticipantId,
        condition: VisualizationCondition,
    ) -> Result<&[EventRecord], GazeError> {
        let data = self.participant(participant)?;
        Ok(data
            .raw
            .get(&condition)
            .map(|slot| slot.events.as_slice())
            .unwrap_or(&[]))
    }

    /// Generated stats of a slot, in file order
    pub fn generated(
        &self,
        participant: &ParticipantId,
        condition: VisualizationCondition,
        kind: RecordKind,
    ) -> Result<&[GeneratedStat], GazeError> {
        let data = self.participant(participant)?;
        Ok(data
            .generated
            .get(&(condition, kind))
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    pub fn metadata(&self, participant: &ParticipantId) -> Result<&[ParticipantMetadata], GazeError> {
        Ok(&self.participant(participant)?.metadata)
    }

    /// The metadata row for one condition, if the table has one
    pub fn metadata_for(
        &self,
        participant: &ParticipantId,
        condition: VisualizationCondition,
    ) -> Result<Option<&ParticipantMetadata>, GazeError> {
        Ok(self
            .metadata(participant)?
            .iter()
            .find(|row| row.visualization == condition))
    }
}

/// Builder used by the load pipeline; consumed by `build`
#[derive(Debug, Default)]
pub struct CorpusBuilder {
    participants: Vec<ParticipantId>,
    data: HashMap<ParticipantId, ParticipantData>,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, participant: &ParticipantId) -> &mut ParticipantData {
        if !self.data.contains_key(participant) {
            self.participants.push(participant.clone());
        }
        self.data.entry(participant.clone()).or_default()
    }

    /// Register a participant with its metadata rows
    pub fn participant(
        &mut self,
        participant: &ParticipantId,
        metadata: Vec<ParticipantMetadata>,
    ) -> &mut Self {
        self.entry(participant).metadata = metadata;
        self
    }

    pub fn fixations(
        &mut self,
        participant: &ParticipantId,
        condition: VisualizationCondition,
        records: Vec<FixationRecord>,
    ) -> &mut Self {
        self.entry(participant)
            .raw
            .entry(condition)
            .or_default()
            .fixations = records;
        self
    }

    pub fn events(
        &mut self,
        participant: &ParticipantId,
        condition: VisualizationCondition,
        records: Vec<EventRecord>,
    ) -> &mut Self {
        self.entry(participant)
            .raw
            .entry(condition)
            .or_default()
            .events = records;
        self
    }

    pub fn generated(
        &mut self,
        participant: &ParticipantId,
        condition: VisualizationCondition,
        kind: RecordKind,
        stats: Vec<GeneratedStat>,
    ) -> &mut Self {
        self.entry(participant)
            .generated
            .insert((condition, kind), stats);
        self
    }

    pub fn build(self) -> Corpus {
        Corpus {
            id: Uuid::new_v4(),
            loaded_at: Utc::now(),
            participants: self.participants,
            data: self.data,
        }
    }
}

/// Holder of the current corpus; replacing it never mutates a corpus in place
#[derive(Debug)]
pub struct CorpusStore {
    current: RwLock<Arc<Corpus>>,
}

impl CorpusStore {
    pub fn new(corpus: Corpus) -> Self {
        Self {
            current: RwLock::new(Arc::new(corpus)),
        }
    }

    /// Snapshot of the current corpus; stays valid after a swap
    pub fn current(&self) -> Arc<Corpus> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Install a new corpus and return the previous one
    pub fn replace(&self, corpus: Corpus) -> Arc<Corpus> {
        let next = Arc::new(corpus);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventPayload, Ontology};

    fn fixation(id: i64, time: f64) -> FixationRecord {
        FixationRecord {
            id,
            time,
            duration: 100.0,
            x: 1.0,
            y: 2.0,
        }
    }

    fn sample_corpus() -> Corpus {
        let p1 = ParticipantId::new("p1");
        let mut builder = CorpusBuilder::new();
        builder
            .participant(
                &p1,
                vec![ParticipantMetadata {
                    participant_id: p1.clone(),
                    ontology: Ontology::Conference,
                    visualization: VisualizationCondition::Tree,
                    success: 0.4,
                }],
            )
            .fixations(
                &p1,
                VisualizationCondition::Graph,
                vec![fixation(1, 10.0), fixation(2, 20.0)],
            )
            .events(
                &p1,
                VisualizationCondition::Graph,
                vec![EventRecord {
                    time: 15.0,
                    tag: "LMouseButton".to_string(),
                    payload: EventPayload::LeftMouseButton {
                        data1: 1.0,
                        data2: 2.0,
                    },
                }],
            )
            .generated(
                &p1,
                VisualizationCondition::Graph,
                RecordKind::Fxd,
                vec![GeneratedStat {
                    description: "mean duration".to_string(),
                    value: 100.0,
                }],
            );
        builder.build()
    }

    #[test]
    fn test_query_surface() {
        let corpus = sample_corpus();
        let p1 = ParticipantId::new("p1");

        assert_eq!(corpus.participants(), &[p1.clone()]);
        assert_eq!(
            corpus
                .fixations(&p1, VisualizationCondition::Graph)
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            corpus
                .records(&p1, VisualizationCondition::Graph, RecordKind::Evd)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            corpus
                .generated(&p1, VisualizationCondition::Graph, RecordKind::Fxd)
                .unwrap()[0]
                .value,
            100.0
        );
    }

    #[test]
    fn test_unloaded_condition_is_empty() {
        let corpus = sample_corpus();
        let p1 = ParticipantId::new("p1");
        assert!(corpus
            .fixations(&p1, VisualizationCondition::Tree)
            .unwrap()
            .is_empty());
        assert!(corpus
            .generated(&p1, VisualizationCondition::Tree, RecordKind::Evd)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unknown_participant_and_gaze_zone() {
        let corpus = sample_corpus();
        let p1 = ParticipantId::new("p1");

        assert!(matches!(
            corpus.metadata(&"p99".into()),
            Err(GazeError::UnknownParticipant(_))
        ));
        assert!(matches!(
            corpus.records(&p1, VisualizationCondition::Graph, RecordKind::Gzd),
            Err(GazeError::UnsupportedRecordKind(RecordKind::Gzd))
        ));
    }

    #[test]
    fn test_metadata_for_condition() {
        let corpus = sample_corpus();
        let p1 = ParticipantId::new("p1");

        let tree = corpus
            .metadata_for(&p1, VisualizationCondition::Tree)
            .unwrap()
            .unwrap();
        assert_eq!(tree.success, 0.4);
        assert!(corpus
            .metadata_for(&p1, VisualizationCondition::Graph)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_store_swap_keeps_old_snapshot() {
        let store = CorpusStore::new(sample_corpus());
        let before = store.current();

        let previous = store.replace(CorpusBuilder::new().build());
        assert_eq!(previous.id(), before.id());

        let after = store.current();
        assert_ne!(after.id(), before.id());
        assert!(after.participants().is_empty());
        // Readers holding the old snapshot still see the full corpus
        assert_eq!(before.participants().len(), 1);
    }
}
