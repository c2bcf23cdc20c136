//! Participant metadata table
//!
//! The table is a CSV-like file shared by all participants: a header row,
//! then rows of `<participantId> <ontologyCode> <visualizationCode> <success>`
//! separated by whitespace or commas. A row may carry more than one group.

use std::collections::HashMap;
use tracing::warn;

use crate::adapters::{parse_integer, parse_number, split_whitespace_comma};
use crate::error::GazeError;
use crate::types::{Ontology, ParticipantId, ParticipantMetadata, VisualizationCondition};

const GROUP_TOKENS: usize = 4;

/// Metadata rows grouped by participant, in table order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataTable {
    rows: HashMap<ParticipantId, Vec<ParticipantMetadata>>,
    /// Groups dropped for unknown codes, bad numbers or success outside [0, 1]
    pub dropped: usize,
}

impl MetadataTable {
    /// Parse the table text; the first line is the header and is ignored
    pub fn parse(text: &str) -> Self {
        let mut table = MetadataTable::default();

        for (line_num, line) in text.lines().enumerate().skip(1) {
            let tokens = split_whitespace_comma(line);
            for group in tokens.chunks(GROUP_TOKENS) {
                match parse_group(group) {
                    Ok(row) => table
                        .rows
                        .entry(row.participant_id.clone())
                        .or_default()
                        .push(row),
                    Err(e) => {
                        warn!(line = line_num + 1, error = %e, "Dropping metadata group");
                        table.dropped += 1;
                    }
                }
            }
        }

        table
    }

    pub fn rows_for(&self, participant: &ParticipantId) -> Option<&[ParticipantMetadata]> {
        self.rows.get(participant).map(Vec::as_slice)
    }

    /// Remove and return a participant's rows
    pub fn take(&mut self, participant: &ParticipantId) -> Option<Vec<ParticipantMetadata>> {
        self.rows.remove(participant)
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.rows.contains_key(participant)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn parse_group(group: &[&str]) -> Result<ParticipantMetadata, GazeError> {
    let [id, ontology, visualization, success] = group else {
        return Err(GazeError::MalformedLine(format!(
            "metadata group has {} tokens, expected {}",
            group.len(),
            GROUP_TOKENS
        )));
    };

    let ontology_code = parse_integer(ontology, "ontology")?;
    let ontology = Ontology::from_code(ontology_code).ok_or_else(|| {
        GazeError::MalformedLine(format!("unknown ontology code {}", ontology_code))
    })?;

    let visualization_code = parse_integer(visualization, "visualization")?;
    let visualization = VisualizationCondition::from_code(visualization_code).ok_or_else(|| {
        GazeError::MalformedLine(format!("unknown visualization code {}", visualization_code))
    })?;

    let success = parse_number(success, "success")?;
    if !(0.0..=1.0).contains(&success) {
        return Err(GazeError::MalformedLine(format!(
            "success {} is not a fraction in [0, 1]",
            success
        )));
    }

    Ok(ParticipantMetadata {
        participant_id: ParticipantId::new(*id),
        ontology,
        visualization,
        success,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "Participant,Ontology,Visualization,Success\n\
                         p1,1,1,0.75\n\
                         p1,2,2,0.5\n\
                         p2,2,1,1\n";

    #[test]
    fn test_header_is_skipped_and_rows_grouped() {
        let table = MetadataTable::parse(TABLE);
        assert_eq!(table.len(), 2);
        assert_eq!(table.dropped, 0);

        let p1 = table.rows_for(&"p1".into()).unwrap();
        assert_eq!(p1.len(), 2);
        assert_eq!(p1[0].ontology, Ontology::Conference);
        assert_eq!(p1[0].visualization, VisualizationCondition::Graph);
        assert_eq!(p1[1].visualization, VisualizationCondition::Tree);
        assert_eq!(p1[1].success, 0.5);
    }

    #[test]
    fn test_multiple_groups_per_row() {
        let table = MetadataTable::parse("header\np3 1 1 0.2 p3 1 2 0.4\n");
        assert_eq!(table.rows_for(&"p3".into()).unwrap().len(), 2);
    }

    #[test]
    fn test_bad_groups_are_dropped() {
        let table = MetadataTable::parse("header\np4,9,1,0.5\np5,1,1\np6,1,2,0.9\n");
        assert_eq!(table.dropped, 2);
        assert!(!table.contains(&"p4".into()));
        assert!(table.contains(&"p6".into()));
    }

    #[test]
    fn test_success_outside_fraction_is_dropped() {
        let table = MetadataTable::parse("header\np1,1,1,1.5\np2,1,2,-0.1\np3,2,1,0\np4,2,2,1\n");
        assert_eq!(table.dropped, 2);
        assert!(!table.contains(&"p1".into()));
        assert!(!table.contains(&"p2".into()));
        assert!(table.contains(&"p3".into()));
        assert!(table.contains(&"p4".into()));
    }

    #[test]
    fn test_take_removes_rows() {
        let mut table = MetadataTable::parse(TABLE);
        assert!(table.take(&"p2".into()).is_some());
        assert!(table.take(&"p2".into()).is_none());
    }
}
