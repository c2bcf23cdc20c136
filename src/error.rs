//! Error types for eyegaze-flux

use thiserror::Error;

use crate::types::{ParticipantId, RecordKind};

/// Errors that can occur while parsing, loading or querying a corpus
#[derive(Debug, Error)]
pub enum GazeError {
    /// Wrong token count or an unparseable scalar. Never fatal during a load;
    /// the line is dropped and counted.
    #[error("Malformed line: {0}")]
    MalformedLine(String),

    /// Event-type code with no registered trailing schema.
    #[error("Unknown event key: {0}")]
    UnknownEventKey(i64),

    #[error("Unsupported record kind: {0}")]
    UnsupportedRecordKind(RecordKind),

    #[error("Missing metadata for participant {0}")]
    MissingMetadata(ParticipantId),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Load cancelled")]
    Cancelled,
}

impl GazeError {
    /// Line-level errors are dropped and counted instead of aborting a load
    pub fn is_line_level(&self) -> bool {
        matches!(
            self,
            GazeError::MalformedLine(_) | GazeError::UnknownEventKey(_)
        )
    }
}
