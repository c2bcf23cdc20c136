//! Fixation (FXD) adapter
//!
//! Parses `<id> <time> <duration> <x> <y>` lines.

use crate::error::GazeError;
use crate::types::{FixationRecord, RecordKind};

use super::{parse_integer, parse_number, split_whitespace_comma, RecordAdapter};

/// Exact token count of a fixation line
pub const FIXATION_TOKENS: usize = 5;

/// Fixation line adapter
pub struct FixationAdapter;

impl RecordAdapter for FixationAdapter {
    type Record = FixationRecord;

    fn kind(&self) -> RecordKind {
        RecordKind::Fxd
    }

    fn parse_line(&self, line: &str) -> Result<FixationRecord, GazeError> {
        try_parse_fixation_line(line)
    }
}

/// Parse a fixation line, reporting why a line was rejected
pub fn try_parse_fixation_line(line: &str) -> Result<FixationRecord, GazeError> {
    let tokens = split_whitespace_comma(line);
    if tokens.len() != FIXATION_TOKENS {
        return Err(GazeError::MalformedLine(format!(
            "fixation line has {} tokens, expected {}",
            tokens.len(),
            FIXATION_TOKENS
        )));
    }

    Ok(FixationRecord {
        id: parse_integer(tokens[0], "id")?,
        time: parse_number(tokens[1], "time")?,
        duration: parse_number(tokens[2], "duration")?,
        x: parse_number(tokens[3], "x")?,
        y: parse_number(tokens[4], "y")?,
    })
}

/// Parse a fixation line; any other token count or a bad scalar yields `None`
pub fn parse_fixation_line(line: &str) -> Option<FixationRecord> {
    try_parse_fixation_line(line).ok()
}
