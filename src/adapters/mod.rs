//! Record line adapters
//!
//! This module provides adapters that parse raw tracker text, one line at a
//! time, into typed records. Every adapter yields zero or one record per line;
//! dropped lines are counted per slot so the load report can surface them.

mod event;
mod fixation;
mod gaze_zone;

pub use event::{parse_event_line, try_parse_event_line, EventAdapter};
pub use fixation::{parse_fixation_line, try_parse_fixation_line, FixationAdapter};
pub use gaze_zone::{parse_gaze_zone_line, GazeZoneAdapter, GazeZoneRecord};

use serde::Serialize;
use tracing::debug;

use crate::error::GazeError;
use crate::types::RecordKind;

/// Trait for per-line record adapters
pub trait RecordAdapter {
    type Record;

    /// Record kind this adapter handles
    fn kind(&self) -> RecordKind;

    /// Parse one non-blank line into a record
    fn parse_line(&self, line: &str) -> Result<Self::Record, GazeError>;

    /// Fails for kinds whose format is not implemented, even on empty input
    fn ensure_supported(&self) -> Result<(), GazeError> {
        Ok(())
    }
}

/// Records parsed from one slot's text plus drop counts
#[derive(Debug, Clone, PartialEq)]
pub struct SlotParse<R> {
    pub records: Vec<R>,
    pub stats: ParseStats,
}

/// Per-slot line accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Non-blank lines seen
    pub lines: usize,
    /// Lines dropped for token count or scalar errors
    pub malformed: usize,
    /// Lines dropped because the event key has no schema
    pub unknown_event_keys: usize,
}

impl ParseStats {
    pub fn dropped(&self) -> usize {
        self.malformed + self.unknown_event_keys
    }

    fn record_drop(&mut self, error: &GazeError) {
        match error {
            GazeError::UnknownEventKey(_) => self.unknown_event_keys += 1,
            _ => self.malformed += 1,
        }
    }
}

/// Run an adapter over every line of a text.
///
/// Line-level errors drop the line; any other error (e.g. an unsupported
/// record kind) aborts and is returned.
pub fn parse_slot<A: RecordAdapter>(
    adapter: &A,
    text: &str,
) -> Result<SlotParse<A::Record>, GazeError> {
    adapter.ensure_supported()?;

    let mut records = Vec::new();
    let mut stats = ParseStats::default();

    for (line_num, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        stats.lines += 1;

        match adapter.parse_line(line) {
            Ok(record) => records.push(record),
            Err(e) if e.is_line_level() => {
                debug!(
                    kind = %adapter.kind(),
                    line = line_num + 1,
                    error = %e,
                    "Dropping line"
                );
                stats.record_drop(&e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(SlotParse { records, stats })
}

/// Split on runs of whitespace and commas, dropping empty tokens
pub(crate) fn split_whitespace_comma(line: &str) -> Vec<&str> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .collect()
}

/// Parse a finite number
pub(crate) fn parse_number(token: &str, field: &str) -> Result<f64, GazeError> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(GazeError::MalformedLine(format!(
            "{} is not a number: {:?}",
            field, token
        ))),
    }
}

/// Parse an integral number; "7" and "7.0" are both accepted
pub(crate) fn parse_integer(token: &str, field: &str) -> Result<i64, GazeError> {
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value);
    }
    let value = parse_number(token, field)?;
    if value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
        return Err(GazeError::MalformedLine(format!(
            "{} is not an integer: {:?}",
            field, token
        )));
    }
    Ok(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_whitespace_comma() {
        assert_eq!(
            split_whitespace_comma("  1, 2\t3 ,,4\r"),
            vec!["1", "2", "3", "4"]
        );
        assert!(split_whitespace_comma(" , ").is_empty());
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("42", "id").unwrap(), 42);
        assert_eq!(parse_integer("42.0", "id").unwrap(), 42);
        assert!(parse_integer("4.5", "id").is_err());
        assert!(parse_integer("abc", "id").is_err());
    }

    #[test]
    fn test_parse_number_rejects_non_finite() {
        assert_eq!(parse_number("1e3", "time").unwrap(), 1000.0);
        assert!(parse_number("NaN", "time").is_err());
        assert!(parse_number("inf", "time").is_err());
    }

    #[test]
    fn test_parse_slot_counts_drops() {
        let text = "1 100 20 5 6\n\n2 200 30 7\n3 300 40 8 9\n";
        let parsed = parse_slot(&FixationAdapter, text).unwrap();

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.stats.lines, 3);
        assert_eq!(parsed.stats.malformed, 1);
        assert_eq!(parsed.stats.dropped(), 1);
    }

    #[test]
    fn test_parse_slot_counts_unknown_keys_separately() {
        let text = "100 LMouseButton 1 10 20\n200 Mystery 9 1 2\n300 Short 1 10\n";
        let parsed = parse_slot(&EventAdapter, text).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.stats.unknown_event_keys, 1);
        assert_eq!(parsed.stats.malformed, 1);
    }

    #[test]
    fn test_parse_slot_gaze_zone_is_fatal() {
        let result = parse_slot(&GazeZoneAdapter, "anything\n");
        assert!(matches!(
            result,
            Err(GazeError::UnsupportedRecordKind(RecordKind::Gzd))
        ));

        // Empty text must not read as "no gaze zones"
        assert!(parse_slot(&GazeZoneAdapter, "").is_err());
    }
}
