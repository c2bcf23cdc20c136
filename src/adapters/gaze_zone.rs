//! Gaze-zone (GZD) adapter
//!
//! The GZD file format is undefined. Parsing fails loudly so a future format
//! addition is never masked by an empty result.

use serde::Serialize;

use crate::error::GazeError;
use crate::types::RecordKind;

use super::RecordAdapter;

/// Placeholder record type for gaze-zone data; never constructed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GazeZoneRecord {}

/// Gaze-zone adapter stub
pub struct GazeZoneAdapter;

impl RecordAdapter for GazeZoneAdapter {
    type Record = GazeZoneRecord;

    fn kind(&self) -> RecordKind {
        RecordKind::Gzd
    }

    fn parse_line(&self, line: &str) -> Result<GazeZoneRecord, GazeError> {
        parse_gaze_zone_line(line)
    }

    fn ensure_supported(&self) -> Result<(), GazeError> {
        Err(GazeError::UnsupportedRecordKind(RecordKind::Gzd))
    }
}

/// Always fails with `UnsupportedRecordKind`
pub fn parse_gaze_zone_line(_line: &str) -> Result<GazeZoneRecord, GazeError> {
    Err(GazeError::UnsupportedRecordKind(RecordKind::Gzd))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaze_zone_line_fails_loudly() {
        let result = parse_gaze_zone_line("1 2 3");
        assert!(matches!(
            result,
            Err(GazeError::UnsupportedRecordKind(RecordKind::Gzd))
        ));
        assert!(!result.unwrap_err().is_line_level());
    }
}
