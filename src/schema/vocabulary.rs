//! Generated statistic vocabulary
//!
//! Descriptions the radar chart understands, in display order, with units.

/// Known generated-stat descriptions and their units
pub const METRIC_VOCABULARY: [(&str, &str); 8] = [
    ("mean duration", "ms"),
    ("mean saccade length", "mm"),
    ("mean saccade duration", "ms"),
    ("scanpath duration", "ms"),
    ("fixation to saccade ratio", ""),
    ("mean absolute degree", "°"),
    ("mean relative degree", "°"),
    ("convex hull area", "mm^2"),
];

pub fn is_known_metric(description: &str) -> bool {
    METRIC_VOCABULARY
        .iter()
        .any(|(known, _)| *known == description)
}

/// Unit for a known description; `Some("")` for unitless metrics
pub fn unit_for(description: &str) -> Option<&'static str> {
    METRIC_VOCABULARY
        .iter()
        .find(|(known, _)| *known == description)
        .map(|(_, unit)| *unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_lookup() {
        assert_eq!(unit_for("mean duration"), Some("ms"));
        assert_eq!(unit_for("convex hull area"), Some("mm^2"));
        assert_eq!(unit_for("fixation to saccade ratio"), Some(""));
        assert_eq!(unit_for("median duration"), None);
    }

    #[test]
    fn test_known_metric_is_exact_match() {
        assert!(is_known_metric("mean saccade length"));
        assert!(!is_known_metric("Mean Saccade Length"));
    }
}
