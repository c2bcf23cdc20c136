//! Generated statistics parsing
//!
//! Generated files hold precomputed summary metrics as colon-delimited
//! `<description>:<value>` pairs, several pairs per line allowed.

use tracing::debug;

use crate::adapters::ParseStats;
use crate::types::GeneratedStat;

/// Parse one line into its (description, value) pairs.
///
/// Tokens are split on `:`, trimmed and empties dropped; pairs are consumed
/// greedily until fewer than two tokens remain. A pair whose value is not a
/// number is skipped.
pub fn parse_generated_line(line: &str) -> Vec<GeneratedStat> {
    parse_pairs(line).0
}

/// Parse a whole generated file, counting skipped pairs as malformed
pub fn parse_generated_text(text: &str) -> (Vec<GeneratedStat>, ParseStats) {
    let mut stats = ParseStats::default();
    let mut out = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        stats.lines += 1;

        let (parsed, skipped) = parse_pairs(line);
        if skipped > 0 {
            debug!(line = line_num + 1, skipped, "Skipping non-numeric generated stats");
            stats.malformed += skipped;
        }
        out.extend(parsed);
    }

    (out, stats)
}

fn parse_pairs(line: &str) -> (Vec<GeneratedStat>, usize) {
    let tokens: Vec<&str> = line
        .split(':')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();

    let mut stats = Vec::new();
    let mut skipped = 0;
    for pair in tokens.chunks_exact(2) {
        match pair[1].parse::<f64>() {
            Ok(value) if value.is_finite() => stats.push(GeneratedStat {
                description: pair[0].to_string(),
                value,
            }),
            _ => skipped += 1,
        }
    }

    (stats, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_two_pairs_on_one_line() {
        let stats = parse_generated_line("mean duration:123.4:mean saccade length:5.6");
        assert_eq!(
            stats,
            vec![
                GeneratedStat {
                    description: "mean duration".to_string(),
                    value: 123.4,
                },
                GeneratedStat {
                    description: "mean saccade length".to_string(),
                    value: 5.6,
                },
            ]
        );
    }

    #[test]
    fn test_dangling_token_is_ignored() {
        let stats = parse_generated_line("mean duration:100:scanpath duration");
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].value, 100.0);
    }

    #[test]
    fn test_empty_tokens_are_dropped() {
        let stats = parse_generated_line("::convex hull area::42.5:\r");
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].description, "convex hull area");
        assert_eq!(stats[0].value, 42.5);
    }

    #[test]
    fn test_text_counts_bad_values() {
        let text = "mean duration:250\nmean saccade length:n/a\n\nscanpath duration:9000\n";
        let (stats, counts) = parse_generated_text(text);
        assert_eq!(stats.len(), 2);
        assert_eq!(counts.lines, 3);
        assert_eq!(counts.malformed, 1);
    }
}
