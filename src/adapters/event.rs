//! Event (EVD) adapter
//!
//! Parses `<time> <tag> <key> [<trailing fields>]` lines. The trailing field
//! list is selected by the event key through the schema registry and the line
//! must carry exactly that many tokens.

use crate::error::GazeError;
use crate::schema::{EventKey, ScalarKind, SchemaRegistry, EVENT_PREFIX_TOKENS};
use crate::types::{EventPayload, EventRecord, RecordKind};

use super::{parse_integer, parse_number, RecordAdapter};

/// Event line adapter
pub struct EventAdapter;

impl RecordAdapter for EventAdapter {
    type Record = EventRecord;

    fn kind(&self) -> RecordKind {
        RecordKind::Evd
    }

    fn parse_line(&self, line: &str) -> Result<EventRecord, GazeError> {
        try_parse_event_line(line)
    }
}

/// A trailing token coerced to its declared kind
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scalar<'a> {
    Number(f64),
    Text(&'a str),
}

/// Parse an event line, reporting why a line was rejected
pub fn try_parse_event_line(line: &str) -> Result<EventRecord, GazeError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < EVENT_PREFIX_TOKENS {
        return Err(GazeError::MalformedLine(format!(
            "event line has {} tokens, expected at least {}",
            tokens.len(),
            EVENT_PREFIX_TOKENS
        )));
    }

    let time = parse_number(tokens[0], "time")?;
    let tag = tokens[1];
    let code = parse_integer(tokens[2], "event key")?;

    let fields = SchemaRegistry::fields_for(code)?;
    if EVENT_PREFIX_TOKENS + fields.len() != tokens.len() {
        return Err(GazeError::MalformedLine(format!(
            "event key {} expects {} tokens, line has {}",
            code,
            EVENT_PREFIX_TOKENS + fields.len(),
            tokens.len()
        )));
    }

    let values = fields
        .iter()
        .zip(&tokens[EVENT_PREFIX_TOKENS..])
        .map(|(field, token)| match field.kind {
            ScalarKind::Number => parse_number(token, field.name).map(Scalar::Number),
            ScalarKind::String => Ok(Scalar::Text(token)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let key = EventKey::from_code(code)?;
    Ok(EventRecord {
        time,
        tag: tag.to_string(),
        payload: build_payload(key, &values)?,
    })
}

/// Parse an event line; schema mismatches and unknown keys yield `None`
pub fn parse_event_line(line: &str) -> Option<EventRecord> {
    try_parse_event_line(line).ok()
}

fn build_payload(key: EventKey, values: &[Scalar<'_>]) -> Result<EventPayload, GazeError> {
    use Scalar::{Number, Text};

    let payload = match (key, values) {
        (EventKey::SlowSlide, [Number(data1), Text(description)]) => EventPayload::SlowSlide {
            data1: *data1,
            description: description.to_string(),
        },
        (EventKey::HideSlide, [Number(data1), Text(description)]) => EventPayload::HideSlide {
            data1: *data1,
            description: description.to_string(),
        },
        (EventKey::Keyboard, [Number(data1), Number(data2), Text(description)]) => {
            EventPayload::Keyboard {
                data1: *data1,
                data2: *data2,
                description: description.to_string(),
            }
        }
        (EventKey::LeftMouseButton, [Number(data1), Number(data2)]) => {
            EventPayload::LeftMouseButton {
                data1: *data1,
                data2: *data2,
            }
        }
        (EventKey::RightMouseButton, [Number(data1), Number(data2)]) => {
            EventPayload::RightMouseButton {
                data1: *data1,
                data2: *data2,
            }
        }
        _ => {
            return Err(GazeError::MalformedLine(format!(
                "values do not match schema of {}",
                key
            )))
        }
    };

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_left_mouse_button() {
        let record = parse_event_line("1520 LMouseButton 1 640 480").unwrap();
        assert_eq!(record.time, 1520.0);
        assert_eq!(record.tag, "LMouseButton");
        assert_eq!(
            record.payload,
            EventPayload::LeftMouseButton {
                data1: 640.0,
                data2: 480.0,
            }
        );
        assert_eq!(record.payload.description(), None);
    }

    #[test]
    fn test_mouse_button_token_count_must_match() {
        assert!(parse_event_line("1520 LMouseButton 1 640").is_none());
        assert!(parse_event_line("1520 LMouseButton 1 640 480 extra").is_none());
    }

    #[test]
    fn test_keyboard_event() {
        let record = parse_event_line("900 Keyboard 3 65 1 A").unwrap();
        assert_eq!(
            record.payload,
            EventPayload::Keyboard {
                data1: 65.0,
                data2: 1.0,
                description: "A".to_string(),
            }
        );
        assert_eq!(record.event_key(), EventKey::Keyboard);
    }

    #[test]
    fn test_slide_events() {
        let slow = parse_event_line("10 SlowSlide 4 2 slide2.png").unwrap();
        assert_eq!(slow.payload.description(), Some("slide2.png"));
        assert_eq!(slow.payload.data2(), None);

        let hide = parse_event_line("20 HideSlide 5 2 slide2.png").unwrap();
        assert_eq!(hide.event_key(), EventKey::HideSlide);
    }

    #[test]
    fn test_number_field_must_parse() {
        let result = try_parse_event_line("900 Keyboard 3 sixty-five 1 A");
        assert!(matches!(result, Err(GazeError::MalformedLine(_))));
    }

    #[test]
    fn test_unknown_key() {
        let result = try_parse_event_line("900 Gaze 7 1 2");
        assert!(matches!(result, Err(GazeError::UnknownEventKey(7))));
        assert!(parse_event_line("900 Gaze 7 1 2").is_none());
    }

    #[test]
    fn test_short_line() {
        assert!(matches!(
            try_parse_event_line("900 Keyboard"),
            Err(GazeError::MalformedLine(_))
        ));
    }
}
