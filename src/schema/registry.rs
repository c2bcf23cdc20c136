//! Event schema registry
//!
//! Maps an event-type code to the ordered list of trailing fields that follow
//! the fixed `<time> <tag> <key>` prefix of an EVD line.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GazeError;

/// Number of tokens before the trailing fields of an event line
pub const EVENT_PREFIX_TOKENS: usize = 3;

/// Scalar type of a trailing field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Number,
    String,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Number => f.write_str("number"),
            ScalarKind::String => f.write_str("string"),
        }
    }
}

/// A named trailing field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: ScalarKind,
}

const fn number(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: ScalarKind::Number,
    }
}

const fn string(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: ScalarKind::String,
    }
}

const SLIDE_FIELDS: [FieldSpec; 2] = [number("data1"), string("description")];
const KEYBOARD_FIELDS: [FieldSpec; 3] = [number("data1"), number("data2"), string("description")];
const MOUSE_FIELDS: [FieldSpec; 2] = [number("data1"), number("data2")];

/// Known event-type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKey {
    LeftMouseButton,
    RightMouseButton,
    Keyboard,
    SlowSlide,
    HideSlide,
}

impl EventKey {
    pub const ALL: [EventKey; 5] = [
        EventKey::LeftMouseButton,
        EventKey::RightMouseButton,
        EventKey::Keyboard,
        EventKey::SlowSlide,
        EventKey::HideSlide,
    ];

    pub fn from_code(code: i64) -> Result<Self, GazeError> {
        match code {
            1 => Ok(EventKey::LeftMouseButton),
            2 => Ok(EventKey::RightMouseButton),
            3 => Ok(EventKey::Keyboard),
            4 => Ok(EventKey::SlowSlide),
            5 => Ok(EventKey::HideSlide),
            other => Err(GazeError::UnknownEventKey(other)),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            EventKey::LeftMouseButton => 1,
            EventKey::RightMouseButton => 2,
            EventKey::Keyboard => 3,
            EventKey::SlowSlide => 4,
            EventKey::HideSlide => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKey::LeftMouseButton => "L_MOUSE_BUTTON",
            EventKey::RightMouseButton => "R_MOUSE_BUTTON",
            EventKey::Keyboard => "KEYBOARD",
            EventKey::SlowSlide => "SLOW_SLIDE",
            EventKey::HideSlide => "HIDE_SLIDE",
        }
    }

    /// Ordered trailing fields for this key
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            EventKey::SlowSlide | EventKey::HideSlide => &SLIDE_FIELDS,
            EventKey::Keyboard => &KEYBOARD_FIELDS,
            EventKey::LeftMouseButton | EventKey::RightMouseButton => &MOUSE_FIELDS,
        }
    }

    /// Exact token count of a well-formed line for this key
    pub fn token_count(&self) -> usize {
        EVENT_PREFIX_TOKENS + self.fields().len()
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.code())
    }
}

/// Static lookup from event-type code to trailing schema
pub struct SchemaRegistry;

impl SchemaRegistry {
    /// Trailing fields for an event-type code; unknown codes are an error
    pub fn fields_for(event_key: i64) -> Result<&'static [FieldSpec], GazeError> {
        EventKey::from_code(event_key).map(|key| key.fields())
    }

    /// The whole table, ordered by code
    pub fn entries() -> impl Iterator<Item = (EventKey, &'static [FieldSpec])> {
        EventKey::ALL.iter().map(|key| (*key, key.fields()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_for_known_keys() {
        let names = |code| -> Vec<&str> {
            SchemaRegistry::fields_for(code)
                .unwrap()
                .iter()
                .map(|f| f.name)
                .collect()
        };

        assert_eq!(names(1), vec!["data1", "data2"]);
        assert_eq!(names(2), vec!["data1", "data2"]);
        assert_eq!(names(3), vec!["data1", "data2", "description"]);
        assert_eq!(names(4), vec!["data1", "description"]);
        assert_eq!(names(5), vec!["data1", "description"]);
    }

    #[test]
    fn test_field_kinds() {
        let keyboard = SchemaRegistry::fields_for(3).unwrap();
        assert_eq!(keyboard[0].kind, ScalarKind::Number);
        assert_eq!(keyboard[1].kind, ScalarKind::Number);
        assert_eq!(keyboard[2].kind, ScalarKind::String);
    }

    #[test]
    fn test_unknown_key_is_error() {
        let result = SchemaRegistry::fields_for(9);
        assert!(matches!(result, Err(GazeError::UnknownEventKey(9))));
        assert!(SchemaRegistry::fields_for(0).is_err());
    }

    #[test]
    fn test_code_round_trip_and_token_count() {
        for key in EventKey::ALL {
            assert_eq!(EventKey::from_code(key.code()).unwrap(), key);
        }
        assert_eq!(EventKey::LeftMouseButton.token_count(), 5);
        assert_eq!(EventKey::Keyboard.token_count(), 6);
        assert_eq!(SchemaRegistry::entries().count(), 5);
    }
}
