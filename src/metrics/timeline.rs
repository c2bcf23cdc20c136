//! Event timeline rendering

use crate::types::EventRecord;

/// Compact duration label such as `1m 1s 500.25ms`.
///
/// Input is rounded to three decimals; zero units are left out and the
/// fractional part stays on the milliseconds.
pub fn humanize_ms(ms: f64) -> String {
    let ms = round3(ms.abs());
    let minutes = (ms / 60_000.0).floor();
    let rest = ms - minutes * 60_000.0;
    let seconds = (rest / 1000.0).floor();
    let millis = round3(rest - seconds * 1000.0);

    let mut parts = Vec::with_capacity(3);
    if minutes > 0.0 {
        parts.push(format!("{}m", minutes));
    }
    if seconds > 0.0 {
        parts.push(format!("{}s", seconds));
    }
    if millis > 0.0 {
        parts.push(format!("{}ms", millis));
    }

    if parts.is_empty() {
        return "0ms".to_string();
    }
    parts.join(" ")
}

/// One timeline line: `<time> <tag> <data1> <data2> <description>`.
///
/// Missing or zero data fields and a missing description render empty.
pub fn event_message(event: &EventRecord) -> String {
    format!(
        "{} {} {} {} {}",
        humanize_ms(event.time),
        event.tag,
        data_field(Some(event.payload.data1())),
        data_field(event.payload.data2()),
        event.payload.description().unwrap_or_default()
    )
}

pub fn event_messages(events: &[EventRecord]) -> Vec<String> {
    events.iter().map(event_message).collect()
}

fn data_field(value: Option<f64>) -> String {
    match value {
        Some(v) if v != 0.0 && !v.is_nan() => v.to_string(),
        _ => String::new(),
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
