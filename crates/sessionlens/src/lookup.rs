//! Look up the session records behind timeline markers.
//!
//! Raw modes print markers instead of lines; this module turns those markers
//! back into the full records they came from, stripped of bookkeeping keys and
//! with bulky payloads replaced by a size note.

use serde_json::{Map, Value};
use tracing::debug;

use sessionlens_timeline::{EventKind, Marker, RawMode};

/// Keys dropped from every object, at any depth.
pub const OMIT_KEYS: &[&str] = &[
    "signature",
    "isSidechain",
    "userType",
    "version",
    "slug",
    "requestId",
    "sessionId",
    "stop_reason",
    "stop_sequence",
    "usage",
    "id",
    "role",
    "parentUuid",
    "uuid",
    "thinkingMetadata",
];

/// Keys whose values are replaced with a size note.
pub const REDACT_KEYS: &[&str] = &["data"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redaction {
    /// Keep payloads as they are.
    Off,
    /// `[omitted:<size>]`
    Omit,
    /// `[omitted:<size> --raw --no-redact]`
    OmitWithHint,
}

impl Redaction {
    pub fn for_mode(mode: RawMode, no_redact: bool) -> Self {
        if no_redact {
            return Redaction::Off;
        }
        match mode {
            RawMode::Redact => Redaction::Omit,
            RawMode::RedactWithHint => Redaction::OmitWithHint,
        }
    }

    fn note(self, size: usize) -> Option<String> {
        match self {
            Redaction::Off => None,
            Redaction::Omit => Some(format!("[omitted:{}]", format_size(size))),
            Redaction::OmitWithHint => Some(format!(
                "[omitted:{} --raw --no-redact]",
                format_size(size)
            )),
        }
    }
}

/// Human-readable size: `0B`, `1023B`, `1.0K`, `2.5M`. The decimal is floored.
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * 1024;

    let (tenths, unit) = if bytes >= MB {
        (bytes * 10 / MB, "M")
    } else if bytes >= KB {
        (bytes * 10 / KB, "K")
    } else {
        return format!("{}B", bytes);
    };
    format!("{}.{}{}", tenths / 10, tenths % 10, unit)
}

fn string_field<'a>(record: &'a Value, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or("")
}

fn matches_marker(record: &Value, marker: &Marker) -> bool {
    if marker.ref_id.is_empty() {
        return false;
    }
    if string_field(record, "uuid").starts_with(&marker.ref_id) {
        return true;
    }
    marker.kind == EventKind::File && string_field(record, "messageId").starts_with(&marker.ref_id)
}

/// Records matching any of `markers`, each once, in order of first match.
///
/// Lines that are not valid JSON are skipped.
pub fn find_records(text: &str, markers: &[Marker]) -> Vec<Value> {
    let records: Vec<Value> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();

    let mut emitted = vec![false; records.len()];
    let mut found = Vec::new();

    for marker in markers {
        for (index, record) in records.iter().enumerate() {
            if !emitted[index] && matches_marker(record, marker) {
                emitted[index] = true;
                found.push(record.clone());
            }
        }
    }

    debug!(
        markers = markers.len(),
        records = found.len(),
        "Looked up raw records"
    );
    found
}

/// Strip [`OMIT_KEYS`] and apply `redaction` to [`REDACT_KEYS`], recursively.
pub fn scrub(value: &Value, redaction: Redaction) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|v| scrub(v, redaction)).collect()),
        Value::Object(map) => {
            let mut result = Map::new();
            for (key, v) in map {
                if OMIT_KEYS.contains(&key.as_str()) {
                    continue;
                }
                let replacement = if REDACT_KEYS.contains(&key.as_str()) {
                    redaction.note(payload_size(v))
                } else {
                    None
                };
                let v = match replacement {
                    Some(note) => Value::String(note),
                    None => scrub(v, redaction),
                };
                result.insert(key.clone(), v);
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}

fn payload_size(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        other => other.to_string().chars().count(),
    }
}

/// Pretty-print each matching record, scrubbed, separated by newlines.
pub fn render_records(
    text: &str,
    markers: &[Marker],
    redaction: Redaction,
) -> serde_json::Result<String> {
    let blocks = find_records(text, markers)
        .iter()
        .map(|record| serde_json::to_string_pretty(&scrub(record, redaction)))
        .collect::<serde_json::Result<Vec<_>>>()?;
    Ok(blocks.join("\n"))
}
