use std::collections::HashSet;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::error::TimelineError;
use crate::types::{Event, EventKind, RangeMarker, ALL_KINDS};

lazy_static! {
    static ref KIND_PREFIX: Regex = Regex::new(r"^[A-Z][a-f0-9]").unwrap();
    static ref OFFSET_SUFFIX: Regex = Regex::new(r"([+-][0-9]+)$").unwrap();
}

/// What the caller wants to see out of a session's events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Kind letters to keep.
    pub types: String,
    /// Range start marker (`""` = from the first event).
    pub from: String,
    /// Range end marker (`""` = through the last event).
    pub to: String,
    /// Optional regular expression matched against `desc`.
    pub pattern: Option<String>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            types: ALL_KINDS.to_string(),
            from: String::new(),
            to: String::new(),
            pattern: None,
        }
    }
}

impl Selection {
    /// Set `from`/`to` from a `from..to` range expression.
    pub fn with_range(mut self, range: &str) -> Self {
        let (from, to) = parse_range(range);
        self.from = from;
        self.to = to;
        self
    }
}

/// Run every stage in order: dedup, prune, sort, range, type, pattern.
pub fn run_pipeline(events: &[Event], selection: &Selection) -> Result<Vec<Event>, TimelineError> {
    let pattern = selection
        .pattern
        .as_deref()
        .map(|p| {
            Regex::new(p).map_err(|source| TimelineError::InvalidPattern {
                pattern: p.to_string(),
                source,
            })
        })
        .transpose()?;

    let result = dedup(events);
    let result = prune_unbacked(&result);
    let result = sort_by_time(&result);
    let result = filter_by_range(&result, &selection.from, &selection.to);
    let mut result = filter_by_type(&result, &selection.types);
    if let Some(re) = pattern {
        result = filter_by_regex(&result, &re);
    }

    debug!(
        input = events.len(),
        output = result.len(),
        "Timeline pipeline finished"
    );
    Ok(result)
}

/// Keep the first event for each `(time, kind, desc)`.
pub fn dedup(events: &[Event]) -> Vec<Event> {
    let mut seen: HashSet<(&str, EventKind, &str)> = HashSet::new();
    events
        .iter()
        .filter(|e| seen.insert((e.time.as_str(), e.kind, e.desc.as_str())))
        .cloned()
        .collect()
}

/// Drop `no-backup` placeholders from any `ref` group that also has a versioned backup.
///
/// Survivors are emitted group by group, in order of each group's first appearance.
pub fn prune_unbacked(events: &[Event]) -> Vec<Event> {
    let mut groups: IndexMap<&str, Vec<&Event>> = IndexMap::new();
    for event in events {
        groups.entry(event.ref_id.as_str()).or_default().push(event);
    }

    let mut result = Vec::with_capacity(events.len());
    for group in groups.values() {
        let has_backup = group.iter().any(|e| e.desc.contains("@v"));
        for event in group {
            if has_backup && event.desc.contains("no-backup") {
                continue;
            }
            result.push((*event).clone());
        }
    }
    result
}

/// Stable ascending sort on `time`.
pub fn sort_by_time(events: &[Event]) -> Vec<Event> {
    let mut sorted = events.to_vec();
    sorted.sort_by(|a, b| a.time.cmp(&b.time));
    sorted
}

/// Split a range expression into `(from, to)` marker strings.
///
/// `""` selects everything, `"a"` selects `a..a`, `"..b"`, `"a.."` and `"a..b"`
/// select the obvious spans.
pub fn parse_range(range: &str) -> (String, String) {
    if range.is_empty() {
        return (String::new(), String::new());
    }
    match range.split_once("..") {
        Some((from, to)) => (from.to_string(), to.to_string()),
        None => (range.to_string(), range.to_string()),
    }
}

/// Parse a marker such as `Uabc12345+1` into an id prefix and an offset.
///
/// A leading uppercase letter is treated as a kind tag only when a hex digit
/// follows it.
pub fn parse_range_marker(marker: &str) -> RangeMarker {
    let mut rest = marker;

    if KIND_PREFIX.is_match(rest) {
        rest = &rest[1..];
    }

    let mut offset = 0i64;
    if let Some(m) = OFFSET_SUFFIX.find(rest) {
        let digits = m.as_str();
        offset = digits.parse::<i64>().unwrap_or(if digits.starts_with('-') {
            i64::MIN
        } else {
            i64::MAX
        });
        rest = &rest[..m.start()];
    }

    RangeMarker {
        id: rest.to_string(),
        offset,
    }
}

/// Inclusive slice between the first match of `from` and the last match of `to`.
///
/// Unmatched or empty markers fall back to the list bounds; offsets are applied
/// after matching and the resulting indices are clamped into range.
pub fn filter_by_range(events: &[Event], from: &str, to: &str) -> Vec<Event> {
    if events.is_empty() {
        return Vec::new();
    }

    let from = parse_range_marker(from);
    let to = parse_range_marker(to);
    let last = events.len() as i64 - 1;

    let start = if from.id.is_empty() {
        0
    } else {
        events
            .iter()
            .position(|e| e.ref_id.starts_with(&from.id))
            .map_or(0, |idx| (idx as i64).saturating_add(from.offset))
    };

    let end = if to.id.is_empty() {
        last
    } else {
        events
            .iter()
            .rposition(|e| e.ref_id.starts_with(&to.id))
            .map_or(last, |idx| (idx as i64).saturating_add(to.offset))
    };

    let start = start.clamp(0, last) as usize;
    let end = end.clamp(0, last) as usize;
    if start > end {
        return Vec::new();
    }
    events[start..=end].to_vec()
}

/// Keep events whose kind letter appears in `types`.
pub fn filter_by_type(events: &[Event], types: &str) -> Vec<Event> {
    events
        .iter()
        .filter(|e| types.contains(e.kind.letter()))
        .cloned()
        .collect()
}

/// Keep events whose `desc` matches `pattern`.
pub fn filter_by_pattern(events: &[Event], pattern: &str) -> Result<Vec<Event>, TimelineError> {
    let re = Regex::new(pattern).map_err(|source| TimelineError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    Ok(filter_by_regex(events, &re))
}

fn filter_by_regex(events: &[Event], re: &Regex) -> Vec<Event> {
    events
        .iter()
        .filter(|e| re.is_match(&e.desc))
        .cloned()
        .collect()
}
