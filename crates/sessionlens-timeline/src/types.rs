use std::fmt;

use serde::{Deserialize, Serialize};

/// Every event kind letter, in the canonical order used as the default type filter.
pub const ALL_KINDS: &str = "UTRFWBGASQDI";

/// Number of id characters kept in an event `ref`.
pub const REF_LEN: usize = 8;

/// Classified event kind. Each variant renders as a single letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "U")]
    User,
    #[serde(rename = "T")]
    Think,
    #[serde(rename = "R")]
    Response,
    #[serde(rename = "F")]
    File,
    #[serde(rename = "W")]
    Web,
    #[serde(rename = "B")]
    Bash,
    #[serde(rename = "G")]
    Grep,
    #[serde(rename = "A")]
    Agent,
    #[serde(rename = "S")]
    Skill,
    #[serde(rename = "Q")]
    Question,
    #[serde(rename = "D")]
    Todo,
    #[serde(rename = "I")]
    Info,
}

impl EventKind {
    pub fn letter(self) -> char {
        match self {
            EventKind::User => 'U',
            EventKind::Think => 'T',
            EventKind::Response => 'R',
            EventKind::File => 'F',
            EventKind::Web => 'W',
            EventKind::Bash => 'B',
            EventKind::Grep => 'G',
            EventKind::Agent => 'A',
            EventKind::Skill => 'S',
            EventKind::Question => 'Q',
            EventKind::Todo => 'D',
            EventKind::Info => 'I',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'U' => Some(EventKind::User),
            'T' => Some(EventKind::Think),
            'R' => Some(EventKind::Response),
            'F' => Some(EventKind::File),
            'W' => Some(EventKind::Web),
            'B' => Some(EventKind::Bash),
            'G' => Some(EventKind::Grep),
            'A' => Some(EventKind::Agent),
            'S' => Some(EventKind::Skill),
            'Q' => Some(EventKind::Question),
            'D' => Some(EventKind::Todo),
            'I' => Some(EventKind::Info),
            _ => None,
        }
    }

    /// Kinds rendered as full blocks in markdown output.
    pub fn is_long_form(self) -> bool {
        matches!(
            self,
            EventKind::Question | EventKind::Think | EventKind::Response | EventKind::User
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A classified, renderable unit derived from one fragment of a source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    #[serde(rename = "ref")]
    pub ref_id: String,
    /// ISO-8601 timestamp, optionally suffixed with `_NNNNN` for ordering.
    pub time: String,
    pub desc: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub notrunc: bool,
}

impl Event {
    pub fn new(
        kind: EventKind,
        ref_id: impl Into<String>,
        time: impl Into<String>,
        desc: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            ref_id: ref_id.into(),
            time: time.into(),
            desc: desc.into(),
            notrunc: false,
        }
    }

    pub fn untruncated(mut self) -> Self {
        self.notrunc = true;
        self
    }

    pub fn marker(&self) -> Marker {
        Marker {
            kind: self.kind,
            ref_id: self.ref_id.clone(),
        }
    }
}

/// `<kind><ref>` cross-reference to the record an event came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marker {
    pub kind: EventKind,
    pub ref_id: String,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.ref_id)
    }
}

/// A parsed range endpoint: an id prefix plus a signed index offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeMarker {
    pub id: String,
    pub offset: i64,
}

/// Truncate a record id to its event `ref`.
pub fn ref_of(id: &str) -> String {
    id.chars().take(REF_LEN).collect()
}
