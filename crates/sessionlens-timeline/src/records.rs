use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// One decoded line of a session log.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Record {
    #[serde(rename = "user")]
    User(UserMessage),
    #[serde(rename = "assistant")]
    Assistant(AssistantMessage),
    #[serde(rename = "system")]
    System(SystemNotice),
    #[serde(rename = "file-history-snapshot")]
    FileSnapshot(FileSnapshot),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub uuid: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,
    #[serde(default)]
    pub message: MessageBody,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_meta: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_compact_summary: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cwd: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantMessage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub uuid: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,
    #[serde(default)]
    pub message: MessageBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemNotice {
    #[serde(default, deserialize_with = "lenient_string")]
    pub uuid: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSnapshot {
    #[serde(default, deserialize_with = "lenient_string")]
    pub message_id: String,
    #[serde(default)]
    pub snapshot: SnapshotBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotBody {
    #[serde(default)]
    pub tracked_file_backups: IndexMap<String, BackupDescriptor>,
}

/// A captured prior version of a file, named `<hash>@v<version>`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDescriptor {
    #[serde(default, deserialize_with = "lenient_string")]
    pub backup_file_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub backup_time: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub content: Content,
}

/// Message payload: plain text or an ordered list of typed fragments.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Fragments(#[serde(deserialize_with = "lenient_fragments")] Vec<Fragment>),
    Other(Value),
}

impl Default for Content {
    fn default() -> Self {
        Content::Fragments(Vec::new())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fragment {
    Thinking {
        #[serde(default, deserialize_with = "lenient_string")]
        thinking: String,
    },
    Text {
        #[serde(default, deserialize_with = "lenient_string")]
        text: String,
    },
    ToolUse {
        #[serde(default, deserialize_with = "lenient_string")]
        id: String,
        #[serde(default, deserialize_with = "lenient_string")]
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

/// Deserialize a string field, mapping `null` and non-string values to `""`.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// Decode each fragment on its own; one that fails becomes [`Fragment::Other`]
/// so its neighbours survive and positions are kept.
fn lenient_fragments<'de, D>(deserializer: D) -> Result<Vec<Fragment>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(|value| Fragment::deserialize(value).unwrap_or(Fragment::Other))
        .collect())
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

/// Decode a newline-delimited session log.
///
/// Each line is decoded on its own. Blank lines and lines that are not valid
/// records are dropped, since a log may have been captured mid-write.
pub fn parse_records(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Record>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                dropped += 1;
                debug!(line = index + 1, error = %e, "Dropping undecodable record");
            }
        }
    }

    debug!(records = records.len(), dropped, "Decoded session log");
    records
}
