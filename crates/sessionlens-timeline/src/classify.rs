use std::str::FromStr;

use serde_json::Value;

use crate::records::{
    AssistantMessage, Content, FileSnapshot, Fragment, Record, SystemNotice, UserMessage,
};
use crate::text::{command_args, command_name, last_segments, shorten_path, summary, teammate_id};
use crate::types::{ref_of, Event, EventKind};

/// Tools the classifier knows how to summarize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    Read,
    Write,
    Edit,
    WebFetch,
    WebSearch,
    Bash,
    BashOutput,
    Grep,
    Glob,
    Task,
    TaskOutput,
    Skill,
    AskUserQuestion,
    TodoWrite,
}

impl ToolName {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::Read => "Read",
            ToolName::Write => "Write",
            ToolName::Edit => "Edit",
            ToolName::WebFetch => "WebFetch",
            ToolName::WebSearch => "WebSearch",
            ToolName::Bash => "Bash",
            ToolName::BashOutput => "BashOutput",
            ToolName::Grep => "Grep",
            ToolName::Glob => "Glob",
            ToolName::Task => "Task",
            ToolName::TaskOutput => "TaskOutput",
            ToolName::Skill => "Skill",
            ToolName::AskUserQuestion => "AskUserQuestion",
            ToolName::TodoWrite => "TodoWrite",
        }
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Read" => Ok(ToolName::Read),
            "Write" => Ok(ToolName::Write),
            "Edit" => Ok(ToolName::Edit),
            "WebFetch" => Ok(ToolName::WebFetch),
            "WebSearch" => Ok(ToolName::WebSearch),
            "Bash" => Ok(ToolName::Bash),
            "BashOutput" => Ok(ToolName::BashOutput),
            "Grep" => Ok(ToolName::Grep),
            "Glob" => Ok(ToolName::Glob),
            "Task" => Ok(ToolName::Task),
            "TaskOutput" => Ok(ToolName::TaskOutput),
            "Skill" => Ok(ToolName::Skill),
            "AskUserQuestion" => Ok(ToolName::AskUserQuestion),
            "TodoWrite" => Ok(ToolName::TodoWrite),
            _ => Err(format!("Unknown tool: {}", s)),
        }
    }
}

/// Turn decoded records into timeline events, in record order.
pub fn classify(records: &[Record]) -> Vec<Event> {
    let cwd = session_cwd(records);
    let mut events = Vec::new();

    for record in records {
        match record {
            Record::User(message) => classify_user(message, &mut events),
            Record::Assistant(message) => classify_assistant(message, &mut events),
            Record::System(notice) => classify_system(notice, &mut events),
            Record::FileSnapshot(snapshot) => classify_snapshot(snapshot, cwd, &mut events),
            Record::Unknown => {}
        }
    }

    events
}

/// Working directory of the first user record that carries one.
pub fn session_cwd(records: &[Record]) -> &str {
    records
        .iter()
        .find_map(|record| match record {
            Record::User(message) if !message.cwd.is_empty() => Some(message.cwd.as_str()),
            _ => None,
        })
        .unwrap_or("")
}

fn classify_user(message: &UserMessage, events: &mut Vec<Event>) {
    let ref_id = ref_of(&message.uuid);
    let time = &message.timestamp;

    if message.is_compact_summary {
        events.push(Event::new(EventKind::Info, ref_id, time, "[auto-compact]"));
        return;
    }
    if message.is_meta {
        return;
    }

    match &message.message.content {
        Content::Text(text) => events.push(classify_user_text(text, &ref_id, time)),
        Content::Fragments(fragments) => {
            for fragment in fragments {
                if let Fragment::Text { text } = fragment {
                    events.push(classify_user_text(text, &ref_id, time));
                }
            }
        }
        Content::Other(_) => {}
    }
}

fn classify_user_text(text: &str, ref_id: &str, time: &str) -> Event {
    if text.starts_with("[Request interrupted") {
        return Event::new(EventKind::Info, ref_id, time, text);
    }
    if text.starts_with("<task-notification>") {
        let finished = summary(text);
        return Event::new(
            EventKind::Info,
            ref_id,
            time,
            format!("[task-notification] {}", finished),
        );
    }
    if text.starts_with("<teammate-message") {
        let teammate = teammate_id(text);
        return Event::new(
            EventKind::Info,
            ref_id,
            time,
            format!("[teammate-message] {}", teammate),
        );
    }
    if text.starts_with('<') && text.contains("<command-name>") {
        return Event::new(EventKind::User, ref_id, time, slash_command(text));
    }
    Event::new(EventKind::User, ref_id, time, text)
}

fn slash_command(text: &str) -> String {
    format!(
        "{} {}",
        command_name(text),
        command_args(text)
    )
}

fn classify_assistant(message: &AssistantMessage, events: &mut Vec<Event>) {
    let ref_id = ref_of(&message.uuid);
    let timestamp = &message.timestamp;

    let Content::Fragments(fragments) = &message.message.content else {
        return;
    };

    for (i, fragment) in fragments.iter().enumerate() {
        match fragment {
            Fragment::Thinking { thinking } => {
                events.push(Event::new(EventKind::Think, &ref_id, timestamp, thinking));
            }
            Fragment::Text { text } => {
                if text.chars().all(char::is_whitespace) {
                    continue;
                }
                events.push(Event::new(EventKind::Response, &ref_id, timestamp, text));
            }
            Fragment::ToolUse { id, name, input } => {
                let time = format!("{}_{:05}", timestamp, i);
                if let Some(event) = classify_tool_use(id, name, input, &ref_id, &time) {
                    events.push(event);
                }
            }
            Fragment::Other => {}
        }
    }
}

fn str_field<'a>(input: &'a Value, key: &str) -> &'a str {
    input.get(key).and_then(Value::as_str).unwrap_or("")
}

fn first_non_empty<'a>(input: &'a Value, keys: &[&str]) -> &'a str {
    keys.iter()
        .map(|key| str_field(input, key))
        .find(|value| !value.is_empty())
        .unwrap_or("")
}

/// Summarize one tool invocation. Tools outside the registry produce nothing.
fn classify_tool_use(
    fragment_id: &str,
    name: &str,
    input: &Value,
    ref_id: &str,
    time: &str,
) -> Option<Event> {
    let tool = name.parse::<ToolName>().ok()?;

    let event = match tool {
        ToolName::Read => Event::new(
            EventKind::File,
            ref_id,
            time,
            last_segments(str_field(input, "file_path"), 2),
        ),
        ToolName::Write | ToolName::Edit => Event::new(
            EventKind::File,
            ref_id,
            time,
            format!(
                "{} no-backup-{}",
                last_segments(str_field(input, "file_path"), 2),
                tool.as_str().to_lowercase()
            ),
        ),
        ToolName::WebFetch | ToolName::WebSearch => Event::new(
            EventKind::Web,
            ref_id,
            time,
            first_non_empty(input, &["url", "query"]),
        )
        .untruncated(),
        ToolName::Bash | ToolName::BashOutput => Event::new(
            EventKind::Bash,
            ref_id,
            time,
            shorten_leading_path(first_non_empty(input, &["command", "description"])),
        ),
        ToolName::Grep | ToolName::Glob => Event::new(
            EventKind::Grep,
            ref_id,
            time,
            format!("{}: {}", tool.as_str(), str_field(input, "pattern")),
        ),
        ToolName::Task => {
            let chars: Vec<char> = fragment_id.chars().collect();
            let short_id: String = chars[chars.len().saturating_sub(8)..].iter().collect();
            Event::new(
                EventKind::Agent,
                ref_id,
                time,
                format!(
                    "{} {}: {}",
                    short_id,
                    str_field(input, "description"),
                    str_field(input, "prompt")
                ),
            )
        }
        ToolName::TaskOutput => Event::new(
            EventKind::Agent,
            ref_id,
            time,
            format!("{} output", str_field(input, "task_id")),
        ),
        ToolName::Skill => Event::new(EventKind::Skill, ref_id, time, str_field(input, "skill")),
        ToolName::AskUserQuestion => {
            let question = input
                .get("questions")
                .and_then(Value::as_array)
                .and_then(|questions| questions.first())
                .map(|q| str_field(q, "question"))
                .unwrap_or("");
            Event::new(EventKind::Question, ref_id, time, question)
        }
        ToolName::TodoWrite => {
            let count = input
                .get("todos")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            Event::new(
                EventKind::Todo,
                ref_id,
                time,
                format!("Todo: {} items", count),
            )
        }
    };

    Some(event)
}

/// Shorten the first token of a command line when it is an absolute path.
fn shorten_leading_path(command: &str) -> String {
    if !command.starts_with('/') {
        return command.to_string();
    }
    match command.split_once(' ') {
        Some((program, rest)) => format!("{} {}", shorten_path(program, 2), rest),
        None => shorten_path(command, 2),
    }
}

fn classify_system(notice: &SystemNotice, events: &mut Vec<Event>) {
    if notice.content.contains("<command-name>") {
        events.push(Event::new(
            EventKind::User,
            ref_of(&notice.uuid),
            &notice.timestamp,
            slash_command(&notice.content),
        ));
    }
}

fn classify_snapshot(snapshot: &FileSnapshot, cwd: &str, events: &mut Vec<Event>) {
    let ref_id = ref_of(&snapshot.message_id);

    for (key, backup) in &snapshot.snapshot.tracked_file_backups {
        if backup.backup_file_name.is_empty() {
            continue;
        }

        let path = if key.starts_with('/') {
            key.clone()
        } else {
            format!("{}/{}", cwd, key)
        };

        let mut parts = backup.backup_file_name.split('@');
        let hash: String = parts.next().unwrap_or("").chars().take(8).collect();
        let version = parts.next().unwrap_or("");

        events.push(Event::new(
            EventKind::File,
            &ref_id,
            &backup.backup_time,
            format!("{} {}@{}", last_segments(&path, 2), hash, version),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::parse_records;

    fn classify_text(text: &str) -> Vec<Event> {
        classify(&parse_records(text))
    }

    #[test]
    fn test_tool_name_registry() {
        assert_eq!("Read".parse::<ToolName>(), Ok(ToolName::Read));
        assert_eq!("TodoWrite".parse::<ToolName>(), Ok(ToolName::TodoWrite));
        assert!("NotebookEdit".parse::<ToolName>().is_err());
        assert!("read".parse::<ToolName>().is_err());
    }

    #[test]
    fn test_shorten_leading_path() {
        assert_eq!(
            shorten_leading_path("/usr/local/bin/node script.js"),
            "\u{2026}/bin/node script.js"
        );
        assert_eq!(shorten_leading_path("/usr/local/bin/node"), "\u{2026}/bin/node");
        assert_eq!(shorten_leading_path("ls -la /tmp/a/b/c"), "ls -la /tmp/a/b/c");
    }

    #[test]
    fn test_session_cwd_uses_first_user_with_cwd() {
        let events = classify_text(
            r#"{"type":"file-history-snapshot","messageId":"m0000000","snapshot":{"trackedFileBackups":{"Cargo.toml":{"backupFileName":"aaaaaaaaaa@v1","backupTime":"t1"}}}}
{"type":"user","uuid":"u1","timestamp":"t0","message":{"content":"one"}}
{"type":"user","uuid":"u2","timestamp":"t0","cwd":"/work/repo","message":{"content":"two"}}
{"type":"user","uuid":"u3","timestamp":"t0","cwd":"/other/place","message":{"content":"three"}}"#,
        );

        assert_eq!(events[0].desc, "repo/Cargo.toml aaaaaaaa@v1");
        assert_eq!(events[0].ref_id, "m0000000");
    }

    #[test]
    fn test_malformed_fragments_keep_sibling_events() {
        let events = classify_text(
            r#"{"type":"user","uuid":"aabbccdd-1","timestamp":"t0","message":{"content":[{"text":"no type"},{"type":"text","text":"real words"}]}}
{"type":"assistant","uuid":"bbccddee-1","timestamp":"t1","message":{"content":["stray",{"type":"text","text":"answer"},{"type":"tool_use","name":"Read","input":{"file_path":"/a/b/c.rs"}}]}}"#,
        );

        let summary: Vec<(EventKind, &str, &str)> = events
            .iter()
            .map(|e| (e.kind, e.time.as_str(), e.desc.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (EventKind::User, "t0", "real words"),
                (EventKind::Response, "t1", "answer"),
                (EventKind::File, "t1_00002", "b/c.rs"),
            ]
        );
    }

    #[test]
    fn test_unknown_tool_emits_nothing() {
        let events = classify_text(
            r#"{"type":"assistant","uuid":"bbccddee-1","timestamp":"t","message":{"content":[{"type":"tool_use","name":"NotebookEdit","input":{}}]}}"#,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_tool_use_missing_input_degrades() {
        let events = classify_text(
            r#"{"type":"assistant","uuid":"bbccddee-1","timestamp":"t","message":{"content":[{"type":"tool_use","name":"Edit"},{"type":"tool_use","name":"Grep","input":{}}]}}"#,
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].desc, " no-backup-edit");
        assert_eq!(events[1].desc, "Grep: ");
        assert_eq!(events[1].time, "t_00001");
    }
}
