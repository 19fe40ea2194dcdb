use crate::text::{clean_time, truncate};
use crate::types::{Event, EventKind, Marker};

const RESET: &str = "\x1b[0m";
const HORIZONTAL_RULE: &str = "---";

/// Which raw variant was requested. Both emit markers only; the variant tells
/// the re-lookup collaborator how to redact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawMode {
    Redact,
    RedactWithHint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkdownFlavor {
    /// Emit markdown text as-is.
    Source,
    /// Same text, meant to be piped through an external viewer.
    Render,
}

/// Header prepended to markdown output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub command: String,
    pub generated: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderMode {
    Raw(RawMode),
    Lines,
    Markdown {
        flavor: MarkdownFlavor,
        front_matter: FrontMatter,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub colors: bool,
    pub emoji: bool,
}

/// Complete rendering configuration consumed by [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub mode: RenderMode,
    /// Truncation width in characters; 0 disables truncation.
    pub width: usize,
    pub timestamps: bool,
    pub style: Style,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::Lines,
            width: 55,
            timestamps: false,
            style: Style::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Text(String),
    Markers(Vec<Marker>),
}

impl Rendered {
    /// Text form: rendered output, or one marker per line.
    pub fn into_text(self) -> String {
        match self {
            Rendered::Text(text) => text,
            Rendered::Markers(markers) => markers
                .iter()
                .map(Marker::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Render filtered events according to `config`.
pub fn render(events: &[Event], config: &RenderConfig) -> Rendered {
    match &config.mode {
        RenderMode::Raw(_) => Rendered::Markers(events.iter().map(Event::marker).collect()),
        RenderMode::Lines => {
            let lines: Vec<String> = events
                .iter()
                .map(|e| config.style.apply(e.kind, &format_line(e, config, false)))
                .collect();
            Rendered::Text(lines.join("\n"))
        }
        RenderMode::Markdown { front_matter, .. } => {
            let mut output = vec![
                HORIZONTAL_RULE.to_string(),
                format!("command: {}", front_matter.command),
                format!("generated: {}", front_matter.generated),
                HORIZONTAL_RULE.to_string(),
                String::new(),
            ];
            let mut first_block = true;

            for event in events {
                if event.kind.is_long_form() {
                    if !first_block {
                        output.push(HORIZONTAL_RULE.to_string());
                        output.push(String::new());
                    }
                    first_block = false;

                    output.push(config.style.apply(event.kind, &marker_line(event, config)));
                    output.push(String::new());
                    output.push(event.desc.clone());
                    output.push(String::new());
                } else {
                    output.push(config.style.apply(event.kind, &format_line(event, config, true)));
                }
            }
            Rendered::Text(output.join("\n"))
        }
    }
}

fn marker_line(event: &Event, config: &RenderConfig) -> String {
    if config.timestamps {
        format!("{} {}", clean_time(&event.time), event.marker())
    } else {
        event.marker().to_string()
    }
}

/// Single-line form of an event: marker, optional timestamp, description.
///
/// Markdown output keeps `desc` verbatim; otherwise it is flattened and cut
/// unless the event is marked `notrunc`.
pub fn format_line(event: &Event, config: &RenderConfig, markdown: bool) -> String {
    let desc = if event.notrunc || markdown {
        event.desc.clone()
    } else {
        truncate(&event.desc.replace('\n', " "), config.width)
    };

    format!("{} {}", marker_line(event, config), desc)
}

impl Style {
    fn palette(kind: EventKind) -> (&'static str, &'static str) {
        match kind {
            EventKind::User => ("\x1b[32m", "👤"),
            EventKind::Think => ("\x1b[3;34m", "🧠"),
            EventKind::Response | EventKind::Question => ("\x1b[34m", "🤖"),
            EventKind::Bash => ("\x1b[2m", "▶️"),
            EventKind::File => ("\x1b[2m", "👀"),
            EventKind::Web => ("\x1b[2m", "🛜"),
            EventKind::Skill => ("\x1b[2m", "⚡️"),
            EventKind::Grep => ("\x1b[2m", "🔍"),
            EventKind::Agent => ("\x1b[2m", "👻"),
            EventKind::Todo => ("\x1b[2m", "✅"),
            EventKind::Info => ("\x1b[2m", "ℹ️"),
        }
    }

    /// Wrap an already formatted line in the style for `kind`.
    pub fn apply(&self, kind: EventKind, line: &str) -> String {
        if !self.colors && !self.emoji {
            return line.to_string();
        }

        let (ansi, mut icon) = Self::palette(kind);
        if kind == EventKind::File && (line.contains("no-backup-") || line.contains("@v")) {
            icon = "📝";
        }

        let (start, end) = if self.colors { (ansi, RESET) } else { ("", "") };
        let icon = if self.emoji {
            format!("{} ", icon)
        } else {
            String::new()
        };
        let separator = if kind == EventKind::User { "\n\n" } else { "" };

        format!("{}{}{}{}{}", start, separator, icon, line, end)
    }
}
