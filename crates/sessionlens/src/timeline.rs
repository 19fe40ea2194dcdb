use std::io::{IsTerminal, Write};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::Args;
use tracing::debug;

use sessionlens_timeline::{
    classify, parse_records, render, run_pipeline, FrontMatter, MarkdownFlavor, RawMode,
    RenderConfig, RenderMode, Rendered, Selection, Style, ALL_KINDS,
};

use crate::config::{Config, Toggle};
use crate::lookup::{render_records, Redaction};
use crate::resolve::{resolve_session, search_roots};
use crate::viewer::pipe_to_viewer;

const DEFAULT_WIDTH: i64 = 55;

#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// Session ID (or prefix) or path to a session log
    pub input: String,

    /// Range to show: <from>..<to>, <from>.., ..<to>, or a single marker
    pub range: Option<String>,

    /// Kind letters to show (default: UTRFWBGASQDI)
    #[arg(short, long)]
    pub types: Option<String>,

    /// Truncation width; 0 or less disables truncation (default: 55)
    #[arg(short, long, allow_negative_numbers = true)]
    pub width: Option<i64>,

    /// Prefix each line with its timestamp
    #[arg(long, conflicts_with = "no_timestamps")]
    pub timestamps: bool,

    /// Hide timestamps even when the config file enables them
    #[arg(long)]
    pub no_timestamps: bool,

    /// Color output
    #[arg(
        long,
        value_enum,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "always",
        conflicts_with = "no_colors"
    )]
    pub colors: Option<Toggle>,

    /// Disable colors
    #[arg(long)]
    pub no_colors: bool,

    /// Emoji icons (auto follows colors)
    #[arg(
        long,
        value_enum,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "always",
        conflicts_with = "no_emoji"
    )]
    pub emoji: Option<Toggle>,

    /// Disable emoji icons
    #[arg(long)]
    pub no_emoji: bool,

    /// Print markdown
    #[arg(long, conflicts_with_all = ["md_render", "raw", "raw2"])]
    pub md_source: bool,

    /// Pipe markdown through the configured viewer
    #[arg(long, conflicts_with_all = ["raw", "raw2"])]
    pub md_render: bool,

    /// Print the full records behind each event, payloads redacted
    #[arg(long, conflicts_with = "raw2")]
    pub raw: bool,

    /// Like --raw, with a hint on how to see redacted payloads
    #[arg(long)]
    pub raw2: bool,

    /// Keep payloads in --raw/--raw2 output
    #[arg(long)]
    pub no_redact: bool,

    /// Only show events whose description matches this regex
    #[arg(short = 'g', long)]
    pub grep: Option<String>,
}

impl TimelineArgs {
    /// Event selection. Priority: flag > config > default
    pub fn selection(&self, config: &Config) -> Selection {
        let types = self
            .types
            .clone()
            .or_else(|| config.types.clone())
            .unwrap_or_else(|| ALL_KINDS.to_string());

        Selection {
            types,
            pattern: self.grep.clone(),
            ..Selection::default()
        }
        .with_range(self.range.as_deref().unwrap_or(""))
    }

    /// Rendering settings. Priority: flag > config > default
    pub fn render_config(
        &self,
        config: &Config,
        stdout_is_terminal: bool,
        front_matter: FrontMatter,
    ) -> RenderConfig {
        let width = self.width.or(config.width).unwrap_or(DEFAULT_WIDTH);

        // The viewer does its own styling.
        let colors = if self.md_render || self.no_colors {
            false
        } else {
            self.colors
                .or(config.colors)
                .unwrap_or_default()
                .resolve(stdout_is_terminal)
        };
        let emoji = if self.no_emoji {
            false
        } else {
            self.emoji.or(config.emoji).unwrap_or_default().resolve(colors)
        };

        RenderConfig {
            mode: self.mode(front_matter),
            width: usize::try_from(width).unwrap_or(0),
            timestamps: self.timestamps(config),
            style: Style { colors, emoji },
        }
    }

    fn timestamps(&self, config: &Config) -> bool {
        if self.timestamps {
            true
        } else if self.no_timestamps {
            false
        } else {
            config.timestamps.unwrap_or(false)
        }
    }

    fn mode(&self, front_matter: FrontMatter) -> RenderMode {
        if self.raw {
            RenderMode::Raw(RawMode::Redact)
        } else if self.raw2 {
            RenderMode::Raw(RawMode::RedactWithHint)
        } else if self.md_source || self.md_render {
            let flavor = if self.md_render {
                MarkdownFlavor::Render
            } else {
                MarkdownFlavor::Source
            };
            RenderMode::Markdown {
                flavor,
                front_matter,
            }
        } else {
            RenderMode::Lines
        }
    }
}

/// What to do with the rendered timeline
#[derive(Debug, PartialEq, Eq)]
pub enum Output {
    Print(String),
    View(String),
}

fn front_matter() -> FrontMatter {
    FrontMatter {
        command: std::env::args().collect::<Vec<_>>().join(" "),
        generated: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

/// Classify, filter and render a session log's `text`.
pub fn build_output(
    text: &str,
    selection: &Selection,
    render_config: &RenderConfig,
    no_redact: bool,
) -> Result<Output> {
    let events = classify(&parse_records(text));
    let filtered = run_pipeline(&events, selection)?;
    debug!(events = events.len(), shown = filtered.len(), "Built timeline");

    let output = match (render(&filtered, render_config), &render_config.mode) {
        (Rendered::Markers(markers), RenderMode::Raw(mode)) => {
            let redaction = Redaction::for_mode(*mode, no_redact);
            Output::Print(
                render_records(text, &markers, redaction).context("Failed to encode records")?,
            )
        }
        (
            rendered,
            RenderMode::Markdown {
                flavor: MarkdownFlavor::Render,
                ..
            },
        ) => Output::View(rendered.into_text()),
        (rendered, _) => Output::Print(rendered.into_text()),
    };
    Ok(output)
}

/// Write `text` and a trailing newline to stdout. Empty text prints nothing.
pub fn write_stdout(text: &str) -> std::io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", text)?;
    stdout.flush()
}

pub async fn handle_timeline_command(args: TimelineArgs, config: &Config) -> Result<()> {
    let roots = search_roots(config.claude_dir());
    let path = resolve_session(&args.input, &roots)?;
    debug!(path = %path.display(), "Reading session");

    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let selection = args.selection(config);
    let render_config =
        args.render_config(config, std::io::stdout().is_terminal(), front_matter());

    match build_output(&text, &selection, &render_config, args.no_redact)? {
        Output::Print(out) => write_stdout(&out)?,
        Output::View(out) => pipe_to_viewer(&config.viewer(), &out).await?,
    }
    Ok(())
}
