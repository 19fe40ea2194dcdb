//! # sessionlens-timeline
//!
//! Turns a recorded session log into a compact, chronologically ordered
//! timeline of classified events.
//!
//! ## Stages
//!
//! - [`parse_records`] - decode newline-delimited JSON, dropping bad lines
//! - [`classify`] - map records to [`Event`]s by content shape and tool name
//! - [`run_pipeline`] - dedup, prune placeholders, sort, and apply a [`Selection`]
//! - [`render`] - produce text (or markers) from a [`RenderConfig`]
//!
//! ## Event kinds
//!
//! `U` user, `T` think, `R` response, `F` file, `W` web, `B` bash,
//! `G` grep/glob, `A` agent, `S` skill, `Q` question, `D` todo, `I` info.

pub mod classify;
pub mod error;
pub mod pipeline;
pub mod records;
pub mod render;
pub mod text;
pub mod types;

pub use classify::{classify, session_cwd, ToolName};
pub use error::TimelineError;
pub use pipeline::{
    dedup, filter_by_pattern, filter_by_range, filter_by_type, parse_range, parse_range_marker,
    prune_unbacked, run_pipeline, sort_by_time, Selection,
};
pub use records::{parse_records, Record};
pub use render::{
    render, FrontMatter, MarkdownFlavor, RawMode, RenderConfig, RenderMode, Rendered, Style,
};
pub use types::{Event, EventKind, Marker, RangeMarker, ALL_KINDS};
