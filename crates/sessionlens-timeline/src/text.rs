//! Small string helpers shared by the classifier and the renderer.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref COMMAND_NAME: Regex = tag_pattern("command-name");
    static ref COMMAND_ARGS: Regex = tag_pattern("command-args");
    static ref SUMMARY: Regex = tag_pattern("summary");
    static ref TEAMMATE_ID: Regex = Regex::new(r#"teammate_id="([^"]*)""#).unwrap();
}

fn tag_pattern(tag: &str) -> Regex {
    Regex::new(&format!("(?s)<{0}>(.*?)</{0}>", regex::escape(tag))).unwrap()
}

/// Last `n` non-empty `/`-separated segments of `path`.
///
/// Paths with `n` or fewer segments are returned unchanged.
pub fn last_segments(path: &str, n: usize) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() <= n {
        return path.to_string();
    }
    segments[segments.len() - n..].join("/")
}

/// Like [`last_segments`], but marks the elision with a leading `…/`.
pub fn shorten_path(path: &str, n: usize) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() <= n {
        return path.to_string();
    }
    format!("\u{2026}/{}", segments[segments.len() - n..].join("/"))
}

/// Cut `text` to `width` characters, appending `[+<omitted>]` when cut.
/// A width of zero disables truncation.
pub fn truncate(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }
    let total = text.chars().count();
    if total <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width).collect();
    format!("{}[+{}]", kept, total - width)
}

/// Drop the `_NNNNN` ordering suffix from an event time.
pub fn clean_time(time: &str) -> &str {
    time.split('_').next().unwrap_or(time)
}

fn first_capture(re: &Regex, text: &str) -> String {
    re.captures(text)
        .map(|c| c[1].to_string())
        .unwrap_or_default()
}

/// Contents of the first `<command-name>` element, or `""`.
pub fn command_name(xml: &str) -> String {
    first_capture(&COMMAND_NAME, xml)
}

pub fn command_args(xml: &str) -> String {
    first_capture(&COMMAND_ARGS, xml)
}

/// Contents of the first `<summary>` element, or `""`.
pub fn summary(xml: &str) -> String {
    first_capture(&SUMMARY, xml)
}

/// Value of the first `teammate_id="…"` attribute, or `""`.
pub fn teammate_id(xml: &str) -> String {
    first_capture(&TEAMMATE_ID, xml)
}
