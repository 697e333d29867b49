//! Extraction of meaningful content from raw delegate output.
//!
//! The delegate interleaves free-form progress chatter with two kinds of
//! marker lines: save confirmations and single-quoted observation records.
//! Extraction keeps only the marker lines, with observation payloads unquoted
//! and unescaped, and drops everything else.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Literal substring marking a save confirmation line.
pub const SAVED_MARKER: &str = "Content successfully saved";
/// Literal substring opening an observation record.
pub const OBSERVATION_MARKER: &str = "{'observation':";

static OBSERVATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{'observation':\s*'((?:\\.|[^'\\])*)'").unwrap());

/// How a single line of delegate output is treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Save confirmation, kept as-is.
    Saved(String),
    /// Observation record, reduced to its unescaped payload.
    Observation(String),
    /// Progress noise, dropped.
    Unrecognized,
}

/// Classify one line of delegate output.
///
/// An observation whose payload does not parse keeps the whole line rather
/// than losing it.
pub fn classify_line(line: &str) -> LineKind {
    let line = line.trim_end();
    if line.contains(SAVED_MARKER) {
        return LineKind::Saved(line.to_string());
    }
    if line.contains(OBSERVATION_MARKER) {
        return match OBSERVATION_RE.captures(line) {
            Some(caps) => {
                let payload = unescape(caps.get(1).map_or("", |m| m.as_str()));
                LineKind::Observation(payload.trim().to_string())
            }
            None => {
                warn!(line, "observation marker without parseable payload, keeping raw line");
                LineKind::Observation(line.to_string())
            }
        };
    }
    LineKind::Unrecognized
}

/// Reduce raw delegate output to its meaningful lines.
///
/// When no marker occurs anywhere in the input, the text is already clean and
/// passes through with trailing whitespace trimmed. Feeding extracted output
/// back in therefore leaves it unchanged.
pub fn extract(raw: &str) -> String {
    if !contains_marker(raw) {
        return raw.trim_end().to_string();
    }
    let mut kept = Vec::new();
    for line in raw.lines() {
        match classify_line(line) {
            LineKind::Saved(text) | LineKind::Observation(text) => kept.push(text),
            LineKind::Unrecognized => {}
        }
    }
    kept.join("\n").trim_end().to_string()
}

fn contains_marker(raw: &str) -> bool {
    raw.contains(SAVED_MARKER) || raw.contains(OBSERVATION_MARKER)
}

/// Undo the two-character escapes the delegate uses inside observation
/// payloads.
fn unescape(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len());
    let mut chars = payload.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
