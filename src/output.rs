//! Rendering of search results.
//!
//! The output format never changes which matches are found, only how they
//! are written.

use crate::error::Error;
use crate::matcher::MatchRecord;
use serde::Serialize;
use std::fmt::Write;
use std::str::FromStr;

/// Name shown for matches that did not come from a file.
const NO_FILE: &str = "<input>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}' (expected text or json)")),
        }
    }
}

/// `path:L` for a single-line match, `path:L1-L2` otherwise. Lines are
/// one-based here, unlike in the JSON records.
pub fn location(record: &MatchRecord) -> String {
    let file = record.file.as_deref().unwrap_or(NO_FILE);
    let start = record.range.start.line + 1;
    let end = record.range.end.line + 1;
    if start == end {
        format!("{file}:{start}")
    } else {
        format!("{file}:{start}-{end}")
    }
}

/// Human-readable listing. `total` is the number of matches before any
/// limit was applied.
pub fn format_text(matches: &[MatchRecord], total: usize) -> String {
    if matches.is_empty() {
        return "No matches found".to_string();
    }

    let mut out = String::new();
    let _ = write!(out, "Found {} matches", matches.len());
    if total > matches.len() {
        let _ = write!(out, " (limited to {})", matches.len());
    }
    out.push(':');

    for record in matches {
        out.push_str("\n\n");
        out.push_str(&location(record));
        out.push('\n');
        out.push_str(&record.text);
    }
    out
}

/// Pretty-printed JSON of any result value: a match list, a [`Page`] or a
/// search outcome.
///
/// [`Page`]: crate::search::Page
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn render(matches: &[MatchRecord], total: usize, format: OutputFormat) -> Result<String, Error> {
    match format {
        OutputFormat::Text => Ok(format_text(matches, total)),
        OutputFormat::Json => format_json(matches),
    }
}
