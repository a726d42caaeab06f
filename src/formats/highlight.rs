//! Rendering of resolved highlight spans
//!
//! Every format reproduces the candidate text exactly, span by span, adding only
//! markup around labelled spans.

use super::FormatError;
use crate::diff::{HighlightSpan, MatchLabel};
use crossterm::style::{style, Stylize};
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightFormat {
    #[default]
    Ansi,
    Tag,
    Json,
}

impl FromStr for HighlightFormat {
    type Err = FormatError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "ansi" => Ok(Self::Ansi),
            "tag" => Ok(Self::Tag),
            "json" => Ok(Self::Json),
            other => Err(FormatError::FormatNotFound(other.to_string())),
        }
    }
}

impl HighlightFormat {
    pub fn render(self, source: &str, spans: &[HighlightSpan]) -> Result<String, FormatError> {
        match self {
            Self::Ansi => Ok(to_ansi(source, spans)),
            Self::Tag => Ok(to_tags(source, spans)),
            Self::Json => to_json(source, spans),
        }
    }
}

/// Wrap labelled spans in `<strong>` / `<weak>` tags
pub fn to_tags(source: &str, spans: &[HighlightSpan]) -> String {
    spans
        .iter()
        .map(|span| {
            let text = span.text(source);
            match span.label {
                Some(label) => format!("<{label}>{text}</{label}>"),
                None => text.to_string(),
            }
        })
        .collect()
}

/// Style labelled spans with terminal colours
pub fn to_ansi(source: &str, spans: &[HighlightSpan]) -> String {
    spans
        .iter()
        .map(|span| {
            let text = span.text(source);
            match span.label {
                Some(MatchLabel::Strong) => style(text).black().on_green().to_string(),
                Some(MatchLabel::Weak) => style(text).black().on_yellow().to_string(),
                None => text.to_string(),
            }
        })
        .collect()
}

#[derive(Serialize)]
struct SpanRecord<'a> {
    begin: usize,
    end: usize,
    label: Option<MatchLabel>,
    text: &'a str,
}

/// Serialize spans as `[{begin, end, label, text}]`
pub fn to_json(source: &str, spans: &[HighlightSpan]) -> Result<String, FormatError> {
    let records: Vec<SpanRecord> = spans
        .iter()
        .map(|span| SpanRecord {
            begin: span.range.begin,
            end: span.range.end,
            label: span.label,
            text: span.text(source),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}
