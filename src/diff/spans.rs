//! Highlight span resolution
//!
//! Classified ranges come out of the classifier in tree order. Rendering needs the
//! opposite view: the candidate text cut into consecutive pieces, each either plain
//! or carrying a label. [`resolve`] produces that cut with a single fold over the
//! highlights sorted by their begin offset:
//!
//! - text before a highlight becomes a plain span
//! - the highlight becomes a labelled span and moves the cursor to its end
//! - a highlight starting before the cursor is dropped
//! - the rest of the text becomes a final plain span
//!
//! Offsets past the end of the text are clamped and empty spans are never emitted, so
//! the spans are disjoint, ascending, and concatenate back to the exact text.

use super::classify::{Highlight, MatchLabel};
use crate::ast::SourceRange;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightSpan {
    pub range: SourceRange,
    /// `None` for plain text
    pub label: Option<MatchLabel>,
}

impl HighlightSpan {
    pub fn plain(begin: usize, end: usize) -> Self {
        Self {
            range: SourceRange::new(begin, end),
            label: None,
        }
    }

    pub fn labeled(begin: usize, end: usize, label: MatchLabel) -> Self {
        Self {
            range: SourceRange::new(begin, end),
            label: Some(label),
        }
    }

    /// The slice of `source` this span covers
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.range.as_range()).unwrap_or_default()
    }
}

/// Cut `source` into plain and labelled spans
pub fn resolve(source: &str, highlights: &[Highlight]) -> Vec<HighlightSpan> {
    let len = source.len();
    let mut sorted: Vec<&Highlight> = highlights.iter().collect();
    sorted.sort_by_key(|highlight| highlight.range.begin);

    let (mut spans, cursor) =
        sorted
            .into_iter()
            .fold((Vec::new(), 0), |(mut spans, cursor), highlight| {
                let begin = highlight.range.begin.min(len);
                if begin < cursor {
                    return (spans, cursor);
                }
                let end = highlight.range.end.min(len).max(begin);

                push_nonempty(&mut spans, HighlightSpan::plain(cursor, begin));
                push_nonempty(
                    &mut spans,
                    HighlightSpan::labeled(begin, end, highlight.label),
                );
                (spans, end)
            });

    push_nonempty(&mut spans, HighlightSpan::plain(cursor, len));
    spans
}

fn push_nonempty(spans: &mut Vec<HighlightSpan>, span: HighlightSpan) {
    if !span.range.is_empty() {
        spans.push(span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlight(begin: usize, end: usize, label: MatchLabel) -> Highlight {
        Highlight {
            range: SourceRange::new(begin, end),
            label,
        }
    }

    #[test]
    fn test_no_highlights_is_one_plain_span() {
        assert_eq!(resolve("1 + 1", &[]), vec![HighlightSpan::plain(0, 5)]);
    }

    #[test]
    fn test_empty_text_has_no_spans() {
        assert!(resolve("", &[]).is_empty());
    }

    #[test]
    fn test_gaps_are_filled() {
        let spans = resolve(
            "fibo(n - 2) + fibo(n - 1)",
            &[
                highlight(0, 11, MatchLabel::Weak),
                highlight(14, 25, MatchLabel::Weak),
            ],
        );

        assert_eq!(
            spans,
            vec![
                HighlightSpan::labeled(0, 11, MatchLabel::Weak),
                HighlightSpan::plain(11, 14),
                HighlightSpan::labeled(14, 25, MatchLabel::Weak),
            ]
        );
    }

    #[test]
    fn test_out_of_order_input_is_sorted() {
        let spans = resolve(
            "a b",
            &[
                highlight(2, 3, MatchLabel::Strong),
                highlight(0, 1, MatchLabel::Weak),
            ],
        );

        assert_eq!(
            spans,
            vec![
                HighlightSpan::labeled(0, 1, MatchLabel::Weak),
                HighlightSpan::plain(1, 2),
                HighlightSpan::labeled(2, 3, MatchLabel::Strong),
            ]
        );
    }

    #[test]
    fn test_overlapping_highlight_is_dropped() {
        let spans = resolve(
            "abcdef",
            &[
                highlight(0, 4, MatchLabel::Weak),
                highlight(2, 6, MatchLabel::Strong),
            ],
        );

        assert_eq!(
            spans,
            vec![
                HighlightSpan::labeled(0, 4, MatchLabel::Weak),
                HighlightSpan::plain(4, 6),
            ]
        );
    }

    #[test]
    fn test_offsets_are_clamped() {
        let spans = resolve("abc", &[highlight(1, 10, MatchLabel::Strong)]);
        assert_eq!(
            spans,
            vec![
                HighlightSpan::plain(0, 1),
                HighlightSpan::labeled(1, 3, MatchLabel::Strong),
            ]
        );
    }

    #[test]
    fn test_empty_highlight_is_omitted() {
        let spans = resolve("abc", &[highlight(1, 1, MatchLabel::Weak)]);
        assert_eq!(spans, vec![HighlightSpan::plain(0, 1), HighlightSpan::plain(1, 3)]);
    }

    #[test]
    fn test_span_text() {
        let span = HighlightSpan::labeled(5, 7, MatchLabel::Strong);
        assert_eq!(span.text("fibo 10"), "10");
    }
}
