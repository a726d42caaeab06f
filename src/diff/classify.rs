//! Match classification of a candidate tree
//!
//! Each node of the candidate is compared against the reference [`NodeIndex`]:
//!
//! - `Strong`: a structurally equal node sits at the same path in the reference
//! - `Weak`: structurally equal nodes exist only at other paths
//!
//! A labelled node is reported once and its children are not visited, so a matched
//! subtree never also reports its own pieces. Unlabelled nodes are descended into.
//! Synthetic nodes (no source range) are never labelled and are always descended into.
//!
//! Matching is independent per candidate node: one reference node may justify any
//! number of candidate matches.

use super::index::NodeIndex;
use super::traversal::{traverse, Flow};
use crate::ast::{NodeRef, SourceRange};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchLabel {
    Weak,
    Strong,
}

impl fmt::Display for MatchLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchLabel::Weak => f.write_str("weak"),
            MatchLabel::Strong => f.write_str("strong"),
        }
    }
}

/// A labelled source range of the candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub range: SourceRange,
    pub label: MatchLabel,
}

/// Classify the nodes of `candidate` against `index`
///
/// Highlights come out in pre-order, which is not necessarily textual order; their
/// ranges never overlap.
pub fn classify(candidate: &NodeRef, index: &NodeIndex) -> Vec<Highlight> {
    let mut highlights = Vec::new();

    traverse(candidate, |node, path| {
        let Some(range) = node.range() else {
            return Flow::Continue;
        };
        match index.locate(node, path) {
            Some(label) => {
                highlights.push(Highlight { range, label });
                Flow::Prune
            }
            None => Flow::Continue,
        }
    });

    tracing::trace!(
        highlights = highlights.len(),
        strong = highlights
            .iter()
            .filter(|h| h.label == MatchLabel::Strong)
            .count(),
        "classified candidate"
    );
    highlights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, ParseOptions};

    fn classify_sources(reference: &str, candidate: &str) -> Vec<(String, MatchLabel)> {
        let options = ParseOptions::default();
        let reference = parse(reference, &options).expect("reference to parse");
        let candidate = parse(candidate, &options).expect("candidate to parse");
        let index = NodeIndex::build(reference.root());

        classify(candidate.root(), &index)
            .into_iter()
            .map(|h| (candidate.source()[h.range.as_range()].to_string(), h.label))
            .collect()
    }

    #[test]
    fn test_identical_snippet_is_one_strong_match() {
        assert_eq!(
            classify_sources("fibo 10", "fibo 10"),
            vec![("fibo 10".to_string(), MatchLabel::Strong)]
        );
    }

    #[test]
    fn test_swapped_operands_are_weak() {
        assert_eq!(
            classify_sources("fibo(n - 1) + fibo(n - 2)", "fibo(n - 2) + fibo(n - 1)"),
            vec![
                ("fibo(n - 2)".to_string(), MatchLabel::Weak),
                ("fibo(n - 1)".to_string(), MatchLabel::Weak),
            ]
        );
    }

    #[test]
    fn test_no_shared_structure() {
        assert!(classify_sources("fibo 10", "1 + 1").is_empty());
    }

    #[test]
    fn test_matched_subtree_is_pruned() {
        // `n - 1` sits at the same path in both trees; `n` and `1` are not reported again
        assert_eq!(
            classify_sources("fibo(n - 1)", "puts(n - 1)"),
            vec![("n - 1".to_string(), MatchLabel::Strong)]
        );
    }

    #[test]
    fn test_synthetic_root_is_descended() {
        assert!(classify_sources("", "fibo 10").is_empty());
    }
}
