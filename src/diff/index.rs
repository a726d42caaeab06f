//! Positional index of a reference tree
//!
//! A [`NodeIndex`] holds every `(node, path)` pair of one tree in pre-order, plus a
//! lookup from node structure to the entries where that structure occurs. It is
//! built once per reference and only read afterwards; nodes are shared `Arc`s, so the
//! index is `Send + Sync` and cheap to clone.

use super::classify::MatchLabel;
use super::traversal::{Path, Walk};
use crate::ast::{Node, NodeRef};
use std::collections::HashMap;

/// One indexed node with its position in the tree
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub node: NodeRef,
    pub path: Path,
}

#[derive(Debug, Clone)]
pub struct NodeIndex {
    root: NodeRef,
    entries: Vec<IndexEntry>,
    /// Structurally equal nodes share one key; values are positions in `entries`
    by_shape: HashMap<NodeRef, Vec<usize>>,
}

impl NodeIndex {
    /// Index every node of `root`, without pruning
    pub fn build(root: &NodeRef) -> Self {
        let mut entries = Vec::new();
        let mut by_shape: HashMap<NodeRef, Vec<usize>> = HashMap::new();

        for (position, (node, path)) in Walk::new(root).enumerate() {
            by_shape.entry(node.clone()).or_default().push(position);
            entries.push(IndexEntry { node, path });
        }

        tracing::debug!(
            nodes = entries.len(),
            distinct = by_shape.len(),
            "indexed reference tree"
        );

        Self {
            root: root.clone(),
            entries,
            by_shape,
        }
    }

    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// All entries in pre-order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if any indexed node is structurally equal to `node`
    pub fn contains(&self, node: &Node) -> bool {
        self.by_shape.contains_key(node)
    }

    /// Paths at which a node structurally equal to `node` occurs
    pub fn paths_of<'a>(&'a self, node: &Node) -> impl Iterator<Item = &'a Path> + 'a {
        self.by_shape
            .get(node)
            .into_iter()
            .flatten()
            .filter_map(|&position| self.entries.get(position))
            .map(|entry| &entry.path)
    }

    /// Label a candidate node found at `path`
    ///
    /// `Strong` when an equal node sits at the same path, `Weak` when equal nodes exist
    /// only elsewhere, `None` when the structure does not occur at all.
    pub fn locate(&self, node: &Node, path: &Path) -> Option<MatchLabel> {
        let positions = self.by_shape.get(node)?;
        let same_place = positions.iter().any(|&position| {
            self.entries
                .get(position)
                .map_or(false, |entry| entry.path == *path)
        });

        Some(if same_place {
            MatchLabel::Strong
        } else {
            MatchLabel::Weak
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Kind;
    use crate::parser::{parse, ParseOptions};

    fn index(source: &str) -> NodeIndex {
        let ast = parse(source, &ParseOptions::default()).expect("source to parse");
        NodeIndex::build(ast.root())
    }

    fn node(source: &str) -> NodeRef {
        parse(source, &ParseOptions::default())
            .expect("source to parse")
            .root()
            .clone()
    }

    #[test]
    fn test_indexes_every_node() {
        let index = index("fibo(n - 1) + fibo(n - 2)");
        assert_eq!(index.len(), index.root().subtree_len());
        assert!(index.entries()[0].path.is_root());
    }

    #[test]
    fn test_duplicate_structures_share_a_key() {
        let index = index("[1, 1, 2]");
        let one = node("1");

        assert_eq!(index.paths_of(&one).count(), 2);
        assert!(index.contains(&node("2")));
        assert!(!index.contains(&node("3")));
    }

    #[test]
    fn test_locate_labels() {
        let index = index("fibo 10");
        let candidate = node("fibo 10");
        let ten = node("10");

        assert_eq!(index.locate(&candidate, &Path::root()), Some(MatchLabel::Strong));
        assert_eq!(index.locate(&ten, &Path::root()), Some(MatchLabel::Weak));
        assert_eq!(
            index.locate(&ten, &Path::root().child(Kind::Send, 2)),
            Some(MatchLabel::Strong)
        );
        assert_eq!(index.locate(&node("11"), &Path::root()), None);
    }

    #[test]
    fn test_index_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NodeIndex>();
    }
}
