//! Path-indexed pre-order traversal
//!
//! Every node is reached together with its [`Path`]: the `(parent kind, child slot)`
//! steps leading to it from the root. The slot index counts every child slot of the
//! parent, scalar and absent slots included, so a path describes *where* a node sits
//! regardless of *what* it contains.
//!
//! Two forms are provided:
//!
//! - [`Walk`], a lazy iterator over `(node, path)` pairs with [`Walk::skip_children`]
//! - [`traverse`], which drives a visitor closure and prunes when it says so

use crate::ast::{Kind, NodeRef};
use serde::Serialize;
use std::fmt;

/// One step of a path: the parent's kind and the child slot taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Step {
    pub parent: Kind,
    pub index: usize,
}

/// Root-to-node address of a node
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Path(Vec<Step>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of the node in slot `index` of a `parent` node at this path
    pub fn child(&self, parent: Kind, index: usize) -> Self {
        let mut steps = Vec::with_capacity(self.0.len() + 1);
        steps.extend_from_slice(&self.0);
        steps.push(Step { parent, index });
        Self(steps)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}.{}", step.parent, step.index)?;
        }
        Ok(())
    }
}

/// What a visitor wants after seeing a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Descend into the node's children
    Continue,
    /// Skip the node's children
    Prune,
}

impl From<()> for Flow {
    fn from(_: ()) -> Self {
        Flow::Continue
    }
}

impl From<bool> for Flow {
    fn from(descend: bool) -> Self {
        if descend {
            Flow::Continue
        } else {
            Flow::Prune
        }
    }
}

/// Lazy pre-order walk over a tree
///
/// Children are visited left to right in slot order. Each call to [`Walk::new`] starts
/// a fresh, finite walk.
pub struct Walk {
    stack: Vec<(NodeRef, Path)>,
    last: Option<(NodeRef, Path)>,
}

impl Walk {
    pub fn new(root: &NodeRef) -> Self {
        Self {
            stack: vec![(root.clone(), Path::root())],
            last: None,
        }
    }

    /// Do not descend into the node most recently returned by `next`
    pub fn skip_children(&mut self) {
        self.last = None;
    }

    fn expand_last(&mut self) {
        let Some((node, path)) = self.last.take() else {
            return;
        };
        let children: Vec<(NodeRef, Path)> = node
            .child_nodes()
            .map(|(index, child)| (child.clone(), path.child(node.kind(), index)))
            .collect();
        self.stack.extend(children.into_iter().rev());
    }
}

impl Iterator for Walk {
    type Item = (NodeRef, Path);

    fn next(&mut self) -> Option<Self::Item> {
        self.expand_last();
        let (node, path) = self.stack.pop()?;
        self.last = Some((node.clone(), path.clone()));
        Some((node, path))
    }
}

/// Visit every node of `root` in pre-order
///
/// The visitor's answer decides whether the node's children are visited: anything
/// converting into [`Flow::Prune`] (including `false`) skips them, while
/// [`Flow::Continue`], `true` and `()` descend. No node is filtered otherwise.
pub fn traverse<F, R>(root: &NodeRef, mut visitor: F)
where
    F: FnMut(&NodeRef, &Path) -> R,
    R: Into<Flow>,
{
    let mut walk = Walk::new(root);
    while let Some((node, path)) = walk.next() {
        if visitor(&node, &path).into() == Flow::Prune {
            walk.skip_children();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, ParseOptions};

    fn tree(source: &str) -> NodeRef {
        parse(source, &ParseOptions::default())
            .expect("source to parse")
            .root()
            .clone()
    }

    #[test]
    fn test_pre_order_with_paths() {
        let root = tree("fibo(n - 1)");
        let visited: Vec<(Kind, String)> = Walk::new(&root)
            .map(|(node, path)| (node.kind(), path.to_string()))
            .collect();

        assert_eq!(
            visited,
            vec![
                (Kind::Send, "(root)".to_string()),
                (Kind::Send, "send.2".to_string()),
                (Kind::Send, "send.2/send.0".to_string()),
                (Kind::Int, "send.2/send.2".to_string()),
            ]
        );
    }

    #[test]
    fn test_prune_with_false() {
        let root = tree("a + (b * c)");
        let mut seen = Vec::new();
        traverse(&root, |node, _| {
            seen.push(node.kind());
            node.kind() != Kind::Begin
        });

        assert_eq!(seen, vec![Kind::Send, Kind::Send, Kind::Begin]);
    }

    #[test]
    fn test_unit_visitor_visits_everything() {
        let root = tree("def fibo(n)\n  n\nend");
        let mut count = 0;
        traverse(&root, |_, _| {
            count += 1;
        });

        assert_eq!(count, root.subtree_len());
    }

    #[test]
    fn test_skip_children_only_affects_last_node() {
        let root = tree("[1, [2, 3], 4]");
        let mut walk = Walk::new(&root);
        let mut kinds = Vec::new();
        while let Some((node, _)) = walk.next() {
            kinds.push(node.kind());
            // Prune the nested array, not the root
            if node.kind() == Kind::Array && kinds.len() > 1 {
                walk.skip_children();
            }
        }

        assert_eq!(kinds, vec![Kind::Array, Kind::Int, Kind::Array, Kind::Int]);
    }

    #[test]
    fn test_walks_are_independent() {
        let root = tree("a; b");
        assert_eq!(Walk::new(&root).count(), Walk::new(&root).count());
    }

    #[test]
    fn test_flow_conversions() {
        assert_eq!(Flow::from(()), Flow::Continue);
        assert_eq!(Flow::from(true), Flow::Continue);
        assert_eq!(Flow::from(false), Flow::Prune);
    }
}
