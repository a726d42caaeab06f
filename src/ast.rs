//! Syntax tree definitions for Ruby snippets
//!
//! This module provides the tree model every other part of the crate consumes:
//! node kinds, nodes with structural equality, and source range / position types.
//!
//! ## Modules
//!
//! - `kind` - The closed enumeration of syntax constructs
//! - `node` - Nodes, children and scalar literal values
//! - `span` - Byte ranges and line/column positions
//! - `position` - Byte offset to line/character column lookup

pub mod kind;
pub mod node;
pub mod position;
pub mod span;

use std::sync::Arc;

pub use kind::Kind;
pub use node::{Child, FloatBits, Node, NodeRef, Scalar};
pub use position::LineIndex;
pub use span::{Position, SourceRange};

/// A parsed snippet: the source text together with its tree
#[derive(Debug, Clone)]
pub struct Ast {
    source: Arc<str>,
    root: NodeRef,
}

impl Ast {
    pub fn new(source: impl Into<Arc<str>>, root: NodeRef) -> Self {
        Self {
            source: source.into(),
            root,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// Source text covered by a node, if it has a range
    pub fn text_of(&self, node: &Node) -> Option<&str> {
        node.range().and_then(|range| self.source.get(range.as_range()))
    }
}
