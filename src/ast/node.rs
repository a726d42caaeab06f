//! Syntax tree nodes and structural equality
//!
//! A [`Node`] is one syntactic construct: a [`Kind`], an ordered list of children and,
//! for nodes backed by real text, a [`SourceRange`]. Children are either nested nodes,
//! scalar literal values, or absent slots (an `if` without `else`, a `send` without a
//! receiver).
//!
//! Equality and hashing are *structural*: kind and children are compared recursively
//! and source ranges are ignored, so the same construct written at two different
//! places (or in two different snippets) compares equal. Every node caches a hash of
//! its shape at construction time, which keeps repeated equality checks and index
//! lookups cheap.
//!
//! Trees are immutable and shared through [`NodeRef`] (`Arc<Node>`), so an index built
//! over a reference tree can be cloned and handed across threads freely.

use super::kind::Kind;
use super::span::SourceRange;
use serde::{Serialize, Serializer};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Shared handle to an immutable node
pub type NodeRef = Arc<Node>;

// ============================================================================
// Scalars and children
// ============================================================================

/// A float literal stored by bit pattern, so scalars stay `Eq + Hash`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatBits(u64);

impl FloatBits {
    pub fn new(value: f64) -> Self {
        Self(value.to_bits())
    }

    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

impl Serialize for FloatBits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

/// A literal value held directly in a child slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Scalar {
    Symbol(String),
    Str(String),
    Int(i64),
    Float(FloatBits),
}

impl Scalar {
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Scalar::Symbol(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Symbol(name) => write!(f, ":{}", name),
            Scalar::Str(value) => write!(f, "{:?}", value),
            Scalar::Int(value) => write!(f, "{}", value),
            Scalar::Float(value) => write!(f, "{:?}", value.value()),
        }
    }
}

/// One child slot of a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Child {
    Node(NodeRef),
    Scalar(Scalar),
    Absent,
}

impl Child {
    pub fn symbol(name: impl Into<String>) -> Self {
        Child::Scalar(Scalar::Symbol(name.into()))
    }

    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Child::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Child::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

impl From<NodeRef> for Child {
    fn from(node: NodeRef) -> Self {
        Child::Node(node)
    }
}

impl From<Option<NodeRef>> for Child {
    fn from(node: Option<NodeRef>) -> Self {
        node.map_or(Child::Absent, Child::Node)
    }
}

impl From<Scalar> for Child {
    fn from(scalar: Scalar) -> Self {
        Child::Scalar(scalar)
    }
}

// ============================================================================
// Node
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    #[serde(rename = "type")]
    kind: Kind,
    range: Option<SourceRange>,
    children: Vec<Child>,
    #[serde(skip)]
    shape: u64,
}

impl Node {
    /// Build a node backed by source text
    pub fn new(kind: Kind, children: Vec<Child>, range: SourceRange) -> NodeRef {
        Self::build(kind, children, Some(range))
    }

    /// Build a node with no source text behind it; such nodes are never matched
    pub fn synthetic(kind: Kind, children: Vec<Child>) -> NodeRef {
        Self::build(kind, children, None)
    }

    fn build(kind: Kind, children: Vec<Child>, range: Option<SourceRange>) -> NodeRef {
        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);
        // Nested nodes hash as their cached shape, so this stays linear in the slot count
        children.hash(&mut hasher);
        Arc::new(Node {
            kind,
            range,
            children,
            shape: hasher.finish(),
        })
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    pub fn range(&self) -> Option<SourceRange> {
        self.range
    }

    pub fn is_synthetic(&self) -> bool {
        self.range.is_none()
    }

    /// Structural hash of this subtree, independent of source ranges
    pub fn shape(&self) -> u64 {
        self.shape
    }

    /// Nested nodes together with their child slot index
    pub fn child_nodes(&self) -> impl Iterator<Item = (usize, &NodeRef)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(index, child)| child.as_node().map(|node| (index, node)))
    }

    /// Scalar values held directly by this node
    pub fn scalars(&self) -> impl Iterator<Item = &Scalar> {
        self.children.iter().filter_map(Child::as_scalar)
    }

    pub fn child(&self, index: usize) -> Option<&Child> {
        self.children.get(index)
    }

    /// Number of nodes in this subtree, including itself
    pub fn subtree_len(&self) -> usize {
        1 + self
            .child_nodes()
            .map(|(_, node)| node.subtree_len())
            .sum::<usize>()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.kind == other.kind && self.children == other.children
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.shape);
    }
}
