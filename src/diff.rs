//! Structural diff and highlight engine
//!
//! Compares a candidate snippet against a reference snippet construct by construct:
//!
//! 1. [`NodeIndex::build`] records every node of the reference with its path.
//! 2. [`classify`] walks the candidate and labels nodes that also occur in the
//!    reference: `strong` at the same path, `weak` elsewhere. Labelled subtrees are
//!    not descended into.
//! 3. [`resolve`] turns the labelled ranges into consecutive text spans covering the
//!    whole candidate.
//!
//! The comparison is purely structural. There is no alignment or edit distance, and
//! no semantic equivalence: renaming a variable or swapping operands of `+` is a
//! different structure.
//!
//! ## Modules
//!
//! - `traversal` - Pre-order walks yielding each node with its path
//! - `index` - The positional index of a reference tree
//! - `classify` - Strong / weak labelling with pruning
//! - `spans` - Highlight ranges to text spans

pub mod classify;
pub mod index;
pub mod spans;
pub mod traversal;

pub use classify::{classify, Highlight, MatchLabel};
pub use index::{IndexEntry, NodeIndex};
pub use spans::{resolve, HighlightSpan};
pub use traversal::{traverse, Flow, Path, Step, Walk};

use crate::error::SyntaxError;
use crate::parser::{parse, ParseOptions};

/// Parse `candidate` and cut it into highlight spans against `index`
pub fn highlight(
    candidate: &str,
    index: &NodeIndex,
    options: &ParseOptions,
) -> Result<Vec<HighlightSpan>, SyntaxError> {
    let ast = parse(candidate, options)?;
    Ok(resolve(ast.source(), &classify(ast.root(), index)))
}
