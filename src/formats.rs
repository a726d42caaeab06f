//! Output formats for trees and highlights
//!
//! - [`sexp`]: indented s-expression dumps of syntax trees
//! - [`highlight`]: resolved highlight spans as tags, ANSI-styled text or JSON
//!
//! Trees can also be dumped as JSON with [`tree_to_json`].

pub mod highlight;
pub mod sexp;

pub use highlight::{to_ansi, to_json as highlights_to_json, to_tags, HighlightFormat};
pub use sexp::{to_sexp, SexpFormatter};

use crate::ast::Node;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unknown format '{0}'")]
    FormatNotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Dump a tree as pretty-printed JSON
pub fn tree_to_json(root: &Node) -> Result<String, FormatError> {
    Ok(serde_json::to_string_pretty(root)?)
}
