//! Hints derived from the reference snippet
//!
//! The hint panel can show the symbols the reference uses (method names, variable
//! names, symbol literals: every symbol atom in the tree) and the length of the
//! reference text. Both are computed once per reference.

use crate::ast::NodeRef;
use crate::diff::traverse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Collect every symbol atom of `root`, deduplicated and sorted by byte order
///
/// Only scalar symbol children count; strings and numbers do not.
pub fn extract_symbols(root: &NodeRef) -> BTreeSet<String> {
    let mut symbols = BTreeSet::new();
    traverse(root, |node, _| {
        symbols.extend(
            node.scalars()
                .filter_map(|scalar| scalar.as_symbol())
                .map(str::to_owned),
        );
    });
    symbols
}

/// Length of the reference in characters, as shown to the player
pub fn code_length(source: &str) -> usize {
    source.chars().count()
}

/// Which hints are visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintSettings {
    pub symbols: bool,
    pub code_length: bool,
}

impl Default for HintSettings {
    fn default() -> Self {
        Self {
            symbols: true,
            code_length: true,
        }
    }
}

/// A hint panel toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Symbols,
    CodeLength,
}

impl HintSettings {
    pub fn is_enabled(&self, hint: Hint) -> bool {
        match hint {
            Hint::Symbols => self.symbols,
            Hint::CodeLength => self.code_length,
        }
    }

    /// Flip a toggle, returning its new state
    pub fn toggle(&mut self, hint: Hint) -> bool {
        let flag = match hint {
            Hint::Symbols => &mut self.symbols,
            Hint::CodeLength => &mut self.code_length,
        };
        *flag = !*flag;
        *flag
    }
}
