//! Lexer for Ruby snippets
//!
//! This module turns source text into a flat stream of spanned tokens for the
//! parser. It runs in three stages:
//!
//! 1. [`tokenize`]: logos based tokenization, failing on the first character no token
//!    matches, on string interpolation and on integers that overflow.
//! 2. [`significant_newlines`]: drops line breaks that cannot end a statement.
//! 3. [`argument_spacing`]: marks the `-` and `[` tokens that open a command argument.
//!
//! Spans are byte ranges into the source text; every tree node's range is built
//! from them.

pub mod lexer_impl;
pub mod newlines;
pub mod spacing;
pub mod tokens;

pub use lexer_impl::{tokenize, SpannedToken};
pub use newlines::significant_newlines;
pub use spacing::argument_spacing;
pub use tokens::{LexError, Token};

use crate::error::SyntaxError;

/// Tokenize `source`, keep only significant line breaks and resolve argument spacing
pub fn lex(source: &str) -> Result<Vec<SpannedToken>, SyntaxError> {
    Ok(argument_spacing(significant_newlines(tokenize(source)?)))
}
