//! # rubyle
//!
//! Engine for a guess-the-code puzzle. The player tries to reconstruct a hidden Ruby
//! snippet; every guess is parsed, compared structurally against the reference, and
//! its text is highlighted:
//!
//! - strong: the same sub-tree exists in the reference at the same path
//! - weak: the sub-tree exists in the reference, somewhere else
//! - plain: no structural counterpart
//!
//! ## Layout
//!
//! - [`lexer`] and [`parser`]: source text to an [`ast::Ast`] of canonical nodes
//! - [`diff`]: path-indexed traversal, the reference index, classification and span
//!   resolution
//! - [`hints`]: symbols and length of the reference
//! - [`session`]: one player's game state
//! - [`formats`]: s-expression, tag, ANSI and JSON output
//! - [`config`] and [`logging`]: host-side set-up

pub mod ast;
pub mod config;
pub mod diff;
pub mod error;
pub mod formats;
pub mod hints;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod session;

pub use ast::{Ast, Node, NodeRef};
pub use diff::{HighlightSpan, MatchLabel, NodeIndex};
pub use error::{SessionError, SubmitError, SyntaxError};
pub use parser::{parse, ParseOptions};
pub use session::{Guess, Session, Settings};
