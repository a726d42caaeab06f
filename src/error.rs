//! Error types shared across the crate

use crate::ast::{LineIndex, Position, SourceRange};
use thiserror::Error;

/// Source text that does not parse
///
/// Raised for candidate guesses (recoverable, shown to the player) and for the
/// reference snippet (fatal at session start, see [`SessionError`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({position})")]
pub struct SyntaxError {
    pub message: String,
    pub range: SourceRange,
    pub position: Position,
}

impl SyntaxError {
    /// Create an error located at `range` within `source`
    pub fn new(message: impl Into<String>, range: SourceRange, source: &str) -> Self {
        let position = LineIndex::new(source).position(range.begin);
        Self {
            message: message.into(),
            range,
            position,
        }
    }
}

/// Failures while setting up a game session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("reference snippet does not parse: {0}")]
    MalformedReference(#[source] SyntaxError),

    #[error("failed to read reference file {path}: {source}")]
    ReferenceFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Reasons a submitted guess is rejected
///
/// A rejected guess leaves the session's guess list untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("SyntaxError: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("nothing to submit")]
    Empty,
}
