//! Implementation of the lexer
//!
//! The actual tokenization is handled entirely by logos; this module collects the
//! tokens with their byte spans and turns the first lexing failure into a
//! [`SyntaxError`].

use crate::ast::SourceRange;
use crate::error::SyntaxError;
use crate::lexer::tokens::{LexError, Token};
use logos::Logos;
use std::ops::Range;

/// Token paired with the byte range it was read from
pub type SpannedToken = (Token, Range<usize>);

/// Tokenize a string, keeping each token's span
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, SyntaxError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(error) => return Err(lex_error(error, source, span)),
        }
    }

    Ok(tokens)
}

fn lex_error(error: LexError, source: &str, span: Range<usize>) -> SyntaxError {
    let message = match error {
        LexError::Interpolation => "string interpolation is not supported".to_string(),
        LexError::IntegerOutOfRange => "integer literal out of range".to_string(),
        LexError::Unrecognised => match source[span.clone()].chars().next() {
            Some('"') | Some('\'') => "unterminated string literal".to_string(),
            Some(ch) => format!("unexpected character `{}`", ch),
            None => "unexpected input".to_string(),
        },
    };
    SyntaxError::new(message, SourceRange::from(span), source)
}
