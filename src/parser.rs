//! Parser for Ruby snippets
//!
//! This module turns source text into an [`Ast`] whose nodes follow the canonical Ruby
//! AST shape. Parsing happens in three stages:
//!
//! 1. Lexing ([`crate::lexer::lex`]): spanned tokens with significant line breaks only.
//! 2. Grammar (`grammar`): chumsky combinators build an intermediate tree that still
//!    has unresolved bare identifiers.
//! 3. Lowering (`conversion`): resolves locals against their scopes and produces the
//!    final, structurally comparable nodes.
//!
//! Behaviour is controlled by an explicit [`ParseOptions`] value passed into every call;
//! the parser keeps no global configuration.

pub(crate) mod conversion;
pub(crate) mod grammar;
pub(crate) mod intermediate;

use crate::ast::{Ast, SourceRange};
use crate::error::SyntaxError;
use crate::lexer::{lex, SpannedToken};
use chumsky::error::SimpleReason;
use chumsky::Parser;
use grammar::ParserError;
use serde::Deserialize;

/// Options for a single parse call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Emit every syntax error as a `tracing` warning as well as returning it
    pub report_diagnostics: bool,
}

impl ParseOptions {
    pub fn reporting() -> Self {
        Self {
            report_diagnostics: true,
        }
    }
}

/// Parse `source` into a syntax tree
pub fn parse(source: &str, options: &ParseOptions) -> Result<Ast, SyntaxError> {
    let result = parse_source(source);
    if let Err(error) = &result {
        if options.report_diagnostics {
            tracing::warn!(
                line = error.position.line + 1,
                column = error.position.column + 1,
                "syntax error: {}",
                error.message
            );
        }
    }
    result
}

fn parse_source(source: &str) -> Result<Ast, SyntaxError> {
    let tokens = lex(source)?;
    let statements = grammar::program()
        .parse(tokens.clone())
        .map_err(|errors| syntax_error(errors, &tokens, source))?;
    Ok(Ast::new(source, conversion::lower_program(statements)))
}

/// Convert the first chumsky error into a located [`SyntaxError`]
///
/// Chumsky spans index into the token list; they are mapped back to byte offsets.
fn syntax_error(errors: Vec<ParserError>, tokens: &[SpannedToken], source: &str) -> SyntaxError {
    let end_of_input = SourceRange::new(source.len(), source.len());
    let Some(error) = errors.into_iter().next() else {
        return SyntaxError::new("invalid syntax", end_of_input, source);
    };

    let range = match error.found() {
        Some((_, span)) => SourceRange::from(span.clone()),
        None => {
            let indices = error.span();
            match tokens.get(indices.start) {
                Some((_, first)) => {
                    let last = indices
                        .end
                        .checked_sub(1)
                        .and_then(|index| tokens.get(index))
                        .map_or(first.end, |(_, span)| span.end.max(first.end));
                    SourceRange::new(first.start, last)
                }
                None => end_of_input,
            }
        }
    };

    let message = match error.reason() {
        SimpleReason::Custom(message) => message.clone(),
        _ => match error.found() {
            Some((token, _)) => format!("unexpected {}", token),
            None => "unexpected end of input".to_string(),
        },
    };

    SyntaxError::new(message, range, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Kind, Position};

    fn parse_ok(source: &str) -> Ast {
        parse(source, &ParseOptions::default()).expect("source to parse")
    }

    #[test]
    fn test_parse_keeps_source() {
        let ast = parse_ok("fibo 10");
        assert_eq!(ast.source(), "fibo 10");
        assert_eq!(ast.root().kind(), Kind::Send);
        assert_eq!(ast.text_of(ast.root()), Some("fibo 10"));
    }

    #[test]
    fn test_comment_only_input() {
        let ast = parse_ok("# nothing here\n");
        assert_eq!(ast.root().kind(), Kind::Begin);
        assert!(ast.root().is_synthetic());
    }

    #[test]
    fn test_unclosed_parameter_list() {
        let err = parse("def fibo(n", &ParseOptions::default()).unwrap_err();
        assert_eq!(err.message, "unexpected end of input");
        assert_eq!(err.range, SourceRange::new(10, 10));
        assert_eq!(err.position, Position::new(0, 10));
    }

    #[test]
    fn test_unexpected_token_is_located() {
        let err = parse("fibo(n - 1))", &ParseOptions::default()).unwrap_err();
        assert_eq!(err.message, "unexpected `)`");
        assert_eq!(err.range, SourceRange::new(11, 12));
    }

    #[test]
    fn test_lexer_errors_pass_through() {
        let err = parse("x = `ls`", &ParseOptions::default()).unwrap_err();
        assert!(err.message.starts_with("unexpected character"));
    }

    #[test]
    fn test_reporting_does_not_change_result() {
        let quiet = parse("1 +", &ParseOptions::default()).unwrap_err();
        let loud = parse("1 +", &ParseOptions::reporting()).unwrap_err();
        assert_eq!(quiet, loud);
    }

    #[test]
    fn test_same_structure_same_tree() {
        let a = parse_ok("fibo(n - 1)");
        let b = parse_ok("fibo( n-1 )");
        assert_eq!(a.root(), b.root());
    }
}
