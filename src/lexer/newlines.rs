//! Significant line break filtering
//!
//! Ruby ends a statement at a line break unless the expression obviously continues.
//! The raw token stream keeps every `\n`; this pass drops the ones that cannot
//! terminate a statement so the grammar only ever sees meaningful terminators:
//!
//! - inside `(...)` and `[...]` (a `{` block or hash re-enables them)
//! - right after a token that needs a right-hand side (`+`, `,`, `=`, `.`, ...)
//! - at the very start of the snippet and in runs of blank lines
//! - right before a leading `.` method chain on the next line

use super::lexer_impl::SpannedToken;
use super::tokens::Token;

/// Remove line breaks that do not end a statement
pub fn significant_newlines(tokens: Vec<SpannedToken>) -> Vec<SpannedToken> {
    let mut result: Vec<SpannedToken> = Vec::with_capacity(tokens.len());
    let mut brackets: Vec<Token> = Vec::new();
    let mut iter = tokens.into_iter().peekable();

    while let Some((token, span)) = iter.next() {
        match token {
            Token::LParen | Token::LBracket | Token::LBrace => brackets.push(token.clone()),
            Token::RParen | Token::RBracket | Token::RBrace => {
                brackets.pop();
            }
            Token::Newline => {
                let nested = matches!(brackets.last(), Some(Token::LParen | Token::LBracket));
                let continued = result
                    .last()
                    .map_or(true, |(previous, _)| previous.continues_line());
                let chained = matches!(iter.peek(), Some((Token::Dot, _)));
                if nested || continued || chained {
                    continue;
                }
            }
            _ => {}
        }
        result.push((token, span));
    }

    result
}
