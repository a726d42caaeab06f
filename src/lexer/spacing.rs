//! Whitespace sensitive command arguments
//!
//! `fibo -1` passes `-1` to `fibo` while `n -1` subtracts from the local `n`, and
//! `puts [1]` passes an array while `list [1]` indexes. The difference lies in the
//! spacing around `-` / `[` and in whether the name before them is a local variable.
//! This pass tracks the locals declared so far and retags the tokens that open an
//! argument:
//!
//! - `-` becomes [`Token::UMinus`] when it has whitespace before it, none after it,
//!   and follows a command name
//! - `[` becomes [`Token::LBracketArg`] when it has whitespace before it and follows a
//!   command name
//!
//! A command name is `yield`, a method name after `.` / `::`, or an identifier that is
//! not a known local. Locals come from assignments, `def` parameters and block
//! parameters; `def`, `class` and `module` bodies start from an empty scope and blocks
//! see the enclosing one.

use super::lexer_impl::SpannedToken;
use super::tokens::Token;
use std::collections::HashSet;

/// Retag `-` and `[` tokens that open the first argument of a command call
pub fn argument_spacing(mut tokens: Vec<SpannedToken>) -> Vec<SpannedToken> {
    let mut locals = Locals::new();

    for index in 0..tokens.len() {
        let opens = opens_argument(&tokens, index, &locals);
        let retagged = match &tokens[index].0 {
            Token::Minus if opens && unspaced_after(&tokens, index) => Some(Token::UMinus),
            Token::LBracket if opens => Some(Token::LBracketArg),
            _ => None,
        };
        if let Some(token) = retagged {
            tokens[index].0 = token;
        }
        locals.observe(&tokens, index);
    }

    tokens
}

fn previous(tokens: &[SpannedToken], index: usize, back: usize) -> Option<&Token> {
    index.checked_sub(back).map(|at| &tokens[at].0)
}

/// Whitespace before `tokens[index]` and a command name right before that
fn opens_argument(tokens: &[SpannedToken], index: usize, locals: &Locals) -> bool {
    if index == 0 || tokens[index - 1].1.end == tokens[index].1.start {
        return false;
    }
    match previous(tokens, index, 1) {
        Some(Token::Yield) => true,
        Some(Token::Ident(name)) => match previous(tokens, index, 2) {
            Some(Token::Dot | Token::ColonColon) => true,
            Some(Token::Def) => false,
            _ => !locals.contains(name),
        },
        _ => false,
    }
}

fn unspaced_after(tokens: &[SpannedToken], index: usize) -> bool {
    tokens
        .get(index + 1)
        .is_some_and(|(_, next)| next.start == tokens[index].1.end)
}

/// Check if a keyword at this point opens a construct rather than acting as a modifier
fn at_expression_start(previous: Option<&Token>) -> bool {
    previous.map_or(true, |token| {
        token.continues_line()
            || matches!(
                token,
                Token::Then | Token::Else | Token::Do | Token::Return | Token::Break | Token::Next
            )
    })
}

/// What the next `end` or `}` closes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opener {
    /// `def`, `class`, `module`, `do` and `{`, which bring their own scope
    Scope,
    /// `if`, `unless`, `while`, `until` and `case`, which share the enclosing scope
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Params {
    None,
    /// Between `def` and the method name
    DefName,
    /// After the method name, with the current parenthesis depth
    Def { depth: usize },
    /// Between the `|` pipes of a block
    Block,
}

#[derive(Debug)]
struct Scope {
    names: HashSet<String>,
    /// A definition body cannot see outer locals
    opaque: bool,
}

#[derive(Debug)]
struct Locals {
    scopes: Vec<Scope>,
    openers: Vec<Opener>,
    params: Params,
    /// Inside a `while`/`until` header, where `do` opens the loop body
    loop_header: bool,
}

impl Locals {
    fn new() -> Self {
        Self {
            scopes: vec![Scope {
                names: HashSet::new(),
                opaque: true,
            }],
            openers: Vec::new(),
            params: Params::None,
            loop_header: false,
        }
    }

    fn contains(&self, name: &str) -> bool {
        for scope in self.scopes.iter().rev() {
            if scope.names.contains(name) {
                return true;
            }
            if scope.opaque {
                break;
            }
        }
        false
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.names.insert(name.to_owned());
        }
    }

    fn open_scope(&mut self, opaque: bool) {
        self.openers.push(Opener::Scope);
        self.scopes.push(Scope {
            names: HashSet::new(),
            opaque,
        });
    }

    fn close(&mut self) {
        if self.openers.pop() == Some(Opener::Scope) && self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Update scopes and declarations after `tokens[index]`
    fn observe(&mut self, tokens: &[SpannedToken], index: usize) {
        let token = &tokens[index].0;
        let before = previous(tokens, index, 1);

        if self.observe_params(token, before) {
            return;
        }

        match token {
            Token::Def => {
                self.open_scope(true);
                self.params = Params::DefName;
            }
            Token::Class | Token::Module => self.open_scope(true),
            Token::LBrace => self.open_scope(false),
            Token::Do if self.loop_header => self.loop_header = false,
            Token::Do => self.open_scope(false),
            Token::Case => self.openers.push(Opener::Body),
            Token::If | Token::Unless if at_expression_start(before) => {
                self.openers.push(Opener::Body)
            }
            Token::While | Token::Until if at_expression_start(before) => {
                self.openers.push(Opener::Body);
                self.loop_header = true;
            }
            Token::End | Token::RBrace => self.close(),
            Token::Newline | Token::Semicolon => self.loop_header = false,
            Token::Pipe if matches!(before, Some(Token::LBrace | Token::Do)) => {
                self.params = Params::Block;
            }
            Token::Ident(name) => {
                let assigned = matches!(
                    tokens.get(index + 1),
                    Some((Token::Assign | Token::OpAssign(_), _))
                );
                let attribute = matches!(before, Some(Token::Dot | Token::ColonColon));
                if assigned && !attribute {
                    self.declare(name);
                }
            }
            _ => {}
        }
    }

    /// Track `def` and block parameter lists; returns true when the token was consumed
    fn observe_params(&mut self, token: &Token, before: Option<&Token>) -> bool {
        let starts_param = matches!(
            before,
            Some(Token::LParen | Token::Comma | Token::Star | Token::Amp | Token::Pipe)
        );

        match (self.params, token) {
            (Params::None, _) => return false,
            (Params::DefName, Token::SelfKw | Token::Dot) => {}
            (Params::DefName, _) => self.params = Params::Def { depth: 0 },
            (Params::Def { depth }, Token::LParen) => {
                self.params = Params::Def { depth: depth + 1 };
            }
            (Params::Def { depth }, Token::RParen) => {
                let depth = depth.saturating_sub(1);
                self.params = if depth == 0 {
                    Params::None
                } else {
                    Params::Def { depth }
                };
            }
            (Params::Def { depth: 0 }, Token::Newline | Token::Semicolon) => {
                self.params = Params::None;
                return false;
            }
            (Params::Def { depth }, Token::Ident(name)) => {
                let bare_first = depth == 0 && matches!(before, Some(Token::Ident(_)));
                if depth <= 1 && (starts_param || bare_first) {
                    self.declare(name);
                }
            }
            (Params::Block, Token::Pipe) => self.params = Params::None,
            (Params::Block, Token::Ident(name)) if starts_param => self.declare(name),
            _ => {}
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lexer_impl::tokenize;

    fn retagged(source: &str) -> Vec<Token> {
        argument_spacing(tokenize(source).expect("source to tokenize"))
            .into_iter()
            .map(|(token, _)| token)
            .filter(|token| {
                matches!(
                    token,
                    Token::Minus | Token::UMinus | Token::LBracket | Token::LBracketArg
                )
            })
            .collect()
    }

    #[test]
    fn test_minus_after_method_name() {
        assert_eq!(retagged("fibo -1"), vec![Token::UMinus]);
        assert_eq!(retagged("fibo - 1"), vec![Token::Minus]);
        assert_eq!(retagged("fibo-1"), vec![Token::Minus]);
        assert_eq!(retagged("list.push -x"), vec![Token::UMinus]);
    }

    #[test]
    fn test_minus_after_local() {
        assert_eq!(retagged("n = 3\nn -1"), vec![Token::Minus]);
        assert_eq!(retagged("3 -1"), vec![Token::Minus]);
    }

    #[test]
    fn test_bracket_after_method_name() {
        assert_eq!(retagged("puts [1]"), vec![Token::LBracketArg]);
        assert_eq!(retagged("puts[1]"), vec![Token::LBracket]);
        assert_eq!(retagged("list = []\nlist [0]"), vec![Token::LBracket, Token::LBracket]);
    }

    #[test]
    fn test_def_parameters_are_locals() {
        assert_eq!(retagged("def f(n, m = 2)\n  n -1\nend"), vec![Token::Minus]);
        assert_eq!(retagged("def f n\n  n -1\nend"), vec![Token::Minus]);
        assert_eq!(retagged("def f(a = g(x))\n  x -1\nend"), vec![Token::UMinus]);
    }

    #[test]
    fn test_block_parameters_are_locals() {
        assert_eq!(retagged("list.each { |x| x -1 }"), vec![Token::Minus]);
        assert_eq!(
            retagged("list.each do |x|\n  x -1\nend\nx -1"),
            vec![Token::Minus, Token::UMinus]
        );
    }

    #[test]
    fn test_definitions_hide_outer_locals() {
        assert_eq!(
            retagged("n = 1\ndef f\n  n -1\nend\nn -1"),
            vec![Token::UMinus, Token::Minus]
        );
    }

    #[test]
    fn test_modifier_keywords_do_not_open_bodies() {
        // `x` stays local after the modifier; the `if` has no `end` to wait for
        assert_eq!(
            retagged("def f\n  x = 1 if y\n  x -1\nend\nx -1"),
            vec![Token::Minus, Token::UMinus]
        );
    }

    #[test]
    fn test_loop_do_does_not_open_a_scope() {
        assert_eq!(
            retagged("while i < 3 do\n  v = 1\nend\nv -1"),
            vec![Token::Minus]
        );
    }
}
