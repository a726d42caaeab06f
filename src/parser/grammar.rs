//! Chumsky grammar for Ruby snippets
//!
//! The grammar consumes the spanned token stream produced by [`crate::lexer::lex`] and
//! builds the intermediate [`Expr`] tree. It is layered the usual way for an expression
//! language, from loosest to tightest binding:
//!
//! - statements: expressions separated by terminators, with `if`/`unless`/`while`/`until`
//!   modifiers
//! - `not`, `and`, `or`
//! - assignment (`=`, `+=`, `||=`, ...), right associative
//! - ternary `? :`, then ranges `..` / `...`
//! - `||`, `&&`, equality, comparison, `|` `^`, `&`, shifts, `+ -`, `* / %`
//! - unary minus, `**`, `!`
//! - postfix: `.method`, `::Name`, `[index]`, brace and `do` blocks
//! - primaries: literals, names, calls, collections, parentheses and the keyword
//!   constructs (`if`, `case`, `def`, `class`, ...)
//!
//! Expressions are built twice: once for ordinary statements and once for `while` /
//! `until` conditions, where `do` opens the loop body instead of a block. Command
//! arguments (`puts x.map do ... end`) are parsed without `do` blocks as well, so a
//! trailing `do` belongs to the command call itself.
//!
//! The input is `(Token, Range<usize>)` pairs, so every parser can read byte spans
//! straight off the tokens it consumes; chumsky's own error spans are token indices.

use super::intermediate::{body_of, BlockExpr, Expr, ExprKind, Param, ParamKind, Params, Span};
use crate::lexer::{SpannedToken, Token};
use chumsky::prelude::*;

/// Type alias for parser error
pub(crate) type ParserError = Simple<SpannedToken>;

type ExprParser = BoxedParser<'static, SpannedToken, Expr, ParserError>;
type StmtsParser = BoxedParser<'static, SpannedToken, Vec<Expr>, ParserError>;

// ============================================================================
// Token helpers
// ============================================================================

/// Match a specific token, yielding its span
pub(crate) fn token(t: Token) -> impl Parser<SpannedToken, Span, Error = ParserError> + Clone {
    filter(move |(tok, _): &SpannedToken| *tok == t).map(|(_, span)| span)
}

/// Match any token accepted by `pred`
fn token_where(
    pred: fn(&Token) -> bool,
) -> impl Parser<SpannedToken, SpannedToken, Error = ParserError> + Clone {
    filter(move |(tok, _): &SpannedToken| pred(tok))
}

fn is_terminator(t: &Token) -> bool {
    matches!(t, Token::Newline | Token::Semicolon)
}

/// One or more statement terminators
fn term() -> impl Parser<SpannedToken, (), Error = ParserError> + Clone {
    token_where(is_terminator).repeated().at_least(1).ignored()
}

fn terms_opt() -> impl Parser<SpannedToken, (), Error = ParserError> + Clone {
    token_where(is_terminator).repeated().ignored()
}

fn ident() -> impl Parser<SpannedToken, (String, Span), Error = ParserError> + Clone {
    select! { (Token::Ident(name), range) => (name, range) }
}

fn constant() -> impl Parser<SpannedToken, (String, Span), Error = ParserError> + Clone {
    select! { (Token::Const(name), range) => (name, range) }
}

/// Name after a `.` or `::`; keywords are valid method names there
fn method_name() -> impl Parser<SpannedToken, (String, Span), Error = ParserError> + Clone {
    filter_map(|span, (tok, range): SpannedToken| {
        let name = match &tok {
            Token::Ident(name) | Token::Const(name) => Some(name.clone()),
            other => other.keyword_name().map(str::to_owned),
        };
        match name {
            Some(name) => Ok((name, range)),
            None => Err(Simple::expected_input_found(
                span,
                Vec::new(),
                Some((tok, range)),
            )),
        }
    })
}

// ============================================================================
// Expression builders
// ============================================================================

/// Argument parsers for calls
#[derive(Clone)]
struct ArgParsers {
    /// Inside parentheses and brackets, where `do` blocks are always allowed
    nested: ExprParser,
    /// Command arguments written without parentheses
    command: ExprParser,
}

/// Arguments of a call, with the span they cover
#[derive(Debug, Clone)]
struct CallArgs {
    args: Vec<Expr>,
    span: Span,
    parens: bool,
}

#[derive(Debug, Clone)]
enum Suffix {
    Method {
        name: String,
        range: Span,
        args: Option<CallArgs>,
    },
    Scope {
        name: String,
        range: Span,
        args: Option<CallArgs>,
    },
    Index {
        args: Vec<Expr>,
        range: Span,
    },
    Block(BlockExpr),
}

fn call(receiver: Option<Expr>, method: String, name_range: Span, args: Option<CallArgs>) -> Expr {
    let start = receiver.as_ref().map_or(name_range.start, |r| r.span.start);
    let (args, end, parens) = match args {
        Some(call_args) => (call_args.args, call_args.span.end, call_args.parens),
        None => (Vec::new(), name_range.end, false),
    };
    Expr::new(
        ExprKind::Call {
            receiver: receiver.map(Box::new),
            method,
            args,
            parens,
        },
        start..end,
    )
}

fn binary(lhs: Expr, op: &Token, rhs: Expr) -> Expr {
    let range = lhs.span.start..rhs.span.end;
    let kind = match op {
        Token::AndAnd => ExprKind::And(Box::new(lhs), Box::new(rhs)),
        Token::OrOr => ExprKind::Or(Box::new(lhs), Box::new(rhs)),
        _ => ExprKind::Call {
            receiver: Some(Box::new(lhs)),
            method: op.operator_name().unwrap_or_default().to_owned(),
            args: vec![rhs],
            parens: false,
        },
    };
    Expr::new(kind, range)
}

fn logical(op: &Token, lhs: Expr, rhs: Expr) -> Expr {
    let range = lhs.span.start..rhs.span.end;
    let kind = match op {
        Token::And => ExprKind::And(Box::new(lhs), Box::new(rhs)),
        _ => ExprKind::Or(Box::new(lhs), Box::new(rhs)),
    };
    Expr::new(kind, range)
}

fn negate(op: Span, operand: Expr) -> Expr {
    let range = op.start..operand.span.end;
    Expr::new(ExprKind::Not(Box::new(operand)), range)
}

/// Unary minus; a numeric literal written right after the `-` becomes a negative literal
fn minus(op: Span, operand: Expr) -> Expr {
    let range = op.start..operand.span.end;
    let adjacent = op.end == operand.span.start;
    match operand.kind {
        ExprKind::Int(value) if adjacent => Expr::new(ExprKind::Int(-value), range),
        ExprKind::Float(bits) if adjacent => {
            Expr::new(ExprKind::Float((-f64::from_bits(bits)).to_bits()), range)
        }
        _ => Expr::new(
            ExprKind::Call {
                receiver: Some(Box::new(operand)),
                method: "-@".to_owned(),
                args: Vec::new(),
                parens: false,
            },
            range,
        ),
    }
}

fn pair(key: Expr, value: Expr) -> Expr {
    let range = key.span.start..value.span.end;
    Expr::new(ExprKind::Pair(Box::new(key), Box::new(value)), range)
}

/// Trailing `key => value` / `key: value` arguments form one braceless hash
fn group_pairs(mut args: Vec<Expr>) -> Vec<Expr> {
    let first_pair = args
        .iter()
        .rposition(|arg| !matches!(arg.kind, ExprKind::Pair(..)))
        .map_or(0, |index| index + 1);
    if first_pair == args.len() {
        return args;
    }

    let pairs = args.split_off(first_pair);
    let start = pairs.first().map_or(0, |p| p.span.start);
    let end = pairs.last().map_or(start, |p| p.span.end);
    args.push(Expr::new(ExprKind::Hash(pairs), start..end));
    args
}

fn if_chain(
    if_range: Span,
    cond: Expr,
    body: Vec<Expr>,
    elsifs: Vec<((Span, Expr), Vec<Expr>)>,
    else_body: Option<Vec<Expr>>,
    end_range: Span,
) -> Expr {
    let mut alternative = else_body.and_then(body_of);
    for ((elsif_range, cond), body) in elsifs.into_iter().rev() {
        let body = body_of(body);
        let end = alternative
            .as_ref()
            .or(body.as_ref())
            .map_or(cond.span.end, |e| e.span.end);
        alternative = Some(Box::new(Expr::new(
            ExprKind::If {
                cond: Box::new(cond),
                then_body: body,
                else_body: alternative,
            },
            elsif_range.start..end,
        )));
    }

    Expr::new(
        ExprKind::If {
            cond: Box::new(cond),
            then_body: body_of(body),
            else_body: alternative,
        },
        if_range.start..end_range.end,
    )
}

fn modifier(keyword: &Token, body: Expr, cond: Expr) -> Expr {
    let range = body.span.start..cond.span.end;
    let (body, cond) = (Box::new(body), Box::new(cond));
    let kind = match keyword {
        Token::If => ExprKind::ModifierIf {
            cond,
            body,
            negated: false,
        },
        Token::Unless => ExprKind::ModifierIf {
            cond,
            body,
            negated: true,
        },
        Token::Until => ExprKind::ModifierWhile {
            cond,
            body,
            until: true,
        },
        _ => ExprKind::ModifierWhile {
            cond,
            body,
            until: false,
        },
    };
    Expr::new(kind, range)
}

fn apply_suffix(base: Expr, suffix: Suffix, span: Span) -> Result<Expr, ParserError> {
    let expr = match suffix {
        Suffix::Method { name, range, args } => call(Some(base), name, range, args),
        Suffix::Scope { name, range, args } => {
            if args.is_none() && name.starts_with(|c: char| c.is_ascii_uppercase()) {
                let full = base.span.start..range.end;
                Expr::new(
                    ExprKind::Const {
                        scope: Some(Box::new(base)),
                        name,
                    },
                    full,
                )
            } else {
                call(Some(base), name, range, args)
            }
        }
        Suffix::Index { args, range } => {
            let full = base.span.start..range.end;
            Expr::new(
                ExprKind::Index {
                    receiver: Box::new(base),
                    args,
                },
                full,
            )
        }
        Suffix::Block(block) => {
            if !base.accepts_block() {
                return Err(Simple::custom(span, "a block can only be given to a method call"));
            }
            let full = base.span.start..block.span.end;
            Expr::new(
                ExprKind::Block {
                    call: Box::new(base),
                    block,
                },
                full,
            )
        }
    };
    Ok(expr)
}

// ============================================================================
// Arguments and parameters
// ============================================================================

/// `key: value`, `key => value` or a plain argument
fn call_arg(arg: ExprParser) -> ExprParser {
    let label_pair = select! { (Token::Label(name), range) => (name, range) }
        .then(arg.clone())
        .map(|((name, range), value)| {
            let key = Expr::new(ExprKind::Sym(name), range.start..range.end - 1);
            pair(key, value)
        });
    let arrow_pair = arg
        .clone()
        .then(token(Token::Arrow).ignore_then(arg).or_not())
        .map(|(key, value)| match value {
            Some(value) => pair(key, value),
            None => key,
        });

    label_pair.or(arrow_pair).boxed()
}

fn paren_arguments(
    arg: ExprParser,
) -> impl Parser<SpannedToken, CallArgs, Error = ParserError> + Clone {
    token(Token::LParen)
        .then(
            call_arg(arg)
                .separated_by(token(Token::Comma))
                .allow_trailing(),
        )
        .then(token(Token::RParen))
        .map(|((open, args), close)| CallArgs {
            args: group_pairs(args),
            span: open.start..close.end,
            parens: true,
        })
}

/// Parenthesised arguments, or command arguments written without parentheses
fn arguments(args: ArgParsers) -> impl Parser<SpannedToken, CallArgs, Error = ParserError> + Clone {
    let command = token_where(|t| t.starts_command_argument() || matches!(t, Token::Label(_)))
        .rewind()
        .ignore_then(
            call_arg(args.command)
                .separated_by(token(Token::Comma))
                .at_least(1),
        )
        .map(|args: Vec<Expr>| {
            let start = args.first().map_or(0, |a| a.span.start);
            let end = args.last().map_or(start, |a| a.span.end);
            CallArgs {
                args: group_pairs(args),
                span: start..end,
                parens: false,
            }
        });

    paren_arguments(args.nested).or(command)
}

fn param(default: Option<ExprParser>) -> BoxedParser<'static, SpannedToken, Param, ParserError> {
    let rest = token(Token::Star)
        .then(ident())
        .map(|(star, (name, range))| Param {
            name,
            kind: ParamKind::Rest,
            span: star.start..range.end,
        });
    let block = token(Token::Amp)
        .then(ident())
        .map(|(amp, (name, range))| Param {
            name,
            kind: ParamKind::Block,
            span: amp.start..range.end,
        });
    let required = ident().map(|(name, range)| Param {
        name,
        kind: ParamKind::Required,
        span: range,
    });

    match default {
        Some(arg) => {
            let optional = ident()
                .then_ignore(token(Token::Assign))
                .then(arg)
                .map(|((name, range), value)| Param {
                    name,
                    span: range.start..value.span.end,
                    kind: ParamKind::Optional(value),
                });
            choice((rest, block, optional, required)).boxed()
        }
        None => choice((rest, block, required)).boxed(),
    }
}

/// `def` parameters: `(a, b = 1, *rest, &blk)` or the same list without parentheses
fn def_params(arg: ExprParser) -> impl Parser<SpannedToken, Params, Error = ParserError> + Clone {
    let param = param(Some(arg));
    let parenthesised = token(Token::LParen)
        .then(param.clone().separated_by(token(Token::Comma)).allow_trailing())
        .then(token(Token::RParen))
        .map(|((open, list), close)| Params {
            list,
            span: Some(open.start..close.end),
        });
    let bare = param
        .separated_by(token(Token::Comma))
        .at_least(1)
        .map(|list: Vec<Param>| {
            let start = list.first().map_or(0, |p| p.span.start);
            let end = list.last().map_or(start, |p| p.span.end);
            Params {
                list,
                span: Some(start..end),
            }
        });

    parenthesised
        .or(bare)
        .or_not()
        .map(Option::unwrap_or_default)
}

// ============================================================================
// Blocks
// ============================================================================

fn block(
    stmts: StmtsParser,
    allow_do: bool,
) -> BoxedParser<'static, SpannedToken, BlockExpr, ParserError> {
    let params = token(Token::Pipe)
        .then(param(None).separated_by(token(Token::Comma)))
        .then(token(Token::Pipe))
        .map(|((open, list), close)| Params {
            list,
            span: Some(open.start..close.end),
        })
        .or_not()
        .map(Option::unwrap_or_default);

    let brace = token(Token::LBrace)
        .then(params.clone())
        .then(stmts.clone())
        .then(token(Token::RBrace))
        .map(|(((open, params), body), close)| BlockExpr {
            params,
            body: body_of(body),
            span: open.start..close.end,
        });

    if !allow_do {
        return brace.boxed();
    }

    let do_block = token(Token::Do)
        .then(params)
        .then(stmts)
        .then(token(Token::End))
        .map(|(((open, params), body), close)| BlockExpr {
            params,
            body: body_of(body),
            span: open.start..close.end,
        });

    brace.or(do_block).boxed()
}

// ============================================================================
// Primaries
// ============================================================================

fn primary(
    stmts: StmtsParser,
    expr: ExprParser,
    arg: ExprParser,
    args: ArgParsers,
    cond: ExprParser,
) -> ExprParser {
    let nested = args.nested.clone();
    let literal = select! {
        (Token::Integer(value), range) => Expr::new(ExprKind::Int(value), range),
        (Token::Float(bits), range) => Expr::new(ExprKind::Float(bits), range),
        (Token::Str(value), range) => Expr::new(ExprKind::Str(value), range),
        (Token::Symbol(name), range) => Expr::new(ExprKind::Sym(name), range),
        (Token::Nil, range) => Expr::new(ExprKind::Nil, range),
        (Token::True, range) => Expr::new(ExprKind::True, range),
        (Token::False, range) => Expr::new(ExprKind::False, range),
        (Token::SelfKw, range) => Expr::new(ExprKind::SelfRef, range),
        (Token::Ivar(name), range) => Expr::new(ExprKind::Ivar(name), range),
        (Token::Gvar(name), range) => Expr::new(ExprKind::Gvar(name), range),
    };

    let identifier = ident()
        .then(arguments(args.clone()).or_not())
        .map(|((name, range), args)| match args {
            None => Expr::new(ExprKind::Ident(name), range),
            Some(args) => call(None, name, range, Some(args)),
        });

    let const_ref = constant()
        .then(paren_arguments(nested.clone()).or_not())
        .map(|((name, range), args)| match args {
            None => Expr::new(ExprKind::Const { scope: None, name }, range),
            Some(args) => call(None, name, range, Some(args)),
        });

    let array = token_where(|t| matches!(t, Token::LBracket | Token::LBracketArg))
        .map(|(_, range)| range)
        .then(
            call_arg(nested.clone())
                .separated_by(token(Token::Comma))
                .allow_trailing(),
        )
        .then(token(Token::RBracket))
        .map(|((open, items), close)| {
            Expr::new(ExprKind::Array(group_pairs(items)), open.start..close.end)
        });

    let label_pair = select! { (Token::Label(name), range) => (name, range) }
        .then(nested.clone())
        .map(|((name, range), value)| {
            pair(Expr::new(ExprKind::Sym(name), range.start..range.end - 1), value)
        });
    let arrow_pair = nested
        .clone()
        .then_ignore(token(Token::Arrow))
        .then(nested.clone())
        .map(|(key, value)| pair(key, value));
    let hash = token(Token::LBrace)
        .then_ignore(terms_opt())
        .then(
            label_pair
                .or(arrow_pair)
                .separated_by(token(Token::Comma).then_ignore(terms_opt()))
                .allow_trailing(),
        )
        .then_ignore(terms_opt())
        .then(token(Token::RBrace))
        .map(|((open, pairs), close)| Expr::new(ExprKind::Hash(pairs), open.start..close.end));

    let parens = token(Token::LParen)
        .then(stmts.clone())
        .then(token(Token::RParen))
        .map(|((open, body), close)| Expr::new(ExprKind::Begin(body), open.start..close.end));

    // `if x then y`, `if x\n y`, `if x; y`
    let then_sep = term()
        .then(token(Token::Then).or_not())
        .ignored()
        .or(token(Token::Then).ignored());
    let else_clause = token(Token::Else).ignore_then(stmts.clone());

    let elsif = token(Token::Elsif)
        .then(expr.clone())
        .then_ignore(then_sep.clone())
        .then(stmts.clone());
    let if_expr = token(Token::If)
        .then(expr.clone())
        .then_ignore(then_sep.clone())
        .then(stmts.clone())
        .then(elsif.repeated())
        .then(else_clause.clone().or_not())
        .then(token(Token::End))
        .map(|(((((if_range, cond), body), elsifs), else_body), end_range)| {
            if_chain(if_range, cond, body, elsifs, else_body, end_range)
        });

    let unless_expr = token(Token::Unless)
        .then(expr.clone())
        .then_ignore(then_sep.clone())
        .then(stmts.clone())
        .then(else_clause.clone().or_not())
        .then(token(Token::End))
        .map(|((((unless_range, cond), body), else_body), end_range)| {
            Expr::new(
                ExprKind::If {
                    cond: Box::new(cond),
                    then_body: else_body.and_then(body_of),
                    else_body: body_of(body),
                },
                unless_range.start..end_range.end,
            )
        });

    let loop_expr = token_where(|t| matches!(t, Token::While | Token::Until))
        .then(cond)
        .then_ignore(term().or(token(Token::Do).ignored()))
        .then(stmts.clone())
        .then(token(Token::End))
        .map(|((((keyword, keyword_range), cond), body), end_range)| {
            Expr::new(
                ExprKind::While {
                    cond: Box::new(cond),
                    body: body_of(body),
                    until: keyword == Token::Until,
                },
                keyword_range.start..end_range.end,
            )
        });

    let when = token(Token::When)
        .then(arg.clone().separated_by(token(Token::Comma)).at_least(1))
        .then_ignore(then_sep)
        .then(stmts.clone())
        .map(|((when_range, patterns), body)| {
            let body = body_of(body);
            let end = body
                .as_ref()
                .map(|b| b.span.end)
                .or_else(|| patterns.last().map(|p| p.span.end))
                .unwrap_or(when_range.end);
            Expr::new(ExprKind::When { patterns, body }, when_range.start..end)
        });
    let case_expr = token(Token::Case)
        .then(expr.or_not())
        .then_ignore(term())
        .then(when.repeated().at_least(1))
        .then(else_clause.or_not())
        .then(token(Token::End))
        .map(|((((case_range, subject), whens), else_body), end_range)| {
            Expr::new(
                ExprKind::Case {
                    subject: subject.map(Box::new),
                    whens,
                    else_body: else_body.and_then(body_of),
                },
                case_range.start..end_range.end,
            )
        });

    let def_name = method_name().or(token_where(|t| t.operator_name().is_some()).map(
        |(t, range)| (t.operator_name().unwrap_or_default().to_owned(), range),
    ));
    let singleton = token(Token::SelfKw)
        .then_ignore(token(Token::Dot))
        .map(|range| Expr::new(ExprKind::SelfRef, range));
    let def_expr = token(Token::Def)
        .then(singleton.or_not())
        .then(def_name)
        .then(def_params(nested.clone()))
        .then(stmts.clone())
        .then(token(Token::End))
        .map(
            |(((((def_range, singleton), (name, _)), params), body), end_range)| {
                Expr::new(
                    ExprKind::Def {
                        singleton: singleton.map(Box::new),
                        name,
                        params,
                        body: body_of(body),
                    },
                    def_range.start..end_range.end,
                )
            },
        );

    let cpath = constant()
        .map(|(name, range)| Expr::new(ExprKind::Const { scope: None, name }, range))
        .then(token(Token::ColonColon).ignore_then(constant()).repeated())
        .foldl(|scope, (name, range)| {
            let full = scope.span.start..range.end;
            Expr::new(
                ExprKind::Const {
                    scope: Some(Box::new(scope)),
                    name,
                },
                full,
            )
        });
    let class_expr = token(Token::Class)
        .then(cpath.clone())
        .then(token(Token::Lt).ignore_then(nested).or_not())
        .then(stmts.clone())
        .then(token(Token::End))
        .map(|((((class_range, path), superclass), body), end_range)| {
            Expr::new(
                ExprKind::Class {
                    path: Box::new(path),
                    superclass: superclass.map(Box::new),
                    body: body_of(body),
                },
                class_range.start..end_range.end,
            )
        });
    let module_expr = token(Token::Module)
        .then(cpath)
        .then(stmts)
        .then(token(Token::End))
        .map(|(((module_range, path), body), end_range)| {
            Expr::new(
                ExprKind::Module {
                    path: Box::new(path),
                    body: body_of(body),
                },
                module_range.start..end_range.end,
            )
        });

    // `return if done` is a modifier, not a returned `if` expression
    let jump_value = token_where(|t| {
        !matches!(t, Token::If | Token::Unless | Token::While | Token::Until)
    })
    .rewind()
    .ignore_then(arg.clone())
    .or_not();
    let jump = token_where(|t| matches!(t, Token::Return | Token::Break | Token::Next))
        .then(jump_value)
        .map(|((keyword, range), value)| {
            let span = value.as_ref().map_or(range.clone(), |v| range.start..v.span.end);
            let value = value.map(Box::new);
            let kind = match keyword {
                Token::Return => ExprKind::Return(value),
                Token::Break => ExprKind::Break(value),
                _ => ExprKind::Next(value),
            };
            Expr::new(kind, span)
        });

    let yield_expr = token(Token::Yield)
        .then(arguments(args).or_not())
        .map(|(range, args)| match args {
            Some(call_args) => Expr::new(
                ExprKind::Yield(call_args.args),
                range.start..call_args.span.end,
            ),
            None => Expr::new(ExprKind::Yield(Vec::new()), range),
        });

    choice((
        if_expr,
        unless_expr,
        loop_expr,
        case_expr,
        def_expr,
        class_expr,
        module_expr,
        jump,
        yield_expr,
        literal,
        identifier,
        const_ref,
        array,
        hash,
        parens,
    ))
    .boxed()
}

fn postfix(primary: ExprParser, stmts: StmtsParser, args: ArgParsers, allow_do: bool) -> ExprParser {
    let nested = args.nested.clone();
    let method = token(Token::Dot)
        .ignore_then(method_name())
        .then(arguments(args).or_not())
        .map(|((name, range), args)| Suffix::Method { name, range, args });
    let scope = token(Token::ColonColon)
        .ignore_then(method_name())
        .then(paren_arguments(nested.clone()).or_not())
        .map(|((name, range), args)| Suffix::Scope { name, range, args });
    let index = token(Token::LBracket)
        .then(nested.separated_by(token(Token::Comma)).allow_trailing())
        .then(token(Token::RBracket))
        .map(|((open, args), close)| Suffix::Index {
            args,
            range: open.start..close.end,
        });
    let suffix = choice((method, scope, index, block(stmts, allow_do).map(Suffix::Block)));

    primary
        .then(suffix.repeated())
        .try_map(|(base, suffixes), span| {
            suffixes
                .into_iter()
                .try_fold(base, |base, suffix| apply_suffix(base, suffix, span.clone()))
        })
        .boxed()
}

// ============================================================================
// Operators
// ============================================================================

/// Left associative binary operator level
fn binary_level(operand: ExprParser, is_op: fn(&Token) -> bool) -> ExprParser {
    operand
        .clone()
        .then(token_where(is_op).then(operand).repeated())
        .foldl(|lhs, ((op, _), rhs)| binary(lhs, &op, rhs))
        .boxed()
}

fn operators(postfix: ExprParser, arg: ExprParser) -> ExprParser {
    let bang = token(Token::Bang)
        .repeated()
        .then(postfix)
        .foldr(negate)
        .boxed();

    // `**` binds tighter than unary minus and is right associative
    let unary = recursive(|unary| {
        let power = bang
            .clone()
            .then(token(Token::Pow).then(unary.clone()).or_not())
            .map(|(base, exponent)| match exponent {
                Some((_, rhs)) => binary(base, &Token::Pow, rhs),
                None => base,
            });
        token_where(|t| matches!(t, Token::Minus | Token::UMinus))
            .then(unary)
            .map(|((_, op), operand)| minus(op, operand))
            .or(power)
    })
    .boxed();

    let product = binary_level(unary, |t| {
        matches!(t, Token::Star | Token::Slash | Token::Percent)
    });
    let sum = binary_level(product, |t| {
        matches!(t, Token::Plus | Token::Minus | Token::UMinus)
    });
    let shift = binary_level(sum, |t| matches!(t, Token::Shl | Token::Shr));
    let bit_and = binary_level(shift, |t| matches!(t, Token::Amp));
    let bit_or = binary_level(bit_and, |t| matches!(t, Token::Pipe | Token::Caret));
    let comparison = binary_level(bit_or, |t| {
        matches!(t, Token::Lt | Token::LtEq | Token::Gt | Token::GtEq)
    });
    let equality = binary_level(comparison, |t| {
        matches!(
            t,
            Token::EqEq | Token::NotEq | Token::CaseEq | Token::Match | Token::Spaceship
        )
    });
    let and = binary_level(equality, |t| matches!(t, Token::AndAnd));
    let or = binary_level(and, |t| matches!(t, Token::OrOr));

    let range = or
        .clone()
        .then(
            token_where(|t| matches!(t, Token::DotDot | Token::DotDotDot))
                .then(or)
                .or_not(),
        )
        .map(|(from, to)| match to {
            Some(((op, _), to)) => {
                let span = from.span.start..to.span.end;
                Expr::new(
                    ExprKind::Range {
                        exclusive: op == Token::DotDotDot,
                        from: Box::new(from),
                        to: Box::new(to),
                    },
                    span,
                )
            }
            None => from,
        });

    let ternary = range
        .then(
            token(Token::Question)
                .ignore_then(arg.clone())
                .then_ignore(token(Token::Colon))
                .then(arg.clone())
                .or_not(),
        )
        .map(|(cond, branches)| match branches {
            Some((then_branch, else_branch)) => {
                let span = cond.span.start..else_branch.span.end;
                Expr::new(
                    ExprKind::If {
                        cond: Box::new(cond),
                        then_body: Some(Box::new(then_branch)),
                        else_body: Some(Box::new(else_branch)),
                    },
                    span,
                )
            }
            None => cond,
        });

    let assign_op = token_where(|t| matches!(t, Token::Assign | Token::OpAssign(_)));
    ternary
        .then(assign_op.then(arg).or_not())
        .try_map(|(target, assignment), span| match assignment {
            None => Ok(target),
            Some(_) if !target.is_assignable() => {
                Err(Simple::custom(span, "cannot assign to this expression"))
            }
            Some(((op, _), value)) => {
                let range = target.span.start..value.span.end;
                let (target, value) = (Box::new(target), Box::new(value));
                let kind = match op {
                    Token::OpAssign(op) => ExprKind::OpAssign { target, op, value },
                    _ => ExprKind::Assign { target, value },
                };
                Ok(Expr::new(kind, range))
            }
        })
        .boxed()
}

// ============================================================================
// Expressions and statements
// ============================================================================

/// Argument expressions: operators over postfix chains over primaries
///
/// Command arguments use `command` when given, and this same parser otherwise.
fn argument(
    stmts: StmtsParser,
    expr: ExprParser,
    cond: ExprParser,
    nested: ExprParser,
    command: Option<ExprParser>,
    allow_do: bool,
) -> ExprParser {
    recursive(move |arg| {
        let arg: ExprParser = arg.boxed();
        let args = ArgParsers {
            nested,
            command: command.unwrap_or_else(|| arg.clone()),
        };
        let primary = primary(stmts.clone(), expr, arg.clone(), args.clone(), cond);
        let postfix = postfix(primary, stmts, args, allow_do);
        operators(postfix, arg)
    })
    .boxed()
}

/// `not`, `and`, `or` over argument expressions
fn expression(stmts: StmtsParser, cond: ExprParser, allow_do: bool) -> ExprParser {
    recursive(move |expr| {
        let expr: ExprParser = expr.boxed();

        let mut nested: Recursive<'static, SpannedToken, Expr, ParserError> = Recursive::declare();
        let command = argument(
            stmts.clone(),
            expr.clone(),
            cond.clone(),
            nested.clone().boxed(),
            None,
            false,
        );
        nested.define(argument(
            stmts.clone(),
            expr.clone(),
            cond.clone(),
            nested.clone().boxed(),
            Some(command.clone()),
            true,
        ));
        let arg = if allow_do { nested.boxed() } else { command };

        let not = token(Token::Not).repeated().then(arg).foldr(negate).boxed();
        not.clone()
            .then(
                token_where(|t| matches!(t, Token::And | Token::Or))
                    .then(not)
                    .repeated(),
            )
            .foldl(|lhs, ((op, _), rhs)| logical(&op, lhs, rhs))
    })
    .boxed()
}

/// One statement: an expression followed by any number of modifiers
fn statement() -> impl Parser<SpannedToken, Expr, Error = ParserError> + Clone {
    recursive(|stmt| {
        let stmts: StmtsParser = terms_opt()
            .ignore_then(stmt.separated_by(term()).allow_trailing())
            .boxed();

        let mut cond: Recursive<'static, SpannedToken, Expr, ParserError> = Recursive::declare();
        let expr = expression(stmts.clone(), cond.clone().boxed(), true);
        cond.define(expression(stmts, cond.clone().boxed(), false));

        let keyword =
            token_where(|t| matches!(t, Token::If | Token::Unless | Token::While | Token::Until));
        expr.clone()
            .then(keyword.then(expr).repeated())
            .foldl(|body, ((keyword, _), cond)| modifier(&keyword, body, cond))
    })
}

/// A whole snippet: terminator separated statements up to the end of input
pub(crate) fn program() -> impl Parser<SpannedToken, Vec<Expr>, Error = ParserError> {
    terms_opt()
        .ignore_then(statement().separated_by(term()).allow_trailing())
        .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_exprs(source: &str) -> Vec<Expr> {
        let tokens = lex(source).expect("source to lex");
        program().parse(tokens).expect("source to parse")
    }

    fn parse_one(source: &str) -> Expr {
        let mut exprs = parse_exprs(source);
        assert_eq!(exprs.len(), 1, "expected a single statement in {:?}", source);
        exprs.remove(0)
    }

    fn method_of(expr: &Expr) -> &str {
        match &expr.kind {
            ExprKind::Call { method, .. } => method,
            other => panic!("expected a call, got {:?}", other),
        }
    }

    #[test]
    fn test_statements_and_terminators() {
        assert_eq!(parse_exprs("a; b\n\nc\n").len(), 3);
        assert!(parse_exprs("").is_empty());
        assert!(parse_exprs("\n;\n").is_empty());
    }

    #[test]
    fn test_command_call() {
        let expr = parse_one("fibo 10");
        assert_eq!(expr.span, 0..7);
        match expr.kind {
            ExprKind::Call {
                receiver: None,
                ref args,
                parens: false,
                ..
            } => assert_eq!(args.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_binary_precedence() {
        let expr = parse_one("1 + 2 * 3");
        assert_eq!(method_of(&expr), "+");

        let expr = parse_one("a - b - c");
        match &expr.kind {
            ExprKind::Call {
                receiver: Some(lhs),
                ..
            } => assert_eq!(method_of(lhs), "-"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = parse_one("2 ** 3 ** 4");
        match &expr.kind {
            ExprKind::Call { args, .. } => assert_eq!(method_of(&args[0]), "**"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_negative_literal() {
        assert_eq!(parse_one("-1").kind, ExprKind::Int(-1));
        assert_eq!(method_of(&parse_one("-x")), "-@");
        assert_eq!(method_of(&parse_one("- 1")), "-@");
    }

    #[test]
    fn test_spaced_minus_opens_an_argument() {
        match parse_one("fibo -1").kind {
            ExprKind::Call {
                receiver: None,
                ref args,
                parens: false,
                ..
            } => assert_eq!(args[0].kind, ExprKind::Int(-1)),
            other => panic!("unexpected {:?}", other),
        }

        let exprs = parse_exprs("n = 2\nn -1");
        assert_eq!(method_of(&exprs[1]), "-");
    }

    #[test]
    fn test_do_block_binds_to_command_call() {
        match parse_one("puts [1].map do |x| x end").kind {
            ExprKind::Block { call, .. } => assert_eq!(method_of(&call), "puts"),
            other => panic!("unexpected {:?}", other),
        }
        match parse_one("puts 1, 2 do |a| a end").kind {
            ExprKind::Block { call, .. } => assert_eq!(method_of(&call), "puts"),
            other => panic!("unexpected {:?}", other),
        }
        match parse_one("puts [1].map { |x| x }").kind {
            ExprKind::Call { args, .. } => {
                assert!(matches!(args[0].kind, ExprKind::Block { .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_assignment_requires_assignable_target() {
        assert!(matches!(parse_one("x = 1").kind, ExprKind::Assign { .. }));
        assert!(matches!(parse_one("x += 1").kind, ExprKind::OpAssign { .. }));

        let tokens = lex("1 = 2").expect("source to lex");
        assert!(program().parse(tokens).is_err());
    }

    #[test]
    fn test_block_only_on_calls() {
        assert!(matches!(
            parse_one("list.each { |x| x }").kind,
            ExprKind::Block { .. }
        ));

        let tokens = lex("1 { 2 }").expect("source to lex");
        assert!(program().parse(tokens).is_err());
    }

    #[test]
    fn test_modifiers_chain() {
        let expr = parse_one("a if b unless c");
        match expr.kind {
            ExprKind::ModifierIf {
                negated: true,
                body,
                ..
            } => assert!(matches!(body.kind, ExprKind::ModifierIf { negated: false, .. })),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_while_do_keyword() {
        assert!(matches!(
            parse_one("while i < 10 do\n  i += 1\nend").kind,
            ExprKind::While { until: false, .. }
        ));
    }

    #[test]
    fn test_unclosed_definition_fails() {
        let tokens = lex("def fibo(n").expect("source to lex");
        assert!(program().parse(tokens).is_err());
    }
}
