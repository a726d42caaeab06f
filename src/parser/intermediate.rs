//! Intermediate syntax tree produced by the grammar
//!
//! The grammar cannot decide whether a bare identifier is a local variable or a
//! method call: that depends on which names were assigned earlier in the enclosing
//! scope. It therefore builds this spanned, unresolved tree, and `conversion` lowers
//! it into [`crate::ast::Node`]s once the whole snippet is known.

use std::ops::Range;

pub(crate) type Span = Range<usize>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Expr {
    pub(crate) kind: ExprKind,
    pub(crate) span: Span,
}

impl Expr {
    pub(crate) fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Check if this expression is a method call a block can attach to
    pub(crate) fn accepts_block(&self) -> bool {
        matches!(self.kind, ExprKind::Ident(_) | ExprKind::Call { .. })
    }

    /// Check if this expression may appear on the left of `=`
    pub(crate) fn is_assignable(&self) -> bool {
        match &self.kind {
            ExprKind::Ident(name) => !name.ends_with(['?', '!']),
            ExprKind::Ivar(_) | ExprKind::Gvar(_) | ExprKind::Const { .. } => true,
            ExprKind::Index { .. } => true,
            ExprKind::Call {
                receiver: Some(_),
                args,
                parens: false,
                method,
            } => args.is_empty() && method.starts_with(|c: char| c.is_ascii_lowercase() || c == '_'),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ExprKind {
    Nil,
    True,
    False,
    SelfRef,
    Int(i64),
    Float(u64),
    Str(String),
    Sym(String),

    /// Bare identifier: a local variable or a receiverless call without arguments
    Ident(String),
    Ivar(String),
    Gvar(String),
    Const {
        scope: Option<Box<Expr>>,
        name: String,
    },

    Array(Vec<Expr>),
    Hash(Vec<Expr>),
    Pair(Box<Expr>, Box<Expr>),
    Range {
        exclusive: bool,
        from: Box<Expr>,
        to: Box<Expr>,
    },

    Call {
        receiver: Option<Box<Expr>>,
        method: String,
        args: Vec<Expr>,
        parens: bool,
    },
    /// A call together with the `{ }` or `do end` block given to it
    Block {
        call: Box<Expr>,
        block: BlockExpr,
    },
    Index {
        receiver: Box<Expr>,
        args: Vec<Expr>,
    },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),

    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// `target op= value`; `op` is `+`, `||`, `&&`, ...
    OpAssign {
        target: Box<Expr>,
        op: String,
        value: Box<Expr>,
    },

    If {
        cond: Box<Expr>,
        then_body: Option<Box<Expr>>,
        else_body: Option<Box<Expr>>,
    },
    /// Statement modifiers are lowered in textual order (body first)
    ModifierIf {
        cond: Box<Expr>,
        body: Box<Expr>,
        negated: bool,
    },
    While {
        cond: Box<Expr>,
        body: Option<Box<Expr>>,
        until: bool,
    },
    ModifierWhile {
        cond: Box<Expr>,
        body: Box<Expr>,
        until: bool,
    },
    Case {
        subject: Option<Box<Expr>>,
        whens: Vec<Expr>,
        else_body: Option<Box<Expr>>,
    },
    When {
        patterns: Vec<Expr>,
        body: Option<Box<Expr>>,
    },

    Def {
        singleton: Option<Box<Expr>>,
        name: String,
        params: Params,
        body: Option<Box<Expr>>,
    },
    Class {
        path: Box<Expr>,
        superclass: Option<Box<Expr>>,
        body: Option<Box<Expr>>,
    },
    Module {
        path: Box<Expr>,
        body: Option<Box<Expr>>,
    },

    Return(Option<Box<Expr>>),
    Break(Option<Box<Expr>>),
    Next(Option<Box<Expr>>),
    Yield(Vec<Expr>),

    /// Statement sequence: a parenthesised group or a body with several statements
    Begin(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BlockExpr {
    pub(crate) params: Params,
    pub(crate) body: Option<Box<Expr>>,
    pub(crate) span: Span,
}

/// Parameter list; `span` is `None` when the list was written without delimiters
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Params {
    pub(crate) list: Vec<Param>,
    pub(crate) span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Param {
    pub(crate) name: String,
    pub(crate) kind: ParamKind,
    pub(crate) span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParamKind {
    Required,
    Optional(Expr),
    Rest,
    Block,
}

/// Wrap a statement list into a single optional body expression
pub(crate) fn body_of(mut statements: Vec<Expr>) -> Option<Box<Expr>> {
    match statements.len() {
        0 => None,
        1 => statements.pop().map(Box::new),
        _ => {
            let start = statements.first().map_or(0, |s| s.span.start);
            let end = statements.last().map_or(start, |s| s.span.end);
            Some(Box::new(Expr::new(ExprKind::Begin(statements), start..end)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, span: Span) -> Expr {
        Expr::new(ExprKind::Ident(name.into()), span)
    }

    #[test]
    fn test_body_of_unwraps_single_statement() {
        assert_eq!(body_of(vec![]), None);
        assert_eq!(body_of(vec![ident("a", 0..1)]), Some(Box::new(ident("a", 0..1))));
    }

    #[test]
    fn test_body_of_groups_statements() {
        let body = body_of(vec![ident("a", 0..1), ident("b", 2..3)]).expect("a body");
        assert_eq!(body.span, 0..3);
        assert!(matches!(body.kind, ExprKind::Begin(ref stmts) if stmts.len() == 2));
    }

    #[test]
    fn test_assignable_targets() {
        assert!(ident("x", 0..1).is_assignable());
        assert!(!ident("empty?", 0..6).is_assignable());
        assert!(!Expr::new(ExprKind::Int(1), 0..1).is_assignable());
    }
}
