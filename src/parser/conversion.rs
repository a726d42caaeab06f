//! Lowering of the intermediate tree into syntax tree nodes
//!
//! This is where bare identifiers are resolved. Ruby decides between a local variable
//! read and a receiverless method call by looking at what was assigned *textually
//! before* the identifier in the same scope, so lowering walks the intermediate tree in
//! source order while tracking the set of known locals:
//!
//! - `def`, `class` and `module` bodies start a fresh, opaque scope
//! - blocks see the enclosing locals plus their own parameters
//! - an assignment declares its name before its value is lowered (`x = x` reads `x`)
//! - statement modifiers lower their body before their condition
//!
//! Node shapes follow the canonical Ruby AST: `(send recv :name args...)`,
//! `(lvasgn :x value)`, `(if cond then else)`, `(block call (args ...) body)`, and so on.

use super::intermediate::{body_of, BlockExpr, Expr, ExprKind, Param, ParamKind, Params};
use crate::ast::{Child, FloatBits, Kind, Node, NodeRef, Scalar, SourceRange};
use std::collections::HashSet;

/// Lower the top-level statements of a snippet into its root node
///
/// A snippet with no statements lowers to an empty synthetic `(begin)`.
pub(crate) fn lower_program(statements: Vec<Expr>) -> NodeRef {
    match body_of(statements) {
        Some(body) => Lowering::new().lower(*body),
        None => Node::synthetic(Kind::Begin, Vec::new()),
    }
}

struct Scope {
    locals: HashSet<String>,
    /// Blocks can read the locals of the scope around them
    transparent: bool,
}

struct Lowering {
    scopes: Vec<Scope>,
}

impl Lowering {
    fn new() -> Self {
        Self {
            scopes: vec![Scope {
                locals: HashSet::new(),
                transparent: false,
            }],
        }
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.locals.insert(name.to_owned());
        }
    }

    fn is_local(&self, name: &str) -> bool {
        for scope in self.scopes.iter().rev() {
            if scope.locals.contains(name) {
                return true;
            }
            if !scope.transparent {
                break;
            }
        }
        false
    }

    fn scoped<T>(&mut self, transparent: bool, f: impl FnOnce(&mut Self) -> T) -> T {
        self.scopes.push(Scope {
            locals: HashSet::new(),
            transparent,
        });
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn lower_opt(&mut self, expr: Option<Box<Expr>>) -> Child {
        expr.map(|e| self.lower(*e)).into()
    }

    fn lower_all(&mut self, exprs: Vec<Expr>) -> Vec<Child> {
        exprs.into_iter().map(|e| Child::from(self.lower(e))).collect()
    }

    fn lower(&mut self, expr: Expr) -> NodeRef {
        let range = SourceRange::from(expr.span);
        match expr.kind {
            ExprKind::Nil => Node::new(Kind::Nil, Vec::new(), range),
            ExprKind::True => Node::new(Kind::True, Vec::new(), range),
            ExprKind::False => Node::new(Kind::False, Vec::new(), range),
            ExprKind::SelfRef => Node::new(Kind::SelfRef, Vec::new(), range),
            ExprKind::Int(value) => Node::new(Kind::Int, vec![Scalar::Int(value).into()], range),
            ExprKind::Float(bits) => Node::new(
                Kind::Float,
                vec![Scalar::Float(FloatBits::from_bits(bits)).into()],
                range,
            ),
            ExprKind::Str(value) => Node::new(Kind::Str, vec![Scalar::Str(value).into()], range),
            ExprKind::Sym(name) => Node::new(Kind::Sym, vec![Child::symbol(name)], range),

            ExprKind::Ident(name) => {
                if self.is_local(&name) {
                    Node::new(Kind::Lvar, vec![Child::symbol(name)], range)
                } else {
                    Node::new(Kind::Send, vec![Child::Absent, Child::symbol(name)], range)
                }
            }
            ExprKind::Ivar(name) => Node::new(Kind::Ivar, vec![Child::symbol(name)], range),
            ExprKind::Gvar(name) => Node::new(Kind::Gvar, vec![Child::symbol(name)], range),
            ExprKind::Const { scope, name } => {
                let scope = self.lower_opt(scope);
                Node::new(Kind::Const, vec![scope, Child::symbol(name)], range)
            }

            ExprKind::Array(items) => {
                let items = self.lower_all(items);
                Node::new(Kind::Array, items, range)
            }
            ExprKind::Hash(pairs) => {
                let pairs = self.lower_all(pairs);
                Node::new(Kind::Hash, pairs, range)
            }
            ExprKind::Pair(key, value) => {
                let key = self.lower(*key);
                let value = self.lower(*value);
                Node::new(Kind::Pair, vec![key.into(), value.into()], range)
            }
            ExprKind::Range {
                exclusive,
                from,
                to,
            } => {
                let kind = if exclusive { Kind::Erange } else { Kind::Irange };
                let from = self.lower(*from);
                let to = self.lower(*to);
                Node::new(kind, vec![from.into(), to.into()], range)
            }

            ExprKind::Call {
                receiver,
                method,
                args,
                ..
            } => {
                let mut children = vec![self.lower_opt(receiver), Child::symbol(method)];
                children.extend(self.lower_all(args));
                Node::new(Kind::Send, children, range)
            }
            ExprKind::Block { call, block } => self.lower_block(*call, block, range),
            ExprKind::Index { receiver, args } => {
                let mut children = vec![Child::from(self.lower(*receiver))];
                children.extend(self.lower_all(args));
                Node::new(Kind::Index, children, range)
            }
            ExprKind::Not(operand) => {
                let operand = self.lower(*operand);
                Node::new(Kind::Send, vec![operand.into(), Child::symbol("!")], range)
            }
            ExprKind::And(lhs, rhs) => {
                let lhs = self.lower(*lhs);
                let rhs = self.lower(*rhs);
                Node::new(Kind::And, vec![lhs.into(), rhs.into()], range)
            }
            ExprKind::Or(lhs, rhs) => {
                let lhs = self.lower(*lhs);
                let rhs = self.lower(*rhs);
                Node::new(Kind::Or, vec![lhs.into(), rhs.into()], range)
            }

            ExprKind::Assign { target, value } => self.lower_target(*target, Some(*value), range),
            ExprKind::OpAssign { target, op, value } => {
                let target_range = SourceRange::from(target.span.clone());
                let target = self.lower_target(*target, None, target_range);
                let value = self.lower(*value);
                let logical = match op.as_str() {
                    "||" => Some(Kind::OrAsgn),
                    "&&" => Some(Kind::AndAsgn),
                    _ => None,
                };
                match logical {
                    Some(kind) => Node::new(kind, vec![target.into(), value.into()], range),
                    None => Node::new(
                        Kind::OpAsgn,
                        vec![target.into(), Child::symbol(op), value.into()],
                        range,
                    ),
                }
            }

            ExprKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let cond = self.lower(*cond);
                let then_body = self.lower_opt(then_body);
                let else_body = self.lower_opt(else_body);
                Node::new(Kind::If, vec![cond.into(), then_body, else_body], range)
            }
            ExprKind::ModifierIf {
                cond,
                body,
                negated,
            } => {
                let body = Child::from(self.lower(*body));
                let cond = Child::from(self.lower(*cond));
                let children = if negated {
                    vec![cond, Child::Absent, body]
                } else {
                    vec![cond, body, Child::Absent]
                };
                Node::new(Kind::If, children, range)
            }
            ExprKind::While { cond, body, until } => {
                let cond = self.lower(*cond);
                let body = self.lower_opt(body);
                Node::new(loop_kind(until), vec![cond.into(), body], range)
            }
            ExprKind::ModifierWhile { cond, body, until } => {
                let body = self.lower(*body);
                let cond = self.lower(*cond);
                Node::new(loop_kind(until), vec![cond.into(), body.into()], range)
            }
            ExprKind::Case {
                subject,
                whens,
                else_body,
            } => {
                let mut children = vec![self.lower_opt(subject)];
                children.extend(self.lower_all(whens));
                children.push(self.lower_opt(else_body));
                Node::new(Kind::Case, children, range)
            }
            ExprKind::When { patterns, body } => {
                let mut children = self.lower_all(patterns);
                children.push(self.lower_opt(body));
                Node::new(Kind::When, children, range)
            }

            ExprKind::Def {
                singleton,
                name,
                params,
                body,
            } => {
                let singleton = singleton.map(|s| self.lower(*s));
                let (args, body) = self.scoped(false, |this| {
                    let args = this.lower_params(params);
                    (args, this.lower_opt(body))
                });
                match singleton {
                    Some(target) => Node::new(
                        Kind::Defs,
                        vec![target.into(), Child::symbol(name), args.into(), body],
                        range,
                    ),
                    None => Node::new(
                        Kind::Def,
                        vec![Child::symbol(name), args.into(), body],
                        range,
                    ),
                }
            }
            ExprKind::Class {
                path,
                superclass,
                body,
            } => {
                let path = self.lower(*path);
                let superclass = self.lower_opt(superclass);
                let body = self.scoped(false, |this| this.lower_opt(body));
                Node::new(Kind::Class, vec![path.into(), superclass, body], range)
            }
            ExprKind::Module { path, body } => {
                let path = self.lower(*path);
                let body = self.scoped(false, |this| this.lower_opt(body));
                Node::new(Kind::Module, vec![path.into(), body], range)
            }

            ExprKind::Return(value) => self.lower_jump(Kind::Return, value, range),
            ExprKind::Break(value) => self.lower_jump(Kind::Break, value, range),
            ExprKind::Next(value) => self.lower_jump(Kind::Next, value, range),
            ExprKind::Yield(args) => {
                let args = self.lower_all(args);
                Node::new(Kind::Yield, args, range)
            }
            ExprKind::Begin(statements) => {
                let statements = self.lower_all(statements);
                Node::new(Kind::Begin, statements, range)
            }
        }
    }

    /// Lower the left-hand side of an assignment; `value` is `None` inside `op_asgn`
    fn lower_target(&mut self, target: Expr, value: Option<Expr>, range: SourceRange) -> NodeRef {
        let span = target.span;
        let (kind, mut children) = match target.kind {
            ExprKind::Ident(name) => {
                self.declare(&name);
                (Kind::Lvasgn, vec![Child::symbol(name)])
            }
            ExprKind::Ivar(name) => (Kind::Ivasgn, vec![Child::symbol(name)]),
            ExprKind::Gvar(name) => (Kind::Gvasgn, vec![Child::symbol(name)]),
            ExprKind::Const { scope, name } => {
                (Kind::Casgn, vec![self.lower_opt(scope), Child::symbol(name)])
            }
            ExprKind::Index { receiver, args } => {
                let mut children = vec![Child::from(self.lower(*receiver))];
                children.extend(self.lower_all(args));
                (Kind::Indexasgn, children)
            }
            ExprKind::Call {
                receiver, method, ..
            } => {
                // `obj.name = v` calls `name=`; inside `obj.name += v` the reader is used
                let method = if value.is_some() {
                    format!("{}=", method)
                } else {
                    method
                };
                (Kind::Send, vec![self.lower_opt(receiver), Child::symbol(method)])
            }
            other => {
                let node = self.lower(Expr::new(other, span));
                (Kind::Begin, vec![node.into()])
            }
        };

        if let Some(value) = value {
            children.push(self.lower(value).into());
        }
        Node::new(kind, children, range)
    }

    fn lower_jump(&mut self, kind: Kind, value: Option<Box<Expr>>, range: SourceRange) -> NodeRef {
        let children = value.map(|v| Child::from(self.lower(*v))).into_iter().collect();
        Node::new(kind, children, range)
    }

    fn lower_block(&mut self, call: Expr, block: BlockExpr, range: SourceRange) -> NodeRef {
        let call = match call.kind {
            // `loop { }` is always a method call, even if `loop` is a local
            ExprKind::Ident(name) => Node::new(
                Kind::Send,
                vec![Child::Absent, Child::symbol(name)],
                SourceRange::from(call.span),
            ),
            other => self.lower(Expr::new(other, call.span)),
        };

        self.scoped(true, |this| {
            let args = this.lower_params(block.params);
            let body = this.lower_opt(block.body);
            Node::new(Kind::Block, vec![call.into(), args.into(), body], range)
        })
    }

    fn lower_params(&mut self, params: Params) -> NodeRef {
        let children: Vec<Child> = params
            .list
            .into_iter()
            .map(|param| Child::from(self.lower_param(param)))
            .collect();
        match params.span {
            Some(span) => Node::new(Kind::Args, children, SourceRange::from(span)),
            None => Node::synthetic(Kind::Args, children),
        }
    }

    fn lower_param(&mut self, param: Param) -> NodeRef {
        let range = SourceRange::from(param.span);
        let node = match param.kind {
            ParamKind::Required => Node::new(Kind::Arg, vec![Child::symbol(&param.name)], range),
            ParamKind::Optional(default) => {
                let default = self.lower(default);
                Node::new(
                    Kind::Optarg,
                    vec![Child::symbol(&param.name), default.into()],
                    range,
                )
            }
            ParamKind::Rest => Node::new(Kind::Restarg, vec![Child::symbol(&param.name)], range),
            ParamKind::Block => {
                Node::new(Kind::Blockarg, vec![Child::symbol(&param.name)], range)
            }
        };
        self.declare(&param.name);
        node
    }
}

fn loop_kind(until: bool) -> Kind {
    if until {
        Kind::Until
    } else {
        Kind::While
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::grammar::program;
    use chumsky::Parser;

    fn lower_source(source: &str) -> NodeRef {
        let tokens = lex(source).expect("source to lex");
        lower_program(program().parse(tokens).expect("source to parse"))
    }

    /// Node kinds in pre-order
    fn kinds(node: &NodeRef) -> Vec<Kind> {
        let mut kinds = vec![node.kind()];
        for (_, child) in node.child_nodes() {
            kinds.extend(self::kinds(child));
        }
        kinds
    }

    #[test]
    fn test_empty_program_is_synthetic_begin() {
        let root = lower_source("");
        assert_eq!(root.kind(), Kind::Begin);
        assert!(root.is_synthetic());
        assert!(root.children().is_empty());
    }

    #[test]
    fn test_unknown_identifier_is_a_call() {
        let root = lower_source("n");
        assert_eq!(root.kind(), Kind::Send);
        assert_eq!(root.child(0), Some(&Child::Absent));
    }

    #[test]
    fn test_assigned_identifier_is_a_local() {
        let root = lower_source("n = 1\nn");
        assert_eq!(kinds(&root), vec![Kind::Begin, Kind::Lvasgn, Kind::Int, Kind::Lvar]);
    }

    #[test]
    fn test_self_assignment_reads_the_new_local() {
        let root = lower_source("x = x");
        assert_eq!(kinds(&root), vec![Kind::Lvasgn, Kind::Lvar]);
    }

    #[test]
    fn test_parameters_are_locals_only_inside_the_method() {
        let root = lower_source("def fibo(n)\n  n\nend\nn");
        assert_eq!(
            kinds(&root),
            vec![Kind::Begin, Kind::Def, Kind::Args, Kind::Arg, Kind::Lvar, Kind::Send]
        );
    }

    #[test]
    fn test_blocks_see_enclosing_locals() {
        let root = lower_source("total = 0\nlist.each { |x| total += x }");
        let block = root.child_nodes().nth(1).map(|(_, node)| node.clone()).expect("block");
        assert_eq!(block.kind(), Kind::Block);
        assert_eq!(
            kinds(&block),
            vec![
                Kind::Block,
                Kind::Send,
                Kind::Send,
                Kind::Args,
                Kind::Arg,
                Kind::OpAsgn,
                Kind::Lvasgn,
                Kind::Lvar,
            ]
        );
    }

    #[test]
    fn test_modifier_body_declares_before_condition() {
        let root = lower_source("a = 1 if a");
        assert_eq!(kinds(&root), vec![Kind::If, Kind::Lvar, Kind::Lvasgn, Kind::Int]);
    }

    #[test]
    fn test_definition_without_parameter_list_has_rangeless_args() {
        let root = lower_source("def hello\nend");
        let args = root.child_nodes().next().map(|(_, node)| node.clone()).expect("args");
        assert_eq!(args.kind(), Kind::Args);
        assert!(args.is_synthetic());
    }
}
