//! The closed set of syntax constructs a tree node can represent
//!
//! Names follow the canonical Ruby AST vocabulary (`send`, `lvar`, `op_asgn`, ...), so
//! dumped trees read the same as those produced by Ruby tooling.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    // Statement sequences and definitions
    Begin,
    Def,
    Defs,
    Args,
    Arg,
    Optarg,
    Restarg,
    Blockarg,
    Class,
    Module,

    // Control flow
    If,
    While,
    Until,
    Case,
    When,
    And,
    Or,
    Return,
    Break,
    Next,
    Yield,

    // Calls
    Send,
    Block,
    Index,

    // Variables and assignment
    Lvar,
    Ivar,
    Gvar,
    Const,
    Lvasgn,
    Ivasgn,
    Gvasgn,
    Casgn,
    Indexasgn,
    OpAsgn,
    OrAsgn,
    AndAsgn,

    // Literals
    Int,
    Float,
    Str,
    Sym,
    Nil,
    True,
    False,
    #[serde(rename = "self")]
    SelfRef,
    Array,
    Hash,
    Pair,
    Irange,
    Erange,
}

impl Kind {
    /// Returns the AST type name used in s-expression dumps
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Begin => "begin",
            Kind::Def => "def",
            Kind::Defs => "defs",
            Kind::Args => "args",
            Kind::Arg => "arg",
            Kind::Optarg => "optarg",
            Kind::Restarg => "restarg",
            Kind::Blockarg => "blockarg",
            Kind::Class => "class",
            Kind::Module => "module",
            Kind::If => "if",
            Kind::While => "while",
            Kind::Until => "until",
            Kind::Case => "case",
            Kind::When => "when",
            Kind::And => "and",
            Kind::Or => "or",
            Kind::Return => "return",
            Kind::Break => "break",
            Kind::Next => "next",
            Kind::Yield => "yield",
            Kind::Send => "send",
            Kind::Block => "block",
            Kind::Index => "index",
            Kind::Lvar => "lvar",
            Kind::Ivar => "ivar",
            Kind::Gvar => "gvar",
            Kind::Const => "const",
            Kind::Lvasgn => "lvasgn",
            Kind::Ivasgn => "ivasgn",
            Kind::Gvasgn => "gvasgn",
            Kind::Casgn => "casgn",
            Kind::Indexasgn => "indexasgn",
            Kind::OpAsgn => "op_asgn",
            Kind::OrAsgn => "or_asgn",
            Kind::AndAsgn => "and_asgn",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Str => "str",
            Kind::Sym => "sym",
            Kind::Nil => "nil",
            Kind::True => "true",
            Kind::False => "false",
            Kind::SelfRef => "self",
            Kind::Array => "array",
            Kind::Hash => "hash",
            Kind::Pair => "pair",
            Kind::Irange => "irange",
            Kind::Erange => "erange",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
