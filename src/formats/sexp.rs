//! S-expression dump of a syntax tree
//!
//! Nested nodes start on a new line indented two spaces deeper; scalars and absent
//! slots stay on the parent's line:
//!
//! ```text
//! (send nil :puts
//!   (send nil :fibo
//!     (int 10)))
//! ```

use crate::ast::{Child, Node};
use std::fmt::Write;

/// Renders trees at a configurable base indentation
#[derive(Debug, Clone, Copy, Default)]
pub struct SexpFormatter {
    pub base_indent: usize,
}

impl SexpFormatter {
    pub fn format(&self, root: &Node) -> String {
        let mut out = String::new();
        write_node(&mut out, root, self.base_indent);
        out
    }
}

pub fn to_sexp(root: &Node) -> String {
    SexpFormatter::default().format(root)
}

fn write_node(out: &mut String, node: &Node, indent: usize) {
    out.push('(');
    out.push_str(node.kind().as_str());
    for child in node.children() {
        match child {
            Child::Node(nested) => {
                out.push('\n');
                out.push_str(&" ".repeat(indent + 2));
                write_node(out, nested, indent + 2);
            }
            // Writing into a String cannot fail
            Child::Scalar(scalar) => {
                let _ = write!(out, " {}", scalar);
            }
            Child::Absent => out.push_str(" nil"),
        }
    }
    out.push(')');
}
