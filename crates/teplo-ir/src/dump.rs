//! Counter-annotated function rendering.
//!
//! One line per node: counter, op tag, source line, indented by depth.
//! Shareable leaves print a dot instead of a counter since they never carry
//! one. The format is stable; snapshot tests and `TEPLO_DEBUG_FUNC` dumps
//! rely on it.

use std::fmt::Write as _;

use crate::func::Function;
use crate::node::{Arena, Child, NodeId, NodeKind};

/// Render `func` with its current counters.
pub fn dump_func(arena: &Arena, func: &Function) -> String {
    let mut out = format!("func {} line {}\n", func.link_name, func.start_line);
    for &id in &func.body {
        dump_node(arena, func, id, 1, &mut out);
    }
    out
}

fn dump_node(arena: &Arena, func: &Function, id: NodeId, depth: usize, out: &mut String) {
    let node = arena.node(id);
    let indent = "  ".repeat(depth);
    if node.kind.is_shareable_leaf() {
        let detail = match &node.kind {
            NodeKind::Name { ident } => ident.as_str(),
            NodeKind::Lit { repr } => repr.as_str(),
            _ => unreachable!(),
        };
        let _ = writeln!(out, "{indent}. {} {}", node.kind.op().name(), detail);
        return;
    }

    let _ = writeln!(
        out,
        "{indent}{} {}:{}",
        func.counters.get(id),
        node.kind.op().name(),
        node.pos.line
    );

    for child in node.kind.children() {
        match child {
            Child::Node(n) => dump_node(arena, func, n, depth + 1, out),
            Child::List(list) => {
                for &n in list {
                    dump_node(arena, func, n, depth + 1, out);
                }
            }
        }
    }
}
