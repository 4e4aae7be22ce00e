//! Top-down counter propagation.
//!
//! After the bottom-up pass every node knows the hottest thing inside it;
//! this pass pushes counters downwards so no child appears hotter than its
//! parent context allows. Kept symmetric with the `backprop` pass.

use std::collections::HashSet;

use teplo_core::Counter;
use teplo_ir::{Arena, Child, NodeCounters, NodeId, NodeKind};

use crate::trace::Trace;

/// Forward-propagate over a statement list; each member starts from its own
/// stored counter.
pub(crate) fn node_list(
    arena: &Arena,
    counters: &mut NodeCounters,
    nodes: &[NodeId],
    watched: &mut HashSet<NodeId>,
    trace: &Trace,
) {
    for &n in nodes {
        let c = counters.get(n);
        node(arena, counters, n, c, watched, trace);
    }
}

/// Forward-propagate one node with the target counter `c` supplied by its
/// context.
pub(crate) fn node(
    arena: &Arena,
    counters: &mut NodeCounters,
    n: NodeId,
    mut c: Counter,
    watched: &mut HashSet<NodeId>,
    trace: &Trace,
) {
    if !watched.insert(n) {
        return;
    }

    if !arena.kind(n).is_shareable_leaf() {
        trace.rewrite(
            "forward_prop",
            arena.op(n),
            arena.pos(n).line,
            counters.get(n),
            c,
        );
        counters.set(n, c);
    }

    match arena.kind(n) {
        NodeKind::If { cond, body, else_ } => {
            // The branch heads carry the maximal counters of their sides.
            let body_count = body.first().map(|&b| counters.get(b)).unwrap_or(0);
            let else_count = else_.first().map(|&e| counters.get(e)).unwrap_or(0);
            let cond_count = counters.get(*cond);

            if body_count + else_count > c {
                // A branch outran the condition's own samples; the condition
                // executed at least as often as both sides together.
                c = body_count + else_count;
                if cond_count > c {
                    // Impossible after back-propagation.
                    c = cond_count;
                }
            }

            if let Some(&head) = body.first() {
                if !arena.kind(head).is_shareable_leaf() {
                    counters.set(head, body_count);
                }
                node_list(arena, counters, body, watched, trace);
            }
            if let Some(&head) = else_.first() {
                if !arena.kind(head).is_shareable_leaf() {
                    counters.set(head, else_count);
                }
                node_list(arena, counters, else_, watched, trace);
            }
            node(arena, counters, *cond, c, watched, trace);
        }
        NodeKind::For {
            cond, body, post, ..
        } => {
            let (cond, post) = (*cond, *post);
            let body_count = body.first().map(|&b| counters.get(b)).unwrap_or(c);
            let cond_count = cond.map(|id| counters.get(id)).unwrap_or(0);
            let post_count = post.map(|id| counters.get(id)).unwrap_or(0);

            // The trip count rules the loop machinery.
            let c = body_count.max(cond_count).max(post_count);
            node_list(arena, counters, body, watched, trace);
            if let Some(cond) = cond {
                node(arena, counters, cond, c, watched, trace);
            }
            if let Some(post) = post {
                node(arena, counters, post, c, watched, trace);
            }
        }
        kind if kind.is_shareable_leaf() => {}
        kind => {
            for child in kind.children() {
                match child {
                    Child::Node(child_node) => {
                        node(arena, counters, child_node, c, watched, trace);
                    }
                    Child::List(list) => node_list(arena, counters, list, watched, trace),
                }
            }
        }
    }
}
