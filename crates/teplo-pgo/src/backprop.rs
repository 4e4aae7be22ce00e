//! Bottom-up counter propagation.
//!
//! Sampling is sparse, so after seeding only some lines of a subtree carry
//! counters. This pass lifts the maximum counter up every subtree so each
//! composite node observes at least the hottest thing inside it, and detects
//! which subtrees may transfer control out of their statement list via
//! return. Kept symmetric with the `forward` pass.

use std::collections::HashSet;

use teplo_core::Counter;
use teplo_ir::{Arena, Child, NodeCounters, NodeId, NodeKind};

use crate::trace::Trace;

/// Back-propagate over a statement list.
///
/// Returns the maximum counter seen in the list and whether any member may
/// return. Within the list a running plateau tracks the hottest counter of
/// the current no-return run; once a member may return, the whole run up to
/// it is pinned to that plateau and the plateau restarts at zero, since
/// statements after a returning subtree cannot execute more often than the
/// subtree itself.
pub(crate) fn node_list(
    arena: &Arena,
    counters: &mut NodeCounters,
    nodes: &[NodeId],
    watched: &mut HashSet<NodeId>,
    trace: &Trace,
) -> (Counter, bool) {
    let mut max_count: Counter = 0;
    let mut count: Counter = 0;
    let mut may_return = false;

    let mut range_start = 0;
    for (cur, &n) in nodes.iter().enumerate() {
        let (c, returns) = node(arena, counters, n, watched, trace);
        count = count.max(c);
        max_count = max_count.max(c);

        if returns {
            set_range(arena, counters, &nodes[range_start..=cur], count, trace);
            range_start = cur + 1;
            count = 0;
            may_return = true;
        }
    }
    set_range(arena, counters, &nodes[range_start..], count, trace);

    (max_count, may_return)
}

fn set_range(
    arena: &Arena,
    counters: &mut NodeCounters,
    nodes: &[NodeId],
    c: Counter,
    trace: &Trace,
) {
    for &n in nodes {
        let kind = arena.kind(n);
        // Leaves never take counters; loop nodes keep their 0/1 clamp.
        if kind.is_shareable_leaf()
            || matches!(kind, NodeKind::For { .. } | NodeKind::Range { .. })
        {
            continue;
        }
        trace.rewrite(
            "back_prop (list)",
            arena.op(n),
            arena.pos(n).line,
            counters.get(n),
            c,
        );
        counters.set(n, c);
    }
}

/// Back-propagate one node; returns its counter and whether the subtree may
/// return.
pub(crate) fn node(
    arena: &Arena,
    counters: &mut NodeCounters,
    n: NodeId,
    watched: &mut HashSet<NodeId>,
    trace: &Trace,
) -> (Counter, bool) {
    if !watched.insert(n) {
        return (counters.get(n), false);
    }

    let mut count: Counter = 0;
    let mut may_return = false;
    // The loop kinds are synthetic join points; their counter is the 0/1
    // clamp below, never the stored sample of their header line.
    let mut clamp_loop = false;

    match arena.kind(n) {
        NodeKind::If { cond, body, else_ } => {
            let (cond_count, cond_returns) = node(arena, counters, *cond, watched, trace);
            let (body_count, body_returns) = node_list(arena, counters, body, watched, trace);
            let (else_count, else_returns) = node_list(arena, counters, else_, watched, trace);

            // Each branch head saw every execution of its side, so the
            // condition ran at least their sum.
            count = cond_count.max(body_count + else_count);
            may_return = cond_returns || body_returns || else_returns;
        }
        NodeKind::For {
            cond, body, post, ..
        } => {
            let (body_count, _) = node_list(arena, counters, body, watched, trace);
            let (cond_count, cond_returns) = opt_node(arena, counters, *cond, watched, trace);
            let (post_count, post_returns) = opt_node(arena, counters, *post, watched, trace);

            // The loop node is an acyclic point; the body's counter carries
            // the trip count. A return inside the body leaves through the
            // loop's own exit edge, so it does not escape the statement list.
            count = Counter::from(body_count != 0 || cond_count != 0 || post_count != 0);
            clamp_loop = true;
            may_return = cond_returns || post_returns;
        }
        NodeKind::Range {
            key,
            value,
            expr,
            body,
        } => {
            let (expr_count, expr_returns) = node(arena, counters, *expr, watched, trace);
            let (key_count, key_returns) = opt_node(arena, counters, *key, watched, trace);
            let (value_count, value_returns) = opt_node(arena, counters, *value, watched, trace);
            let (body_count, _) = node_list(arena, counters, body, watched, trace);

            // Same acyclic-point rule as `For`.
            count = Counter::from(
                expr_count != 0 || key_count != 0 || value_count != 0 || body_count != 0,
            );
            clamp_loop = true;
            may_return = expr_returns || key_returns || value_returns;
        }
        NodeKind::Return { results } => {
            let (results_count, _) = node_list(arena, counters, results, watched, trace);
            count = results_count;
            may_return = true;
        }
        kind if kind.is_shareable_leaf() => {}
        kind => {
            for child in kind.children() {
                let (child_count, child_returns) = match child {
                    Child::Node(c) => node(arena, counters, c, watched, trace),
                    Child::List(list) => node_list(arena, counters, list, watched, trace),
                };
                count = count.max(child_count);
                may_return = may_return || child_returns;
            }
        }
    }

    if !clamp_loop {
        count = count.max(counters.get(n));
    }
    if !arena.kind(n).is_shareable_leaf() {
        trace.rewrite(
            "back_prop",
            arena.op(n),
            arena.pos(n).line,
            counters.get(n),
            count,
        );
        counters.set(n, count);
    }

    (count, may_return)
}

fn opt_node(
    arena: &Arena,
    counters: &mut NodeCounters,
    n: Option<NodeId>,
    watched: &mut HashSet<NodeId>,
    trace: &Trace,
) -> (Counter, bool) {
    match n {
        Some(n) => node(arena, counters, n, watched, trace),
        None => (0, false),
    }
}
