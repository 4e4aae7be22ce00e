//! Counter correction for inlined regions.
//!
//! The profiler sampled the callee against its own source lines; after
//! inlining those statements sit inside the caller, still carrying their
//! origin positions. This pass walks the caller, and inside every region
//! delimited by an inline marker and its `.i` end label re-seeds counters
//! from the callee's profile, then re-propagates the caller.

use std::collections::HashMap;

use teplo_core::Counter;
use teplo_profile::Profile;
use teplo_ir::{
    is_inline_end_label, visit_list, Arena, Child, FuncId, Function, InlineTree, NodeCounters,
    NodeId, NodeKind, PosTable, Unit,
};

use crate::counters::propagate_counters;
use crate::index::SampleIndex;
use crate::trace::Trace;

/// Seed tables for one inlined callee.
struct CalleeTables {
    /// Line to propagated counter of the locally compiled callee. Preferred:
    /// it already went through both propagation passes.
    propagated: HashMap<u32, Counter>,
    /// Line to raw cumulative counter from the callee's sample buckets.
    raw: HashMap<u32, Counter>,
    /// Entry estimate used when the marker itself was never sampled.
    entry: Counter,
}

/// Re-seed counters inside `func`'s inlined regions and re-propagate.
pub fn correct_profile_after_inline(
    index: &SampleIndex,
    profile: &Profile,
    unit: &mut Unit,
    func: FuncId,
) {
    // Resolve every marker's callee up front so the mutating walk below
    // only touches the caller's own table.
    let tables = collect_callee_tables(index, profile, unit, func);

    let (arena, positions, inline_tree, funcs) = unit.parts_mut();
    let caller = &mut funcs[func.as_u32() as usize];
    let trace = Trace::for_func(&caller.link_name);
    {
        let Function { body, counters, .. } = caller;
        let mut walk = Walk {
            arena,
            positions,
            inline_tree,
            tables: &tables,
            counters,
            trace: &trace,
            stack: Vec::new(),
            cur: None,
        };
        walk.list(body.as_slice());
    }

    propagate_counters(arena, caller);
}

fn collect_callee_tables(
    index: &SampleIndex,
    profile: &Profile,
    unit: &Unit,
    func: FuncId,
) -> HashMap<String, CalleeTables> {
    let mut marks = Vec::new();
    visit_list(&unit.arena, &unit.func(func).body, &mut |n| {
        if let NodeKind::InlineMark { index } = unit.arena.kind(n) {
            marks.push(*index);
        }
    });

    let mut tables = HashMap::new();
    for mark in marks {
        let Some(name) = unit.inline_tree.inlined_function(mark) else {
            // Dangling marker; the walk will skip its region too.
            continue;
        };
        if tables.contains_key(name) {
            continue;
        }
        let (propagated, entry) = match unit.by_link_name(name) {
            Some(callee) if callee != func => {
                let callee = unit.func(callee);
                (
                    callee.counters_by_line(&unit.arena, &unit.positions),
                    callee.entry_counter(),
                )
            }
            _ => (HashMap::new(), 0),
        };
        tables.insert(
            name.to_string(),
            CalleeTables {
                propagated,
                raw: index.line_counters(name, profile),
                entry,
            },
        );
    }
    tables
}

/// Active inlined region: the callee's seed tables and the counter observed
/// at its marker.
#[derive(Clone, Copy)]
struct Region<'t> {
    tables: &'t CalleeTables,
    count: Counter,
}

struct Walk<'a> {
    arena: &'a Arena,
    positions: &'a PosTable,
    inline_tree: &'a InlineTree,
    tables: &'a HashMap<String, CalleeTables>,
    counters: &'a mut NodeCounters,
    trace: &'a Trace,
    /// Saved regions of enclosing markers; nested inlining pushes here.
    stack: Vec<Option<Region<'a>>>,
    cur: Option<Region<'a>>,
}

impl Walk<'_> {
    fn list(&mut self, nodes: &[NodeId]) {
        for &n in nodes {
            match self.arena.kind(n) {
                NodeKind::InlineMark { index } => self.enter(n, *index),
                NodeKind::Label { name } if is_inline_end_label(name) && self.cur.is_some() => {
                    self.cur = self.stack.pop().flatten();
                }
                _ => self.node(n),
            }
        }
    }

    fn enter(&mut self, marker: NodeId, index: u32) {
        let tables_by_name = self.tables;
        let tables = self
            .inline_tree
            .inlined_function(index)
            .and_then(|name| tables_by_name.get(name));
        let Some(tables) = tables else {
            // Dangling marker: keep seeding from the surrounding region.
            // Its end label still pops, so push a balancing frame that
            // restores the very same region.
            self.stack.push(self.cur);
            return;
        };

        let mut count = self.counters.get(marker);
        if count == 0 {
            count = tables.entry;
        }
        self.counters.set(marker, count);

        let prev = self.cur.take();
        self.stack.push(prev);
        self.cur = Some(Region { tables, count });
    }

    fn node(&mut self, n: NodeId) {
        self.seed(n);
        for child in self.arena.kind(n).children() {
            match child {
                Child::Node(child_node) => self.node(child_node),
                Child::List(list) => self.list(list),
            }
        }
    }

    fn seed(&mut self, n: NodeId) {
        let Some(region) = &self.cur else {
            return;
        };
        if region.count == 0 || self.arena.kind(n).is_shareable_leaf() {
            return;
        }
        let line = self.positions.innermost_line(self.arena.pos(n));
        let seeded = region
            .tables
            .propagated
            .get(&line)
            .or_else(|| region.tables.raw.get(&line));
        if let Some(&counter) = seeded {
            self.trace
                .rewrite("inline_fix", self.arena.op(n), line, self.counters.get(n), counter);
            self.counters.set(n, counter);
        }
    }
}
