//! Functions, the compilation unit and the inline tree.

use std::collections::HashMap;

use teplo_core::Counter;

use crate::node::{visit_list, Arena, NodeId, NodeList};
use crate::pos::PosTable;

/// Handle of a function within its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncId(u32);

impl FuncId {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
}

/// Per-function counter store, keyed by node identity.
///
/// This is the canonical home of counters; nodes themselves never hold one.
/// Reading an unset node yields zero, matching the "zero is a valid
/// observation" convention.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeCounters {
    counts: HashMap<NodeId, Counter>,
}

impl NodeCounters {
    pub fn get(&self, id: NodeId) -> Counter {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    /// The stored counter, distinguishing "never set" from "set to zero".
    pub fn lookup(&self, id: NodeId) -> Option<Counter> {
        self.counts.get(&id).copied()
    }

    pub fn set(&mut self, id: NodeId, counter: Counter) {
        self.counts.insert(id, counter);
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// One compiled function.
#[derive(Debug, Clone)]
pub struct Function {
    /// Link-time system name; the profile's function names match this.
    pub link_name: String,
    pub body: NodeList,
    pub start_line: u32,
    /// Node-profile table for this function.
    pub counters: NodeCounters,
}

impl Function {
    pub fn new(link_name: impl Into<String>, body: NodeList, start_line: u32) -> Self {
        Self {
            link_name: link_name.into(),
            body,
            start_line,
            counters: NodeCounters::default(),
        }
    }

    /// Project the node profile onto binary-visible source lines, keeping
    /// the maximum counter seen per line.
    ///
    /// Inlined copies and lowered SSA values match against their origin
    /// lines through this table.
    pub fn counters_by_line(&self, arena: &Arena, positions: &PosTable) -> HashMap<u32, Counter> {
        let mut by_line = HashMap::new();
        visit_list(arena, &self.body, &mut |id| {
            let Some(counter) = self.counters.lookup(id) else {
                return;
            };
            let line = positions.innermost_line(arena.pos(id));
            let slot = by_line.entry(line).or_insert(counter);
            if counter > *slot {
                *slot = counter;
            }
        });
        by_line
    }

    /// Counter of the function's first body statement; the entry estimate
    /// used when an inline marker carries no sample of its own.
    pub fn entry_counter(&self) -> Counter {
        self.body.first().map(|&n| self.counters.get(n)).unwrap_or(0)
    }
}

/// Maps inline-marker indices to callee symbolic names. Read-only during
/// annotation.
#[derive(Debug, Clone, Default)]
pub struct InlineTree {
    callees: Vec<String>,
}

impl InlineTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callee, returning the index markers will carry.
    pub fn push(&mut self, callee: impl Into<String>) -> u32 {
        self.callees.push(callee.into());
        (self.callees.len() - 1) as u32
    }

    /// The callee's symbolic name, or `None` for a dangling index.
    pub fn inlined_function(&self, index: u32) -> Option<&str> {
        self.callees.get(index as usize).map(|s| s.as_str())
    }
}

/// The compilation unit the annotation passes operate on: one arena, the
/// functions compiled from it, directive-aware positions and the inline
/// tree.
#[derive(Debug, Clone, Default)]
pub struct Unit {
    pub arena: Arena,
    pub funcs: Vec<Function>,
    pub positions: PosTable,
    pub inline_tree: InlineTree,
}

impl Unit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_func(&mut self, func: Function) -> FuncId {
        let id = FuncId(self.funcs.len() as u32);
        self.funcs.push(func);
        id
    }

    pub fn func(&self, id: FuncId) -> &Function {
        &self.funcs[id.0 as usize]
    }

    pub fn func_mut(&mut self, id: FuncId) -> &mut Function {
        &mut self.funcs[id.0 as usize]
    }

    /// Bottom-up enumeration order of the unit's functions.
    pub fn func_ids(&self) -> impl Iterator<Item = FuncId> + use<> {
        (0..self.funcs.len() as u32).map(FuncId)
    }

    pub fn by_link_name(&self, link_name: &str) -> Option<FuncId> {
        self.funcs
            .iter()
            .position(|f| f.link_name == link_name)
            .map(|i| FuncId(i as u32))
    }

    /// Split borrow for the mutating passes: the arena, positions and inline
    /// tree stay shared while one function's table is rewritten.
    pub fn parts_mut(&mut self) -> (&Arena, &PosTable, &InlineTree, &mut [Function]) {
        (&self.arena, &self.positions, &self.inline_tree, &mut self.funcs)
    }
}
