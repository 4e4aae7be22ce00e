//! Initial counter loading and the propagation driver.

use std::collections::HashSet;

use teplo_profile::Profile;
use teplo_ir::{visit_list, Arena, FuncId, Function, PosTable, Unit};

use crate::index::SampleIndex;
use crate::trace::Trace;
use crate::{backprop, forward};

/// Seed and propagate counters for every function in the unit.
///
/// Builds the sample index (resetting all node-profile tables), then runs
/// the loader and both propagation passes per function. The returned index
/// stays valid through inlining; `correct_profile_after_inline` re-reads it.
pub fn load_counters(profile: &Profile, unit: &mut Unit) -> SampleIndex {
    let index = SampleIndex::build(profile, unit);
    for id in unit.func_ids() {
        let (arena, positions, _, funcs) = unit.parts_mut();
        let func = &mut funcs[id.as_u32() as usize];
        let trace = Trace::for_func(&func.link_name);
        let source = func.link_name.clone();
        seed_func(&index, profile, arena, positions, func, &source, &trace);
        propagate_counters(arena, func);
    }
    index
}

/// Re-seed one function from `callee`'s sample buckets and re-propagate.
///
/// With `callee == func` this simply reloads the function; with a different
/// callee it replays the callee's profile onto the caller's nodes, which is
/// how the inline corrector seeds freshly spliced bodies.
pub fn set_counters_for_func(
    index: &SampleIndex,
    profile: &Profile,
    unit: &mut Unit,
    func: FuncId,
    callee: FuncId,
) {
    let source = unit.func(callee).link_name.clone();
    let (arena, positions, _, funcs) = unit.parts_mut();
    let target = &mut funcs[func.as_u32() as usize];
    let trace = Trace::for_func(&target.link_name);
    seed_func(index, profile, arena, positions, target, &source, &trace);
    propagate_counters(arena, target);
}

/// Run back-propagation then forward-propagation on one function.
///
/// Idempotent: a second run over an unchanged table is a fixpoint.
pub fn propagate_counters(arena: &Arena, func: &mut Function) {
    let trace = Trace::for_func(&func.link_name);
    let Function { body, counters, .. } = func;

    let mut watched = HashSet::new();
    backprop::node_list(arena, counters, body.as_slice(), &mut watched, &trace);
    let mut watched = HashSet::new();
    forward::node_list(arena, counters, body.as_slice(), &mut watched, &trace);
}

/// Write sample values onto `target`'s nodes from the buckets recorded for
/// `source_name`.
fn seed_func(
    index: &SampleIndex,
    profile: &Profile,
    arena: &Arena,
    positions: &PosTable,
    target: &mut Function,
    source_name: &str,
    trace: &Trace,
) {
    let Some(record) = index.get(source_name) else {
        // Function not in the profile: the table stays all-zero and
        // propagation is a no-op.
        return;
    };

    let Function { body, counters, .. } = target;
    visit_list(arena, body.as_slice(), &mut |n| {
        let line = positions.innermost_line(arena.pos(n));
        let Some(bucket) = record.lines.get(&line) else {
            return;
        };
        if arena.kind(n).is_shareable_leaf() {
            return;
        }
        let Some(&first) = bucket.first() else {
            return;
        };
        // Cumulative value: the flat one can be zero for non-leaf statements.
        let value = profile.samples[first].cumulative();
        trace.seed(arena.op(n), line, value);
        counters.set(n, value);
    });
}
