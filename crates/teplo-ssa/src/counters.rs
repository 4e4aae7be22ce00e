//! Transfer of AST node counters onto CFG blocks.

use teplo_core::Counter;
use teplo_ir::{Arena, Function, PosTable};

use crate::func::{SsaFunc, ValueKind};

/// Runtime helpers whose presence marks a block as a cold trap or
/// instrumentation path. Anything else is a normal call.
const PANIC_HELPERS: &[&str] = &[
    "rt.race_enter",
    "rt.race_exit",
    "rt.panic_divide",
    "rt.panic_wrap",
    "rt.panic_shift",
];

pub fn is_panic_helper(callee: &str) -> bool {
    PANIC_HELPERS.contains(&callee)
}

/// Derive each block's counter from the values it contains.
///
/// A block's counter is the maximum node counter found at its values' source
/// lines, except that trap blocks (out-of-bounds panics, calls into the
/// panic/race helpers) are pinned to zero: they share lines with hot code
/// but never run.
pub fn set_block_counters(
    arena: &Arena,
    positions: &PosTable,
    ir_func: &Function,
    f: &mut SsaFunc,
) {
    let by_line = ir_func.counters_by_line(arena, positions);

    for block in &mut f.blocks {
        let mut counter: Counter = 0;
        let mut cold = false;
        for value in &block.values {
            match &value.kind {
                ValueKind::PanicBounds => cold = true,
                ValueKind::StaticCall { callee } | ValueKind::StaticLeCall { callee } => {
                    if is_panic_helper(callee) {
                        cold = true;
                    }
                }
                ValueKind::Phi | ValueKind::Plain => {}
            }
            let line = positions.innermost_line(value.pos);
            if let Some(&c) = by_line.get(&line) {
                counter = counter.max(c);
            }
        }
        block.counter = if cold { 0 } else { counter };
    }
}
