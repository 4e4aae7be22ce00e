//! Profile-guided block layout.
//!
//! The driver keeps the lowering order when ExtTSP is disabled, runs the
//! exact Hamiltonian-path layout for small functions, and the chain-merging
//! ExtTSP heuristic for the rest. Either way the entry block stays at
//! index 0.

mod exttsp;
mod tsp;


use teplo_core::{Flags, LayoutConfig};

use crate::func::{Block, SsaFunc};

/// Reorder `f`'s blocks for locality.
pub fn layout(f: &mut SsaFunc, flags: &Flags, config: &LayoutConfig) {
    if !flags.exttsp || f.blocks.is_empty() {
        return;
    }

    normalize_entry(f);
    let order = if f.blocks.len() <= config.tsp_threshold {
        tsp::layout_exact(f)
    } else {
        exttsp::layout(f, config)
    };
    apply_order(f, &order);
}

/// The lowering queue occasionally leaves the entry block away from
/// index 0; swap it back before laying out.
fn normalize_entry(f: &mut SsaFunc) {
    if let Some(idx) = f.position_of(f.entry)
        && idx != 0
    {
        f.blocks.swap(0, idx);
    }
}

/// Permute `f.blocks` into `order` (positional indices).
fn apply_order(f: &mut SsaFunc, order: &[usize]) {
    debug_assert_eq!(order.len(), f.blocks.len());
    let mut taken: Vec<Option<Block>> = f.blocks.drain(..).map(Some).collect();
    f.blocks = order
        .iter()
        .map(|&i| taken[i].take().expect("layout order repeats a block"))
        .collect();
}
