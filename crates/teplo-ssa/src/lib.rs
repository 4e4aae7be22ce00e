//! CFG-side half of the PGO pipeline.
//!
//! - `func` - the block/value model produced by lowering
//! - `counters` - transfer of AST node counters onto blocks
//! - `layout` - profile-guided block reordering (exact for small functions,
//!   ExtTSP otherwise)

mod counters;
mod func;
pub mod layout;

#[cfg(test)]
mod counters_tests;

pub use counters::{is_panic_helper, set_block_counters};
pub use func::{Block, BlockId, SsaFunc, Value, ValueKind};
