//! Statement-level IR for the Teplo PGO pipeline.
//!
//! The AST proper is built by the front end; this crate carries the slice of
//! it the annotation passes need:
//! - `pos` - source positions and the `//line`-directive projection
//! - `node` - arena-allocated tagged nodes with a generic child walk
//! - `func` - functions, the compilation unit, the inline tree, and the
//!   per-function node-profile tables (counters live here, never on nodes)
//! - `dump` - counter-annotated rendering for debugging and snapshots
//! - `check` - post-propagation integrity checks

pub mod check;
mod dump;
mod func;
mod node;
mod pos;

#[cfg(test)]
mod dump_tests;
#[cfg(test)]
mod node_tests;

pub use dump::dump_func;
pub use func::{FuncId, Function, InlineTree, NodeCounters, Unit};
pub use node::{visit, visit_list, Arena, BinOp, Child, Node, NodeId, NodeKind, NodeList, Op, UnOp};
pub use pos::{FileId, Pos, PosTable};

/// Inlined regions end at a synthetic label whose name carries this prefix.
pub const INLINE_LABEL_PREFIX: &str = ".i";

/// True for the synthetic label closing an inlined region.
pub fn is_inline_end_label(name: &str) -> bool {
    name.starts_with(INLINE_LABEL_PREFIX)
}
