//! Profile-guided counter annotation for the Teplo AST.
//!
//! The pipeline, in order:
//! - `index` - bucket profile samples per function and binary-visible line
//! - `counters` - seed statement counters from cumulative sample values
//! - `backprop` - lift counters bottom-up, tracking may-return subtrees
//! - `forward` - push counters top-down until the table is consistent
//! - `inline` - re-seed inlined regions from their callee's profile
//!
//! Counters live in each function's node-profile table (`teplo_ir`), never
//! on nodes; every pass guards recursion with a watched set keyed by node
//! identity, so shared subterms are processed once.

mod backprop;
mod counters;
mod forward;
mod index;
mod inline;
mod trace;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod inline_tests;

pub use counters::{load_counters, propagate_counters, set_counters_for_func};
pub use index::{FuncSamples, SampleIndex};
pub use inline::correct_profile_after_inline;
