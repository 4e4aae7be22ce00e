//! Feature toggles and layout tunables.

use crate::DEBUG_FUNC_ENV;

/// Toggles for block-level PGO. Both default to off; the driver flips them
/// from its command line.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    /// Load profile counters onto AST nodes and propagate them.
    pub pgo_blocks: bool,
    /// Reorder CFG blocks with the ExtTSP objective.
    pub exttsp: bool,
    /// Substring of a function link name selecting functions for verbose
    /// tracing. Mirrors the `TEPLO_DEBUG_FUNC` environment variable.
    pub debug_func: Option<String>,
}

impl Flags {
    /// Flags with both PGO stages enabled and the debug selector taken
    /// from the environment.
    pub fn enabled() -> Self {
        Self {
            pgo_blocks: true,
            exttsp: true,
            debug_func: std::env::var(DEBUG_FUNC_ENV).ok().filter(|s| !s.is_empty()),
        }
    }

    /// True when verbose tracing is requested for `link_name`.
    pub fn traces(&self, link_name: &str) -> bool {
        self.debug_func
            .as_deref()
            .is_some_and(|pat| link_name.contains(pat))
    }
}

/// Tunables for the ExtTSP block layout.
///
/// The defaults are the shipping configuration; tests occasionally shrink
/// the distances to exercise the scoring bands.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Bytes within which a forward jump is still "near".
    pub forward_distance: u64,
    /// Bytes within which a backward jump is still "near".
    pub backward_distance: u64,
    /// Multiplier for near-forward jumps.
    pub forward_weight: f64,
    /// Multiplier for near-backward jumps.
    pub backward_weight: f64,
    /// Maximum chain length still considered for X1-Y-X2 splits.
    pub chain_split_threshold: usize,
    /// Use the exact Hamiltonian-path layout when the block count is at
    /// most this.
    pub tsp_threshold: usize,
    /// Execution-count threshold separating hot chains from cold ones.
    pub cold_threshold: u64,
    /// Comparison epsilon for merge gains.
    pub eps: f64,
    /// Verbosity of the layout passes; levels above 2 dump chain state.
    pub debug: u8,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            forward_distance: 1024,
            backward_distance: 640,
            forward_weight: 0.1,
            backward_weight: 0.1,
            chain_split_threshold: 128,
            tsp_threshold: 10,
            cold_threshold: 10,
            eps: 1e-8,
            debug: 0,
        }
    }
}
