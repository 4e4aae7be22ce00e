//! Shared types and configuration for the Teplo profile-guided
//! basic-block pipeline.
//!
//! Everything downstream of the profile reader speaks in terms of these
//! types: `Counter` for execution-count estimates, `Flags` for the PGO
//! feature toggles, and `LayoutConfig` for the ExtTSP tunables.

mod config;

pub use config::{Flags, LayoutConfig};

/// An estimated execution count for one program point.
///
/// Zero is a valid observation (the point was compiled but never sampled),
/// so absence of data and "observed cold" are deliberately the same value.
pub type Counter = i64;

/// Environment variable holding a link-name substring that enables verbose
/// per-function tracing of the annotation and layout passes.
pub const DEBUG_FUNC_ENV: &str = "TEPLO_DEBUG_FUNC";

/// True when verbose tracing is requested for `link_name`.
pub fn trace_enabled(link_name: &str) -> bool {
    match std::env::var(DEBUG_FUNC_ENV) {
        Ok(pat) => !pat.is_empty() && link_name.contains(&pat),
        Err(_) => false,
    }
}
