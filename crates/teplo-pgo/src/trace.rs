//! Env-gated per-function tracing.
//!
//! Set `TEPLO_DEBUG_FUNC` to a link-name substring to watch the annotation
//! passes rewrite counters for matching functions.

use teplo_core::{trace_enabled, Counter};
use teplo_ir::Op;

pub(crate) struct Trace {
    on: bool,
}

impl Trace {
    pub fn for_func(link_name: &str) -> Self {
        let on = trace_enabled(link_name);
        if on {
            eprintln!("start pgo trace for: {link_name}");
        }
        Self { on }
    }

    pub fn seed(&self, op: Op, line: u32, counter: Counter) {
        if self.on {
            eprintln!("seed: {}:{line} new: {counter}", op.name());
        }
    }

    pub fn rewrite(&self, stage: &str, op: Op, line: u32, old: Counter, new: Counter) {
        if self.on {
            eprintln!("{stage}: {}:{line} old: {old} new: {new}", op.name());
        }
    }
}
