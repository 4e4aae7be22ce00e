//! Per-function sample indexing.

use std::collections::HashMap;

use indexmap::IndexMap;
use teplo_core::Counter;
use teplo_profile::Profile;
use teplo_ir::{FuncId, Unit};

/// Line buckets for one function of the unit.
#[derive(Debug, Clone)]
pub struct FuncSamples {
    pub func: FuncId,
    /// Binary-visible line to the samples whose stack touched it, as indices
    /// into the profile's sample vector.
    pub lines: IndexMap<u32, Vec<usize>>,
}

/// Samples bucketed by function link name and source line.
///
/// Built once per `load_counters` run and kept alive through inlining so the
/// corrector can re-read callee buckets.
#[derive(Debug, Clone, Default)]
pub struct SampleIndex {
    funcs: IndexMap<String, FuncSamples>,
}

impl SampleIndex {
    /// Index `profile` against the unit's functions.
    ///
    /// One record is created per function in bottom-up enumeration order,
    /// resetting its node-profile table on the way. Sampled functions the
    /// unit does not contain are skipped. An inlined frame shares its sample
    /// with every `(function, line)` pair on the location, so one sample may
    /// land in several records.
    pub fn build(profile: &Profile, unit: &mut Unit) -> Self {
        let mut funcs = IndexMap::new();
        for id in unit.func_ids() {
            let func = unit.func_mut(id);
            func.counters.clear();
            funcs.insert(
                func.link_name.clone(),
                FuncSamples {
                    func: id,
                    lines: IndexMap::new(),
                },
            );
        }

        for (sample_idx, sample) in profile.samples.iter().enumerate() {
            if sample.stack.is_empty() {
                continue;
            }
            for location in &sample.stack {
                for entry in &location.lines {
                    let Some(record) = funcs.get_mut(&entry.function) else {
                        continue;
                    };
                    record.lines.entry(entry.line).or_default().push(sample_idx);
                }
            }
        }

        Self { funcs }
    }

    pub fn get(&self, link_name: &str) -> Option<&FuncSamples> {
        self.funcs.get(link_name)
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    /// Raw line-to-cumulative-counter table for one function; the inline
    /// corrector's fallback seed source.
    pub fn line_counters(&self, link_name: &str, profile: &Profile) -> HashMap<u32, Counter> {
        let mut out = HashMap::new();
        let Some(record) = self.get(link_name) else {
            return out;
        };
        for (&line, bucket) in &record.lines {
            if let Some(&first) = bucket.first() {
                out.insert(line, profile.samples[first].cumulative());
            }
        }
        out
    }
}
