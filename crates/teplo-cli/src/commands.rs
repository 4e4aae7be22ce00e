//! Command implementations.
//!
//! Both commands aggregate straight over the raw sample list; they do not
//! need a compilation unit, so they see exactly what the sample indexer
//! would see.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::ArgMatches;
use indexmap::IndexMap;
use teplo_profile::Profile;

/// Per-function totals: sample count and summed cumulative value.
pub fn stats(matches: &ArgMatches) -> Result<String, teplo_profile::Error> {
    let path = matches.get_one::<PathBuf>("profile").expect("required arg");
    let profile = Profile::from_path(path)?;
    Ok(render_stats(&profile))
}

/// Line buckets for one function: hits and the first cumulative value, the
/// same value the counter loader would seed.
pub fn lines(matches: &ArgMatches) -> Result<String, teplo_profile::Error> {
    let path = matches.get_one::<PathBuf>("profile").expect("required arg");
    let function = matches.get_one::<String>("function").expect("required arg");
    let profile = Profile::from_path(path)?;
    Ok(render_lines(&profile, function))
}

pub(crate) fn render_stats(profile: &Profile) -> String {
    let mut totals: IndexMap<&str, (usize, i64)> = IndexMap::new();
    for sample in &profile.samples {
        for location in &sample.stack {
            for entry in &location.lines {
                let slot = totals.entry(entry.function.as_str()).or_default();
                slot.0 += 1;
                slot.1 += sample.cumulative();
            }
        }
    }
    totals.sort_by(|_, a, _, b| b.1.cmp(&a.1));

    let mut out = format!("{} samples\n", profile.samples.len());
    for (function, (hits, cumulative)) in &totals {
        let _ = writeln!(out, "{cumulative:>12} {hits:>6}  {function}");
    }
    out
}

pub(crate) fn render_lines(profile: &Profile, function: &str) -> String {
    let mut buckets: IndexMap<u32, (usize, i64)> = IndexMap::new();
    for sample in &profile.samples {
        for location in &sample.stack {
            for entry in &location.lines {
                if entry.function != function {
                    continue;
                }
                let slot = buckets.entry(entry.line).or_insert((0, 0));
                slot.0 += 1;
                if slot.0 == 1 {
                    slot.1 = sample.cumulative();
                }
            }
        }
    }
    buckets.sort_keys();

    let mut out = format!("{function}\n");
    for (line, (hits, first_cumulative)) in &buckets {
        let _ = writeln!(out, "  line {line:>5}: {hits} samples, counter {first_cumulative}");
    }
    out
}
