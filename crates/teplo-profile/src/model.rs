//! Profile samples, locations and line entries.

use std::path::Path;

use teplo_core::Counter;

/// One `(function, line)` attribution of a sampled address.
///
/// A single address can expand to several entries when the profiled binary
/// inlined calls at that point; entries run from the innermost frame
/// outwards.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LineEntry {
    /// Link-time system name of the function.
    pub function: String,
    /// Binary-visible source line recorded by the profiler.
    pub line: u32,
}

/// A resolved program location on a sample's call stack.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Location {
    #[serde(default)]
    pub lines: Vec<LineEntry>,
}

/// One sample: a value vector plus the call stack it was taken on.
///
/// The value vector is indexed 0 (flat) and 1 (cumulative). Annotation uses
/// the cumulative value, since flat values can be zero for non-leaf
/// statements.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Sample {
    pub values: Vec<i64>,
    #[serde(default)]
    pub stack: Vec<Location>,
}

impl Sample {
    /// Cumulative counter of this sample; zero when the profiler recorded
    /// fewer than two values.
    pub fn cumulative(&self) -> Counter {
        self.values.get(1).copied().unwrap_or(0)
    }
}

/// A parsed CPU profile.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub samples: Vec<Sample>,
}

impl Profile {
    /// Parse a profile from its JSON fixture form.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a JSON profile from disk.
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// A profile with zero samples is accepted everywhere and yields no
    /// counters.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
