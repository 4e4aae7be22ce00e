//! Parsed CPU-profile data model.
//!
//! The binary profile reader lives with the compiler driver; this crate
//! defines the shape it produces and a JSON loader used by fixtures and the
//! `teplo` dev tool. A profile is an unordered multiset of samples, each
//! carrying a value vector and a call stack of locations; a location holds
//! `(function, line)` pairs ordered from the innermost frame outwards.

mod model;


pub use model::{LineEntry, Location, Profile, Sample};

/// Errors produced by the profile loading edge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed profile: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("profile I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for profile loading.
pub type Result<T> = std::result::Result<T, Error>;
