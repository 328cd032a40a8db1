//! Error types for motion sets and motion loading.

use thiserror::Error;

/// Errors surfaced by motion set, entry and pool operations.
///
/// Lookups that can legitimately miss (`find_*`, `remove_*`) return `Option`
/// or silently do nothing instead of producing `NotFound`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MotionSetError {
    /// The string id pool rejected the text (empty input or pool exhausted).
    #[error("failed to intern identifier '{text}': {reason}")]
    InternFailure { text: String, reason: String },

    /// The entry has no interned identifier and cannot be keyed.
    #[error("motion entry '{location}' has no identifier")]
    MissingIdentifier { location: String },

    /// Another entry in the same set already uses the identifier.
    #[error("motion id '{id}' is already used in motion set '{set}'")]
    DuplicateIdentifier { id: String, set: String },

    /// Child set index outside `0..len`.
    #[error("child set index {index} is out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The load strategy could not produce a motion. Cached on the entry.
    #[error("failed to load motion '{id}' from '{path}': {reason}")]
    LoadFailed {
        id: String,
        path: String,
        reason: String,
    },

    /// The operation targeted an entry or set that is not where it was expected.
    #[error("{what} not found")]
    NotFound { what: String },

    /// An entry or set from another context (or another string id pool).
    #[error("{what} belongs to a different motion set context")]
    ForeignContext { what: String },

    /// Linking the child would make a set its own descendant.
    #[error("adding motion set '{child}' under '{parent}' would create a cycle")]
    CycleDetected { parent: String, child: String },
}

/// Errors produced by a [`crate::MotionSetCallback`] implementation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("io error reading '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not decode motion '{path}': {reason}")]
    Decode { path: String, reason: String },

    /// The strategy has nothing to offer for this entry.
    #[error("no motion available for '{path}'")]
    Missing { path: String },

    #[error("{0}")]
    Other(String),
}
