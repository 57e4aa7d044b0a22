//! Error types for atom parsing and instance selection

use crate::resolver::SelectionFailure;

/// Errors surfaced by the resolver core
///
/// Every error is a pure function result; nothing is retried internally.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Structurally invalid package specifier (unknown operator, missing
    /// category/name, operator without a version, trailing garbage).
    #[error("malformed atom: {0}")]
    MalformedAtom(String),

    /// Version string that does not follow the version grammar.
    #[error("invalid version: {0}")]
    InvalidVersion(String),

    /// Slot constraint that does not follow the slot grammar.
    #[error("invalid slot: {0}")]
    InvalidSlot(String),

    /// Catalog snapshot that is not well-formed JSON.
    #[error("invalid catalog snapshot: {0}")]
    InvalidSnapshot(String),

    /// Set name that is not registered.
    #[error("unknown set: {0}")]
    UnknownSet(String),

    /// No candidate survived matching and visibility filtering.
    #[error("{0}")]
    NoMatchingInstance(SelectionFailure),

    /// Two surviving candidates tied on (version, repository priority).
    /// Instance identity includes the repository, so a full tie indicates
    /// an inconsistent catalog or repository configuration.
    #[error("internal invariant violation: {0}")]
    InternalInvariantViolation(String),
}

/// Result type for resolver operations
pub type Result<T> = std::result::Result<T, Error>;
