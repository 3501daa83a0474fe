//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::value::Kind;

/// Domain errors represent violations of the tree and value contracts.
/// These are independent of parsing and I/O concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A handle did not refer to a live node of the required kind.
    #[error("expected {expected}, not {found}")]
    Type {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid value for {kind}: {value:?}")]
    Value { kind: Kind, value: String },

    #[error("{0} is not in children")]
    Lookup(String),

    #[error("cannot insert {0} into its own subtree")]
    Cycle(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
