//! Error types for tree construction, proof extraction and field conversion.

use thiserror::Error;

/// Errors raised at the library boundary.
///
/// Every variant is a synchronous precondition failure: nothing is retried and
/// no partially built tree or proof is ever returned alongside one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    /// Input is not a canonical, reduced element of the hash field.
    #[error("invalid field element: {0}")]
    InvalidFieldElement(String),

    /// More secrets than leaf slots for the requested depth.
    #[error("too many members: {count} secrets exceed capacity {capacity} of a depth-{depth} tree")]
    TooManyMembers {
        count: usize,
        capacity: usize,
        depth: usize,
    },

    /// Proof requested for a leaf position outside `[0, 2^depth)`.
    #[error("leaf index {index} out of range (tree has {leaf_count} leaves)")]
    IndexOutOfRange { index: usize, leaf_count: usize },

    #[error("invalid tree depth {depth}: must be between 1 and {max}")]
    InvalidDepth { depth: usize, max: usize },

    /// Poseidon constants failed their one-time consistency check.
    #[error("hash initialization failed: {0}")]
    HasherInit(String),
}

pub type Result<T> = std::result::Result<T, MerkleError>;
