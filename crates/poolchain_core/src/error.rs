//! # Pool Error Types
//!
//! All errors that can occur in the allocator and the list built on it.
//!
//! A lookup that matches nothing is not an error: `search` returns `None`,
//! and `free`/`delete`/`insert_before` on an absent target are silent no-ops.

use thiserror::Error;

/// Errors that can occur in the pool allocator or the concurrent list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The request is larger than the pool, or no free gap is large enough.
    ///
    /// Recoverable: free other handles and retry.
    #[error("allocation failed: requested {requested} bytes from a pool of {capacity}")]
    AllocationFailure {
        /// Bytes requested.
        requested: usize,
        /// Total pool capacity at the time of the request.
        capacity: usize,
    },

    /// A required reference was missing or does not belong to this structure.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A byte access fell outside the arena.
    #[error("out of bounds: {len} bytes at offset {offset} in a pool of {capacity}")]
    OutOfBounds {
        /// Start offset of the access.
        offset: usize,
        /// Length of the access.
        len: usize,
        /// Arena length.
        capacity: usize,
    },

    /// Invalid configuration file or value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for pool and list operations.
pub type PoolResult<T> = Result<T, PoolError>;
