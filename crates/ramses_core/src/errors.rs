//! Error Types
//!
//! The unchecked pool operations treat misuse as a programmer error and only
//! assert in debug builds. The `try_*` variants report the same conditions as
//! [`PoolError`] values instead.

use thiserror::Error;

/// Misuse of a slot pool detected by a checked operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// An explicit-only pool was asked to pick a handle on its own.
    #[error("Explicit memory pool requires a caller-supplied handle")]
    MissingHandle,

    /// The handle lies outside the preallocated range of an explicit pool.
    #[error("Handle {index} is out of range (pool size: {size})")]
    OutOfRange {
        /// Slot index of the offending handle
        index: usize,
        /// Current number of slots
        size: usize,
    },

    /// The slot is already live.
    #[error("Handle {0} is already allocated")]
    AlreadyAllocated(usize),

    /// The slot is not live.
    #[error("Handle {0} is not allocated")]
    NotAllocated(usize),

    /// The `INVALID` sentinel was used as an explicit handle.
    #[error("The invalid handle sentinel cannot be allocated")]
    InvalidHandle,
}

/// Alias for `Result<T, PoolError>`.
pub type Result<T> = std::result::Result<T, PoolError>;
