//! Error Types
//!
//! The unchecked scene operations assert their preconditions in debug builds
//! only. [`SceneError`] is returned by the checked `try_*` operations and by
//! [`SceneT::validate_topology`](crate::scene::SceneT::validate_topology).

use ramses_core::PoolError;
use thiserror::Error;

use crate::handles::{NodeHandle, TransformHandle};

/// Structural or handle misuse detected by a checked scene operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    // ========================================================================
    // Handle Errors
    // ========================================================================
    /// The node handle does not name a live node.
    #[error("Node {0} is not allocated")]
    NodeNotAllocated(NodeHandle),

    /// The transform handle does not name a live transform.
    #[error("Transform {0} is not allocated")]
    TransformNotAllocated(TransformHandle),

    /// The underlying slot pool rejected the operation.
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    // ========================================================================
    // Topology Errors
    // ========================================================================
    /// A node cannot be its own child.
    #[error("Cannot attach {0} to itself")]
    SelfParenting(NodeHandle),

    /// The child already has a parent.
    #[error("{child} already has parent {parent}")]
    AlreadyHasParent {
        /// Node that was about to be attached
        child: NodeHandle,
        /// Its current parent
        parent: NodeHandle,
    },

    /// The child is not in the parent's child list.
    #[error("{child} is not a child of {parent}")]
    NotAChild {
        /// Expected parent
        parent: NodeHandle,
        /// Node that was about to be detached
        child: NodeHandle,
    },

    /// Attaching would make a node its own ancestor.
    #[error("Attaching {child} to {parent} would create a cycle")]
    Cycle {
        /// Requested parent
        parent: NodeHandle,
        /// Requested child, an ancestor of `parent`
        child: NodeHandle,
    },

    /// The node already carries a transform.
    #[error("{node} already has transform {transform}")]
    NodeAlreadyHasTransform {
        /// Node in question
        node: NodeHandle,
        /// Transform already attached to it
        transform: TransformHandle,
    },

    /// Parent and child links disagree.
    #[error("Inconsistent topology at {node}: {reason}")]
    InconsistentTopology {
        /// Node where the inconsistency was found
        node: NodeHandle,
        /// What is wrong
        reason: String,
    },
}

/// Alias for `Result<T, SceneError>`.
pub type Result<T> = std::result::Result<T, SceneError>;
