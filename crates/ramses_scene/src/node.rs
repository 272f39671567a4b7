use crate::handles::NodeHandle;

/// A node of the scene topology.
///
/// Only hierarchy data lives here. Transforms, renderables and cameras refer
/// to their node by handle and are stored in their own pools.
///
/// # Hierarchy
///
/// - `parent`: handle of the parent node, [`NodeHandle::invalid`] for roots
/// - `children`: child handles in insertion order, which is also the
///   traversal order used by consumers
///
/// Both sides of a parent/child link are only ever changed together through
/// [`SceneT::add_child_to_node`](crate::scene::SceneT::add_child_to_node) and
/// [`SceneT::remove_child_from_node`](crate::scene::SceneT::remove_child_from_node).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyNode {
    pub(crate) parent: NodeHandle,
    pub(crate) children: Vec<NodeHandle>,
}

impl TopologyNode {
    /// Returns the parent handle, invalid for a root node.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> NodeHandle {
        self.parent
    }

    /// Returns the child handles in insertion order.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Returns `true` if this node has no parent.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent == NodeHandle::invalid()
    }
}
