//! Handle types of the scene entity kinds.

use ramses_core::new_handle_type;

new_handle_type! {
    /// Slot of a [`TopologyNode`](crate::node::TopologyNode).
    pub struct NodeHandle;
    /// Slot of a [`TopologyTransform`](crate::transform::TopologyTransform).
    pub struct TransformHandle;
    /// Slot of a [`Renderable`](crate::components::Renderable).
    pub struct RenderableHandle;
    /// Slot of a [`Camera`](crate::components::Camera).
    pub struct CameraHandle;
}
