use glam::{Vec3, Vec4};
use ramses_core::{AutoPools, ExplicitPools, MemoryHandle, PoolFamily, SlotPool};

use crate::components::{Camera, ProjectionType, Renderable, VisibilityMode};
use crate::config::{SceneInfo, SceneSizeInformation};
use crate::errors::{Result, SceneError};
use crate::handles::{CameraHandle, NodeHandle, RenderableHandle, TransformHandle};
use crate::node::TopologyNode;
use crate::transform::{RotationType, TopologyTransform};

/// Scene store backed by auto-assigning pools.
pub type Scene = SceneT<AutoPools>;
/// Scene store backed by explicit-only pools.
pub type SceneWithExplicitMemory = SceneT<ExplicitPools>;

/// Raw scene store.
///
/// Owns one slot pool per entity kind and the parent/child topology. Setters
/// here have no caching side effects; see
/// [`TransformationCachedSceneT`](crate::transformation_cache::TransformationCachedSceneT)
/// for the layer that keeps world/object matrices up to date.
///
/// All operations taking a handle require it to be allocated. Violations are
/// programmer errors caught by debug assertions; the `try_*` variants check
/// instead and return [`SceneError`].
pub struct SceneT<F: PoolFamily> {
    info: SceneInfo,

    // ==== Topology ====
    nodes: F::Pool<TopologyNode, NodeHandle>,
    transforms: F::Pool<TopologyTransform, TransformHandle>,

    // ==== Collaborator pools ====
    renderables: F::Pool<Renderable, RenderableHandle>,
    cameras: F::Pool<Camera, CameraHandle>,
}

impl<F: PoolFamily> Default for SceneT<F> {
    fn default() -> Self {
        Self::new(SceneInfo::default())
    }
}

impl<F: PoolFamily> SceneT<F> {
    #[must_use]
    pub fn new(info: SceneInfo) -> Self {
        log::debug!("Creating scene {} '{}'", info.scene_id, info.name);
        Self {
            info,
            nodes: Default::default(),
            transforms: Default::default(),
            renderables: Default::default(),
            cameras: Default::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn info(&self) -> &SceneInfo {
        &self.info
    }

    #[inline]
    #[must_use]
    pub fn scene_id(&self) -> u64 {
        self.info.scene_id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Grows every pool to at least the given slot counts.
    pub fn preallocate_scene_size(&mut self, size: &SceneSizeInformation) {
        log::debug!("Preallocating scene {} to {size}", self.info.scene_id);
        self.nodes.preallocate_size(size.node_count);
        self.transforms.preallocate_size(size.transform_count);
        self.renderables.preallocate_size(size.renderable_count);
        self.cameras.preallocate_size(size.camera_count);
    }

    /// Slot counts (live and dead) of every pool.
    #[must_use]
    pub fn scene_size_information(&self) -> SceneSizeInformation {
        SceneSizeInformation {
            node_count: self.nodes.total_count(),
            transform_count: self.transforms.total_count(),
            renderable_count: self.renderables.total_count(),
            camera_count: self.cameras.total_count(),
        }
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Scenes with explicit memory cannot pick handles on their own.
    #[inline]
    fn debug_assert_handle_supplied(supplied: bool, kind: &str) {
        debug_assert!(
            F::AUTO_ASSIGNS_HANDLES || supplied,
            "scene with explicit memory needs a caller-supplied {kind} handle"
        );
    }

    /// Allocates a node, reserving room for `child_count_hint` children.
    pub fn allocate_node(&mut self, child_count_hint: usize, handle: Option<NodeHandle>) -> NodeHandle {
        Self::debug_assert_handle_supplied(handle.is_some(), "node");
        let actual = self.nodes.allocate(handle);
        self.nodes.get_memory_mut(actual).children.reserve(child_count_hint);
        actual
    }

    /// Checked [`allocate_node`](Self::allocate_node).
    pub fn try_allocate_node(
        &mut self,
        child_count_hint: usize,
        handle: Option<NodeHandle>,
    ) -> Result<NodeHandle> {
        let actual = self
            .nodes
            .try_allocate(handle)
            .map_err(SceneError::from)
            .inspect_err(|err| log::warn!("Rejected node allocation: {err}"))?;
        self.nodes.get_memory_mut(actual).children.reserve(child_count_hint);
        Ok(actual)
    }

    /// Releases a node that is detached from the topology.
    pub fn release_node(&mut self, node: NodeHandle) {
        debug_assert!(
            self.nodes.get(node).is_some_and(|n| n.is_root() && n.children.is_empty()),
            "releasing {node} while it is still linked into the topology"
        );
        self.nodes.release(node);
    }

    #[inline]
    #[must_use]
    pub fn is_node_allocated(&self, node: NodeHandle) -> bool {
        self.nodes.is_allocated(node)
    }

    /// Number of node slots, including unallocated ones.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.total_count()
    }

    #[inline]
    #[must_use]
    pub fn node(&self, node: NodeHandle) -> &TopologyNode {
        self.nodes.get_memory(node)
    }

    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &F::Pool<TopologyNode, NodeHandle> {
        &self.nodes
    }

    /// Parent of `node`, invalid for a root.
    #[inline]
    #[must_use]
    pub fn parent(&self, node: NodeHandle) -> NodeHandle {
        self.nodes.get_memory(node).parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self, node: NodeHandle) -> &[NodeHandle] {
        &self.nodes.get_memory(node).children
    }

    #[inline]
    #[must_use]
    pub fn child_count(&self, node: NodeHandle) -> usize {
        self.nodes.get_memory(node).children.len()
    }

    #[inline]
    #[must_use]
    pub fn child(&self, node: NodeHandle, index: usize) -> NodeHandle {
        let children = &self.nodes.get_memory(node).children;
        debug_assert!(index < children.len(), "child index {index} out of range for {node}");
        children[index]
    }

    /// Appends `child` to the children of `parent` and links it back.
    pub fn add_child_to_node(&mut self, parent: NodeHandle, child: NodeHandle) {
        debug_assert!(self.nodes.get(child).is_some_and(TopologyNode::is_root), "{child} already has a parent");

        let parent_node = self.nodes.get_memory_mut(parent);
        debug_assert!(!parent_node.children.contains(&child), "{child} is already a child of {parent}");
        parent_node.children.push(child);

        self.nodes.get_memory_mut(child).parent = parent;
    }

    /// Checked [`add_child_to_node`](Self::add_child_to_node).
    ///
    /// Rejects unallocated nodes, self-parenting, children that already have
    /// a parent, and links that would close a cycle.
    pub fn try_add_child_to_node(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        self.check_link(parent, child).inspect_err(|err| log::warn!("Rejected attach: {err}"))?;
        self.add_child_to_node(parent, child);
        Ok(())
    }

    fn check_link(&self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        for node in [parent, child] {
            if !self.nodes.is_allocated(node) {
                return Err(SceneError::NodeNotAllocated(node));
            }
        }
        if parent == child {
            return Err(SceneError::SelfParenting(child));
        }

        let current_parent = self.parent(child);
        if current_parent.is_valid() {
            return Err(SceneError::AlreadyHasParent {
                child,
                parent: current_parent,
            });
        }

        let mut ancestor = parent;
        while ancestor.is_valid() {
            if ancestor == child {
                return Err(SceneError::Cycle { parent, child });
            }
            ancestor = self.parent(ancestor);
        }
        Ok(())
    }

    /// Removes `child` from the children of `parent` and clears its parent.
    pub fn remove_child_from_node(&mut self, parent: NodeHandle, child: NodeHandle) {
        let parent_node = self.nodes.get_memory_mut(parent);
        let position = parent_node.children.iter().position(|&c| c == child);
        debug_assert!(position.is_some(), "{child} is not a child of {parent}");
        if let Some(position) = position {
            parent_node.children.remove(position);
        }

        self.nodes.get_memory_mut(child).parent = NodeHandle::invalid();
    }

    /// Checked [`remove_child_from_node`](Self::remove_child_from_node).
    pub fn try_remove_child_from_node(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        self.check_unlink(parent, child).inspect_err(|err| log::warn!("Rejected detach: {err}"))?;
        self.remove_child_from_node(parent, child);
        Ok(())
    }

    pub(crate) fn check_unlink(&self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        for node in [parent, child] {
            if !self.nodes.is_allocated(node) {
                return Err(SceneError::NodeNotAllocated(node));
            }
        }
        if self.parent(child) != parent || !self.children(parent).contains(&child) {
            return Err(SceneError::NotAChild { parent, child });
        }
        Ok(())
    }

    /// Verifies that every parent/child link is symmetric and that every
    /// transform points at a live node.
    pub fn validate_topology(&self) -> Result<()> {
        self.find_topology_error().inspect_err(|err| log::error!("Topology validation failed: {err}"))
    }

    fn find_topology_error(&self) -> Result<()> {
        let inconsistent = |node: NodeHandle, reason: String| SceneError::InconsistentTopology { node, reason };

        for (handle, node) in self.nodes.iter() {
            if node.parent.is_valid() {
                let Some(parent) = self.nodes.get(node.parent) else {
                    return Err(inconsistent(handle, format!("parent {} is not allocated", node.parent)));
                };
                if !parent.children.contains(&handle) {
                    return Err(inconsistent(handle, format!("missing from children of {}", node.parent)));
                }
            }

            for (index, &child) in node.children.iter().enumerate() {
                let Some(child_node) = self.nodes.get(child) else {
                    return Err(inconsistent(handle, format!("child {child} is not allocated")));
                };
                if child_node.parent != handle {
                    return Err(inconsistent(handle, format!("child {child} has parent {}", child_node.parent)));
                }
                if node.children[..index].contains(&child) {
                    return Err(inconsistent(handle, format!("child {child} is listed twice")));
                }
            }
        }

        for (handle, transform) in self.transforms.iter() {
            if !self.nodes.is_allocated(transform.node) {
                return Err(inconsistent(transform.node, format!("{handle} refers to an unallocated node")));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    /// Allocates an identity transform attached to `node`.
    pub fn allocate_transform(&mut self, node: NodeHandle, handle: Option<TransformHandle>) -> TransformHandle {
        Self::debug_assert_handle_supplied(handle.is_some(), "transform");
        let actual = self.transforms.allocate(handle);
        self.transforms.get_memory_mut(actual).node = node;
        actual
    }

    /// Checked [`allocate_transform`](Self::allocate_transform).
    pub fn try_allocate_transform(
        &mut self,
        node: NodeHandle,
        handle: Option<TransformHandle>,
    ) -> Result<TransformHandle> {
        let actual = if self.nodes.is_allocated(node) {
            self.transforms.try_allocate(handle).map_err(SceneError::from)
        } else {
            Err(SceneError::NodeNotAllocated(node))
        }
        .inspect_err(|err| log::warn!("Rejected transform allocation: {err}"))?;
        self.transforms.get_memory_mut(actual).node = node;
        Ok(actual)
    }

    pub fn release_transform(&mut self, transform: TransformHandle) {
        self.transforms.release(transform);
    }

    /// Checked [`release_transform`](Self::release_transform).
    pub fn try_release_transform(&mut self, transform: TransformHandle) -> Result<()> {
        self.check_transform(transform)?;
        self.release_transform(transform);
        Ok(())
    }

    pub(crate) fn check_transform(&self, transform: TransformHandle) -> Result<()> {
        if self.transforms.is_allocated(transform) {
            Ok(())
        } else {
            let err = SceneError::TransformNotAllocated(transform);
            log::warn!("Rejected transform release: {err}");
            Err(err)
        }
    }

    #[inline]
    #[must_use]
    pub fn is_transform_allocated(&self, transform: TransformHandle) -> bool {
        self.transforms.is_allocated(transform)
    }

    /// Number of transform slots, including unallocated ones.
    #[inline]
    #[must_use]
    pub fn transform_count(&self) -> usize {
        self.transforms.total_count()
    }

    #[inline]
    #[must_use]
    pub fn transform(&self, transform: TransformHandle) -> &TopologyTransform {
        self.transforms.get_memory(transform)
    }

    #[inline]
    #[must_use]
    pub fn transforms(&self) -> &F::Pool<TopologyTransform, TransformHandle> {
        &self.transforms
    }

    /// Node the transform is attached to.
    #[inline]
    #[must_use]
    pub fn transform_node(&self, transform: TransformHandle) -> NodeHandle {
        self.transforms.get_memory(transform).node
    }

    #[inline]
    #[must_use]
    pub fn translation(&self, transform: TransformHandle) -> Vec3 {
        self.transforms.get_memory(transform).translation
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self, transform: TransformHandle) -> Vec4 {
        self.transforms.get_memory(transform).rotation
    }

    #[inline]
    #[must_use]
    pub fn rotation_type(&self, transform: TransformHandle) -> RotationType {
        self.transforms.get_memory(transform).rotation_type
    }

    #[inline]
    #[must_use]
    pub fn scaling(&self, transform: TransformHandle) -> Vec3 {
        self.transforms.get_memory(transform).scaling
    }

    pub fn set_translation(&mut self, transform: TransformHandle, translation: Vec3) {
        self.transforms.get_memory_mut(transform).translation = translation;
    }

    pub fn set_rotation(&mut self, transform: TransformHandle, rotation: Vec4, rotation_type: RotationType) {
        let t = self.transforms.get_memory_mut(transform);
        t.rotation = rotation;
        t.rotation_type = rotation_type;
    }

    pub fn set_scaling(&mut self, transform: TransformHandle, scaling: Vec3) {
        self.transforms.get_memory_mut(transform).scaling = scaling;
    }

    // ========================================================================
    // Renderables
    // ========================================================================

    pub fn allocate_renderable(&mut self, node: NodeHandle, handle: Option<RenderableHandle>) -> RenderableHandle {
        Self::debug_assert_handle_supplied(handle.is_some(), "renderable");
        let actual = self.renderables.allocate(handle);
        self.renderables.get_memory_mut(actual).node = node;
        actual
    }

    pub fn release_renderable(&mut self, renderable: RenderableHandle) {
        self.renderables.release(renderable);
    }

    #[inline]
    #[must_use]
    pub fn is_renderable_allocated(&self, renderable: RenderableHandle) -> bool {
        self.renderables.is_allocated(renderable)
    }

    #[inline]
    #[must_use]
    pub fn renderable_count(&self) -> usize {
        self.renderables.total_count()
    }

    #[inline]
    #[must_use]
    pub fn renderable(&self, renderable: RenderableHandle) -> &Renderable {
        self.renderables.get_memory(renderable)
    }

    #[inline]
    #[must_use]
    pub fn renderables(&self) -> &F::Pool<Renderable, RenderableHandle> {
        &self.renderables
    }

    pub fn set_renderable_visibility(&mut self, renderable: RenderableHandle, visibility: VisibilityMode) {
        self.renderables.get_memory_mut(renderable).visibility = visibility;
    }

    // ========================================================================
    // Cameras
    // ========================================================================

    pub fn allocate_camera(
        &mut self,
        projection: ProjectionType,
        node: NodeHandle,
        handle: Option<CameraHandle>,
    ) -> CameraHandle {
        Self::debug_assert_handle_supplied(handle.is_some(), "camera");
        let actual = self.cameras.allocate(handle);
        let camera = self.cameras.get_memory_mut(actual);
        camera.node = node;
        camera.projection = projection;
        actual
    }

    pub fn release_camera(&mut self, camera: CameraHandle) {
        self.cameras.release(camera);
    }

    #[inline]
    #[must_use]
    pub fn is_camera_allocated(&self, camera: CameraHandle) -> bool {
        self.cameras.is_allocated(camera)
    }

    #[inline]
    #[must_use]
    pub fn camera_count(&self) -> usize {
        self.cameras.total_count()
    }

    #[inline]
    #[must_use]
    pub fn camera(&self, camera: CameraHandle) -> &Camera {
        self.cameras.get_memory(camera)
    }

    #[inline]
    #[must_use]
    pub fn cameras(&self) -> &F::Pool<Camera, CameraHandle> {
        &self.cameras
    }
}
