//! Transformation Cache
//!
//! Layers a per-node matrix cache over [`SceneT`] and keeps it valid lazily.
//!
//! # Dirty tracking
//!
//! Every node owns a [`MatrixCacheEntry`] with one cached matrix and one dirty
//! flag per [`MatrixType`]. Any mutation that can change a node's composed
//! transform (linking, unlinking, attaching or releasing a transform, setting
//! translation/rotation/scaling) marks the node dirty and walks its subtree.
//! The walk stops at nodes that are already dirty for both matrix types:
//! their subtree was marked when they were, so repeated mutations only pay for
//! newly dirtied nodes.
//!
//! # Reads
//!
//! [`TransformationCachedSceneT::update_matrix_cache`] walks up from the
//! requested node collecting dirty entries until it meets a clean ancestor (or
//! passes the root), then walks back down composing local matrices onto the
//! clean seed and storing each result. Nodes without a modified transform pass
//! the running matrix through unchanged.
//!
//! World matrices compose as `parent * (T * S * R)`. Object matrices compose
//! the reciprocal factors in reverse, `(R^-1 * S^-1 * T^-1) * parent`, so the
//! inverse is never computed by general matrix inversion.
//!
//! # Invariant
//!
//! A clean flag means the cached matrix equals the composed transform chain
//! from the root at that moment. Dirtiness of a node implies dirtiness of its
//! whole subtree for the same matrix type.

use std::cell::{Cell, RefCell};
use std::ops::Deref;

use glam::{Mat4, Vec3, Vec4};
use ramses_core::{AutoPools, ExplicitPools, MemoryHandle, PoolFamily, SlotPool};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::components::{ProjectionType, VisibilityMode};
use crate::config::{SceneInfo, SceneSizeInformation};
use crate::errors::{Result, SceneError};
use crate::handles::{CameraHandle, NodeHandle, RenderableHandle, TransformHandle};
use crate::scene::SceneT;
use crate::transform::RotationType;

/// Cached scene backed by auto-assigning pools.
pub type TransformationCachedScene = TransformationCachedSceneT<AutoPools>;
/// Cached scene backed by explicit-only pools.
pub type TransformationCachedSceneWithExplicitMemory = TransformationCachedSceneT<ExplicitPools>;

/// Which composed matrix to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixType {
    /// Node space to root space.
    World,
    /// Root space to node space, the inverse of `World`.
    Object,
}

impl MatrixType {
    #[inline]
    const fn index(self) -> usize {
        match self {
            Self::World => 0,
            Self::Object => 1,
        }
    }
}

/// Per-node cache state, allocated and released together with the node.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixCacheEntry {
    matrices: [Mat4; 2],
    dirty: [bool; 2],
    is_identity: bool,
}

impl Default for MatrixCacheEntry {
    fn default() -> Self {
        Self {
            matrices: [Mat4::IDENTITY; 2],
            dirty: [true; 2],
            is_identity: true,
        }
    }
}

impl MatrixCacheEntry {
    #[inline]
    #[must_use]
    pub fn is_dirty(&self, matrix_type: MatrixType) -> bool {
        self.dirty[matrix_type.index()]
    }

    /// Whether the node still contributes no local transform.
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.is_identity
    }

    /// Marks both matrix types dirty. Returns `false` if both already were.
    #[inline]
    fn mark_dirty(&mut self) -> bool {
        if self.dirty[0] && self.dirty[1] {
            return false;
        }
        self.dirty = [true; 2];
        true
    }
}

/// Scene store with lazily cached world and object matrices.
///
/// Read access to the underlying store goes through `Deref`. Mutators that
/// affect transformations exist only on this type, so the cache cannot be
/// bypassed.
///
/// Not internally synchronized. Share between threads only behind an
/// external lock that covers both mutation and
/// [`update_matrix_cache`](Self::update_matrix_cache).
pub struct TransformationCachedSceneT<F: PoolFamily> {
    scene: SceneT<F>,
    node_cache: RefCell<F::Pool<MatrixCacheEntry, NodeHandle>>,
    node_to_transform: FxHashMap<NodeHandle, TransformHandle>,

    /// Scratch stack of the subtree walk, empty between calls.
    dirty_propagation_buffer: Vec<NodeHandle>,

    // ==== Instrumentation ====
    dirty_propagation_count: u64,
    matrix_computation_count: Cell<u64>,
}

impl<F: PoolFamily> Default for TransformationCachedSceneT<F> {
    fn default() -> Self {
        Self::new(SceneInfo::default())
    }
}

impl<F: PoolFamily> Deref for TransformationCachedSceneT<F> {
    type Target = SceneT<F>;

    fn deref(&self) -> &Self::Target {
        &self.scene
    }
}

impl<F: PoolFamily> TransformationCachedSceneT<F> {
    #[must_use]
    pub fn new(info: SceneInfo) -> Self {
        Self {
            scene: SceneT::new(info),
            node_cache: RefCell::new(Default::default()),
            node_to_transform: FxHashMap::default(),
            dirty_propagation_buffer: Vec::new(),
            dirty_propagation_count: 0,
            matrix_computation_count: Cell::new(0),
        }
    }

    /// The underlying store.
    #[inline]
    #[must_use]
    pub fn scene(&self) -> &SceneT<F> {
        &self.scene
    }

    /// Grows every pool, including the matrix cache, to the given sizes.
    pub fn preallocate_scene_size(&mut self, size: &SceneSizeInformation) {
        self.scene.preallocate_scene_size(size);
        self.node_cache.get_mut().preallocate_size(size.node_count);
    }

    // ========================================================================
    // Matrix cache
    // ========================================================================

    /// Returns the composed matrix of `node`, recomputing dirty entries on the
    /// path from the nearest clean ancestor.
    ///
    /// Calling it again without intervening mutations returns the cached value
    /// and computes nothing.
    #[must_use]
    pub fn update_matrix_cache(&self, matrix_type: MatrixType, node: NodeHandle) -> Mat4 {
        let kind = matrix_type.index();
        let mut cache = self.node_cache.borrow_mut();

        let mut dirty_chain: SmallVec<[NodeHandle; 16]> = SmallVec::new();
        let mut current = node;
        while current.is_valid() && cache.get_memory(current).dirty[kind] {
            dirty_chain.push(current);
            current = self.scene.parent(current);
        }

        let mut chain_matrix = if current.is_valid() {
            cache.get_memory(current).matrices[kind]
        } else {
            Mat4::IDENTITY
        };

        for &handle in dirty_chain.iter().rev() {
            let entry = cache.get_memory_mut(handle);
            if !entry.is_identity
                && let Some(&transform) = self.node_to_transform.get(&handle)
            {
                let transform = self.scene.transform(transform);
                chain_matrix = match matrix_type {
                    MatrixType::World => chain_matrix * transform.local_matrix(),
                    MatrixType::Object => transform.inverse_local_matrix() * chain_matrix,
                };
            }
            entry.matrices[kind] = chain_matrix;
            entry.dirty[kind] = false;
        }

        if !dirty_chain.is_empty() {
            log::trace!("Recomputed {} {matrix_type:?} matrices for {node}", dirty_chain.len());
            self.matrix_computation_count
                .set(self.matrix_computation_count.get() + dirty_chain.len() as u64);
        }

        chain_matrix
    }

    /// Whether the cached `matrix_type` matrix of `node` must be recomputed.
    #[inline]
    #[must_use]
    pub fn is_matrix_cache_dirty(&self, matrix_type: MatrixType, node: NodeHandle) -> bool {
        self.node_cache.borrow().get_memory(node).is_dirty(matrix_type)
    }

    /// Copy of the cache entry of `node`.
    #[must_use]
    pub fn matrix_cache_entry(&self, node: NodeHandle) -> MatrixCacheEntry {
        self.node_cache.borrow().get_memory(node).clone()
    }

    /// Transform attached to `node`, if any.
    #[inline]
    #[must_use]
    pub fn transform_of(&self, node: NodeHandle) -> Option<TransformHandle> {
        self.node_to_transform.get(&node).copied()
    }

    /// Number of nodes newly marked dirty since creation.
    #[inline]
    #[must_use]
    pub fn dirty_propagation_count(&self) -> u64 {
        self.dirty_propagation_count
    }

    /// Number of cache entries recomputed since creation.
    #[inline]
    #[must_use]
    pub fn matrix_computation_count(&self) -> u64 {
        self.matrix_computation_count.get()
    }

    /// Marks `node` and every not-yet-dirty node below it dirty.
    fn propagate_dirty_to_children(&mut self, node: NodeHandle) {
        let cache = self.node_cache.get_mut();
        let buffer = &mut self.dirty_propagation_buffer;
        debug_assert!(buffer.is_empty());

        buffer.push(node);
        while let Some(current) = buffer.pop() {
            if cache.get_memory_mut(current).mark_dirty() {
                self.dirty_propagation_count += 1;
                buffer.extend_from_slice(self.scene.children(current));
            }
        }
    }

    /// Marks the node of `transform` as carrying a local transform and
    /// dirties its subtree.
    fn transform_changed(&mut self, transform: TransformHandle) {
        let node = self.scene.transform_node(transform);
        self.node_cache.get_mut().get_memory_mut(node).is_identity = false;
        self.propagate_dirty_to_children(node);
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Allocates a node together with its dirty, identity cache entry.
    pub fn allocate_node(&mut self, child_count_hint: usize, handle: Option<NodeHandle>) -> NodeHandle {
        let actual = self.scene.allocate_node(child_count_hint, handle);
        let cache = self.node_cache.get_mut();
        cache.preallocate_size(self.scene.node_count());
        cache.allocate(Some(actual));
        actual
    }

    /// Checked [`allocate_node`](Self::allocate_node).
    pub fn try_allocate_node(
        &mut self,
        child_count_hint: usize,
        handle: Option<NodeHandle>,
    ) -> Result<NodeHandle> {
        let actual = self.scene.try_allocate_node(child_count_hint, handle)?;
        let cache = self.node_cache.get_mut();
        cache.preallocate_size(self.scene.node_count());
        cache.allocate(Some(actual));
        Ok(actual)
    }

    /// Releases a detached node that no longer carries a transform.
    pub fn release_node(&mut self, node: NodeHandle) {
        debug_assert!(
            !self.node_to_transform.contains_key(&node),
            "releasing {node} while a transform is still attached"
        );
        self.node_cache.get_mut().release(node);
        self.scene.release_node(node);
    }

    pub fn add_child_to_node(&mut self, parent: NodeHandle, child: NodeHandle) {
        self.scene.add_child_to_node(parent, child);
        self.propagate_dirty_to_children(child);
    }

    /// Checked [`add_child_to_node`](Self::add_child_to_node).
    pub fn try_add_child_to_node(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        self.scene.try_add_child_to_node(parent, child)?;
        self.propagate_dirty_to_children(child);
        Ok(())
    }

    pub fn remove_child_from_node(&mut self, parent: NodeHandle, child: NodeHandle) {
        // The subtree walk has to run while the link still exists.
        self.propagate_dirty_to_children(child);
        self.scene.remove_child_from_node(parent, child);
    }

    /// Checked [`remove_child_from_node`](Self::remove_child_from_node).
    pub fn try_remove_child_from_node(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        self.scene
            .check_unlink(parent, child)
            .inspect_err(|err| log::warn!("Rejected detach: {err}"))?;
        self.remove_child_from_node(parent, child);
        Ok(())
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    /// Attaches a new identity transform to `node`.
    pub fn allocate_transform(&mut self, node: NodeHandle, handle: Option<TransformHandle>) -> TransformHandle {
        debug_assert!(
            !self.node_to_transform.contains_key(&node),
            "{node} already has a transform"
        );
        let actual = self.scene.allocate_transform(node, handle);
        self.node_to_transform.insert(node, actual);
        self.propagate_dirty_to_children(node);
        actual
    }

    /// Checked [`allocate_transform`](Self::allocate_transform).
    pub fn try_allocate_transform(
        &mut self,
        node: NodeHandle,
        handle: Option<TransformHandle>,
    ) -> Result<TransformHandle> {
        if let Some(&transform) = self.node_to_transform.get(&node) {
            let err = SceneError::NodeAlreadyHasTransform { node, transform };
            log::warn!("Rejected transform allocation: {err}");
            return Err(err);
        }
        let actual = self.scene.try_allocate_transform(node, handle)?;
        self.node_to_transform.insert(node, actual);
        self.propagate_dirty_to_children(node);
        Ok(actual)
    }

    /// Detaches and releases a transform; its node becomes identity again.
    pub fn release_transform(&mut self, transform: TransformHandle) {
        let node = self.scene.transform_node(transform);
        self.propagate_dirty_to_children(node);
        self.node_to_transform.remove(&node);
        self.node_cache.get_mut().get_memory_mut(node).is_identity = true;
        self.scene.release_transform(transform);
    }

    /// Checked [`release_transform`](Self::release_transform).
    pub fn try_release_transform(&mut self, transform: TransformHandle) -> Result<()> {
        self.scene.check_transform(transform)?;
        self.release_transform(transform);
        Ok(())
    }

    pub fn set_translation(&mut self, transform: TransformHandle, translation: Vec3) {
        self.scene.set_translation(transform, translation);
        self.transform_changed(transform);
    }

    pub fn set_rotation(&mut self, transform: TransformHandle, rotation: Vec4, rotation_type: RotationType) {
        self.scene.set_rotation(transform, rotation, rotation_type);
        self.transform_changed(transform);
    }

    pub fn set_scaling(&mut self, transform: TransformHandle, scaling: Vec3) {
        self.scene.set_scaling(transform, scaling);
        self.transform_changed(transform);
    }

    // ========================================================================
    // Collaborator entities (no cache interaction)
    // ========================================================================

    pub fn allocate_renderable(&mut self, node: NodeHandle, handle: Option<RenderableHandle>) -> RenderableHandle {
        self.scene.allocate_renderable(node, handle)
    }

    pub fn release_renderable(&mut self, renderable: RenderableHandle) {
        self.scene.release_renderable(renderable);
    }

    pub fn set_renderable_visibility(&mut self, renderable: RenderableHandle, visibility: VisibilityMode) {
        self.scene.set_renderable_visibility(renderable, visibility);
    }

    pub fn allocate_camera(
        &mut self,
        projection: ProjectionType,
        node: NodeHandle,
        handle: Option<CameraHandle>,
    ) -> CameraHandle {
        self.scene.allocate_camera(projection, node, handle)
    }

    pub fn release_camera(&mut self, camera: CameraHandle) {
        self.scene.release_camera(camera);
    }
}
