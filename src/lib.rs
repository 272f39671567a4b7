//! # Ramses
//!
//! Scene graph core of a client/renderer split 3D engine.
//!
//! Re-exports the workspace crates under one name: typed handles and slot
//! pools from `ramses_core`, the node/transform store and the transformation
//! cache from `ramses_scene`. Most users only need the [`prelude`].
//!
//! ```
//! use ramses::prelude::*;
//!
//! let mut scene = TransformationCachedScene::new(SceneInfo::new(1, "demo"));
//! let root = scene.allocate_node(1, None);
//! let child = scene.allocate_node(0, None);
//! scene.add_child_to_node(root, child);
//!
//! let transform = scene.allocate_transform(root, None);
//! scene.set_translation(transform, Vec3::new(1.0, 0.0, 0.0));
//!
//! let world = scene.update_matrix_cache(MatrixType::World, child);
//! assert_eq!(world.w_axis.x, 1.0);
//! ```

pub use ramses_core;
pub use ramses_scene;

pub use glam;

pub use ramses_core::{
    AutoPools, ExplicitPools, MemoryHandle, MemoryPool, MemoryPoolExplicit, PoolError, PoolFamily, SlotPool,
    new_handle_type,
};
pub use ramses_scene::{
    Camera, CameraHandle, MatrixCacheEntry, MatrixType, NodeHandle, ProjectionType, Renderable, RenderableHandle,
    RotationType, Scene, SceneError, SceneInfo, SceneSizeInformation, SceneT, SceneWithExplicitMemory, TopologyNode,
    TopologyTransform, TransformHandle, TransformationCachedScene, TransformationCachedSceneT,
    TransformationCachedSceneWithExplicitMemory, VisibilityMode,
};

pub mod prelude {
    //! Commonly used types.

    pub use crate::{
        AutoPools, Camera, CameraHandle, ExplicitPools, MatrixType, MemoryHandle, MemoryPool, MemoryPoolExplicit,
        NodeHandle, PoolError, PoolFamily, ProjectionType, Renderable, RenderableHandle, RotationType, Scene,
        SceneError, SceneInfo, SceneSizeInformation, SceneWithExplicitMemory, SlotPool, TransformHandle,
        TransformationCachedScene, TransformationCachedSceneWithExplicitMemory, VisibilityMode,
    };
    pub use glam::{Mat4, Quat, Vec3, Vec4};
}
