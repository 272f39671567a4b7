//! # Ramses Scene
//!
//! Scene graph store and transformation cache.
//!
//! - [`SceneT`]: raw store of nodes, transforms and the entities attached to
//!   nodes (renderables, cameras), with parent/child topology
//! - [`TransformationCachedSceneT`]: wraps a store and keeps lazily computed
//!   world and object matrices per node
//!
//! Both are generic over a [`PoolFamily`](ramses_core::PoolFamily). The
//! aliases [`Scene`] / [`TransformationCachedScene`] use auto-assigning pools,
//! the `*WithExplicitMemory` aliases require every handle to be supplied by the
//! caller.

pub mod components;
pub mod config;
pub mod errors;
pub mod handles;
pub mod node;
pub mod scene;
pub mod transform;
pub mod transformation_cache;

pub use components::{Camera, ProjectionType, Renderable, VisibilityMode};
pub use config::{SceneInfo, SceneSizeInformation};
pub use errors::SceneError;
pub use handles::{CameraHandle, NodeHandle, RenderableHandle, TransformHandle};
pub use node::TopologyNode;
pub use scene::{Scene, SceneT, SceneWithExplicitMemory};
pub use transform::{RotationType, TopologyTransform};
pub use transformation_cache::{
    MatrixCacheEntry, MatrixType, TransformationCachedScene, TransformationCachedSceneT,
    TransformationCachedSceneWithExplicitMemory,
};
