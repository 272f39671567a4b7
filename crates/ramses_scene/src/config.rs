//! Scene configuration.
//!
//! Both types are plain serde data so that size presets and scene identity can
//! come from a JSON or TOML file.

use serde::{Deserialize, Serialize};

/// Identity of a scene.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneInfo {
    pub scene_id: u64,
    pub name: String,
}

impl SceneInfo {
    #[must_use]
    pub fn new(scene_id: u64, name: impl Into<String>) -> Self {
        Self {
            scene_id,
            name: name.into(),
        }
    }
}

/// Slot counts per entity kind.
///
/// Used both to pre-size the pools of a scene and to report how many slots a
/// scene currently spans (live and dead).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSizeInformation {
    pub node_count: usize,
    pub transform_count: usize,
    pub renderable_count: usize,
    pub camera_count: usize,
}

impl std::fmt::Display for SceneSizeInformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[nodes={} transforms={} renderables={} cameras={}]",
            self.node_count, self.transform_count, self.renderable_count, self.camera_count
        )
    }
}
