//! Entities that reference a node but take no part in transformation caching.

use serde::{Deserialize, Serialize};

use crate::handles::NodeHandle;

/// Visibility state of a renderable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VisibilityMode {
    /// Rendered normally.
    #[default]
    Visible,
    /// Not rendered, but resources stay uploaded.
    Invisible,
    /// Not rendered and resources may be released.
    Off,
}

/// Something drawable placed at a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Renderable {
    pub node: NodeHandle,
    pub visibility: VisibilityMode,
}

/// Projection model of a camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectionType {
    #[default]
    Perspective,
    Orthographic,
}

/// A viewpoint placed at a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Camera {
    pub node: NodeHandle,
    pub projection: ProjectionType,
}
