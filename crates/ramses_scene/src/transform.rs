use glam::{Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::handles::NodeHandle;

/// Interpretation of the rotation `Vec4` stored in a transform.
///
/// The Euler variants read `x`, `y`, `z` as angles in degrees around the
/// matching axis and apply them in the named order around fixed axes, so
/// `EulerXYZ` rotates around X first and Z last. `w` is ignored.
/// `Quaternion` reads the vector as `(x, y, z, w)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RotationType {
    #[default]
    EulerXYZ,
    EulerXZY,
    EulerYXZ,
    EulerYZX,
    EulerZXY,
    EulerZYX,
    Quaternion,
}

impl RotationType {
    /// Converts a rotation vector of this type into a unit quaternion.
    #[must_use]
    pub fn to_quat(self, rotation: Vec4) -> Quat {
        let x = Quat::from_rotation_x(rotation.x.to_radians());
        let y = Quat::from_rotation_y(rotation.y.to_radians());
        let z = Quat::from_rotation_z(rotation.z.to_radians());

        // Later rotations multiply from the left.
        match self {
            Self::EulerXYZ => z * y * x,
            Self::EulerXZY => y * z * x,
            Self::EulerYXZ => z * x * y,
            Self::EulerYZX => x * z * y,
            Self::EulerZXY => y * x * z,
            Self::EulerZYX => x * y * z,
            Self::Quaternion => {
                let q = Quat::from_vec4(rotation);
                if q.length_squared() > f32::EPSILON {
                    q.normalize()
                } else {
                    Quat::IDENTITY
                }
            }
        }
    }
}

/// Transform component attached to at most one node.
///
/// Holds translation, rotation and scaling. The combined local matrix is
/// `T * S * R`; the inverse is built from reciprocal factors in reverse
/// order, so no general 4x4 inversion is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyTransform {
    pub(crate) node: NodeHandle,
    pub(crate) translation: Vec3,
    pub(crate) rotation: Vec4,
    pub(crate) rotation_type: RotationType,
    pub(crate) scaling: Vec3,
}

impl Default for TopologyTransform {
    fn default() -> Self {
        Self {
            node: NodeHandle::invalid(),
            translation: Vec3::ZERO,
            rotation: Vec4::W,
            rotation_type: RotationType::default(),
            scaling: Vec3::ONE,
        }
    }
}

impl TopologyTransform {
    /// Node this transform is attached to.
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    #[inline]
    #[must_use]
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Vec4 {
        self.rotation
    }

    #[inline]
    #[must_use]
    pub fn rotation_type(&self) -> RotationType {
        self.rotation_type
    }

    #[inline]
    #[must_use]
    pub fn scaling(&self) -> Vec3 {
        self.scaling
    }

    /// Rotation as a unit quaternion.
    #[inline]
    #[must_use]
    pub fn rotation_quat(&self) -> Quat {
        self.rotation_type.to_quat(self.rotation)
    }

    /// Local matrix `T * S * R`.
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_scale(self.scaling)
            * Mat4::from_quat(self.rotation_quat())
    }

    /// Inverse local matrix `R^-1 * S^-1 * T^-1`.
    ///
    /// A zero scaling component yields non-finite values, matching what a
    /// singular local matrix would produce.
    #[must_use]
    pub fn inverse_local_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation_quat().conjugate())
            * Mat4::from_scale(self.scaling.recip())
            * Mat4::from_translation(-self.translation)
    }
}
