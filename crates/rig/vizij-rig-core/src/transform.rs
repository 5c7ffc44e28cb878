//! Local/world joint transforms.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Translation, rotation (quat x, y, z, w) and scale of a joint relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn new(position: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 1.0],
        }
    }

    pub fn from_position(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Get rotation as nalgebra UnitQuaternion
    pub fn rotation_quaternion(&self) -> UnitQuaternion<f32> {
        let [x, y, z, w] = self.rotation;
        let q = Quaternion::new(w, x, y, z);
        if q.norm_squared() <= f32::EPSILON {
            UnitQuaternion::identity()
        } else {
            UnitQuaternion::new_normalize(q)
        }
    }

    /// Compose a child's local transform onto this (parent world) transform.
    ///
    /// Scale is propagated per axis (no shear), which matches how rigs are
    /// usually authored.
    pub fn compose(&self, local: &Transform) -> Transform {
        let parent_rot = self.rotation_quaternion();
        let scaled = Vector3::from(local.position).component_mul(&Vector3::from(self.scale));
        let position = Vector3::from(self.position) + parent_rot * scaled;
        let rotation = parent_rot * local.rotation_quaternion();
        let scale = Vector3::from(self.scale).component_mul(&Vector3::from(local.scale));
        Transform {
            position: position.into(),
            rotation: [rotation.i, rotation.j, rotation.k, rotation.w],
            scale: scale.into(),
        }
    }

    /// Angle in degrees between the rotations of two transforms.
    pub fn rotation_angle_deg(&self, other: &Transform) -> f32 {
        self.rotation_quaternion()
            .angle_to(&other.rotation_quaternion())
            .to_degrees()
    }

    /// Position scaled uniformly about the parent origin.
    pub fn with_scaled_position(&self, factor: f32) -> Transform {
        Transform {
            position: [
                self.position[0] * factor,
                self.position[1] * factor,
                self.position[2] * factor,
            ],
            ..*self
        }
    }
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    (Vector3::from(a) - Vector3::from(b)).norm()
}
