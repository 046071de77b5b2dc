//! SE3: 6-DOF rigid transformation (rotation + translation).
//!
//! Poses in the map follow the `a_tform_b` naming convention: an `SE3`
//! named `world_tform_waypoint` maps points expressed in the waypoint frame
//! into the world frame:
//!
//! ```text
//! p_world = world_tform_waypoint * p_waypoint
//! ```

use nalgebra::{Matrix3, Matrix4, Quaternion, UnitQuaternion, Vector3};

/// Quaternions with a norm below this are treated as "unset" and read as identity.
const DEGENERATE_QUATERNION_NORM: f64 = 1e-12;

/// Rigid transformation: p' = R * p + t.
#[derive(Debug, Clone, PartialEq)]
pub struct SE3 {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl SE3 {
    /// Identity transformation.
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Construct from quaternion (w, x, y, z) and translation.
    ///
    /// The quaternion is normalized. An all-zero quaternion, which is what an
    /// absent rotation field decodes to, yields the identity rotation.
    pub fn from_quaternion(qw: f64, qx: f64, qy: f64, qz: f64, translation: Vector3<f64>) -> Self {
        let q = Quaternion::new(qw, qx, qy, qz);
        let rotation = if q.norm() < DEGENERATE_QUATERNION_NORM {
            UnitQuaternion::identity()
        } else {
            UnitQuaternion::from_quaternion(q)
        };
        Self {
            rotation,
            translation,
        }
    }

    /// Convert to homogeneous 4x4 matrix [R | t; 0 0 0 1].
    pub fn to_matrix(&self) -> Matrix4<f64> {
        let mut mat = Matrix4::identity();
        mat.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&self.rotation_matrix());
        mat.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        mat
    }

    /// Inverse transformation: [R^T | -R^T t].
    pub fn inverse(&self) -> Self {
        let rot_inv = self.rotation.inverse();
        Self {
            rotation: rot_inv,
            translation: -(rot_inv * self.translation),
        }
    }

    /// Compose two transforms: self ∘ other.
    ///
    /// For T1 = [R1 | t1] and T2 = [R2 | t2]:
    /// T1 ∘ T2 = [R1*R2 | R1*t2 + t1]
    pub fn compose(&self, other: &SE3) -> Self {
        Self {
            rotation: self.rotation * other.rotation,
            translation: self.rotation * other.translation + self.translation,
        }
    }

    /// Get the rotation matrix.
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.rotation.to_rotation_matrix().into_inner()
    }

    /// Translation as a plain `[x, y, z]` array, the shape positions take on the wire.
    pub fn position(&self) -> [f64; 3] {
        [self.translation.x, self.translation.y, self.translation.z]
    }
}

impl Default for SE3 {
    fn default() -> Self {
        Self::identity()
    }
}
