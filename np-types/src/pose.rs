//! Position + orientation transform.

use nalgebra::{Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position and orientation of a rigid body or collision shape.
///
/// Represents a rigid transform in 3D space using a position vector and a
/// unit quaternion. Poses compose via [`Pose::compose`] and invert via
/// [`Pose::inverse`]; they map shape-local points and vectors to world space
/// and, via composition with an inverse, between two shapes' local frames.
///
/// # Example
///
/// ```
/// use np_types::Pose;
/// use nalgebra::Point3;
///
/// let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
/// let world = pose.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert_eq!(world, Point3::new(2.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position in world coordinates.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create an identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position and rotation.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }

    /// Transform a point from local to world coordinates.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Transform a vector from local to world coordinates (rotation only).
    #[must_use]
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * local
    }

    /// Transform a point from world to local coordinates.
    #[must_use]
    pub fn inverse_transform_point(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse() * (world - self.position))
    }

    /// Transform a vector from world to local coordinates.
    #[must_use]
    pub fn inverse_transform_vector(&self, world: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse() * world
    }

    /// Compute the inverse pose.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        Self {
            position: Point3::from(-(inv_rotation * self.position.coords)),
            rotation: inv_rotation,
        }
    }

    /// Compose two poses: self * other.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            position: self.transform_point(&other.position),
            rotation: self.rotation * other.rotation,
        }
    }

    /// Linear interpolation between two poses.
    ///
    /// Uses SLERP for rotation interpolation. `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            position: Point3::from(self.position.coords.lerp(&other.position.coords, t)),
            rotation: self.rotation.slerp(&other.rotation, t),
        }
    }

    /// Check if the pose contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pose_identity() {
        let pose = Pose::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        let transformed = pose.transform_point(&p);
        assert_relative_eq!(transformed.coords, p.coords, epsilon = 1e-10);
    }

    #[test]
    fn test_pose_rotation() {
        // 90 degree rotation around Z
        let pose = Pose::from_position_rotation(
            Point3::origin(),
            UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        );

        let world = pose.transform_vector(&Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(world.x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(world.y, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_pose_inverse() {
        let pose = Pose::from_position_rotation(
            Point3::new(1.0, 2.0, 3.0),
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
        );

        let composed = pose.compose(&pose.inverse());
        assert_relative_eq!(composed.position.coords, Vector3::zeros(), epsilon = 1e-10);
        assert!(composed.rotation.angle() < 1e-10);
    }

    #[test]
    fn test_inverse_transform_round_trip() {
        let pose = Pose::from_position_rotation(
            Point3::new(-2.0, 0.5, 4.0),
            UnitQuaternion::from_euler_angles(0.4, -0.2, 1.1),
        );

        let p = Point3::new(0.3, -1.0, 2.0);
        let back = pose.inverse_transform_point(&pose.transform_point(&p));
        assert_relative_eq!(back.coords, p.coords, epsilon = 1e-10);

        let v = Vector3::new(1.0, 2.0, -0.5);
        let back = pose.inverse_transform_vector(&pose.transform_vector(&v));
        assert_relative_eq!(back, v, epsilon = 1e-10);
    }

    #[test]
    fn test_pose_lerp() {
        let p1 = Pose::from_position(Point3::new(0.0, 0.0, 0.0));
        let p2 = Pose::from_position(Point3::new(10.0, 0.0, 0.0));

        let mid = p1.lerp(&p2, 0.5);
        assert_relative_eq!(mid.position.x, 5.0, epsilon = 1e-10);

        // Clamped outside [0, 1]
        let over = p1.lerp(&p2, 1.5);
        assert_relative_eq!(over.position.x, 10.0, epsilon = 1e-10);
    }
}
