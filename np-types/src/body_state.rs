//! Momentum-primary kinematic snapshot of a rigid body.

use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::MassProperties;

/// Kinematic state of a rigid body at one instant.
///
/// The primary quantities are position, orientation, linear and angular
/// momentum, inverse mass, and the local-frame inverse inertia tensor.
/// Velocities and the world-frame inverse inertia are *derived* and
/// recomputed on demand from the primaries - they are never stored, so a
/// state blended by [`BodyState::interpolate`] automatically reports
/// consistent derived values. (Linearly interpolating a rotated inverse
/// inertia tensor would not be meaningful.)
///
/// Invariants: `inv_mass >= 0` (0 encodes infinite/static mass) and the
/// orientation is unit-norm.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyState {
    /// Position of the center of mass in world coordinates.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub orientation: UnitQuaternion<f64>,
    /// Linear momentum in world coordinates (kg·m/s).
    pub linear_momentum: Vector3<f64>,
    /// Angular momentum in world coordinates (kg·m²/s).
    pub angular_momentum: Vector3<f64>,
    /// Inverse mass (1/kg); 0 encodes a static body.
    pub inv_mass: f64,
    /// Inverse inertia tensor in the body's local frame.
    pub inv_inertia_local: Matrix3<f64>,
}

impl BodyState {
    /// Create a state at rest from an initial transform and mass properties.
    #[must_use]
    pub fn new(
        position: Point3<f64>,
        orientation: UnitQuaternion<f64>,
        props: &MassProperties,
    ) -> Self {
        Self {
            position,
            orientation,
            linear_momentum: Vector3::zeros(),
            angular_momentum: Vector3::zeros(),
            inv_mass: props.inverse_mass(),
            inv_inertia_local: props.inverse_inertia(),
        }
    }

    /// Linear velocity, derived from momentum: `v = p * m⁻¹`.
    #[must_use]
    pub fn linear_velocity(&self) -> Vector3<f64> {
        self.linear_momentum * self.inv_mass
    }

    /// Inverse inertia tensor in world coordinates: `R · I⁻¹ · Rᵀ`.
    #[must_use]
    pub fn inv_inertia_world(&self) -> Matrix3<f64> {
        let r = *self.orientation.to_rotation_matrix().matrix();
        r * self.inv_inertia_local * r.transpose()
    }

    /// Angular velocity, derived from momentum: `ω = I⁻¹_world · L`.
    #[must_use]
    pub fn angular_velocity(&self) -> Vector3<f64> {
        self.inv_inertia_world() * self.angular_momentum
    }

    /// Check if this represents a static (immovable) body.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0
    }

    /// Check if the state contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.orientation.coords.iter().all(|x| x.is_finite())
            && self.linear_momentum.iter().all(|x| x.is_finite())
            && self.angular_momentum.iter().all(|x| x.is_finite())
            && self.inv_mass.is_finite()
            && self.inv_inertia_local.iter().all(|x| x.is_finite())
    }

    /// Blend two snapshots of the same body for sub-step rendering.
    ///
    /// Position and both momenta are interpolated component-wise; the
    /// orientation is spherically interpolated (shortest arc). Inverse mass
    /// and local inverse inertia do not change between steps and pass
    /// through from `current`. `alpha` is clamped to `[0, 1]`; 0 reproduces
    /// `previous` and 1 reproduces `current`.
    #[must_use]
    pub fn interpolate(previous: &Self, current: &Self, alpha: f64) -> Self {
        let alpha = alpha.clamp(0.0, 1.0);
        Self {
            position: Point3::from(
                previous
                    .position
                    .coords
                    .lerp(&current.position.coords, alpha),
            ),
            orientation: previous.orientation.slerp(&current.orientation, alpha),
            linear_momentum: previous
                .linear_momentum
                .lerp(&current.linear_momentum, alpha),
            angular_momentum: previous
                .angular_momentum
                .lerp(&current.angular_momentum, alpha),
            inv_mass: current.inv_mass,
            inv_inertia_local: current.inv_inertia_local,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Unit;
    use proptest::prelude::*;

    fn sample_states() -> (BodyState, BodyState) {
        let props = MassProperties::new(
            2.0,
            Vector3::zeros(),
            Matrix3::from_diagonal(&Vector3::new(1.0, 2.0, 3.0)),
        );
        let mut previous = BodyState::new(
            Point3::new(0.0, 0.0, 0.0),
            UnitQuaternion::identity(),
            &props,
        );
        previous.linear_momentum = Vector3::new(2.0, 0.0, 0.0);
        previous.angular_momentum = Vector3::new(0.0, 1.0, 0.0);

        let mut current = previous;
        current.position = Point3::new(4.0, 2.0, 0.0);
        current.orientation =
            UnitQuaternion::from_axis_angle(&Unit::new_normalize(Vector3::z()), 1.0);
        current.linear_momentum = Vector3::new(6.0, 2.0, 0.0);
        current.angular_momentum = Vector3::new(0.0, 3.0, 2.0);
        (previous, current)
    }

    #[test]
    fn test_derived_velocities() {
        let (previous, _) = sample_states();
        // v = p / m = (2, 0, 0) / 2
        assert_relative_eq!(
            previous.linear_velocity(),
            Vector3::new(1.0, 0.0, 0.0),
            epsilon = 1e-12
        );
        // Identity orientation: ω = I⁻¹ L = (0, 1/2, 0)
        assert_relative_eq!(
            previous.angular_velocity(),
            Vector3::new(0.0, 0.5, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_inv_inertia_world_rotates_with_body() {
        let (_, current) = sample_states();
        let world = current.inv_inertia_world();
        // Similarity transform preserves eigenvalues (here: 1, 1/2, 1/3)
        let local_trace = current.inv_inertia_local.trace();
        assert_relative_eq!(world.trace(), local_trace, epsilon = 1e-10);
        // And must be symmetric
        assert_relative_eq!(world, world.transpose(), epsilon = 1e-10);
    }

    #[test]
    fn test_interpolation_boundaries() {
        let (previous, current) = sample_states();

        let at_zero = BodyState::interpolate(&previous, &current, 0.0);
        assert_relative_eq!(
            at_zero.position.coords,
            previous.position.coords,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            at_zero.linear_momentum,
            previous.linear_momentum,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            at_zero.angular_momentum,
            previous.angular_momentum,
            epsilon = 1e-12
        );
        assert!(at_zero.orientation.angle_to(&previous.orientation) < 1e-12);

        let at_one = BodyState::interpolate(&previous, &current, 1.0);
        assert_relative_eq!(
            at_one.position.coords,
            current.position.coords,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            at_one.linear_momentum,
            current.linear_momentum,
            epsilon = 1e-12
        );
        assert!(at_one.orientation.angle_to(&current.orientation) < 1e-12);

        // Mass fields pass through unchanged at both ends
        assert_eq!(at_zero.inv_mass, current.inv_mass);
        assert_eq!(at_one.inv_inertia_local, current.inv_inertia_local);
    }

    #[test]
    fn test_orientation_interpolation_is_spherical() {
        let props = MassProperties::point_mass(1.0);
        let previous = BodyState::new(Point3::origin(), UnitQuaternion::identity(), &props);

        let theta = 1.2;
        let mut current = previous;
        current.orientation =
            UnitQuaternion::from_axis_angle(&Unit::new_normalize(Vector3::z()), theta);

        let mid = BodyState::interpolate(&previous, &current, 0.5);
        // Halfway along the arc: rotation angle from `previous` is θ/2
        assert_relative_eq!(
            mid.orientation.angle_to(&previous.orientation),
            theta / 2.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_static_body() {
        let state = BodyState::new(
            Point3::origin(),
            UnitQuaternion::identity(),
            &MassProperties::static_body(),
        );
        assert!(state.is_static());
        assert_eq!(state.linear_velocity(), Vector3::zeros());
        assert_eq!(state.angular_velocity(), Vector3::zeros());
    }

    proptest! {
        #[test]
        fn prop_interpolation_stays_between_endpoints(alpha in 0.0f64..=1.0) {
            let (previous, current) = sample_states();
            let blended = BodyState::interpolate(&previous, &current, alpha);

            prop_assert!(blended.is_finite());
            for i in 0..3 {
                let lo = previous.position[i].min(current.position[i]);
                let hi = previous.position[i].max(current.position[i]);
                prop_assert!(blended.position[i] >= lo - 1e-12);
                prop_assert!(blended.position[i] <= hi + 1e-12);
            }
        }
    }
}
