//! Previous/current state pair with render-rate blending.

use crate::BodyState;

/// A rigid body's kinematic state across two sequential simulation steps.
///
/// The integrator overwrites both snapshots each step via [`RigidBody::advance`]
/// (previous ← current, current ← integrated result). The renderer queries a
/// blended state with a frame-local factor; queries never mutate the body.
/// This avoids visual stuttering when the display and physics step rates are
/// out of sync.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBody {
    previous: BodyState,
    current: BodyState,
    interpolation_factor: f64,
}

impl RigidBody {
    /// Create a body with both snapshots set to the initial state.
    #[must_use]
    pub fn new(initial: BodyState) -> Self {
        Self {
            previous: initial,
            current: initial,
            interpolation_factor: 0.0,
        }
    }

    /// The state at the current simulation step.
    #[must_use]
    pub fn current(&self) -> &BodyState {
        &self.current
    }

    /// The state at the previous simulation step.
    #[must_use]
    pub fn previous(&self) -> &BodyState {
        &self.previous
    }

    /// Record the integrated state for a new simulation step.
    ///
    /// The old current state becomes the previous state.
    pub fn advance(&mut self, next: BodyState) {
        self.previous = self.current;
        self.current = next;
    }

    /// Set the blend factor used by [`RigidBody::interpolated_state`].
    ///
    /// The factor is clamped to `[0, 1]`.
    pub fn set_interpolation_factor(&mut self, alpha: f64) {
        self.interpolation_factor = alpha.clamp(0.0, 1.0);
    }

    /// The blend factor set for the current display frame.
    #[must_use]
    pub fn interpolation_factor(&self) -> f64 {
        self.interpolation_factor
    }

    /// Blended state at the stored interpolation factor.
    #[must_use]
    pub fn interpolated_state(&self) -> BodyState {
        BodyState::interpolate(&self.previous, &self.current, self.interpolation_factor)
    }

    /// Blended state at a caller-supplied frame-local factor.
    #[must_use]
    pub fn interpolated_state_at(&self, alpha: f64) -> BodyState {
        BodyState::interpolate(&self.previous, &self.current, alpha)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::MassProperties;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, UnitQuaternion, Vector3};

    fn body_at(x: f64) -> BodyState {
        BodyState::new(
            Point3::new(x, 0.0, 0.0),
            UnitQuaternion::identity(),
            &MassProperties::point_mass(1.0),
        )
    }

    #[test]
    fn test_advance_shifts_snapshots() {
        let mut body = RigidBody::new(body_at(0.0));
        body.advance(body_at(1.0));
        assert_eq!(body.previous().position.x, 0.0);
        assert_eq!(body.current().position.x, 1.0);

        body.advance(body_at(2.0));
        assert_eq!(body.previous().position.x, 1.0);
        assert_eq!(body.current().position.x, 2.0);
    }

    #[test]
    fn test_interpolated_state() {
        let mut body = RigidBody::new(body_at(0.0));
        body.advance(body_at(10.0));

        body.set_interpolation_factor(0.25);
        let blended = body.interpolated_state();
        assert_relative_eq!(blended.position.x, 2.5, epsilon = 1e-12);

        // Query never mutates the snapshots
        assert_eq!(body.previous().position.x, 0.0);
        assert_eq!(body.current().position.x, 10.0);
    }

    #[test]
    fn test_interpolated_state_at_clamps() {
        let mut body = RigidBody::new(body_at(0.0));
        body.advance(body_at(4.0));

        assert_relative_eq!(body.interpolated_state_at(-1.0).position.x, 0.0);
        assert_relative_eq!(body.interpolated_state_at(2.0).position.x, 4.0);
    }

    #[test]
    fn test_momentum_blending() {
        let mut start = body_at(0.0);
        start.linear_momentum = Vector3::new(0.0, 0.0, 0.0);
        let mut end = start;
        end.linear_momentum = Vector3::new(2.0, 0.0, 0.0);

        let mut body = RigidBody::new(start);
        body.advance(end);

        let blended = body.interpolated_state_at(0.5);
        assert_relative_eq!(blended.linear_momentum.x, 1.0, epsilon = 1e-12);
        // Derived velocity follows the blended momentum
        assert_relative_eq!(blended.linear_velocity().x, 1.0, epsilon = 1e-12);
    }
}
