//! Mass and inertia container.

use nalgebra::{Matrix3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::StateError;

/// Mass properties of a rigid body.
///
/// Contains mass, center of mass offset, and the inertia tensor about the
/// center of mass in local coordinates. Computing these from shape geometry
/// is an external concern; this type only stores and inverts them.
///
/// A non-positive or infinite mass encodes a static (immovable) body, for
/// which the inverse mass and inverse inertia are zero.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassProperties {
    /// Total mass in kg.
    pub mass: f64,
    /// Center of mass offset from body origin in local coordinates.
    pub center_of_mass: Vector3<f64>,
    /// Inertia tensor about center of mass in local coordinates (kg·m²).
    pub inertia: Matrix3<f64>,
}

impl MassProperties {
    /// Create mass properties with given values.
    #[must_use]
    pub const fn new(mass: f64, center_of_mass: Vector3<f64>, inertia: Matrix3<f64>) -> Self {
        Self {
            mass,
            center_of_mass,
            inertia,
        }
    }

    /// Create mass properties for a point mass at the origin.
    #[must_use]
    pub fn point_mass(mass: f64) -> Self {
        Self {
            mass,
            center_of_mass: Vector3::zeros(),
            inertia: Matrix3::identity(),
        }
    }

    /// Create mass properties for a static (immovable) body.
    #[must_use]
    pub fn static_body() -> Self {
        Self {
            mass: f64::INFINITY,
            center_of_mass: Vector3::zeros(),
            inertia: Matrix3::identity(),
        }
    }

    /// Get the inverse mass (0 if mass is infinite/static).
    #[must_use]
    pub fn inverse_mass(&self) -> f64 {
        if self.mass <= 0.0 || self.mass.is_infinite() {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Get the inverse inertia tensor in local coordinates.
    ///
    /// Returns the zero matrix for static bodies or singular inertia.
    #[must_use]
    pub fn inverse_inertia(&self) -> Matrix3<f64> {
        if self.is_static() {
            return Matrix3::zeros();
        }
        self.inertia.try_inverse().unwrap_or_else(Matrix3::zeros)
    }

    /// Check if this represents a static (immovable) body.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.mass <= 0.0 || self.mass.is_infinite()
    }

    /// Validate that the mass properties are physically valid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.mass < 0.0 {
            return Err(StateError::invalid_mass("mass cannot be negative"));
        }

        if !self.center_of_mass.iter().all(|x| x.is_finite()) {
            return Err(StateError::invalid_mass("center of mass must be finite"));
        }

        // Inertia must be positive semi-definite for physical bodies
        let eigenvalues = self.inertia.symmetric_eigenvalues();
        if eigenvalues.iter().any(|&e| e < -1e-10) {
            return Err(StateError::invalid_mass(
                "inertia tensor must be positive semi-definite",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inverse_mass() {
        let props = MassProperties::point_mass(2.0);
        assert_relative_eq!(props.inverse_mass(), 0.5, epsilon = 1e-12);
        assert!(!props.is_static());
    }

    #[test]
    fn test_static_body() {
        let props = MassProperties::static_body();
        assert!(props.is_static());
        assert_eq!(props.inverse_mass(), 0.0);
        assert_eq!(props.inverse_inertia(), Matrix3::zeros());
    }

    #[test]
    fn test_inverse_inertia() {
        let inertia = Matrix3::from_diagonal(&Vector3::new(2.0, 4.0, 8.0));
        let props = MassProperties::new(1.0, Vector3::zeros(), inertia);
        let inv = props.inverse_inertia();
        assert_relative_eq!(inv[(0, 0)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(inv[(1, 1)], 0.25, epsilon = 1e-12);
        assert_relative_eq!(inv[(2, 2)], 0.125, epsilon = 1e-12);
    }

    #[test]
    fn test_validation() {
        assert!(MassProperties::point_mass(1.0).validate().is_ok());
        assert!(MassProperties::static_body().validate().is_ok());

        let negative = MassProperties::new(-1.0, Vector3::zeros(), Matrix3::identity());
        assert!(negative.validate().is_err());

        let bad_inertia = MassProperties::new(
            1.0,
            Vector3::zeros(),
            Matrix3::from_diagonal(&Vector3::new(-1.0, 1.0, 1.0)),
        );
        assert!(bad_inertia.validate().is_err());
    }
}
