//! Contact points and manifolds.

use nalgebra::{Point3, Vector3};

/// Maximum number of points in a contact manifold.
pub const MAX_MANIFOLD_POINTS: usize = 4;

/// A single contact point between two shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPointInfo {
    /// Contact normal in world space (unit, from shape 1 toward shape 2).
    pub normal: Vector3<f64>,
    /// Penetration depth (>= 0; positive means overlapping inflated hulls).
    pub penetration: f64,
    /// Contact point on shape 1's surface, in shape 1's local frame.
    pub local_point1: Point3<f64>,
    /// Contact point on shape 2's surface, in shape 2's local frame.
    pub local_point2: Point3<f64>,
}

/// An immutable, ordered set of contact points sharing a near-common normal.
///
/// Produced once per colliding shape pair per frame and handed to the
/// constraint solver by value. Always holds 1 to [`MAX_MANIFOLD_POINTS`]
/// points.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactManifold {
    points: Vec<ContactPointInfo>,
}

impl ContactManifold {
    /// The contact points, in insertion order.
    #[must_use]
    pub fn points(&self) -> &[ContactPointInfo] {
        &self.points
    }

    /// Number of contact points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the manifold holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Accumulates contact points and finalizes into a [`ContactManifold`].
#[derive(Debug, Clone, Default)]
pub struct ManifoldBuilder {
    points: Vec<ContactPointInfo>,
}

impl ManifoldBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard all accumulated points.
    pub fn reset(&mut self) {
        self.points.clear();
    }

    /// Append a contact point.
    pub fn push(&mut self, point: ContactPointInfo) {
        debug_assert!(self.points.len() < MAX_MANIFOLD_POINTS);
        debug_assert!(point.penetration >= 0.0);
        self.points.push(point);
    }

    /// Number of accumulated points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no points have been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The first accumulated point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&ContactPointInfo> {
        self.points.first()
    }

    /// Finalize into an immutable manifold.
    ///
    /// Returns `None` if no points were accumulated.
    #[must_use]
    pub fn build(self) -> Option<ContactManifold> {
        if self.points.is_empty() {
            None
        } else {
            Some(ContactManifold {
                points: self.points,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn point(depth: f64) -> ContactPointInfo {
        ContactPointInfo {
            normal: Vector3::z(),
            penetration: depth,
            local_point1: Point3::origin(),
            local_point2: Point3::origin(),
        }
    }

    #[test]
    fn test_builder_accumulates() {
        let mut builder = ManifoldBuilder::new();
        assert!(builder.is_empty());

        builder.push(point(0.1));
        builder.push(point(0.2));
        assert_eq!(builder.len(), 2);
        assert_eq!(builder.first().unwrap().penetration, 0.1);

        let manifold = builder.build().unwrap();
        assert_eq!(manifold.len(), 2);
        assert_eq!(manifold.points()[1].penetration, 0.2);
    }

    #[test]
    fn test_builder_reset() {
        let mut builder = ManifoldBuilder::new();
        builder.push(point(0.1));
        builder.reset();
        assert!(builder.is_empty());
        assert!(builder.build().is_none());
    }
}
