//! Collision shape variants for narrow-phase detection.
//!
//! Shapes are a closed tagged variant; every shape-pair algorithm is a
//! function over two [`ShapeType`] tags selected by the dispatch table in
//! [`crate::narrow`]. Each shape splits into a *core* (point, segment, or
//! vertex set) and a *margin*: a small inflation distance around the core
//! surface. GJK measures distance between cores and compares against the
//! margin sum, which detects near-contact before exact penetration.

use std::sync::Arc;

use nalgebra::{Point3, Vector3};
use np_types::Pose;

use crate::half_edge::ConvexPolyhedronData;

/// Collision margin around a convex polyhedron's core hull, in meters.
///
/// Capsules and spheres use their radius as the margin (their core is the
/// inner segment / center point); polyhedra use this fixed inflation so that
/// shallow contacts are classified before the hulls themselves overlap.
pub const POLYHEDRON_MARGIN: f64 = 0.04;

/// Shape variant tag used for dispatch-table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    /// Sphere.
    Sphere,
    /// Capsule.
    Capsule,
    /// Convex polyhedron.
    ConvexPolyhedron,
}

/// Convex collision shape for a body.
///
/// Shapes are owned by bodies/the world; collision routines only read them.
/// Polyhedron data sits behind an [`Arc`] so several bodies can share one
/// hull.
#[derive(Debug, Clone)]
pub enum CollisionShape {
    /// Sphere with given radius.
    Sphere {
        /// Sphere radius in meters.
        radius: f64,
    },
    /// Capsule (segment with hemispherical caps).
    ///
    /// The inner segment runs along the local Y-axis from `-half_height`
    /// to `+half_height`.
    Capsule {
        /// Half-length of the inner segment along the Y-axis.
        half_height: f64,
        /// Radius of the capsule.
        radius: f64,
    },
    /// Convex polyhedron with half-edge topology.
    ConvexPolyhedron {
        /// The shared polyhedron data.
        data: Arc<ConvexPolyhedronData>,
    },
}

impl CollisionShape {
    /// Create a sphere shape.
    #[must_use]
    pub fn sphere(radius: f64) -> Self {
        Self::Sphere { radius }
    }

    /// Create a capsule shape.
    #[must_use]
    pub fn capsule(half_height: f64, radius: f64) -> Self {
        Self::Capsule {
            half_height,
            radius,
        }
    }

    /// Create a convex polyhedron shape.
    #[must_use]
    pub fn convex_polyhedron(data: Arc<ConvexPolyhedronData>) -> Self {
        Self::ConvexPolyhedron { data }
    }

    /// Create an axis-aligned box polyhedron with the given half-extents.
    #[must_use]
    pub fn cuboid(half_extents: Vector3<f64>) -> Self {
        Self::ConvexPolyhedron {
            data: Arc::new(ConvexPolyhedronData::cuboid(half_extents)),
        }
    }

    /// The variant tag of this shape.
    #[must_use]
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Self::Sphere { .. } => ShapeType::Sphere,
            Self::Capsule { .. } => ShapeType::Capsule,
            Self::ConvexPolyhedron { .. } => ShapeType::ConvexPolyhedron,
        }
    }

    /// The collision margin inflating this shape's core.
    #[must_use]
    pub fn margin(&self) -> f64 {
        match self {
            Self::Sphere { radius } | Self::Capsule { radius, .. } => *radius,
            Self::ConvexPolyhedron { .. } => POLYHEDRON_MARGIN,
        }
    }

    /// The world-space endpoints of a capsule's inner segment.
    ///
    /// Returns `None` if this shape is not a capsule.
    #[must_use]
    pub fn capsule_segment(&self, pose: &Pose) -> Option<(Point3<f64>, Point3<f64>)> {
        match self {
            Self::Capsule { half_height, .. } => {
                let local_start = Point3::new(0.0, -*half_height, 0.0);
                let local_end = Point3::new(0.0, *half_height, 0.0);
                Some((
                    pose.transform_point(&local_start),
                    pose.transform_point(&local_end),
                ))
            }
            _ => None,
        }
    }

    /// Borrow the polyhedron data, if this shape is a polyhedron.
    #[must_use]
    pub fn polyhedron(&self) -> Option<&ConvexPolyhedronData> {
        match self {
            Self::ConvexPolyhedron { data } => Some(data),
            _ => None,
        }
    }
}
