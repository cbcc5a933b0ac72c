//! Support-point queries on shape cores.
//!
//! The support function returns the point of a shape's *core* (center point,
//! inner segment, or vertex hull) that is furthest in a given direction.
//! This is the primitive operation underlying GJK; margin inflation is
//! handled arithmetically by the caller, never by the support map.

use nalgebra::{Point3, Vector3};
use np_types::Pose;

use crate::shape::CollisionShape;

/// World-space support point of a shape's core in a world-space direction.
#[must_use]
pub fn support(shape: &CollisionShape, pose: &Pose, direction: &Vector3<f64>) -> Point3<f64> {
    match shape {
        // A sphere's core is its center point
        CollisionShape::Sphere { .. } => pose.position,
        CollisionShape::Capsule { half_height, .. } => {
            support_segment(pose, *half_height, direction)
        }
        CollisionShape::ConvexPolyhedron { data } => {
            support_vertices(pose, data.vertices(), direction)
        }
    }
}

/// Support point of a capsule's inner segment (local Y-axis).
fn support_segment(pose: &Pose, half_height: f64, direction: &Vector3<f64>) -> Point3<f64> {
    let local_dir = pose.inverse_transform_vector(direction);
    let local_end = if local_dir.y >= 0.0 {
        Point3::new(0.0, half_height, 0.0)
    } else {
        Point3::new(0.0, -half_height, 0.0)
    };
    pose.transform_point(&local_end)
}

/// Support point over a vertex set.
fn support_vertices(
    pose: &Pose,
    vertices: &[Point3<f64>],
    direction: &Vector3<f64>,
) -> Point3<f64> {
    // Transform the direction once instead of every vertex
    let local_dir = pose.inverse_transform_vector(direction);

    let mut max_dot = f64::NEG_INFINITY;
    let mut best = Point3::origin();
    for vertex in vertices {
        let dot = vertex.coords.dot(&local_dir);
        if dot > max_dot {
            max_dot = dot;
            best = *vertex;
        }
    }

    pose.transform_point(&best)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_sphere_core_is_center() {
        let shape = CollisionShape::sphere(2.0);
        let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
        let s = support(&shape, &pose, &Vector3::x());
        assert_relative_eq!(s.coords, Vector3::new(1.0, 2.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_capsule_segment_endpoints() {
        let shape = CollisionShape::capsule(0.5, 0.2);
        let pose = Pose::identity();

        let up = support(&shape, &pose, &Vector3::y());
        assert_relative_eq!(up.y, 0.5, epsilon = 1e-12);

        let down = support(&shape, &pose, &Vector3::new(0.3, -1.0, 0.0));
        assert_relative_eq!(down.y, -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_polyhedron_extreme_vertex() {
        let shape = CollisionShape::cuboid(Vector3::new(1.0, 2.0, 3.0));
        let pose = Pose::identity();

        let s = support(&shape, &pose, &Vector3::new(1.0, 1.0, 1.0).normalize());
        assert_relative_eq!(s.coords, Vector3::new(1.0, 2.0, 3.0), epsilon = 1e-12);

        let s = support(&shape, &pose, &-Vector3::x());
        assert_relative_eq!(s.x, -1.0, epsilon = 1e-12);
    }
}
