//! GJK (Gilbert-Johnson-Keerthi) distance and overlap classification.
//!
//! Works in Minkowski space (the Minkowski difference of the two shape
//! *cores*). The algorithm iteratively refines a simplex (point, segment,
//! triangle, tetrahedron) toward the point of the difference closest to the
//! origin, tracking witness points on both shapes through barycentric
//! coordinates of the supporting feature.
//!
//! Classification compares the core distance against the sum of the two
//! shapes' collision margins:
//!
//! - distance beyond the margin sum → [`GjkResult::Separated`]
//! - cores disjoint but inflated hulls touching → [`GjkResult::CollideInMargin`]
//!   with exactly one witness contact point
//! - simplex encloses the origin (cores overlap) → [`GjkResult::Interpenetrate`]
//!
//! Since every core here is polytopal (point, segment, or vertex hull), the
//! iteration terminates exactly when a support point repeats; the iteration
//! bound is a hard backstop against numerical cycling.
//!
//! # References
//!
//! - Gilbert, Johnson, Keerthi: "A Fast Procedure for Computing the Distance
//!   Between Complex Objects in Three-Dimensional Space" (1988)
//! - van den Bergen: "Collision Detection in Interactive 3D Environments" (2003)

use nalgebra::{Point3, Vector3};
use np_types::Pose;
use tracing::warn;

use crate::manifold::ContactPointInfo;
use crate::shape::CollisionShape;
use crate::support::support;

/// Maximum iterations before giving up on refinement.
const GJK_MAX_ITERATIONS: usize = 64;

/// Relative convergence tolerance on the squared distance.
const GJK_REL_TOLERANCE: f64 = 1e-10;

/// Squared tolerance for duplicate support points.
const DUPLICATE_EPSILON_SQ: f64 = 1e-24;

/// Core distances below this count as touching (classified as deep overlap,
/// since no separating normal can be recovered).
const CONTACT_EPSILON: f64 = 1e-9;

/// Result of a GJK query over a shape pair.
#[derive(Debug, Clone)]
pub enum GjkResult {
    /// The margin-inflated hulls do not touch.
    Separated {
        /// Gap between the inflated hulls (> 0).
        distance: f64,
    },
    /// Cores are disjoint but the inflated hulls overlap (shallow contact).
    CollideInMargin(ContactPointInfo),
    /// The cores themselves overlap (deep contact); no witness is produced.
    Interpenetrate,
}

/// A point in Minkowski space with the support points that produced it.
#[derive(Debug, Clone, Copy)]
struct SupportPoint {
    /// `on_a - on_b`.
    w: Vector3<f64>,
    /// Support point on shape 1's core, world space.
    on_a: Point3<f64>,
    /// Support point on shape 2's core, world space.
    on_b: Point3<f64>,
}

/// Closest point of the current simplex to the origin.
#[derive(Debug, Clone, Copy)]
struct Closest {
    point: Vector3<f64>,
    on_a: Point3<f64>,
    on_b: Point3<f64>,
    enclosed: bool,
}

/// The GJK simplex: 1 to 4 Minkowski points.
#[derive(Debug, Clone, Default)]
struct Simplex {
    points: Vec<SupportPoint>,
}

fn support_minkowski(
    shape1: &CollisionShape,
    pose1: &Pose,
    shape2: &CollisionShape,
    pose2: &Pose,
    direction: &Vector3<f64>,
) -> SupportPoint {
    let on_a = support(shape1, pose1, direction);
    let on_b = support(shape2, pose2, &-direction);
    SupportPoint {
        w: on_a - on_b,
        on_a,
        on_b,
    }
}

/// Classify a shape pair by core distance versus margin sum.
#[must_use]
pub fn test(
    shape1: &CollisionShape,
    pose1: &Pose,
    shape2: &CollisionShape,
    pose2: &Pose,
) -> GjkResult {
    let margin1 = shape1.margin();
    let margin2 = shape2.margin();

    // Initial direction: between the shape origins
    let mut direction = pose2.position - pose1.position;
    if direction.norm_squared() < DUPLICATE_EPSILON_SQ {
        direction = Vector3::x();
    }

    let mut simplex = Simplex::default();
    simplex
        .points
        .push(support_minkowski(shape1, pose1, shape2, pose2, &direction));

    let mut closest = simplex.closest_to_origin();

    for iteration in 0..GJK_MAX_ITERATIONS {
        if closest.enclosed {
            return GjkResult::Interpenetrate;
        }
        let dist_sq = closest.point.norm_squared();
        if dist_sq < CONTACT_EPSILON * CONTACT_EPSILON {
            // Origin on the simplex: cores touch
            return GjkResult::Interpenetrate;
        }

        let candidate = support_minkowski(shape1, pose1, shape2, pose2, &-closest.point);

        // Lower-bound convergence: the new support cannot get closer
        if dist_sq - closest.point.dot(&candidate.w) <= GJK_REL_TOLERANCE * dist_sq {
            break;
        }
        // Polytopal cores: a repeated support point means the closest
        // feature is final. Also covers near-degenerate simplices.
        if simplex.contains(&candidate.w) {
            break;
        }

        simplex.points.push(candidate);
        closest = simplex.closest_to_origin();

        if iteration + 1 == GJK_MAX_ITERATIONS {
            warn!(
                iterations = GJK_MAX_ITERATIONS,
                "GJK hit iteration bound, using best simplex"
            );
        }
    }

    classify(&closest, pose1, margin1, pose2, margin2)
}

fn classify(
    closest: &Closest,
    pose1: &Pose,
    margin1: f64,
    pose2: &Pose,
    margin2: f64,
) -> GjkResult {
    if closest.enclosed {
        return GjkResult::Interpenetrate;
    }
    let distance = closest.point.norm();
    if distance < CONTACT_EPSILON {
        return GjkResult::Interpenetrate;
    }

    let margin_sum = margin1 + margin2;
    if distance >= margin_sum {
        return GjkResult::Separated {
            distance: distance - margin_sum,
        };
    }

    // closest.point = on_a - on_b, so shape1 -> shape2 runs against it
    let normal = -closest.point / distance;
    let point1_world = closest.on_a + normal * margin1;
    let point2_world = closest.on_b - normal * margin2;

    GjkResult::CollideInMargin(ContactPointInfo {
        normal,
        penetration: margin_sum - distance,
        local_point1: pose1.inverse_transform_point(&point1_world),
        local_point2: pose2.inverse_transform_point(&point2_world),
    })
}

impl Simplex {
    fn contains(&self, w: &Vector3<f64>) -> bool {
        self.points
            .iter()
            .any(|p| (p.w - w).norm_squared() < DUPLICATE_EPSILON_SQ)
    }

    /// Closest point of the simplex to the origin, reducing the simplex to
    /// the supporting feature.
    fn closest_to_origin(&mut self) -> Closest {
        match self.points.len() {
            1 => self.combine(&[0], &[1.0]),
            2 => {
                let (bary, keep) = segment_barycentrics(&self.points[0].w, &self.points[1].w);
                self.reduce(&[0, 1], &bary, &keep)
            }
            3 => {
                let (bary, keep) = triangle_barycentrics(
                    &self.points[0].w,
                    &self.points[1].w,
                    &self.points[2].w,
                );
                self.reduce(&[0, 1, 2], &bary, &keep)
            }
            _ => self.closest_on_tetrahedron(),
        }
    }

    fn closest_on_tetrahedron(&mut self) -> Closest {
        let w = [
            self.points[0].w,
            self.points[1].w,
            self.points[2].w,
            self.points[3].w,
        ];

        // Each face with its opposite vertex
        const FACES: [[usize; 4]; 4] = [[0, 1, 2, 3], [0, 1, 3, 2], [0, 2, 3, 1], [1, 2, 3, 0]];

        let mut best: Option<(f64, [usize; 3], [f64; 3], [bool; 3])> = None;
        for [i, j, k, l] in FACES {
            let n = (w[j] - w[i]).cross(&(w[k] - w[i]));
            let origin_side = -w[i].dot(&n);
            let opposite_side = (w[l] - w[i]).dot(&n);

            // Origin strictly inside lies on the same side as the opposite
            // vertex for all faces. Flat tetrahedra evaluate every face.
            let outside = origin_side * opposite_side < 0.0 || opposite_side.abs() < 1e-24;
            if !outside {
                continue;
            }

            let (bary, keep) = triangle_barycentrics(&w[i], &w[j], &w[k]);
            let closest = w[i] * bary[0] + w[j] * bary[1] + w[k] * bary[2];
            let dist_sq = closest.norm_squared();
            if best.map_or(true, |(b, _, _, _)| dist_sq < b) {
                best = Some((dist_sq, [i, j, k], bary, keep));
            }
        }

        match best {
            None => Closest {
                point: Vector3::zeros(),
                on_a: self.points[0].on_a,
                on_b: self.points[0].on_b,
                enclosed: true,
            },
            Some((_, indices, bary, keep)) => self.reduce(&indices, &bary, &keep),
        }
    }

    /// Keep only the supporting vertices and blend witnesses by barycentrics.
    fn reduce(&mut self, indices: &[usize], bary: &[f64], keep: &[bool]) -> Closest {
        let mut kept_indices = Vec::with_capacity(indices.len());
        let mut kept_bary = Vec::with_capacity(indices.len());
        for (slot, &index) in indices.iter().enumerate() {
            if keep[slot] {
                kept_indices.push(index);
                kept_bary.push(bary[slot]);
            }
        }
        let result = self.combine(&kept_indices, &kept_bary);
        let kept_points: Vec<SupportPoint> =
            kept_indices.iter().map(|&i| self.points[i]).collect();
        self.points = kept_points;
        result
    }

    fn combine(&self, indices: &[usize], bary: &[f64]) -> Closest {
        let mut point = Vector3::zeros();
        let mut on_a = Vector3::zeros();
        let mut on_b = Vector3::zeros();
        for (&index, &weight) in indices.iter().zip(bary) {
            point += self.points[index].w * weight;
            on_a += self.points[index].on_a.coords * weight;
            on_b += self.points[index].on_b.coords * weight;
        }
        Closest {
            point,
            on_a: Point3::from(on_a),
            on_b: Point3::from(on_b),
            enclosed: false,
        }
    }
}

/// Barycentric coordinates of the origin's closest point on segment AB,
/// with a keep mask for the supporting vertices.
fn segment_barycentrics(a: &Vector3<f64>, b: &Vector3<f64>) -> ([f64; 2], [bool; 2]) {
    let ab = b - a;
    let denom = ab.norm_squared();
    if denom < DUPLICATE_EPSILON_SQ {
        return ([1.0, 0.0], [true, false]);
    }
    let t = -a.dot(&ab) / denom;
    if t <= 0.0 {
        ([1.0, 0.0], [true, false])
    } else if t >= 1.0 {
        ([0.0, 1.0], [false, true])
    } else {
        ([1.0 - t, t], [true, true])
    }
}

/// Barycentric coordinates of the origin's closest point on triangle ABC.
///
/// Voronoi-region case analysis (Ericson, "Real-Time Collision Detection").
fn triangle_barycentrics(
    a: &Vector3<f64>,
    b: &Vector3<f64>,
    c: &Vector3<f64>,
) -> ([f64; 3], [bool; 3]) {
    let ab = b - a;
    let ac = c - a;
    let ap = -a;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return ([1.0, 0.0, 0.0], [true, false, false]);
    }

    let bp = -b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return ([0.0, 1.0, 0.0], [false, true, false]);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let t = d1 / (d1 - d3);
        return ([1.0 - t, t, 0.0], [true, true, false]);
    }

    let cp = -c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return ([0.0, 0.0, 1.0], [false, false, true]);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let t = d2 / (d2 - d6);
        return ([1.0 - t, 0.0, t], [true, false, true]);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let t = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return ([0.0, 1.0 - t, t], [false, true, true]);
    }

    let denom_sum = va + vb + vc;
    if denom_sum.abs() < 1e-30 {
        // Collinear triangle: fall back to the best edge
        return collinear_triangle_fallback(a, b, c);
    }
    let v = vb / denom_sum;
    let w = vc / denom_sum;
    ([1.0 - v - w, v, w], [true, true, true])
}

/// Closest point over the three edges of a degenerate (collinear) triangle.
fn collinear_triangle_fallback(
    a: &Vector3<f64>,
    b: &Vector3<f64>,
    c: &Vector3<f64>,
) -> ([f64; 3], [bool; 3]) {
    let edges: [(usize, usize, &Vector3<f64>, &Vector3<f64>); 3] =
        [(0, 1, a, b), (0, 2, a, c), (1, 2, b, c)];

    let mut best_dist = f64::INFINITY;
    let mut bary = [1.0, 0.0, 0.0];
    let mut keep = [true, false, false];
    for (i, j, p, q) in edges {
        let (edge_bary, edge_keep) = segment_barycentrics(p, q);
        let closest = p * edge_bary[0] + q * edge_bary[1];
        let dist_sq = closest.norm_squared();
        if dist_sq < best_dist {
            best_dist = dist_sq;
            bary = [0.0; 3];
            keep = [false; 3];
            bary[i] = edge_bary[0];
            bary[j] = edge_bary[1];
            keep[i] = edge_keep[0];
            keep[j] = edge_keep[1];
        }
    }
    (bary, keep)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pose_at(x: f64, y: f64, z: f64) -> Pose {
        Pose::from_position(Point3::new(x, y, z))
    }

    #[test]
    fn test_spheres_separated() {
        let a = CollisionShape::sphere(0.5);
        let b = CollisionShape::sphere(0.5);
        let result = test(&a, &pose_at(0.0, 0.0, 0.0), &b, &pose_at(3.0, 0.0, 0.0));
        match result {
            GjkResult::Separated { distance } => {
                assert_relative_eq!(distance, 2.0, epsilon = 1e-9);
            }
            other => panic!("expected Separated, got {other:?}"),
        }
    }

    #[test]
    fn test_spheres_in_margin() {
        let a = CollisionShape::sphere(0.5);
        let b = CollisionShape::sphere(0.5);
        let result = test(&a, &pose_at(0.0, 0.0, 0.0), &b, &pose_at(0.8, 0.0, 0.0));
        match result {
            GjkResult::CollideInMargin(contact) => {
                assert_relative_eq!(contact.penetration, 0.2, epsilon = 1e-9);
                assert_relative_eq!(contact.normal, Vector3::x(), epsilon = 1e-9);
                // Witness on each sphere's surface (poses are translations)
                assert_relative_eq!(contact.local_point1.x, 0.5, epsilon = 1e-9);
                assert_relative_eq!(contact.local_point2.x, -0.5, epsilon = 1e-9);
            }
            other => panic!("expected CollideInMargin, got {other:?}"),
        }
    }

    #[test]
    fn test_coincident_sphere_centers_interpenetrate() {
        let a = CollisionShape::sphere(0.5);
        let b = CollisionShape::sphere(0.5);
        let result = test(&a, &pose_at(0.0, 0.0, 0.0), &b, &pose_at(0.0, 0.0, 0.0));
        assert!(matches!(result, GjkResult::Interpenetrate));
    }

    #[test]
    fn test_capsule_above_box_in_margin() {
        // Capsule lying along Y, core segment at z = 0.65, above a box whose
        // top face is z = 0.5. Core gap 0.15 < margin sum 0.24.
        let capsule = CollisionShape::capsule(0.5, 0.2);
        let cuboid = CollisionShape::cuboid(Vector3::new(1.0, 1.0, 0.5));
        let result = test(
            &capsule,
            &pose_at(0.0, 0.0, 0.65),
            &cuboid,
            &pose_at(0.0, 0.0, 0.0),
        );
        match result {
            GjkResult::CollideInMargin(contact) => {
                assert_relative_eq!(contact.penetration, 0.09, epsilon = 1e-9);
                assert_relative_eq!(contact.normal, -Vector3::z(), epsilon = 1e-9);
            }
            other => panic!("expected CollideInMargin, got {other:?}"),
        }
    }

    #[test]
    fn test_capsule_inside_box_interpenetrates() {
        let capsule = CollisionShape::capsule(0.5, 0.2);
        let cuboid = CollisionShape::cuboid(Vector3::new(1.0, 1.0, 0.5));
        let result = test(
            &capsule,
            &pose_at(0.0, 0.0, 0.2),
            &cuboid,
            &pose_at(0.0, 0.0, 0.0),
        );
        assert!(matches!(result, GjkResult::Interpenetrate));
    }

    #[test]
    fn test_boxes_separated_along_diagonal() {
        let a = CollisionShape::cuboid(Vector3::new(0.5, 0.5, 0.5));
        let b = CollisionShape::cuboid(Vector3::new(0.5, 0.5, 0.5));
        let result = test(&a, &pose_at(0.0, 0.0, 0.0), &b, &pose_at(2.0, 2.0, 2.0));
        assert!(matches!(result, GjkResult::Separated { .. }));
    }

    #[test]
    fn test_triangle_barycentrics_interior() {
        // Origin projects inside this triangle (z = -1 plane around origin)
        let a = Vector3::new(-1.0, -1.0, -1.0);
        let b = Vector3::new(2.0, -1.0, -1.0);
        let c = Vector3::new(-1.0, 2.0, -1.0);
        let (bary, keep) = triangle_barycentrics(&a, &b, &c);
        assert!(keep.iter().all(|&k| k));
        let closest = a * bary[0] + b * bary[1] + c * bary[2];
        assert_relative_eq!(closest, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-9);
    }

    #[test]
    fn test_segment_barycentrics_clamps() {
        let a = Vector3::new(1.0, 0.0, 0.0);
        let b = Vector3::new(2.0, 0.0, 0.0);
        let (bary, keep) = segment_barycentrics(&a, &b);
        // Origin is beyond endpoint A
        assert_eq!(bary, [1.0, 0.0]);
        assert_eq!(keep, [true, false]);
    }
}
