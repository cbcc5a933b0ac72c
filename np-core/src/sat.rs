//! SAT (separating-axis theorem) overlap tests and manifold generation.
//!
//! Used for deep contacts, where GJK cannot recover a separating direction.
//! Candidate axes are the face normals of each polyhedron plus the cross
//! products of edge direction pairs (the capsule's inner segment counts as a
//! single edge). If any axis separates the shapes there is no contact;
//! otherwise the axis of minimum penetration defines the contact normal.
//!
//! Face axes are preferred over edge-cross axes unless the edge penetration
//! is meaningfully smaller ([`FACE_PREFERENCE`]): face contacts yield multi-
//! point manifolds, which the solver resolves far more stably than a single
//! edge contact, and the preference keeps the chosen axis from flickering
//! between near-tied candidates across frames.
//!
//! Face manifolds are built by clipping: the incident polygon (or the
//! capsule's inner segment) is clipped against the side planes of the
//! reference face, and surviving points at or below the reference plane
//! become contact points, capped at [`MAX_MANIFOLD_POINTS`].

use nalgebra::{Point3, Vector3};
use np_types::Pose;

use crate::half_edge::ConvexPolyhedronData;
use crate::manifold::{ContactManifold, ContactPointInfo, ManifoldBuilder, MAX_MANIFOLD_POINTS};
use crate::shape::POLYHEDRON_MARGIN;

/// Edge-cross axes must beat the best face axis by this factor to be chosen.
const FACE_PREFERENCE: f64 = 0.95;

/// Sine-of-angle threshold below which two directions count as parallel
/// (their cross product is discarded as a candidate axis).
const PARALLEL_SIN_EPSILON: f64 = 1e-6;

/// Points above the reference face plane by more than this are not contacts.
const CLIP_PLANE_SLACK: f64 = POLYHEDRON_MARGIN;

#[derive(Debug, Clone, Copy)]
enum CapsuleAxis {
    /// Polyhedron face index.
    Face(usize),
    /// Unique-edge index, with the oriented candidate axis.
    Edge(usize, Vector3<f64>),
}

#[derive(Debug, Clone, Copy)]
enum PolyPairAxis {
    /// Face index on polyhedron 1.
    Face1(usize),
    /// Face index on polyhedron 2.
    Face2(usize),
    /// Unique-edge indices on each polyhedron, with the candidate axis.
    EdgePair(usize, usize, Vector3<f64>),
}

/// Interval of a polyhedron's vertices projected on a world-space axis.
fn project_polyhedron(
    poly: &ConvexPolyhedronData,
    pose: &Pose,
    axis: &Vector3<f64>,
) -> (f64, f64) {
    // axis . (R v + t) = (R^-1 axis) . v + axis . t
    let local_axis = pose.inverse_transform_vector(axis);
    let offset = pose.position.coords.dot(axis);

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for vertex in poly.vertices() {
        let proj = vertex.coords.dot(&local_axis) + offset;
        min = min.min(proj);
        max = max.max(proj);
    }
    (min, max)
}

/// World-space plane offset of a face (signed distance of the plane from the
/// origin along the outward normal).
fn face_plane_offset(
    poly: &ConvexPolyhedronData,
    pose: &Pose,
    face_index: usize,
    normal_world: &Vector3<f64>,
) -> f64 {
    let v0 = pose.transform_point(&poly.vertex(poly.face(face_index).vertices[0]));
    normal_world.dot(&v0.coords)
}

/// The edge most extremal along `outward` among edges parallel to
/// `edge_dir`, as world-space endpoints.
///
/// Parallel edges all produce the same cross-product axis, so the axis scan
/// cannot tell which of them actually supports the contact; this picks the
/// one furthest along the contact normal.
fn supporting_edge(
    poly: &ConvexPolyhedronData,
    pose: &Pose,
    edge_dir: &Vector3<f64>,
    outward: &Vector3<f64>,
) -> (Point3<f64>, Point3<f64>) {
    let mut best_score = f64::NEG_INFINITY;
    let mut best = (Point3::origin(), Point3::origin());
    for &(i, j) in poly.unique_edges() {
        let a = pose.transform_point(&poly.vertex(i));
        let b = pose.transform_point(&poly.vertex(j));
        let dir = b - a;
        if dir.cross(edge_dir).norm() >= PARALLEL_SIN_EPSILON * dir.norm() * edge_dir.norm() {
            continue;
        }
        let score = (a.coords + b.coords).dot(outward);
        if score > best_score {
            best_score = score;
            best = (a, b);
        }
    }
    // The winning edge itself always passes the parallel filter
    best
}

/// Closest points between segments `[p1, q1]` and `[p2, q2]`.
///
/// Robust against degenerate (point-like) segments; clamps to the segment
/// ends (Ericson, "Real-Time Collision Detection", 5.1.9).
pub(crate) fn closest_points_segments(
    p1: &Point3<f64>,
    q1: &Point3<f64>,
    p2: &Point3<f64>,
    q2: &Point3<f64>,
) -> (Point3<f64>, Point3<f64>) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    const EPS: f64 = 1e-18;
    let (s, t);
    if a <= EPS && e <= EPS {
        return (*p1, *p2);
    }
    if a <= EPS {
        s = 0.0;
        t = (f / e).clamp(0.0, 1.0);
    } else {
        let c = d1.dot(&r);
        if e <= EPS {
            t = 0.0;
            s = (-c / a).clamp(0.0, 1.0);
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let s_unclamped = if denom > EPS {
                (b * f - c * e) / denom
            } else {
                0.0
            };
            let s_clamped = s_unclamped.clamp(0.0, 1.0);
            let t_for_s = (b * s_clamped + f) / e;
            if t_for_s < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t_for_s > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            } else {
                t = t_for_s;
                s = s_clamped;
            }
        }
    }
    (p1 + d1 * s, p2 + d2 * t)
}

/// SAT test between a capsule and a convex polyhedron.
///
/// Returns `None` if a separating axis exists. `capsule_is_shape1` fixes the
/// manifold's normal orientation and local-point assignment.
pub(crate) fn capsule_vs_polyhedron(
    capsule_pose: &Pose,
    half_height: f64,
    radius: f64,
    poly: &ConvexPolyhedronData,
    poly_pose: &Pose,
    capsule_is_shape1: bool,
) -> Option<ContactManifold> {
    let seg_a = capsule_pose.transform_point(&Point3::new(0.0, -half_height, 0.0));
    let seg_b = capsule_pose.transform_point(&Point3::new(0.0, half_height, 0.0));
    let capsule_dir = capsule_pose.rotation * Vector3::y();

    // Face axes: one-sided depth of the capsule below each face plane
    let mut best_face_pen = f64::INFINITY;
    let mut best_face = 0;
    for face_index in 0..poly.face_count() {
        let normal_world = poly_pose.rotation * poly.face_normal(face_index);
        let plane = face_plane_offset(poly, poly_pose, face_index, &normal_world);
        let capsule_min = seg_a
            .coords
            .dot(&normal_world)
            .min(seg_b.coords.dot(&normal_world))
            - radius;
        let pen = plane - capsule_min;
        if pen <= 0.0 {
            return None;
        }
        if pen < best_face_pen {
            best_face_pen = pen;
            best_face = face_index;
        }
    }

    // Edge-cross axes: capsule segment direction against each unique edge
    let mut best_edge_pen = f64::INFINITY;
    let mut best_edge = None;
    for (edge_index, &(i, j)) in poly.unique_edges().iter().enumerate() {
        let edge_dir = poly_pose.transform_vector(&(poly.vertex(j) - poly.vertex(i)));
        let axis = capsule_dir.cross(&edge_dir);
        let axis_norm = axis.norm();
        if axis_norm < PARALLEL_SIN_EPSILON * edge_dir.norm() {
            continue;
        }
        let axis = axis / axis_norm;

        let (poly_min, poly_max) = project_polyhedron(poly, poly_pose, &axis);
        let proj_a = seg_a.coords.dot(&axis);
        let proj_b = seg_b.coords.dot(&axis);
        let capsule_min = proj_a.min(proj_b) - radius;
        let capsule_max = proj_a.max(proj_b) + radius;

        let overlap = poly_max.min(capsule_max) - poly_min.max(capsule_min);
        if overlap <= 0.0 {
            return None;
        }
        if overlap < best_edge_pen {
            best_edge_pen = overlap;
            best_edge = Some(CapsuleAxis::Edge(edge_index, axis));
        }
    }

    let chosen = match best_edge {
        Some(edge) if best_edge_pen < FACE_PREFERENCE * best_face_pen => edge,
        _ => CapsuleAxis::Face(best_face),
    };

    match chosen {
        CapsuleAxis::Face(face_index) => {
            let mut builder = ManifoldBuilder::new();
            capsule_face_contact_points(
                poly,
                poly_pose,
                face_index,
                capsule_pose,
                half_height,
                radius,
                capsule_is_shape1,
                None,
                &mut builder,
            );
            builder.build()
        }
        CapsuleAxis::Edge(edge_index, axis) => {
            // Orient the axis from the polyhedron toward the capsule
            let orient = (capsule_pose.position - poly_pose.position).dot(&axis);
            let axis_to_capsule = if orient < 0.0 { -axis } else { axis };

            let (i, j) = poly.unique_edges()[edge_index];
            let winning_dir = poly_pose.transform_vector(&(poly.vertex(j) - poly.vertex(i)));
            let (edge_start, edge_end) =
                supporting_edge(poly, poly_pose, &winning_dir, &axis_to_capsule);
            let (on_capsule, on_edge) =
                closest_points_segments(&seg_a, &seg_b, &edge_start, &edge_end);

            let capsule_surface = on_capsule - axis_to_capsule * radius;
            let capsule_local = capsule_pose.inverse_transform_point(&capsule_surface);
            let poly_local = poly_pose.inverse_transform_point(&on_edge);

            let (normal, local_point1, local_point2) = if capsule_is_shape1 {
                (-axis_to_capsule, capsule_local, poly_local)
            } else {
                (axis_to_capsule, poly_local, capsule_local)
            };

            let mut builder = ManifoldBuilder::new();
            builder.push(ContactPointInfo {
                normal,
                penetration: best_edge_pen,
                local_point1,
                local_point2,
            });
            builder.build()
        }
    }
}

/// Build capsule-face contact points by clipping the capsule's inner segment
/// against the side planes of a polyhedron face.
///
/// With `fixed_depth` set, every surviving point carries that depth and no
/// depth filtering is applied (used when a shallow query has already measured
/// the penetration). Otherwise each point's depth is `radius` minus its
/// height above the face plane, and points outside the radius are dropped;
/// if the whole segment is clipped away, the deeper segment endpoint is used
/// as a single fallback contact.
#[allow(clippy::too_many_arguments)]
pub(crate) fn capsule_face_contact_points(
    poly: &ConvexPolyhedronData,
    poly_pose: &Pose,
    face_index: usize,
    capsule_pose: &Pose,
    half_height: f64,
    radius: f64,
    capsule_is_shape1: bool,
    fixed_depth: Option<f64>,
    builder: &mut ManifoldBuilder,
) {
    let face = poly.face(face_index);
    let n = poly.face_normal(face_index);
    let v0 = poly.vertex(face.vertices[0]);

    // Capsule segment endpoints in the polyhedron's local frame
    let seg_a = poly_pose.inverse_transform_point(
        &capsule_pose.transform_point(&Point3::new(0.0, -half_height, 0.0)),
    );
    let seg_b = poly_pose.inverse_transform_point(
        &capsule_pose.transform_point(&Point3::new(0.0, half_height, 0.0)),
    );
    let seg_dir = seg_b - seg_a;

    // Parametric clip of the segment against the face's side planes. Each
    // side plane passes through a face edge with inward normal n x e.
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    let count = face.vertices.len();
    for k in 0..count {
        let from = poly.vertex(face.vertices[k]);
        let to = poly.vertex(face.vertices[(k + 1) % count]);
        let inward = n.cross(&(to - from));

        let da = inward.dot(&(seg_a - from));
        let db = inward.dot(&(seg_b - from));
        if da < 0.0 && db < 0.0 {
            t0 = 1.0;
            t1 = 0.0;
            break;
        }
        if da < 0.0 {
            t0 = t0.max(da / (da - db));
        } else if db < 0.0 {
            t1 = t1.min(da / (da - db));
        }
    }

    let mut candidates: Vec<Point3<f64>> = Vec::with_capacity(2);
    if t0 <= t1 {
        candidates.push(seg_a + seg_dir * t0);
        // Skip the second point when it coincides with the first (clipped to
        // a single parameter, or a degenerate zero-length segment)
        if (seg_dir * (t1 - t0)).norm_squared() > 1e-24 {
            candidates.push(seg_a + seg_dir * t1);
        }
    } else if fixed_depth.is_none() {
        // Segment entirely outside the face polygon: fall back to the
        // endpoint deepest below the face plane
        let da = n.dot(&(seg_a - v0));
        let db = n.dot(&(seg_b - v0));
        candidates.push(if da <= db { seg_a } else { seg_b });
    }

    let normal_world = poly_pose.rotation * n;
    for p in candidates {
        let height = n.dot(&(p - v0));
        let depth = match fixed_depth {
            Some(depth) => depth,
            None => {
                let depth = radius - height;
                if depth <= 0.0 {
                    continue;
                }
                depth
            }
        };

        let poly_local = p - n * height;
        let segment_world = poly_pose.transform_point(&p);
        let capsule_surface = segment_world - normal_world * radius;
        let capsule_local = capsule_pose.inverse_transform_point(&capsule_surface);

        let (normal, local_point1, local_point2) = if capsule_is_shape1 {
            (-normal_world, capsule_local, poly_local)
        } else {
            (normal_world, poly_local, capsule_local)
        };
        builder.push(ContactPointInfo {
            normal,
            penetration: depth,
            local_point1,
            local_point2,
        });
    }
}

/// SAT test between two convex polyhedra.
///
/// Returns `None` if a separating axis exists; otherwise a manifold of one
/// to [`MAX_MANIFOLD_POINTS`] points along the minimum-penetration axis.
pub(crate) fn polyhedron_vs_polyhedron(
    poly1: &ConvexPolyhedronData,
    pose1: &Pose,
    poly2: &ConvexPolyhedronData,
    pose2: &Pose,
) -> Option<ContactManifold> {
    let mut best_face_pen = f64::INFINITY;
    let mut best_face = PolyPairAxis::Face1(0);

    for face_index in 0..poly1.face_count() {
        let normal_world = pose1.rotation * poly1.face_normal(face_index);
        let plane = face_plane_offset(poly1, pose1, face_index, &normal_world);
        let (other_min, _) = project_polyhedron(poly2, pose2, &normal_world);
        let pen = plane - other_min;
        if pen <= 0.0 {
            return None;
        }
        if pen < best_face_pen {
            best_face_pen = pen;
            best_face = PolyPairAxis::Face1(face_index);
        }
    }
    for face_index in 0..poly2.face_count() {
        let normal_world = pose2.rotation * poly2.face_normal(face_index);
        let plane = face_plane_offset(poly2, pose2, face_index, &normal_world);
        let (other_min, _) = project_polyhedron(poly1, pose1, &normal_world);
        let pen = plane - other_min;
        if pen <= 0.0 {
            return None;
        }
        if pen < best_face_pen {
            best_face_pen = pen;
            best_face = PolyPairAxis::Face2(face_index);
        }
    }

    let mut best_edge_pen = f64::INFINITY;
    let mut best_edge = None;
    for (index1, &(a1, b1)) in poly1.unique_edges().iter().enumerate() {
        let dir1 = pose1.transform_vector(&(poly1.vertex(b1) - poly1.vertex(a1)));
        for (index2, &(a2, b2)) in poly2.unique_edges().iter().enumerate() {
            let dir2 = pose2.transform_vector(&(poly2.vertex(b2) - poly2.vertex(a2)));
            let axis = dir1.cross(&dir2);
            let axis_norm = axis.norm();
            if axis_norm < PARALLEL_SIN_EPSILON * dir1.norm() * dir2.norm() {
                continue;
            }
            let axis = axis / axis_norm;

            let (min1, max1) = project_polyhedron(poly1, pose1, &axis);
            let (min2, max2) = project_polyhedron(poly2, pose2, &axis);
            let overlap = max1.min(max2) - min1.max(min2);
            if overlap <= 0.0 {
                return None;
            }
            if overlap < best_edge_pen {
                best_edge_pen = overlap;
                best_edge = Some(PolyPairAxis::EdgePair(index1, index2, axis));
            }
        }
    }

    let chosen = match best_edge {
        Some(edge) if best_edge_pen < FACE_PREFERENCE * best_face_pen => edge,
        _ => best_face,
    };

    match chosen {
        PolyPairAxis::Face1(face_index) => face_contact(
            poly1,
            pose1,
            face_index,
            poly2,
            pose2,
            true,
            best_face_pen,
        ),
        PolyPairAxis::Face2(face_index) => face_contact(
            poly2,
            pose2,
            face_index,
            poly1,
            pose1,
            false,
            best_face_pen,
        ),
        PolyPairAxis::EdgePair(index1, index2, axis) => {
            // Orient the axis from shape 1 toward shape 2
            let orient = (pose2.position - pose1.position).dot(&axis);
            let normal = if orient < 0.0 { -axis } else { axis };

            let (a1, b1) = poly1.unique_edges()[index1];
            let (a2, b2) = poly2.unique_edges()[index2];
            let dir1 = pose1.transform_vector(&(poly1.vertex(b1) - poly1.vertex(a1)));
            let dir2 = pose2.transform_vector(&(poly2.vertex(b2) - poly2.vertex(a2)));
            let (p1, q1) = supporting_edge(poly1, pose1, &dir1, &normal);
            let (p2, q2) = supporting_edge(poly2, pose2, &dir2, &-normal);
            let (on_edge1, on_edge2) = closest_points_segments(&p1, &q1, &p2, &q2);

            let mut builder = ManifoldBuilder::new();
            builder.push(ContactPointInfo {
                normal,
                penetration: best_edge_pen,
                local_point1: pose1.inverse_transform_point(&on_edge1),
                local_point2: pose2.inverse_transform_point(&on_edge2),
            });
            builder.build()
        }
    }
}

/// Build a face contact manifold: clip the incident face of the other
/// polyhedron against the reference face's side planes.
fn face_contact(
    ref_poly: &ConvexPolyhedronData,
    ref_pose: &Pose,
    ref_face: usize,
    inc_poly: &ConvexPolyhedronData,
    inc_pose: &Pose,
    ref_is_shape1: bool,
    penetration: f64,
) -> Option<ContactManifold> {
    let ref_normal = ref_pose.rotation * ref_poly.face_normal(ref_face);
    let ref_plane = face_plane_offset(ref_poly, ref_pose, ref_face, &ref_normal);

    // Incident face: the one most anti-parallel to the reference normal
    let mut inc_face = 0;
    let mut min_dot = f64::INFINITY;
    for face_index in 0..inc_poly.face_count() {
        let dot = (inc_pose.rotation * inc_poly.face_normal(face_index)).dot(&ref_normal);
        if dot < min_dot {
            min_dot = dot;
            inc_face = face_index;
        }
    }

    let mut polygon: Vec<Point3<f64>> = inc_poly
        .face(inc_face)
        .vertices
        .iter()
        .map(|&v| inc_pose.transform_point(&inc_poly.vertex(v)))
        .collect();

    // Sutherland-Hodgman clip against each side plane of the reference face
    let ref_loop = &ref_poly.face(ref_face).vertices;
    let count = ref_loop.len();
    for k in 0..count {
        if polygon.is_empty() {
            break;
        }
        let from = ref_pose.transform_point(&ref_poly.vertex(ref_loop[k]));
        let to = ref_pose.transform_point(&ref_poly.vertex(ref_loop[(k + 1) % count]));
        let inward = ref_normal.cross(&(to - from));

        let mut clipped = Vec::with_capacity(polygon.len() + 1);
        for i in 0..polygon.len() {
            let current = polygon[i];
            let next = polygon[(i + 1) % polygon.len()];
            let d_current = inward.dot(&(current - from));
            let d_next = inward.dot(&(next - from));

            if d_current >= 0.0 {
                clipped.push(current);
            }
            if (d_current >= 0.0) != (d_next >= 0.0) {
                let t = d_current / (d_current - d_next);
                clipped.push(current + (next - current) * t);
            }
        }
        polygon = clipped;
    }

    // Keep points at (or within slack of) the reference plane
    let mut kept: Vec<(Point3<f64>, f64)> = polygon
        .into_iter()
        .filter_map(|p| {
            let height = ref_normal.dot(&p.coords) - ref_plane;
            if height <= CLIP_PLANE_SLACK {
                Some((p, (-height).max(0.0)))
            } else {
                None
            }
        })
        .collect();

    if kept.is_empty() {
        // Degenerate clip: fall back to the incident vertex deepest below
        // the reference plane
        let mut deepest = inc_pose.transform_point(&inc_poly.vertex(0));
        let mut min_proj = f64::INFINITY;
        for vertex in inc_poly.vertices() {
            let world = inc_pose.transform_point(vertex);
            let proj = ref_normal.dot(&world.coords);
            if proj < min_proj {
                min_proj = proj;
                deepest = world;
            }
        }
        kept.push((deepest, penetration));
    }

    if kept.len() > MAX_MANIFOLD_POINTS {
        // Keep the deepest points, preserving insertion order
        let mut order: Vec<usize> = (0..kept.len()).collect();
        order.sort_by(|&a, &b| kept[b].1.total_cmp(&kept[a].1));
        order.truncate(MAX_MANIFOLD_POINTS);
        order.sort_unstable();
        kept = order.into_iter().map(|i| kept[i]).collect();
    }

    let mut builder = ManifoldBuilder::new();
    let normal = if ref_is_shape1 { ref_normal } else { -ref_normal };
    for (point, depth) in kept {
        let height = ref_normal.dot(&point.coords) - ref_plane;
        let on_ref = point - ref_normal * height;
        let on_ref_local = ref_pose.inverse_transform_point(&on_ref);
        let on_inc_local = inc_pose.inverse_transform_point(&point);
        let (local_point1, local_point2) = if ref_is_shape1 {
            (on_ref_local, on_inc_local)
        } else {
            (on_inc_local, on_ref_local)
        };
        builder.push(ContactPointInfo {
            normal,
            penetration: depth,
            local_point1,
            local_point2,
        });
    }
    builder.build()
}
