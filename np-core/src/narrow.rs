//! Narrow-phase dispatch.
//!
//! [`test_collision`] selects a pair algorithm from the two shape variant
//! tags and runs it. Every algorithm follows the same two-phase scheme: GJK
//! first, which is cheap and exact while the shape cores are disjoint, then
//! SAT only when GJK reports the cores themselves overlapping and can no
//! longer produce a contact normal.
//!
//! The capsule/polyhedron algorithm additionally upgrades a shallow GJK
//! result to a two-point manifold when the capsule lies flat on a face:
//! a single contact point under a lying capsule lets the solver rock the
//! body around it, while two points along the segment pin it down.
//!
//! [`LastFrameInfo`] records which phase produced the result each frame.
//! It is bookkeeping for warm-start heuristics; nothing in the detection
//! itself reads it back.

use nalgebra::Vector3;
use np_types::Pose;
use tracing::{debug, warn};

use crate::gjk::{self, GjkResult};
use crate::manifold::{ContactManifold, ContactPointInfo, ManifoldBuilder};
use crate::sat;
use crate::shape::{CollisionShape, ShapeType};

/// Squared-sine tolerance for the face-parallel upgrade: both the angle
/// between the face normal and the contact normal, and the angle between the
/// capsule axis and the face plane, must stay under ~1.8 degrees.
const FACE_PARALLEL_TOLERANCE: f64 = 1e-3;

/// Which phase produced the previous result for a shape pair.
///
/// Updated on every dispatch. Consumers may use it to bias warm-starting;
/// the detection algorithms never read it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LastFrameInfo {
    /// The last result came from the GJK phase.
    pub was_using_gjk: bool,
    /// The last result came from the SAT phase.
    pub was_using_sat: bool,
}

/// Everything a pair algorithm needs for one narrow-phase query.
#[derive(Debug)]
pub struct NarrowPhaseInfo<'a> {
    /// First shape of the pair.
    pub shape1: &'a CollisionShape,
    /// World pose of the first shape.
    pub pose1: &'a Pose,
    /// Second shape of the pair.
    pub shape2: &'a CollisionShape,
    /// World pose of the second shape.
    pub pose2: &'a Pose,
    /// Per-pair phase bookkeeping, persisted across frames by the caller.
    pub last_frame: &'a mut LastFrameInfo,
}

type CollisionAlgorithm = fn(&mut NarrowPhaseInfo<'_>) -> Option<ContactManifold>;

/// Select the pair algorithm for two shape variants.
fn algorithm_for(type1: ShapeType, type2: ShapeType) -> CollisionAlgorithm {
    use ShapeType::{Capsule, ConvexPolyhedron, Sphere};
    match (type1, type2) {
        (Sphere | Capsule, Sphere | Capsule) => round_pair,
        (Sphere | Capsule, ConvexPolyhedron) | (ConvexPolyhedron, Sphere | Capsule) => {
            capsule_polyhedron
        }
        (ConvexPolyhedron, ConvexPolyhedron) => polyhedron_pair,
    }
}

/// Run narrow-phase detection on a shape pair.
///
/// Returns `None` when the (margin-inflated) shapes do not touch. Contact
/// normals point from shape 1 toward shape 2.
pub fn test_collision(info: &mut NarrowPhaseInfo<'_>) -> Option<ContactManifold> {
    let algorithm = algorithm_for(info.shape1.shape_type(), info.shape2.shape_type());
    algorithm(info)
}

fn single_point(contact: ContactPointInfo) -> Option<ContactManifold> {
    let mut builder = ManifoldBuilder::new();
    builder.push(contact);
    builder.build()
}

/// Sphere/sphere, sphere/capsule and capsule/capsule: GJK alone suffices,
/// since the cores (point or segment) rarely overlap exactly.
fn round_pair(info: &mut NarrowPhaseInfo<'_>) -> Option<ContactManifold> {
    info.last_frame.was_using_gjk = true;
    info.last_frame.was_using_sat = false;
    match gjk::test(info.shape1, info.pose1, info.shape2, info.pose2) {
        GjkResult::Separated { .. } => None,
        GjkResult::CollideInMargin(contact) => single_point(contact),
        GjkResult::Interpenetrate => degenerate_overlap(info),
    }
}

/// Cores overlapping exactly (for example coincident sphere centers) leave
/// no recoverable direction; emit a full-depth contact along +Z so the
/// solver still pushes the bodies apart.
fn degenerate_overlap(info: &mut NarrowPhaseInfo<'_>) -> Option<ContactManifold> {
    warn!("degenerate core overlap, emitting +Z contact");
    let normal = Vector3::z();
    let margin1 = info.shape1.margin();
    let margin2 = info.shape2.margin();
    let point1_world = info.pose1.position + normal * margin1;
    let point2_world = info.pose2.position - normal * margin2;
    single_point(ContactPointInfo {
        normal,
        penetration: margin1 + margin2,
        local_point1: info.pose1.inverse_transform_point(&point1_world),
        local_point2: info.pose2.inverse_transform_point(&point2_world),
    })
}

/// Capsule (or sphere, as a zero-height capsule) against a convex
/// polyhedron: GJK while shallow, with the face-parallel manifold upgrade,
/// SAT when deep.
fn capsule_polyhedron(info: &mut NarrowPhaseInfo<'_>) -> Option<ContactManifold> {
    let (capsule_shape, capsule_pose, poly_shape, poly_pose, capsule_is_shape1) =
        if info.shape1.polyhedron().is_some() {
            (info.shape2, info.pose2, info.shape1, info.pose1, false)
        } else {
            (info.shape1, info.pose1, info.shape2, info.pose2, true)
        };
    let poly = poly_shape.polyhedron()?;
    let (half_height, radius) = match *capsule_shape {
        CollisionShape::Capsule {
            half_height,
            radius,
        } => (half_height, radius),
        CollisionShape::Sphere { radius } => (0.0, radius),
        // The dispatch table never pairs two polyhedra here
        CollisionShape::ConvexPolyhedron { .. } => return None,
    };

    match gjk::test(info.shape1, info.pose1, info.shape2, info.pose2) {
        GjkResult::Separated { .. } => {
            info.last_frame.was_using_gjk = true;
            info.last_frame.was_using_sat = false;
            None
        }
        GjkResult::CollideInMargin(contact) => {
            info.last_frame.was_using_gjk = true;
            info.last_frame.was_using_sat = false;

            // Face-parallel upgrade: if the contact normal matches a face
            // normal and the capsule axis lies in that face's plane, clip
            // the segment against the face for a two-point manifold.
            let capsule_dir = capsule_pose.rotation * Vector3::y();
            let toward_capsule = if capsule_is_shape1 {
                -contact.normal
            } else {
                contact.normal
            };
            for face_index in 0..poly.face_count() {
                let face_normal = poly_pose.rotation * poly.face_normal(face_index);
                if face_normal.cross(&toward_capsule).norm_squared() >= FACE_PARALLEL_TOLERANCE {
                    continue;
                }
                if face_normal.dot(&toward_capsule) <= 0.0 {
                    continue;
                }
                if capsule_dir.dot(&face_normal).powi(2) >= FACE_PARALLEL_TOLERANCE {
                    continue;
                }

                let mut builder = ManifoldBuilder::new();
                sat::capsule_face_contact_points(
                    poly,
                    poly_pose,
                    face_index,
                    capsule_pose,
                    half_height,
                    radius,
                    capsule_is_shape1,
                    Some(contact.penetration),
                    &mut builder,
                );
                if builder.len() >= 2 {
                    return builder.build();
                }
                break;
            }
            single_point(contact)
        }
        GjkResult::Interpenetrate => {
            info.last_frame.was_using_gjk = false;
            info.last_frame.was_using_sat = true;
            debug!("deep capsule/polyhedron overlap, switching to SAT");
            sat::capsule_vs_polyhedron(
                capsule_pose,
                half_height,
                radius,
                poly,
                poly_pose,
                capsule_is_shape1,
            )
        }
    }
}

/// Convex polyhedron pair: GJK while shallow, SAT when deep.
fn polyhedron_pair(info: &mut NarrowPhaseInfo<'_>) -> Option<ContactManifold> {
    let poly1 = info.shape1.polyhedron()?;
    let poly2 = info.shape2.polyhedron()?;

    match gjk::test(info.shape1, info.pose1, info.shape2, info.pose2) {
        GjkResult::Separated { .. } => {
            info.last_frame.was_using_gjk = true;
            info.last_frame.was_using_sat = false;
            None
        }
        GjkResult::CollideInMargin(contact) => {
            info.last_frame.was_using_gjk = true;
            info.last_frame.was_using_sat = false;
            single_point(contact)
        }
        GjkResult::Interpenetrate => {
            info.last_frame.was_using_gjk = false;
            info.last_frame.was_using_sat = true;
            debug!("deep polyhedron overlap, switching to SAT");
            sat::polyhedron_vs_polyhedron(poly1, info.pose1, poly2, info.pose2)
        }
    }
}
