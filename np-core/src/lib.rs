//! Narrow-phase collision detection for convex shapes.
//!
//! Detects contacts between sphere, capsule, and convex polyhedron shapes,
//! producing contact manifolds (normal, penetration depth, witness points on
//! both surfaces) for a constraint solver.
//!
//! Detection is two-phase per pair: GJK over the shape cores handles
//! separation and shallow (within-margin) contact exactly; SAT takes over
//! for deep overlap, where GJK loses the contact direction. The
//! [`narrow::test_collision`] entry point dispatches on the shape variants.
//!
//! ```
//! use nalgebra::{Point3, Vector3};
//! use np_core::{CollisionShape, LastFrameInfo, NarrowPhaseInfo};
//! use np_types::Pose;
//!
//! let capsule = CollisionShape::capsule(0.5, 0.2);
//! let ground = CollisionShape::cuboid(Vector3::new(2.0, 2.0, 0.5));
//! let capsule_pose = Pose::from_position(Point3::new(0.0, 0.0, 0.65));
//! let ground_pose = Pose::identity();
//!
//! let mut last_frame = LastFrameInfo::default();
//! let manifold = np_core::test_collision(&mut NarrowPhaseInfo {
//!     shape1: &capsule,
//!     pose1: &capsule_pose,
//!     shape2: &ground,
//!     pose2: &ground_pose,
//!     last_frame: &mut last_frame,
//! });
//! // A capsule lying on the ground gets a two-point manifold
//! assert_eq!(manifold.map(|m| m.len()), Some(2));
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod gjk;
pub mod half_edge;
pub mod manifold;
pub mod narrow;
mod sat;
pub mod shape;
pub mod support;

pub use error::ShapeError;
pub use gjk::GjkResult;
pub use half_edge::{ConvexPolyhedronData, Face, HalfEdge};
pub use manifold::{ContactManifold, ContactPointInfo, ManifoldBuilder, MAX_MANIFOLD_POINTS};
pub use narrow::{test_collision, LastFrameInfo, NarrowPhaseInfo};
pub use shape::{CollisionShape, ShapeType, POLYHEDRON_MARGIN};
