//! Rigid-body kinematic state types.
//!
//! This crate provides the state representation consumed by the narrow-phase
//! collision core and the surrounding simulation loop:
//!
//! - [`Pose`] - Position + orientation transform (composable, invertible)
//! - [`BodyState`] - Momentum-primary kinematic snapshot of a rigid body
//! - [`RigidBody`] - Previous/current snapshot pair with render-rate blending
//! - [`MassProperties`] - Mass and inertia container (inverse-mass convention)
//!
//! # Design Philosophy
//!
//! These types are **pure data plus derived-quantity queries**. They do no
//! integration and no collision detection. A `BodyState` stores the primary
//! quantities (position, orientation, linear/angular momentum, inverse mass,
//! local inverse inertia) and recomputes derived quantities (velocities,
//! world-space inverse inertia) on demand - derived values are never stored
//! or interpolated directly.
//!
//! # Interpolation
//!
//! The simulation step rate and the display rate generally differ. Each body
//! keeps the state of the previous and the current step; the renderer queries
//! a blended state with a frame-local factor in `[0, 1]`:
//!
//! ```
//! use np_types::{BodyState, MassProperties, RigidBody};
//! use nalgebra::{Point3, UnitQuaternion};
//!
//! let props = MassProperties::point_mass(2.0);
//! let start = BodyState::new(
//!     Point3::new(0.0, 0.0, 0.0),
//!     UnitQuaternion::identity(),
//!     &props,
//! );
//! let mut body = RigidBody::new(start);
//!
//! // Integrator produced a new state for this step.
//! let mut next = *body.current();
//! next.position = Point3::new(1.0, 0.0, 0.0);
//! body.advance(next);
//!
//! // Renderer blends halfway between the two steps.
//! let blended = body.interpolated_state_at(0.5);
//! assert!((blended.position.x - 0.5).abs() < 1e-12);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,  // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,      // mul_add style changes aren't always clearer
    clippy::missing_errors_doc     // Error docs added where non-obvious
)]

mod body_state;
mod error;
mod mass;
mod pose;
mod rigid_body;

pub use body_state::BodyState;
pub use error::StateError;
pub use mass::MassProperties;
pub use pose::Pose;
pub use rigid_body::RigidBody;

// Re-export math types for convenience
pub use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};

/// Result type for state operations.
pub type Result<T> = std::result::Result<T, StateError>;
