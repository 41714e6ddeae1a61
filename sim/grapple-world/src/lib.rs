//! Reference physics world for the grapple.
//!
//! [`World`] implements [`grapple_core::PhysicsBackend`] with plain maps of
//! bodies, colliders and joints and analytic ray casts against spheres,
//! planes and boxes. It has no solver, so linked chains keep whatever
//! transforms the grapple last wrote.
//!
//! # Example
//!
//! ```
//! use grapple_core::Grapple;
//! use grapple_types::{GrappleConfig, Pose};
//! use grapple_world::{CollisionShape, World};
//! use nalgebra::Point3;
//!
//! let mut world = World::new();
//! world.add_static_collider(
//!     CollisionShape::sphere(1.0),
//!     Pose::from_position(Point3::new(0.0, 6.0, 0.0)),
//! );
//!
//! let config = GrappleConfig::default()
//!     .with_max_extension(10.0)
//!     .with_extension_speed(20.0);
//! let mut grapple = Grapple::new(config, Pose::identity(), &mut world).unwrap();
//! grapple.fire(&mut world).unwrap();
//!
//! let outcome = loop {
//!     if let Some(outcome) = grapple.tick(&mut world, 1.0 / 60.0).unwrap() {
//!         break outcome;
//!     }
//! };
//! assert!(outcome.is_contact());
//! ```

#![doc(html_root_url = "https://docs.rs/grapple-world/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::neg_cmp_op_on_partial_ord, // !(x >= 0.0) is intentional for NaN rejection
    clippy::missing_errors_doc,
)]

pub mod shape;
pub mod world;

pub use shape::{raycast_shape, CollisionShape, ShapeHit};
pub use world::{Body, Collider, Joint, World};
