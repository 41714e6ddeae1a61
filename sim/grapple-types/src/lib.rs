//! Core types for segmented grapple rope simulation.
//!
//! This crate provides the foundational data shared by the grapple crates:
//!
//! - [`BodyId`], [`JointId`], [`ColliderId`] - Handles into the physics backend
//! - [`Pose`] and [`Transform`] - Placement of links, bodies and the grapple origin
//! - [`JointLimits`], [`JointSpring`], [`CharacterJointConfig`] - Joint setup
//! - [`GrappleConfig`] - Link spacing, range, speed and joint presets
//! - [`GrappleError`] - Unified error type
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They carry no physics and no state machine.
//! The chain logic lives in `grapple-core`, the reference physics world in
//! `grapple-world`.
//!
//! # Coordinate System
//!
//! Consistent with the CortenForge ecosystem:
//!
//! - X: right
//! - Y: forward
//! - Z: up
//! - Right-handed
//!
//! A link's local +Y axis points along the rope toward the head.
//!
//! # Example
//!
//! ```
//! use grapple_types::{GrappleConfig, Pose};
//! use nalgebra::Point3;
//!
//! let config = GrappleConfig::default().with_max_extension(10.0).with_link_spacing(1.0);
//! assert!(config.validate().is_ok());
//! assert!(config.link_capacity() >= 10);
//!
//! let origin = Pose::from_position(Point3::new(0.0, 0.0, 1.0));
//! assert_eq!(origin.forward().y, 1.0);
//! ```

#![doc(html_root_url = "https://docs.rs/grapple-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::cast_precision_loss,       // usize to f64 is fine for counts
    clippy::cast_possible_truncation,  // link counts are small and non-negative
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod body;
mod config;
mod error;
mod joint;

pub use body::{BodyId, ColliderId, Pose, Transform};
pub use config::{GrappleConfig, MIN_LINK_SPACING};
pub use error::GrappleError;
pub use joint::{CharacterJointConfig, JointId, JointLimits, JointSpring};

// Re-export math types for convenience
pub use nalgebra::{Point3, UnitQuaternion, UnitVector3, Vector3};

/// Result type for grapple operations.
pub type Result<T> = std::result::Result<T, GrappleError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_link_transform_along_direction() {
        let direction = Vector3::new(1.0, 0.0, 0.0);
        let transform = Transform::along(Point3::new(2.0, 0.0, 0.0), &direction, 0.5);

        let forward = transform.pose.forward();
        assert!((forward.x - 1.0).abs() < 1e-10);
        assert_eq!(transform.scale, 0.5);
    }

    #[test]
    fn test_config_capacity_covers_range() {
        let config = GrappleConfig::default()
            .with_max_extension(10.0)
            .with_link_spacing(1.0);
        assert!(config.link_capacity() >= 10);
    }
}
