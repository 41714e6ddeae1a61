//! Body handles and placement types.
//!
//! This module provides the handles the grapple uses to address bodies and
//! colliders in a physics backend, plus the pose and link transform types
//! used to place links along the rope.

use nalgebra::{Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique identifier for a rigid body in the physics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub u64);

impl BodyId {
    /// Create a new body ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for BodyId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// Unique identifier for a collision shape in the physics backend.
///
/// Colliders can exist without a rigid body (static level geometry). The
/// grapple adds a kinematic body to such a collider when it latches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColliderId(pub u64);

impl ColliderId {
    /// Create a new collider ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ColliderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Collider({})", self.0)
    }
}

/// Position and orientation of a body or of the grapple origin.
///
/// # Example
///
/// ```
/// use grapple_types::Pose;
/// use nalgebra::{Point3, UnitQuaternion, Vector3};
///
/// // Create a pose at position (1, 2, 3) with identity rotation
/// let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
///
/// // Transform a local point to world coordinates
/// let local = Point3::new(1.0, 0.0, 0.0);
/// let world = pose.transform_point(&local);
/// assert_eq!(world, Point3::new(2.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position in world coordinates.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create an identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position and rotation.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }

    /// Create a pose at `position` whose forward axis (+Y) points along `direction`.
    ///
    /// A zero `direction` yields the identity orientation.
    #[must_use]
    pub fn looking_along(position: Point3<f64>, direction: &Vector3<f64>) -> Self {
        Self {
            position,
            rotation: rotation_from_forward(direction),
        }
    }

    /// Transform a point from local to world coordinates.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Transform a vector from local to world coordinates (rotation only).
    #[must_use]
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * local
    }

    /// Transform a point from world to local coordinates.
    #[must_use]
    pub fn inverse_transform_point(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse() * (world - self.position))
    }

    /// Transform a vector from world to local coordinates.
    #[must_use]
    pub fn inverse_transform_vector(&self, world: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse() * world
    }

    /// Get the forward direction (local +Y in world coordinates).
    #[must_use]
    pub fn forward(&self) -> Vector3<f64> {
        self.transform_vector(&Vector3::y())
    }

    /// Get the right direction (local +X in world coordinates).
    #[must_use]
    pub fn right(&self) -> Vector3<f64> {
        self.transform_vector(&Vector3::x())
    }
}

/// Shortest rotation taking local +Y onto `direction`.
///
/// `rotation_between` has no answer for exactly opposite vectors, so that
/// case is a half turn about +Z.
fn rotation_from_forward(direction: &Vector3<f64>) -> UnitQuaternion<f64> {
    if direction.norm_squared() < 1e-20 {
        return UnitQuaternion::identity();
    }
    UnitQuaternion::rotation_between(&Vector3::y(), direction)
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::PI))
}

/// Spatial transform of a body: pose plus uniform visual scale.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform {
    /// Position and orientation.
    pub pose: Pose,
    /// Uniform scale applied to the body's shape.
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pose: Pose::identity(),
            scale: 1.0,
        }
    }
}

impl Transform {
    /// Create a transform from a pose and scale.
    #[must_use]
    pub const fn new(pose: Pose, scale: f64) -> Self {
        Self { pose, scale }
    }

    /// Create a transform at `position` aimed along `direction`.
    #[must_use]
    pub fn along(position: Point3<f64>, direction: &Vector3<f64>, scale: f64) -> Self {
        Self {
            pose: Pose::looking_along(position, direction),
            scale,
        }
    }

    /// Rotate about the local forward axis.
    ///
    /// Alternating links use a quarter turn here to give the rope a braided
    /// look.
    #[must_use]
    pub fn twisted(mut self, angle: f64) -> Self {
        self.pose.rotation *= UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle);
        self
    }

    /// Create an unscaled transform at `position` with identity rotation.
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            pose: Pose::from_position(position),
            scale: 1.0,
        }
    }

    /// Same transform moved to `position`.
    #[must_use]
    pub fn with_position(mut self, position: Point3<f64>) -> Self {
        self.pose.position = position;
        self
    }

    /// World position.
    #[must_use]
    pub fn position(&self) -> Point3<f64> {
        self.pose.position
    }
}
