//! Physics capability consumed by the grapple.
//!
//! The grapple never simulates anything itself. Every body, joint and ray
//! query goes through [`PhysicsBackend`], which a host implements on top of
//! its rigid-body engine. `grapple-world` provides an in-memory reference
//! implementation.
//!
//! All calls are synchronous and happen on the simulation tick thread.

use grapple_types::{BodyId, CharacterJointConfig, ColliderId, JointId, Result, Transform};
use nalgebra::{Point3, UnitVector3, Vector3};

/// Result of a ray query against the physics scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from ray origin to hit point.
    pub distance: f64,
    /// Hit point in world coordinates.
    pub point: Point3<f64>,
    /// Surface normal at hit point (pointing away from surface).
    pub normal: Vector3<f64>,
    /// Collider that was struck.
    pub collider: ColliderId,
    /// Rigid body owning the collider, if it has one.
    pub body: Option<BodyId>,
}

impl RayHit {
    /// Create a new ray hit.
    #[must_use]
    pub fn new(
        distance: f64,
        point: Point3<f64>,
        normal: Vector3<f64>,
        collider: ColliderId,
        body: Option<BodyId>,
    ) -> Self {
        Self {
            distance,
            point,
            normal,
            collider,
            body,
        }
    }
}

/// Rigid-body engine operations the grapple relies on.
///
/// Handles passed back in must have been produced by the same backend.
/// Unknown handles are reported as [`grapple_types::GrappleError::InvalidBodyId`],
/// [`grapple_types::GrappleError::InvalidJointId`] or
/// [`grapple_types::GrappleError::InvalidColliderId`].
pub trait PhysicsBackend {
    /// Cast a ray and return the nearest hit within `max_distance`.
    fn raycast(
        &self,
        origin: Point3<f64>,
        direction: UnitVector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit>;

    /// Create a rigid body with the given transform.
    fn create_body(&mut self, transform: Transform, kinematic: bool) -> BodyId;

    /// Destroy a rigid body along with every joint it owns.
    fn destroy_body(&mut self, body: BodyId) -> Result<()>;

    /// Body attached to `collider`, adding a kinematic one if it has none.
    fn ensure_body(&mut self, collider: ColliderId) -> Result<BodyId>;

    /// Set whether the body is driven by its transform (kinematic) or by the solver.
    fn set_kinematic(&mut self, body: BodyId, kinematic: bool) -> Result<()>;

    /// Enable or disable the body. Disabled bodies are skipped by ray queries.
    fn set_enabled(&mut self, body: BodyId, enabled: bool) -> Result<()>;

    /// Teleport a body.
    fn set_transform(&mut self, body: BodyId, transform: Transform) -> Result<()>;

    /// Current transform of a body.
    fn transform(&self, body: BodyId) -> Result<Transform>;

    /// Create an unconnected character joint owned by `owner`.
    fn create_joint(&mut self, owner: BodyId, config: &CharacterJointConfig) -> Result<JointId>;

    /// Replace a joint's axis, limits and spring.
    fn configure_joint(&mut self, joint: JointId, config: &CharacterJointConfig) -> Result<()>;

    /// Connect a joint to another body, or disconnect it with `None`.
    fn connect_joint(&mut self, joint: JointId, body: Option<BodyId>) -> Result<()>;

    /// Body a joint is currently connected to.
    fn joint_connection(&self, joint: JointId) -> Result<Option<BodyId>>;

    /// Destroy a joint.
    fn destroy_joint(&mut self, joint: JointId) -> Result<()>;
}
