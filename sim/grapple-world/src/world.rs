//! In-memory physics world.
//!
//! The [`World`] stores rigid bodies, colliders and character joints and
//! answers ray queries analytically. It does not integrate dynamics: bodies
//! only move when something sets their transform. That is enough to drive a
//! grapple headless and to inspect exactly what it did to the scene.

use crate::shape::{raycast_shape, CollisionShape};
use grapple_core::{PhysicsBackend, RayHit};
use grapple_types::{
    BodyId, CharacterJointConfig, ColliderId, GrappleError, JointId, Pose, Result, Transform,
};
use hashbrown::HashMap;
use nalgebra::{Point3, UnitVector3};
use tracing::{debug, trace};

/// A rigid body.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Unique identifier.
    pub id: BodyId,
    /// Current transform.
    pub transform: Transform,
    /// Whether the body follows its transform instead of the solver.
    pub kinematic: bool,
    /// Disabled bodies are invisible to ray queries.
    pub enabled: bool,
    /// Collider carried by this body.
    pub collider: Option<ColliderId>,
}

/// A collision shape, static or carried by a body.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    /// Unique identifier.
    pub id: ColliderId,
    /// Geometry.
    pub shape: CollisionShape,
    /// Pose relative to the owning body, or in world space without one.
    pub local_pose: Pose,
    /// Owning body.
    pub body: Option<BodyId>,
}

/// A character joint between its owner and an optional connected body.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    /// Unique identifier.
    pub id: JointId,
    /// Body the joint is attached to.
    pub owner: BodyId,
    /// Body on the other side, if connected.
    pub connected: Option<BodyId>,
    /// Axis, limits and spring.
    pub config: CharacterJointConfig,
}

/// Container for bodies, colliders and joints.
#[derive(Debug, Clone, Default)]
pub struct World {
    /// All bodies, indexed by ID.
    bodies: HashMap<BodyId, Body>,
    /// All colliders, indexed by ID.
    colliders: HashMap<ColliderId, Collider>,
    /// All joints, indexed by ID.
    joints: HashMap<JointId, Joint>,
    next_body_id: u64,
    next_collider_id: u64,
    next_joint_id: u64,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Get the number of colliders.
    #[must_use]
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Get the number of joints.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    // =========================================================================
    // Scene construction
    // =========================================================================

    /// Add a body without a collider.
    pub fn add_body(&mut self, transform: Transform, kinematic: bool) -> BodyId {
        let id = BodyId::new(self.next_body_id);
        self.next_body_id += 1;
        self.bodies.insert(
            id,
            Body {
                id,
                transform,
                kinematic,
                enabled: true,
                collider: None,
            },
        );
        id
    }

    /// Add a collider with no body, fixed at `pose`.
    pub fn add_static_collider(&mut self, shape: CollisionShape, pose: Pose) -> ColliderId {
        let id = ColliderId::new(self.next_collider_id);
        self.next_collider_id += 1;
        self.colliders.insert(
            id,
            Collider {
                id,
                shape,
                local_pose: pose,
                body: None,
            },
        );
        id
    }

    /// Add a body carrying a collider centred on it.
    pub fn add_body_with_collider(
        &mut self,
        shape: CollisionShape,
        transform: Transform,
        kinematic: bool,
    ) -> (BodyId, ColliderId) {
        let body = self.add_body(transform, kinematic);
        let collider = self.add_static_collider(shape, Pose::identity());
        self.attach(collider, body);
        (body, collider)
    }

    fn attach(&mut self, collider: ColliderId, body: BodyId) {
        if let Some(c) = self.colliders.get_mut(&collider) {
            c.body = Some(body);
        }
        if let Some(b) = self.bodies.get_mut(&body) {
            b.collider = Some(collider);
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get a body by ID.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// Get a mutable reference to a body by ID.
    #[must_use]
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(&id)
    }

    /// Get a collider by ID.
    #[must_use]
    pub fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(&id)
    }

    /// Get a joint by ID.
    #[must_use]
    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(&id)
    }

    /// Iterate over all joints.
    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.joints.values()
    }

    /// Joints attached to `body`, sorted by ID.
    #[must_use]
    pub fn joints_owned_by(&self, body: BodyId) -> Vec<JointId> {
        let mut ids: Vec<_> = self
            .joints
            .values()
            .filter(|j| j.owner == body)
            .map(|j| j.id)
            .collect();
        ids.sort_by_key(|id| id.raw());
        ids
    }

    /// Joints whose other side is `body`, sorted by ID.
    #[must_use]
    pub fn joints_connected_to(&self, body: BodyId) -> Vec<JointId> {
        let mut ids: Vec<_> = self
            .joints
            .values()
            .filter(|j| j.connected == Some(body))
            .map(|j| j.id)
            .collect();
        ids.sort_by_key(|id| id.raw());
        ids
    }

    /// World pose of a collider.
    #[must_use]
    pub fn collider_pose(&self, collider: &Collider) -> Pose {
        match collider.body.and_then(|b| self.bodies.get(&b)) {
            Some(body) => {
                let parent = body.transform.pose;
                Pose::from_position_rotation(
                    parent.transform_point(&collider.local_pose.position),
                    parent.rotation * collider.local_pose.rotation,
                )
            }
            None => collider.local_pose,
        }
    }

    fn collider_enabled(&self, collider: &Collider) -> bool {
        collider
            .body
            .and_then(|b| self.bodies.get(&b))
            .is_none_or(|b| b.enabled)
    }

    fn body_entry(&mut self, id: BodyId) -> Result<&mut Body> {
        self.bodies
            .get_mut(&id)
            .ok_or(GrappleError::InvalidBodyId(id.raw()))
    }

    fn joint_entry(&mut self, id: JointId) -> Result<&mut Joint> {
        self.joints
            .get_mut(&id)
            .ok_or(GrappleError::InvalidJointId(id.raw()))
    }
}

impl PhysicsBackend for World {
    fn raycast(
        &self,
        origin: Point3<f64>,
        direction: UnitVector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit> {
        self.colliders
            .values()
            .filter(|c| self.collider_enabled(c))
            .filter_map(|c| {
                let pose = self.collider_pose(c);
                raycast_shape(&c.shape, &pose, origin, direction, max_distance).map(|hit| {
                    RayHit::new(hit.distance, hit.point, hit.normal, c.id, c.body)
                })
            })
            // Equal distances resolve to the lowest collider ID
            .min_by(|a, b| {
                a.distance
                    .total_cmp(&b.distance)
                    .then(a.collider.raw().cmp(&b.collider.raw()))
            })
    }

    fn create_body(&mut self, transform: Transform, kinematic: bool) -> BodyId {
        self.add_body(transform, kinematic)
    }

    fn destroy_body(&mut self, body: BodyId) -> Result<()> {
        let removed = self
            .bodies
            .remove(&body)
            .ok_or(GrappleError::InvalidBodyId(body.raw()))?;

        if let Some(collider) = removed.collider {
            self.colliders.remove(&collider);
        }
        self.joints.retain(|_, joint| joint.owner != body);
        for joint in self.joints.values_mut() {
            if joint.connected == Some(body) {
                joint.connected = None;
            }
        }
        Ok(())
    }

    fn ensure_body(&mut self, collider: ColliderId) -> Result<BodyId> {
        let entry = self
            .colliders
            .get(&collider)
            .ok_or(GrappleError::InvalidColliderId(collider.raw()))?;
        if let Some(body) = entry.body {
            return Ok(body);
        }

        // The new body takes over the collider's world pose
        let pose = entry.local_pose;
        let body = self.add_body(Transform::new(pose, 1.0), true);
        if let Some(c) = self.colliders.get_mut(&collider) {
            c.local_pose = Pose::identity();
        }
        self.attach(collider, body);
        debug!(%collider, %body, "added kinematic body to collider");
        Ok(body)
    }

    fn set_kinematic(&mut self, body: BodyId, kinematic: bool) -> Result<()> {
        self.body_entry(body)?.kinematic = kinematic;
        Ok(())
    }

    fn set_enabled(&mut self, body: BodyId, enabled: bool) -> Result<()> {
        self.body_entry(body)?.enabled = enabled;
        Ok(())
    }

    fn set_transform(&mut self, body: BodyId, transform: Transform) -> Result<()> {
        self.body_entry(body)?.transform = transform;
        Ok(())
    }

    fn transform(&self, body: BodyId) -> Result<Transform> {
        self.bodies
            .get(&body)
            .map(|b| b.transform)
            .ok_or(GrappleError::InvalidBodyId(body.raw()))
    }

    fn create_joint(&mut self, owner: BodyId, config: &CharacterJointConfig) -> Result<JointId> {
        if !self.bodies.contains_key(&owner) {
            return Err(GrappleError::InvalidBodyId(owner.raw()));
        }
        let id = JointId::new(self.next_joint_id);
        self.next_joint_id += 1;
        self.joints.insert(
            id,
            Joint {
                id,
                owner,
                connected: None,
                config: *config,
            },
        );
        trace!(%id, %owner, "joint created");
        Ok(id)
    }

    fn configure_joint(&mut self, joint: JointId, config: &CharacterJointConfig) -> Result<()> {
        self.joint_entry(joint)?.config = *config;
        Ok(())
    }

    fn connect_joint(&mut self, joint: JointId, body: Option<BodyId>) -> Result<()> {
        if let Some(other) = body {
            if !self.bodies.contains_key(&other) {
                return Err(GrappleError::InvalidBodyId(other.raw()));
            }
        }
        self.joint_entry(joint)?.connected = body;
        Ok(())
    }

    fn joint_connection(&self, joint: JointId) -> Result<Option<BodyId>> {
        self.joints
            .get(&joint)
            .map(|j| j.connected)
            .ok_or(GrappleError::InvalidJointId(joint.raw()))
    }

    fn destroy_joint(&mut self, joint: JointId) -> Result<()> {
        self.joints
            .remove(&joint)
            .map(|_| ())
            .ok_or(GrappleError::InvalidJointId(joint.raw()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn forward() -> UnitVector3<f64> {
        UnitVector3::new_normalize(Vector3::y())
    }

    #[test]
    fn test_raycast_nearest_hit() {
        let mut world = World::new();
        let far = world.add_static_collider(
            CollisionShape::sphere(1.0),
            Pose::from_position(Point3::new(0.0, 8.0, 0.0)),
        );
        let near = world.add_static_collider(
            CollisionShape::sphere(1.0),
            Pose::from_position(Point3::new(0.0, 4.0, 0.0)),
        );

        let hit = world.raycast(Point3::origin(), forward(), 20.0).unwrap();
        assert_eq!(hit.collider, near);
        assert_ne!(hit.collider, far);
        assert_relative_eq!(hit.distance, 3.0, epsilon = 1e-10);
        assert!(hit.body.is_none());
    }

    #[test]
    fn test_raycast_tie_prefers_lowest_id() {
        let mut world = World::new();
        let pose = Pose::from_position(Point3::new(0.0, 4.0, 0.0));
        let first = world.add_static_collider(CollisionShape::sphere(1.0), pose);
        world.add_static_collider(CollisionShape::sphere(1.0), pose);

        let hit = world.raycast(Point3::origin(), forward(), 20.0).unwrap();
        assert_eq!(hit.collider, first);
    }

    #[test]
    fn test_raycast_skips_disabled_bodies() {
        let mut world = World::new();
        let (body, _) = world.add_body_with_collider(
            CollisionShape::sphere(1.0),
            Transform::from_position(Point3::new(0.0, 4.0, 0.0)),
            false,
        );
        assert!(world.raycast(Point3::origin(), forward(), 20.0).is_some());

        world.set_enabled(body, false).unwrap();
        assert!(world.raycast(Point3::origin(), forward(), 20.0).is_none());
    }

    #[test]
    fn test_collider_follows_body() {
        let mut world = World::new();
        let (body, _) = world.add_body_with_collider(
            CollisionShape::sphere(0.5),
            Transform::from_position(Point3::new(0.0, 4.0, 0.0)),
            true,
        );
        world
            .set_transform(body, Transform::from_position(Point3::new(0.0, 9.0, 0.0)))
            .unwrap();

        let hit = world.raycast(Point3::origin(), forward(), 20.0).unwrap();
        assert_relative_eq!(hit.distance, 8.5, epsilon = 1e-10);
        assert_eq!(hit.body, Some(body));
    }

    #[test]
    fn test_ensure_body_on_static_collider() {
        let mut world = World::new();
        let collider = world.add_static_collider(
            CollisionShape::cuboid(Vector3::new(1.0, 1.0, 1.0)),
            Pose::from_position(Point3::new(0.0, 5.0, 0.0)),
        );

        let body = world.ensure_body(collider).unwrap();
        assert!(world.body(body).unwrap().kinematic);
        assert_eq!(world.collider(collider).unwrap().body, Some(body));
        assert_eq!(world.ensure_body(collider).unwrap(), body);

        // Collider stays where it was
        let hit = world.raycast(Point3::origin(), forward(), 20.0).unwrap();
        assert_relative_eq!(hit.distance, 4.0, epsilon = 1e-10);

        assert_eq!(
            world.ensure_body(ColliderId::new(99)),
            Err(GrappleError::InvalidColliderId(99))
        );
    }

    #[test]
    fn test_joint_lifecycle() {
        let mut world = World::new();
        let a = world.add_body(Transform::default(), false);
        let b = world.add_body(Transform::default(), false);

        let joint = world
            .create_joint(a, &CharacterJointConfig::chain_link())
            .unwrap();
        world.connect_joint(joint, Some(b)).unwrap();
        assert_eq!(world.joint_connection(joint).unwrap(), Some(b));
        assert_eq!(world.joints_owned_by(a), vec![joint]);
        assert_eq!(world.joints_connected_to(b), vec![joint]);

        world
            .configure_joint(joint, &CharacterJointConfig::player())
            .unwrap();
        assert_eq!(
            world.joint(joint).unwrap().config,
            CharacterJointConfig::player()
        );

        // Destroying the connected body leaves the joint dangling but valid
        world.destroy_body(b).unwrap();
        assert_eq!(world.joint_connection(joint).unwrap(), None);

        world.destroy_joint(joint).unwrap();
        assert!(world.destroy_joint(joint).unwrap_err().is_invalid_handle());
    }

    #[test]
    fn test_invalid_handles() {
        let mut world = World::new();
        let missing = BodyId::new(42);
        assert!(world.set_kinematic(missing, true).is_err());
        assert!(world.transform(missing).is_err());
        assert!(world
            .create_joint(missing, &CharacterJointConfig::chain_link())
            .is_err());

        let a = world.add_body(Transform::default(), false);
        let joint = world
            .create_joint(a, &CharacterJointConfig::chain_link())
            .unwrap();
        assert_eq!(
            world.connect_joint(joint, Some(missing)),
            Err(GrappleError::InvalidBodyId(42))
        );
    }

    #[test]
    fn test_destroy_body_removes_owned_joints_and_collider() {
        let mut world = World::new();
        let (body, collider) = world.add_body_with_collider(
            CollisionShape::sphere(1.0),
            Transform::default(),
            false,
        );
        world
            .create_joint(body, &CharacterJointConfig::chain_link())
            .unwrap();

        world.destroy_body(body).unwrap();
        assert_eq!(world.joint_count(), 0);
        assert!(world.collider(collider).is_none());
        assert_eq!(world.body_count(), 0);
    }
}
