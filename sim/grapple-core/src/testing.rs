//! Minimal in-crate backend for unit tests.
//!
//! Colliders are spheres and raycasts return the nearest one. Joint and body
//! bookkeeping mirrors what a real engine would report.

use crate::physics::{PhysicsBackend, RayHit};
use grapple_types::{
    BodyId, CharacterJointConfig, ColliderId, GrappleError, JointId, Result, Transform,
};
use hashbrown::HashMap;
use nalgebra::{Point3, UnitVector3};

#[derive(Debug, Clone)]
pub struct MockBody {
    pub transform: Transform,
    pub kinematic: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct MockJoint {
    pub owner: BodyId,
    pub connected: Option<BodyId>,
    pub config: CharacterJointConfig,
}

#[derive(Debug, Clone)]
pub struct MockSphere {
    pub center: Point3<f64>,
    pub radius: f64,
    pub body: Option<BodyId>,
}

#[derive(Debug, Default)]
pub struct MockPhysics {
    next_id: u64,
    pub bodies: HashMap<BodyId, MockBody>,
    pub joints: HashMap<JointId, MockJoint>,
    pub spheres: HashMap<ColliderId, MockSphere>,
}

impl MockPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Add a static sphere with no rigid body.
    pub fn add_sphere(&mut self, center: Point3<f64>, radius: f64) -> ColliderId {
        let id = ColliderId::new(self.next());
        self.spheres.insert(
            id,
            MockSphere {
                center,
                radius,
                body: None,
            },
        );
        id
    }

    /// Add a dynamic body at `position` with no collider.
    pub fn add_body(&mut self, position: Point3<f64>) -> BodyId {
        self.create_body(Transform::from_position(position), false)
    }

    pub fn body(&self, body: BodyId) -> &MockBody {
        &self.bodies[&body]
    }

    pub fn joint(&self, joint: JointId) -> &MockJoint {
        &self.joints[&joint]
    }

    fn body_mut(&mut self, body: BodyId) -> Result<&mut MockBody> {
        self.bodies
            .get_mut(&body)
            .ok_or(GrappleError::InvalidBodyId(body.raw()))
    }

    fn joint_mut(&mut self, joint: JointId) -> Result<&mut MockJoint> {
        self.joints
            .get_mut(&joint)
            .ok_or(GrappleError::InvalidJointId(joint.raw()))
    }
}

impl PhysicsBackend for MockPhysics {
    fn raycast(
        &self,
        origin: Point3<f64>,
        direction: UnitVector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit> {
        self.spheres
            .iter()
            .filter_map(|(&id, sphere)| {
                let dir = direction.as_ref();
                let oc = origin - sphere.center;
                let b = oc.dot(dir);
                let c = oc.dot(&oc) - sphere.radius * sphere.radius;
                let disc = b * b - c;
                if disc < 0.0 {
                    return None;
                }
                let mut t = -b - disc.sqrt();
                if t < 0.0 {
                    t = -b + disc.sqrt();
                }
                if t < 0.0 || t > max_distance {
                    return None;
                }
                let point = origin + dir * t;
                let normal = (point - sphere.center).normalize();
                Some(RayHit::new(t, point, normal, id, sphere.body))
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn create_body(&mut self, transform: Transform, kinematic: bool) -> BodyId {
        let id = BodyId::new(self.next());
        self.bodies.insert(
            id,
            MockBody {
                transform,
                kinematic,
                enabled: true,
            },
        );
        id
    }

    fn destroy_body(&mut self, body: BodyId) -> Result<()> {
        self.bodies
            .remove(&body)
            .ok_or(GrappleError::InvalidBodyId(body.raw()))?;
        self.joints.retain(|_, joint| joint.owner != body);
        Ok(())
    }

    fn ensure_body(&mut self, collider: ColliderId) -> Result<BodyId> {
        let sphere = self
            .spheres
            .get(&collider)
            .cloned()
            .ok_or(GrappleError::InvalidColliderId(collider.raw()))?;
        if let Some(body) = sphere.body {
            return Ok(body);
        }
        let body = self.create_body(Transform::from_position(sphere.center), true);
        if let Some(entry) = self.spheres.get_mut(&collider) {
            entry.body = Some(body);
        }
        Ok(body)
    }

    fn set_kinematic(&mut self, body: BodyId, kinematic: bool) -> Result<()> {
        self.body_mut(body)?.kinematic = kinematic;
        Ok(())
    }

    fn set_enabled(&mut self, body: BodyId, enabled: bool) -> Result<()> {
        self.body_mut(body)?.enabled = enabled;
        Ok(())
    }

    fn set_transform(&mut self, body: BodyId, transform: Transform) -> Result<()> {
        self.body_mut(body)?.transform = transform;
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
        let id = JointId::new(self.next());
        self.joints.insert(
            id,
            MockJoint {
                owner,
                connected: None,
                config: *config,
            },
        );
        Ok(id)
    }

    fn configure_joint(&mut self, joint: JointId, config: &CharacterJointConfig) -> Result<()> {
        self.joint_mut(joint)?.config = *config;
        Ok(())
    }

    fn connect_joint(&mut self, joint: JointId, body: Option<BodyId>) -> Result<()> {
        if let Some(b) = body {
            if !self.bodies.contains_key(&b) {
                return Err(GrappleError::InvalidBodyId(b.raw()));
            }
        }
        self.joint_mut(joint)?.connected = body;
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
