//! Fixed-capacity pool of rope links.
//!
//! Every link body is created once when the pool is built and lives until
//! [`LinkPool::destroy`]. Activating and deactivating a link only toggles
//! backend flags, so firing the grapple never allocates bodies.
//!
//! Index 0 is the head (nearest the target); higher indices run back toward
//! the origin.

use crate::physics::PhysicsBackend;
use grapple_types::{
    BodyId, CharacterJointConfig, GrappleError, JointId, Point3, Result, Transform,
};

/// One segment of the rope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    body: BodyId,
    joint: Option<JointId>,
    active: bool,
    kinematic: bool,
}

impl Link {
    /// Rigid body backing this link.
    #[must_use]
    pub fn body(&self) -> BodyId {
        self.body
    }

    /// Joint owned by this link, if one has been created.
    #[must_use]
    pub fn joint(&self) -> Option<JointId> {
        self.joint
    }

    /// Whether the link is part of the rope.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the link is driven by its transform rather than the solver.
    #[must_use]
    pub fn is_kinematic(&self) -> bool {
        self.kinematic
    }
}

/// Preallocated, fixed-length sequence of links.
#[derive(Debug, Clone)]
pub struct LinkPool {
    links: Vec<Link>,
}

impl LinkPool {
    /// Create `capacity` inactive, kinematic link bodies.
    pub fn new<P>(physics: &mut P, capacity: usize, scale: f64) -> Result<Self>
    where
        P: PhysicsBackend + ?Sized,
    {
        let mut links = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            let transform = Transform {
                scale,
                ..Transform::default()
            };
            let body = physics.create_body(transform, true);
            physics.set_enabled(body, false)?;
            links.push(Link {
                body,
                joint: None,
                active: false,
                kinematic: true,
            });
        }
        Ok(Self { links })
    }

    /// Number of links in the pool. Never changes after construction.
    #[must_use]
    pub fn count(&self) -> usize {
        self.links.len()
    }

    /// Number of links currently flagged active.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.links.iter().filter(|l| l.active).count()
    }

    /// All links in index order.
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Link at `index`.
    pub fn link(&self, index: usize) -> Result<&Link> {
        self.links.get(index).ok_or(GrappleError::LinkIndexOutOfRange {
            index,
            capacity: self.links.len(),
        })
    }

    fn link_mut(&mut self, index: usize) -> Result<&mut Link> {
        let capacity = self.links.len();
        self.links
            .get_mut(index)
            .ok_or(GrappleError::LinkIndexOutOfRange { index, capacity })
    }

    /// Place and activate the link at `index`. The link becomes kinematic.
    pub fn acquire<P>(&mut self, physics: &mut P, index: usize, transform: Transform) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        let link = self.link_mut(index)?;
        physics.set_transform(link.body, transform)?;
        physics.set_kinematic(link.body, true)?;
        physics.set_enabled(link.body, true)?;
        link.kinematic = true;
        link.active = true;
        Ok(())
    }

    /// Deactivate the link at `index`.
    ///
    /// Its joint, if any, is disconnected but kept for reuse. The parked
    /// body is left kinematic so the solver ignores it.
    pub fn release<P>(&mut self, physics: &mut P, index: usize) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        let link = self.link_mut(index)?;
        if let Some(joint) = link.joint {
            physics.connect_joint(joint, None)?;
        }
        physics.set_kinematic(link.body, true)?;
        physics.set_enabled(link.body, false)?;
        link.kinematic = true;
        link.active = false;
        Ok(())
    }

    /// Switch the link at `index` between kinematic and simulated.
    pub fn set_kinematic<P>(&mut self, physics: &mut P, index: usize, kinematic: bool) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        let link = self.link_mut(index)?;
        physics.set_kinematic(link.body, kinematic)?;
        link.kinematic = kinematic;
        Ok(())
    }

    /// Joint of the link at `index`, creating it with `config` if absent.
    pub fn ensure_joint<P>(
        &mut self,
        physics: &mut P,
        index: usize,
        config: &CharacterJointConfig,
    ) -> Result<JointId>
    where
        P: PhysicsBackend + ?Sized,
    {
        let link = self.link_mut(index)?;
        if let Some(joint) = link.joint {
            return Ok(joint);
        }
        let joint = physics.create_joint(link.body, config)?;
        link.joint = Some(joint);
        Ok(joint)
    }

    /// Destroy the joint of the link at `index`. No-op without one.
    pub fn destroy_joint<P>(&mut self, physics: &mut P, index: usize) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        let link = self.link_mut(index)?;
        if let Some(joint) = link.joint.take() {
            physics.destroy_joint(joint)?;
        }
        Ok(())
    }

    /// Connect the joint of the link at `index` to `body`.
    ///
    /// No-op when the link has no joint.
    pub fn connect_joint<P>(
        &mut self,
        physics: &mut P,
        index: usize,
        body: Option<BodyId>,
    ) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        if let Some(joint) = self.link(index)?.joint {
            physics.connect_joint(joint, body)?;
        }
        Ok(())
    }

    /// Disconnect the joint of the link at `index`, keeping the joint itself.
    pub fn disconnect_joint<P>(&mut self, physics: &mut P, index: usize) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        self.connect_joint(physics, index, None)
    }

    /// Current world position of the link at `index`.
    pub fn position<P>(&self, physics: &P, index: usize) -> Result<Point3<f64>>
    where
        P: PhysicsBackend + ?Sized,
    {
        Ok(physics.transform(self.link(index)?.body)?.position())
    }

    /// Teleport the link at `index` to `position`, keeping rotation and scale.
    pub fn move_link<P>(&mut self, physics: &mut P, index: usize, position: Point3<f64>) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        let body = self.link(index)?.body;
        let transform = physics.transform(body)?.with_position(position);
        physics.set_transform(body, transform)
    }

    /// Destroy every joint and body owned by the pool.
    pub fn destroy<P>(self, physics: &mut P) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        for link in self.links {
            if let Some(joint) = link.joint {
                physics.destroy_joint(joint)?;
            }
            physics.destroy_body(link.body)?;
        }
        Ok(())
    }
}
