//! Coupling between the rope tail and the actor hanging from it.

use crate::physics::PhysicsBackend;
use grapple_types::{BodyId, CharacterJointConfig, JointId, Result};

/// Joint owned by the actor body and connected to the tail link.
///
/// At most one exists per grapple. Dropping the value without calling
/// [`PlayerAttachment::release`] leaks the backend joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerAttachment {
    body: BodyId,
    joint: JointId,
}

impl PlayerAttachment {
    /// Create the actor-side joint and connect it to `tail`.
    pub fn connect<P>(
        physics: &mut P,
        body: BodyId,
        tail: BodyId,
        config: &CharacterJointConfig,
    ) -> Result<Self>
    where
        P: PhysicsBackend + ?Sized,
    {
        let joint = physics.create_joint(body, config)?;
        physics.connect_joint(joint, Some(tail))?;
        Ok(Self { body, joint })
    }

    /// Attached actor body.
    #[must_use]
    pub fn body(&self) -> BodyId {
        self.body
    }

    /// Actor-side joint.
    #[must_use]
    pub fn joint(&self) -> JointId {
        self.joint
    }

    /// Whether the backend still holds the actor-side joint.
    ///
    /// The host may destroy the actor body, taking its joints with it.
    pub fn is_present<P>(&self, physics: &P) -> bool
    where
        P: PhysicsBackend + ?Sized,
    {
        physics.joint_connection(self.joint).is_ok()
    }

    /// Let go of the tail while it is being moved. No-op if the joint is gone.
    pub fn detach<P>(&self, physics: &mut P) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        if !self.is_present(&*physics) {
            return Ok(());
        }
        physics.connect_joint(self.joint, None)
    }

    /// Connect to a (possibly new) tail link. No-op if the joint is gone.
    pub fn reattach<P>(&self, physics: &mut P, tail: BodyId) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        if !self.is_present(&*physics) {
            return Ok(());
        }
        physics.connect_joint(self.joint, Some(tail))
    }

    /// Destroy the actor-side joint. No-op if it is already gone.
    pub fn release<P>(self, physics: &mut P) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        if !self.is_present(&*physics) {
            return Ok(());
        }
        physics.destroy_joint(self.joint)
    }
}
