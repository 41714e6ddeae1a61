//! Retraction controller.
//!
//! One [`retract_step`] reels the tail link toward the actor (or toward the
//! grapple origin when nothing is attached). Once it arrives the link is
//! released and the actor is moved onto the next link in.

use crate::attachment::PlayerAttachment;
use crate::physics::PhysicsBackend;
use crate::pool::LinkPool;
use crate::scan::move_towards;
use grapple_types::{Pose, Result};
use tracing::{debug, trace};

/// Outcome of one retraction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetractStep {
    /// The tail moved but has not arrived yet.
    Reeling,
    /// The tail arrived and was released.
    Released {
        /// Links still in the chain.
        remaining: usize,
    },
    /// Nothing left to retract.
    Exhausted,
}

/// Parameters for a retraction step.
#[derive(Debug, Clone, Copy)]
pub struct RetractParams {
    /// Reel speed (m/s).
    pub speed: f64,
    /// Step length (s).
    pub dt: f64,
    /// Squared distance at which the tail counts as arrived.
    pub epsilon_sq: f64,
}

/// Reel the tail link of a chain of `active` links one step.
///
/// An attachment whose joint the backend no longer holds is treated as
/// absent, so the tail reels toward `origin`.
pub fn retract_step<P>(
    physics: &mut P,
    pool: &mut LinkPool,
    active: usize,
    attachment: Option<&PlayerAttachment>,
    origin: &Pose,
    params: RetractParams,
) -> Result<RetractStep>
where
    P: PhysicsBackend + ?Sized,
{
    if active == 0 {
        return Ok(RetractStep::Exhausted);
    }
    let tail = active - 1;
    let attachment = attachment.filter(|attachment| attachment.is_present(&*physics));

    let target = match attachment {
        Some(attachment) => {
            attachment.detach(physics)?;
            physics.transform(attachment.body())?.position()
        }
        None => origin.position,
    };

    let current = pool.position(physics, tail)?;
    let next = move_towards(current, target, params.speed * params.dt.max(0.0));
    pool.move_link(physics, tail, next)?;

    if (target - next).norm_squared() < params.epsilon_sq {
        pool.disconnect_joint(physics, tail)?;
        pool.release(physics, tail)?;

        let remaining = tail;
        if let Some(attachment) = attachment.filter(|_| remaining > 0) {
            attachment.reattach(physics, pool.link(remaining - 1)?.body())?;
        }

        debug!(link = tail, remaining, "retracted link");
        return Ok(RetractStep::Released { remaining });
    }

    if let Some(attachment) = attachment {
        attachment.reattach(physics, pool.link(tail)?.body())?;
    }

    trace!(link = tail, position = ?next, "reeling");
    Ok(RetractStep::Reeling)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::linking::link_chain;
    use crate::testing::MockPhysics;
    use approx::assert_relative_eq;
    use grapple_types::{CharacterJointConfig, Transform};
    use nalgebra::Point3;

    fn chain(physics: &mut MockPhysics, links: usize) -> LinkPool {
        let mut pool = LinkPool::new(physics, links + 1, 1.0).unwrap();
        for i in 0..links {
            // Head farthest from the origin
            let y = (links - i) as f64;
            pool.acquire(physics, i, Transform::from_position(Point3::new(0.0, y, 0.0)))
                .unwrap();
        }
        link_chain(physics, &mut pool, &CharacterJointConfig::chain_link()).unwrap();
        pool
    }

    fn params(speed: f64) -> RetractParams {
        RetractParams {
            speed,
            dt: 0.1,
            epsilon_sq: 0.01,
        }
    }

    #[test]
    fn test_reel_toward_origin() {
        let mut physics = MockPhysics::new();
        let mut pool = chain(&mut physics, 3);
        let origin = Pose::identity();

        // Tail sits 1 m out; 5 m/s * 0.1 s covers half of it
        let step = retract_step(&mut physics, &mut pool, 3, None, &origin, params(5.0)).unwrap();
        assert_eq!(step, RetractStep::Reeling);
        assert_relative_eq!(pool.position(&physics, 2).unwrap().y, 0.5, epsilon = 1e-10);

        let step = retract_step(&mut physics, &mut pool, 3, None, &origin, params(5.0)).unwrap();
        assert_eq!(step, RetractStep::Released { remaining: 2 });
        assert!(!pool.link(2).unwrap().is_active());
    }

    #[test]
    fn test_player_follows_new_tail() {
        let mut physics = MockPhysics::new();
        let mut pool = chain(&mut physics, 3);
        let player = physics.add_body(Point3::origin());
        let tail = pool.link(2).unwrap().body();
        let attachment = PlayerAttachment::connect(
            &mut physics,
            player,
            tail,
            &CharacterJointConfig::player(),
        )
        .unwrap();

        let step = retract_step(
            &mut physics,
            &mut pool,
            3,
            Some(&attachment),
            &Pose::identity(),
            params(100.0),
        )
        .unwrap();
        assert_eq!(step, RetractStep::Released { remaining: 2 });
        assert_eq!(
            physics.joint(attachment.joint()).connected,
            Some(pool.link(1).unwrap().body())
        );

        // Released link's own joint no longer holds the chain
        let released_joint = pool.link(2).unwrap().joint().unwrap();
        assert_eq!(physics.joint(released_joint).connected, None);
    }

    #[test]
    fn test_stale_attachment_reels_to_origin() {
        let mut physics = MockPhysics::new();
        let mut pool = chain(&mut physics, 2);
        let player = physics.add_body(Point3::new(0.0, 5.0, 0.0));
        let tail = pool.link(1).unwrap().body();
        let attachment = PlayerAttachment::connect(
            &mut physics,
            player,
            tail,
            &CharacterJointConfig::player(),
        )
        .unwrap();
        physics.destroy_joint(attachment.joint()).unwrap();

        let step = retract_step(
            &mut physics,
            &mut pool,
            2,
            Some(&attachment),
            &Pose::identity(),
            params(5.0),
        )
        .unwrap();
        assert_eq!(step, RetractStep::Reeling);
        // Toward the origin, not the player at y = 5
        assert_relative_eq!(pool.position(&physics, 1).unwrap().y, 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_empty_chain_is_exhausted() {
        let mut physics = MockPhysics::new();
        let mut pool = LinkPool::new(&mut physics, 2, 1.0).unwrap();
        let step =
            retract_step(&mut physics, &mut pool, 0, None, &Pose::identity(), params(1.0)).unwrap();
        assert_eq!(step, RetractStep::Exhausted);
    }
}
