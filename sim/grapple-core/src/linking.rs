//! Joint linking.
//!
//! Turns the active links into a simulated chain: every active link after the
//! head gets a joint connected to the previous active link's body, and every
//! joint present is given the chain limits.

use crate::physics::PhysicsBackend;
use crate::pool::LinkPool;
use grapple_types::{BodyId, CharacterJointConfig, Result};
use tracing::debug;

/// Link the active links of `pool` head to tail.
///
/// Inactive links are skipped. Existing joints are reused, so running this
/// twice never creates a second joint on a link. Returns the number of
/// links made part of the chain.
pub fn link_chain<P>(
    physics: &mut P,
    pool: &mut LinkPool,
    config: &CharacterJointConfig,
) -> Result<usize>
where
    P: PhysicsBackend + ?Sized,
{
    let mut previous: Option<BodyId> = None;
    let mut linked = 0;

    for index in 0..pool.count() {
        let link = *pool.link(index)?;
        if !link.is_active() {
            continue;
        }

        pool.set_kinematic(physics, index, false)?;

        if let Some(prev) = previous {
            let joint = pool.ensure_joint(physics, index, config)?;
            physics.connect_joint(joint, Some(prev))?;
        }

        if let Some(joint) = pool.link(index)?.joint() {
            physics.configure_joint(joint, config)?;
        }

        previous = Some(link.body());
        linked += 1;
    }

    debug!(links = linked, "chain linked");
    Ok(linked)
}
