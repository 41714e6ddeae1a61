//! Grapple controller.
//!
//! [`Grapple`] owns the link pool, the chain counters, the player attachment
//! and at most one running routine (an extension or an auto-retraction). The
//! host calls [`Grapple::tick`] once per simulation step; everything else is
//! an immediate command.
//!
//! ```text
//! Idle ──fire──▶ Extending ──contact/fail──▶ Linked ──auto_retract──▶ Retracting
//!   ▲                                                                   │
//!   └───────────────────────────── reset_links ◀────────────────────────┘
//! ```
//!
//! `fire` may be called from any phase; it cancels whatever is running and
//! starts over from an empty chain.

use crate::attachment::PlayerAttachment;
use crate::events::{ExtensionOutcome, GrappleEvent, GrappleHandlers};
use crate::linking::link_chain;
use crate::physics::{PhysicsBackend, RayHit};
use crate::pool::LinkPool;
use crate::retract::{retract_step, RetractParams, RetractStep};
use crate::scan::{ExtensionScan, ScanStep};
use grapple_types::{BodyId, GrappleConfig, GrappleError, Pose, Result, MIN_LINK_SPACING};
use tracing::{debug, trace, warn};

/// Coarse chain state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrapplePhase {
    /// No chain.
    Idle,
    /// An extension is in flight.
    Extending,
    /// The chain is linked and nothing is running.
    Linked,
    /// An auto-retraction is running.
    Retracting,
}

/// Routine owned by the grapple and advanced by [`Grapple::tick`].
#[derive(Debug, Clone, Copy)]
enum Routine {
    Extend(ExtensionScan),
    AutoRetract { speed: f64 },
}

/// Segmented grapple rope.
#[derive(Debug)]
pub struct Grapple {
    config: GrappleConfig,
    origin: Pose,
    pool: LinkPool,
    active_joint_count: usize,
    extended: bool,
    max_retract_length: f64,
    routine: Option<Routine>,
    target: Option<BodyId>,
    attachment: Option<PlayerAttachment>,
    handlers: GrappleHandlers,
}

impl Grapple {
    /// Validate `config` and preallocate the link pool.
    pub fn new<P>(config: GrappleConfig, origin: Pose, physics: &mut P) -> Result<Self>
    where
        P: PhysicsBackend + ?Sized,
    {
        config.validate()?;
        if config.link_spacing < MIN_LINK_SPACING {
            warn!(
                spacing = config.link_spacing,
                min = MIN_LINK_SPACING,
                "link spacing below minimum, clamping"
            );
        }

        let capacity = config.link_capacity();
        let pool = LinkPool::new(physics, capacity, config.link_scale)?;
        debug!(capacity, "grapple created");

        Ok(Self {
            config,
            origin,
            pool,
            active_joint_count: 0,
            extended: false,
            max_retract_length: 0.0,
            routine: None,
            target: None,
            attachment: None,
            handlers: GrappleHandlers::default(),
        })
    }

    /// Install notification handlers.
    #[must_use]
    pub fn with_handlers(mut self, handlers: GrappleHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// Mutable access to the notification handlers.
    pub fn handlers_mut(&mut self) -> &mut GrappleHandlers {
        &mut self.handlers
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Configuration the grapple was built with.
    #[must_use]
    pub fn config(&self) -> &GrappleConfig {
        &self.config
    }

    /// Current origin.
    #[must_use]
    pub fn origin(&self) -> &Pose {
        &self.origin
    }

    /// Link pool.
    #[must_use]
    pub fn pool(&self) -> &LinkPool {
        &self.pool
    }

    /// Number of preallocated links.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pool.count()
    }

    /// Whether a linked chain exists (contact or fail has completed and
    /// the chain has not been reset).
    #[must_use]
    pub fn is_extended(&self) -> bool {
        self.extended
    }

    /// Number of links in the chain.
    #[must_use]
    pub fn active_joint_count(&self) -> usize {
        self.active_joint_count
    }

    /// Retraction floor installed by the last [`Grapple::auto_retract`].
    #[must_use]
    pub fn max_retract_length(&self) -> f64 {
        self.max_retract_length
    }

    /// Body the head is latched onto.
    #[must_use]
    pub fn target(&self) -> Option<BodyId> {
        self.target
    }

    /// Actor body coupled to the tail.
    #[must_use]
    pub fn attached_player(&self) -> Option<BodyId> {
        self.attachment.map(|a| a.body())
    }

    /// Player attachment, if any.
    #[must_use]
    pub fn attachment(&self) -> Option<&PlayerAttachment> {
        self.attachment.as_ref()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> GrapplePhase {
        match self.routine {
            Some(Routine::Extend(_)) => GrapplePhase::Extending,
            Some(Routine::AutoRetract { .. }) if self.extended => GrapplePhase::Retracting,
            _ if self.extended => GrapplePhase::Linked,
            _ => GrapplePhase::Idle,
        }
    }

    /// Distance from the head link to the tail link.
    pub fn reach<P>(&self, physics: &P) -> Result<f64>
    where
        P: PhysicsBackend + ?Sized,
    {
        if self.active_joint_count == 0 {
            return Ok(0.0);
        }
        let head = self.pool.position(physics, 0)?;
        let tail = self.pool.position(physics, self.active_joint_count - 1)?;
        Ok((head - tail).norm())
    }

    /// Move the origin. The running routine reads it on its next tick.
    pub fn set_origin(&mut self, origin: Pose) {
        self.origin = origin;
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Cancel whatever is running, reset the chain and start extending.
    pub fn fire<P>(&mut self, physics: &mut P) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        self.routine = None;
        self.reset_links(physics)?;
        self.routine = Some(Routine::Extend(ExtensionScan::new(&self.origin)));
        debug!(origin = ?self.origin.position, "fire");
        Ok(())
    }

    /// Advance the running routine by `dt` seconds.
    ///
    /// Returns the outcome on the tick an extension finishes.
    pub fn tick<P>(&mut self, physics: &mut P, dt: f64) -> Result<Option<ExtensionOutcome>>
    where
        P: PhysicsBackend + ?Sized,
    {
        match self.routine.take() {
            None => Ok(None),
            Some(Routine::Extend(mut scan)) => {
                let step = scan.step(physics, &mut self.pool, &self.origin, &self.config, dt)?;
                self.active_joint_count = scan.placed();
                match step {
                    ScanStep::Extending => {
                        self.routine = Some(Routine::Extend(scan));
                        Ok(None)
                    }
                    ScanStep::Contact(hit) => self.finish_contact(physics, &hit).map(Some),
                    ScanStep::Exhausted => self.finish_fail(physics).map(Some),
                }
            }
            Some(Routine::AutoRetract { speed }) => {
                if !self.extended {
                    return Ok(None);
                }
                self.routine = Some(Routine::AutoRetract { speed });
                self.retract_once(physics, speed, dt)?;
                if !self.extended {
                    self.routine = None;
                    debug!("auto retract finished");
                }
                Ok(None)
            }
        }
    }

    /// Cancel any running routine and retract one step.
    pub fn retract<P>(&mut self, physics: &mut P, speed: f64, dt: f64) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        self.routine = None;
        self.retract_once(physics, speed, dt)
    }

    /// Cancel any running routine and retract every tick while extended.
    ///
    /// A positive `max_retract_length` stops retraction once the reach, the
    /// distance from the head link to the tail link (see [`Grapple::reach`]),
    /// is shorter than it; zero or negative retracts fully.
    pub fn auto_retract(&mut self, speed: f64, max_retract_length: f64) {
        self.routine = None;
        self.max_retract_length = max_retract_length;
        self.routine = Some(Routine::AutoRetract { speed });
        debug!(speed, max_retract_length, "auto retract");
    }

    /// Destroy the head joint's connection to the grappled body.
    pub fn disconnect_from_target<P>(&mut self, physics: &mut P) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        self.pool.destroy_joint(physics, 0)?;
        if let Some(target) = self.target.take() {
            debug!(%target, "disconnected from target");
        }
        Ok(())
    }

    /// Couple `body` to the tail link, replacing any existing attachment.
    pub fn connect_player<P>(&mut self, physics: &mut P, body: BodyId) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        if self.active_joint_count == 0 {
            return Err(GrappleError::EmptyChain);
        }
        if let Some(existing) = self.attachment {
            self.disconnect_player(physics, existing.body())?;
        }

        let tail = self.pool.link(self.active_joint_count - 1)?.body();
        let attachment =
            PlayerAttachment::connect(physics, body, tail, &self.config.player_joint)?;
        self.attachment = Some(attachment);
        debug!(%body, %tail, "player connected");
        self.handlers.emit(GrappleEvent::Connected);
        Ok(())
    }

    /// Uncouple `body` from the tail. No-op if `body` is not attached.
    pub fn disconnect_player<P>(&mut self, physics: &mut P, body: BodyId) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        match self.attachment {
            Some(attachment) if attachment.body() == body => {
                self.attachment = None;
                attachment.release(physics)?;
                debug!(%body, "player disconnected");
                self.handlers.emit(GrappleEvent::Disconnected);
            }
            Some(attachment) => {
                warn!(%body, attached = %attachment.body(), "disconnect ignored, different body attached");
            }
            None => {
                warn!(%body, "disconnect ignored, no player attached");
            }
        }
        Ok(())
    }

    /// Return to idle: drop every connection and park every link.
    ///
    /// Running twice in a row leaves the same state. The grapple ends idle
    /// even when a backend call fails; the first error is returned.
    pub fn reset_links<P>(&mut self, physics: &mut P) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        // Every step runs even if an earlier one fails; the first error wins.
        let mut result = self.pool.disconnect_joint(physics, 0);
        self.target = None;

        if let Some(attachment) = self.attachment {
            result = result.and(self.disconnect_player(physics, attachment.body()));
        }

        for index in 0..self.pool.count() {
            result = result.and(self.pool.release(physics, index));
        }

        self.active_joint_count = 0;
        self.extended = false;
        trace!("links reset");
        result
    }

    /// Release every backend resource owned by the grapple.
    pub fn destroy<P>(mut self, physics: &mut P) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        self.routine = None;
        if let Some(attachment) = self.attachment.take() {
            attachment.release(physics)?;
        }
        self.pool.destroy(physics)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn finish_contact<P>(&mut self, physics: &mut P, hit: &RayHit) -> Result<ExtensionOutcome>
    where
        P: PhysicsBackend + ?Sized,
    {
        link_chain(physics, &mut self.pool, &self.config.chain_joint)?;

        let body = match hit.body {
            Some(body) => body,
            None => physics.ensure_body(hit.collider)?,
        };
        self.pool
            .ensure_joint(physics, 0, &self.config.chain_joint)?;
        self.pool.connect_joint(physics, 0, Some(body))?;

        self.target = Some(body);
        self.extended = true;
        debug!(%body, point = ?hit.point, links = self.active_joint_count, "contact");
        self.handlers.emit(GrappleEvent::Contact);

        Ok(ExtensionOutcome::Contact {
            body,
            point: hit.point,
        })
    }

    fn finish_fail<P>(&mut self, physics: &mut P) -> Result<ExtensionOutcome>
    where
        P: PhysicsBackend + ?Sized,
    {
        link_chain(physics, &mut self.pool, &self.config.chain_joint)?;
        self.pool.destroy_joint(physics, 0)?;

        self.extended = true;
        debug!(links = self.active_joint_count, "extension failed");
        self.handlers.emit(GrappleEvent::Fail);

        Ok(ExtensionOutcome::Fail)
    }

    fn retract_once<P>(&mut self, physics: &mut P, speed: f64, dt: f64) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        if self.active_joint_count == 0 {
            return self.reset_links(physics);
        }

        if let Some(attachment) = self.attachment {
            if !attachment.is_present(&*physics) {
                self.attachment = None;
                warn!(body = %attachment.body(), "player joint gone, dropping attachment");
                self.handlers.emit(GrappleEvent::Disconnected);
            }
        }

        if self.max_retract_length > 0.0 {
            let reach = self.reach(physics)?;
            if reach * reach < self.max_retract_length * self.max_retract_length {
                trace!(reach, floor = self.max_retract_length, "retract stalled at floor");
                return Ok(());
            }
        }

        let params = RetractParams {
            speed,
            dt,
            epsilon_sq: self.config.retract_epsilon_sq,
        };
        let step = retract_step(
            physics,
            &mut self.pool,
            self.active_joint_count,
            self.attachment.as_ref(),
            &self.origin,
            params,
        )?;

        match step {
            RetractStep::Reeling => Ok(()),
            RetractStep::Released { remaining } => {
                self.active_joint_count = remaining;
                if remaining == 0 {
                    self.reset_links(physics)?;
                }
                Ok(())
            }
            RetractStep::Exhausted => self.reset_links(physics),
        }
    }
}
