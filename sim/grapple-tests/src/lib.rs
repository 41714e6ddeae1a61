//! Shared scene setup for the grapple integration tests.
//!
//! Everything here builds on [`grapple_world::World`]. The rope is fired
//! along +Y from the world origin unless a test says otherwise.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![allow(clippy::missing_errors_doc)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use grapple_core::{ExtensionOutcome, Grapple, GrappleHandlers};
use grapple_types::{BodyId, ColliderId, GrappleConfig, Pose, Result, Transform};
use grapple_world::{CollisionShape, World};
use nalgebra::Point3;

/// Tick length used by most scenarios (60 Hz).
pub const DT: f64 = 1.0 / 60.0;

/// Unit link spacing, 10 m range, 10 m/s.
#[must_use]
pub fn unit_config() -> GrappleConfig {
    GrappleConfig::default()
        .with_link_spacing(1.0)
        .with_max_extension(10.0)
        .with_extension_speed(10.0)
}

/// Static sphere whose near surface sits `distance` metres down +Y.
pub fn add_obstacle(world: &mut World, distance: f64) -> ColliderId {
    let radius = 0.5;
    world.add_static_collider(
        CollisionShape::sphere(radius),
        Pose::from_position(Point3::new(0.0, distance + radius, 0.0)),
    )
}

/// Dynamic body with a sphere collider, near surface at `distance` down +Y.
pub fn add_dynamic_obstacle(world: &mut World, distance: f64) -> (BodyId, ColliderId) {
    let radius = 0.5;
    world.add_body_with_collider(
        CollisionShape::sphere(radius),
        Transform::from_position(Point3::new(0.0, distance + radius, 0.0)),
        false,
    )
}

/// Actor body standing at the world origin.
pub fn add_player(world: &mut World) -> BodyId {
    world.add_body(Transform::from_position(Point3::origin()), false)
}

/// Tick until the extension finishes or `max_ticks` pass.
///
/// Returns the outcome and the number of ticks taken.
pub fn run_extension(
    grapple: &mut Grapple,
    world: &mut World,
    dt: f64,
    max_ticks: usize,
) -> Result<Option<(ExtensionOutcome, usize)>> {
    for tick in 1..=max_ticks {
        if let Some(outcome) = grapple.tick(world, dt)? {
            return Ok(Some((outcome, tick)));
        }
    }
    Ok(None)
}

/// Counts how often a handler fired.
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    /// Handler closure that bumps this counter.
    pub fn handler(&self) -> impl FnMut() + 'static {
        let count = Arc::clone(&self.0);
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Times the handler ran.
    #[must_use]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// One counter per notification.
#[derive(Debug, Clone, Default)]
pub struct EventCounters {
    /// Contact notifications.
    pub contact: Counter,
    /// Fail notifications.
    pub fail: Counter,
    /// Connected notifications.
    pub connected: Counter,
    /// Disconnected notifications.
    pub disconnected: Counter,
}

impl EventCounters {
    /// Handlers wired to these counters.
    #[must_use]
    pub fn handlers(&self) -> GrappleHandlers {
        GrappleHandlers::new()
            .on_contact(self.contact.handler())
            .on_fail(self.fail.handler())
            .on_connected(self.connected.handler())
            .on_disconnected(self.disconnected.handler())
    }
}
