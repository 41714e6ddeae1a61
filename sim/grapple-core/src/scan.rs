//! Extension scanner.
//!
//! [`ExtensionScan`] is the resumable state of one extension: the cast point
//! advancing from the origin toward the end of the rope's range, and the
//! number of links laid out behind it. Each [`ExtensionScan::step`] advances
//! the cast point, lays the links along the live origin-to-cast line and
//! probes a short segment ahead for an obstruction.
//!
//! The direction is re-derived from the live origin every tick, so a moving
//! origin bends the approach instead of the rope flying a straight line.

use crate::physics::{PhysicsBackend, RayHit};
use crate::pool::LinkPool;
use grapple_types::{GrappleConfig, Pose, Result, Transform};
use nalgebra::{Point3, Unit, Vector3};
use std::f64::consts::FRAC_PI_2;
use tracing::trace;

/// Result of one scan step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanStep {
    /// Still travelling.
    Extending,
    /// The probe struck something.
    Contact(RayHit),
    /// The cast point reached the end of the range without a hit.
    Exhausted,
}

/// Resumable state of an extension in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtensionScan {
    cast_position: Point3<f64>,
    direction: Vector3<f64>,
    placed: usize,
}

impl ExtensionScan {
    /// Start a scan at the origin.
    #[must_use]
    pub fn new(origin: &Pose) -> Self {
        Self {
            cast_position: origin.position,
            direction: origin.forward(),
            placed: 0,
        }
    }

    /// Current cast position.
    #[must_use]
    pub fn cast_position(&self) -> Point3<f64> {
        self.cast_position
    }

    /// Unit direction from the origin to the cast position.
    #[must_use]
    pub fn direction(&self) -> Vector3<f64> {
        self.direction
    }

    /// Number of links laid out by the last step.
    #[must_use]
    pub fn placed(&self) -> usize {
        self.placed
    }

    /// Advance the scan by one tick of `dt` seconds.
    pub fn step<P>(
        &mut self,
        physics: &mut P,
        pool: &mut LinkPool,
        origin: &Pose,
        config: &GrappleConfig,
        dt: f64,
    ) -> Result<ScanStep>
    where
        P: PhysicsBackend + ?Sized,
    {
        let spacing = config.effective_link_spacing();
        let advance = config.extension_speed * dt.max(0.0);
        let destination = origin.position + origin.forward() * config.max_extension;

        self.cast_position = move_towards(self.cast_position, destination, advance);

        let offset = self.cast_position - origin.position;
        let distance = offset.norm();
        self.direction = if distance > 1e-10 {
            offset / distance
        } else {
            origin.forward()
        };

        // Head is index 0; the last pool slot is never used
        let max_links = pool.count().saturating_sub(1);
        // Tolerance keeps float drift from adding a link at exact multiples
        let count = ((distance / spacing - 1e-9).ceil().max(0.0) as usize).min(max_links);
        self.lay_links(physics, pool, config, spacing, count)?;

        trace!(
            cast = ?self.cast_position,
            distance,
            links = count,
            "extension step"
        );

        let probe_length = spacing * advance;
        if probe_length > 0.0 {
            let ray = Unit::new_normalize(self.direction);
            if let Some(hit) = physics.raycast(self.cast_position, ray, probe_length) {
                if self.placed == 0 && max_links > 0 {
                    // Struck before any link fit between origin and cast point
                    self.lay_links(physics, pool, config, spacing, 1)?;
                }
                return Ok(ScanStep::Contact(hit));
            }
        }

        if (destination - self.cast_position).norm_squared() <= config.arrival_epsilon_sq {
            return Ok(ScanStep::Exhausted);
        }

        Ok(ScanStep::Extending)
    }

    fn lay_links<P>(
        &mut self,
        physics: &mut P,
        pool: &mut LinkPool,
        config: &GrappleConfig,
        spacing: f64,
        count: usize,
    ) -> Result<()>
    where
        P: PhysicsBackend + ?Sized,
    {
        let step = self.direction * spacing;
        for i in 0..count {
            let position = self.cast_position - step * i as f64;
            let mut transform = Transform::along(position, &self.direction, config.link_scale);
            if config.alternate_rotation && i % 2 == 0 {
                transform = transform.twisted(FRAC_PI_2);
            }
            pool.acquire(physics, i, transform)?;
        }

        // The origin may have moved closer since the last tick
        for i in count..self.placed {
            pool.release(physics, i)?;
        }

        self.placed = count;
        Ok(())
    }
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting.
pub(crate) fn move_towards(
    current: Point3<f64>,
    target: Point3<f64>,
    max_delta: f64,
) -> Point3<f64> {
    let delta = target - current;
    let distance = delta.norm();
    if distance <= max_delta || distance < f64::EPSILON {
        target
    } else {
        current + delta * (max_delta / distance)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::testing::MockPhysics;
    use approx::assert_relative_eq;

    fn setup(max_extension: f64) -> (MockPhysics, LinkPool, GrappleConfig) {
        let config = GrappleConfig::default()
            .with_link_spacing(1.0)
            .with_max_extension(max_extension)
            .with_extension_speed(10.0);
        let mut physics = MockPhysics::new();
        let pool = LinkPool::new(&mut physics, config.link_capacity(), 1.0).unwrap();
        (physics, pool, config)
    }

    #[test]
    fn test_move_towards() {
        let a = Point3::origin();
        let b = Point3::new(3.0, 4.0, 0.0);

        let p = move_towards(a, b, 1.0);
        assert_relative_eq!((p - a).norm(), 1.0, epsilon = 1e-12);

        // No overshoot
        assert_eq!(move_towards(a, b, 10.0), b);
        assert_eq!(move_towards(b, b, 1.0), b);
    }

    #[test]
    fn test_step_lays_links_behind_cast() {
        let (mut physics, mut pool, config) = setup(10.0);
        let origin = Pose::identity();
        let mut scan = ExtensionScan::new(&origin);

        // 10 m/s for 0.35 s puts the cast at 3.5 m
        let step = scan
            .step(&mut physics, &mut pool, &origin, &config, 0.35)
            .unwrap();
        assert_eq!(step, ScanStep::Extending);
        assert_relative_eq!(scan.cast_position().y, 3.5, epsilon = 1e-10);
        assert_eq!(scan.placed(), 4);
        assert_eq!(pool.active_count(), 4);

        // Head sits on the cast point, the rest trail back by one spacing each
        assert_relative_eq!(pool.position(&physics, 0).unwrap().y, 3.5, epsilon = 1e-10);
        assert_relative_eq!(pool.position(&physics, 3).unwrap().y, 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_step_exhausts_at_range() {
        let (mut physics, mut pool, config) = setup(10.0);
        let origin = Pose::identity();
        let mut scan = ExtensionScan::new(&origin);

        let mut ticks = 0;
        loop {
            ticks += 1;
            match scan
                .step(&mut physics, &mut pool, &origin, &config, 0.1)
                .unwrap()
            {
                ScanStep::Extending => assert!(ticks < 100),
                ScanStep::Exhausted => break,
                ScanStep::Contact(_) => panic!("nothing to hit"),
            }
        }

        assert_eq!(ticks, 10);
        assert_eq!(scan.placed(), 10);
        assert!(scan.placed() < pool.count());
    }

    #[test]
    fn test_step_reports_contact() {
        let (mut physics, mut pool, config) = setup(10.0);
        physics.add_sphere(Point3::new(0.0, 4.5, 0.0), 0.5);
        let origin = Pose::identity();
        let mut scan = ExtensionScan::new(&origin);

        let hit = loop {
            match scan
                .step(&mut physics, &mut pool, &origin, &config, 0.1)
                .unwrap()
            {
                ScanStep::Extending => {}
                ScanStep::Contact(hit) => break hit,
                ScanStep::Exhausted => panic!("missed the sphere"),
            }
        };

        assert_relative_eq!(hit.point.y, 4.0, epsilon = 1e-9);
        assert!(scan.placed() >= 3 && scan.placed() <= 4);
    }

    #[test]
    fn test_link_count_clamped_to_capacity() {
        let config = GrappleConfig::default()
            .with_link_spacing(1.0)
            .with_max_extension(10.0)
            .with_extension_speed(100.0);
        let mut physics = MockPhysics::new();
        // Deliberately undersized pool
        let mut pool = LinkPool::new(&mut physics, 4, 1.0).unwrap();
        let origin = Pose::identity();
        let mut scan = ExtensionScan::new(&origin);

        let step = scan
            .step(&mut physics, &mut pool, &origin, &config, 1.0)
            .unwrap();
        assert_eq!(step, ScanStep::Exhausted);
        assert_eq!(scan.placed(), 3);
        assert!(!pool.link(3).unwrap().is_active());
    }

    #[test]
    fn test_origin_moving_closer_releases_links() {
        let (mut physics, mut pool, config) = setup(10.0);
        let mut origin = Pose::identity();
        let mut scan = ExtensionScan::new(&origin);

        scan.step(&mut physics, &mut pool, &origin, &config, 0.5)
            .unwrap();
        assert_eq!(scan.placed(), 5);

        // Origin jumps forward; the destination moves with it
        origin.position.y = 4.0;
        scan.step(&mut physics, &mut pool, &origin, &config, 0.05)
            .unwrap();
        assert!(scan.placed() < 5);
        assert_eq!(pool.active_count(), scan.placed());
    }

    #[test]
    fn test_alternate_rotation_twists_even_links() {
        let (mut physics, mut pool, config) = setup(10.0);
        let config = config.with_alternate_rotation(true);
        let origin = Pose::identity();
        let mut scan = ExtensionScan::new(&origin);
        scan.step(&mut physics, &mut pool, &origin, &config, 0.3)
            .unwrap();

        let r0 = physics.transform(pool.link(0).unwrap().body()).unwrap();
        let r1 = physics.transform(pool.link(1).unwrap().body()).unwrap();
        // Both aimed along +Y, side axes a quarter turn apart
        assert_relative_eq!(r0.pose.forward(), r1.pose.forward(), epsilon = 1e-10);
        assert_relative_eq!(r0.pose.right().dot(&r1.pose.right()), 0.0, epsilon = 1e-10);
    }
}
