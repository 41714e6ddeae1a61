//! Property-based tests for the grapple.
//!
//! Run with: cargo test -p grapple-tests -- properties

use grapple_core::{ExtensionOutcome, Grapple};
use grapple_tests::{add_obstacle, run_extension};
use grapple_types::{GrappleConfig, Pose};
use grapple_world::World;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Spacing, range and speed small enough to keep each case quick.
fn arb_config() -> impl Strategy<Value = GrappleConfig> {
    (0.25..3.0f64, 0.0..25.0f64, 2.0..60.0f64).prop_map(|(spacing, range, speed)| {
        GrappleConfig::default()
            .with_link_spacing(spacing)
            .with_max_extension(range)
            .with_extension_speed(speed)
    })
}

proptest! {
    /// Pool capacity always covers the range.
    #[test]
    fn capacity_covers_range(spacing in 0.001..10.0f64, range in 0.0..500.0f64) {
        let config = GrappleConfig::default()
            .with_link_spacing(spacing)
            .with_max_extension(range);
        let needed = (range / spacing).ceil() as usize;
        prop_assert!(config.link_capacity() >= needed);
        prop_assert!(config.link_capacity() >= 2);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Clear range: FAIL within range / (speed * dt) + 1 ticks, inside the pool.
    #[test]
    fn extension_terminates_in_bounded_ticks(config in arb_config(), dt in 0.005..0.05f64) {
        let mut world = World::new();
        let mut grapple = Grapple::new(config.clone(), Pose::identity(), &mut world).unwrap();
        grapple.fire(&mut world).unwrap();

        let bound = (config.max_extension / (config.extension_speed * dt)).ceil() as usize + 1;
        let mut max_seen = 0;
        let mut finished = None;
        for tick in 1..=bound {
            let outcome = grapple.tick(&mut world, dt).unwrap();
            max_seen = max_seen.max(grapple.active_joint_count());
            if let Some(outcome) = outcome {
                finished = Some((outcome, tick));
                break;
            }
        }

        let (outcome, _) = finished.expect("extension exceeded tick bound");
        prop_assert_eq!(outcome, ExtensionOutcome::Fail);
        prop_assert!(max_seen < grapple.capacity());
        prop_assert!(grapple.is_extended());
    }

    /// Obstacle within range: CONTACT, head latched, links inside the pool.
    ///
    /// Spacing of at least one keeps the probe as long as the per-tick advance,
    /// so the cast cannot step over the obstacle.
    #[test]
    fn obstacle_in_range_is_contacted(
        spacing in 1.0..3.0f64,
        range in 3.0..25.0f64,
        speed in 2.0..60.0f64,
        fraction in 0.1..0.9f64,
    ) {
        let config = GrappleConfig::default()
            .with_link_spacing(spacing)
            .with_max_extension(range)
            .with_extension_speed(speed);
        let mut world = World::new();
        add_obstacle(&mut world, config.max_extension * fraction);
        let mut grapple = Grapple::new(config, Pose::identity(), &mut world).unwrap();
        grapple.fire(&mut world).unwrap();

        let (outcome, _) = run_extension(&mut grapple, &mut world, 1.0 / 60.0, 100_000)
            .unwrap()
            .expect("extension never finished");
        let is_contact = matches!(outcome, ExtensionOutcome::Contact { .. });
        prop_assert!(is_contact);
        prop_assert!(grapple.active_joint_count() > 0);
        prop_assert!(grapple.active_joint_count() < grapple.capacity());
        prop_assert!(grapple.pool().link(0).unwrap().joint().is_some());
    }

    /// Reset after any number of ticks twice leaves the same state.
    #[test]
    fn reset_is_idempotent(config in arb_config(), ticks in 0usize..40) {
        let mut world = World::new();
        let mut grapple = Grapple::new(config, Pose::identity(), &mut world).unwrap();
        grapple.fire(&mut world).unwrap();
        for _ in 0..ticks {
            grapple.tick(&mut world, 1.0 / 30.0).unwrap();
        }

        grapple.reset_links(&mut world).unwrap();
        let links = grapple.pool().links().to_vec();
        let joints = world.joint_count();

        grapple.reset_links(&mut world).unwrap();
        prop_assert_eq!(grapple.pool().links(), links.as_slice());
        prop_assert_eq!(world.joint_count(), joints);
        prop_assert_eq!(grapple.active_joint_count(), 0);
        prop_assert!(!grapple.is_extended());
    }

    /// Auto-retraction never grows the chain and always empties it without a floor.
    #[test]
    fn auto_retract_is_monotonic(config in arb_config(), speed in 1.0..50.0f64) {
        let mut world = World::new();
        let mut grapple = Grapple::new(config, Pose::identity(), &mut world).unwrap();
        grapple.fire(&mut world).unwrap();
        run_extension(&mut grapple, &mut world, 1.0 / 60.0, 100_000).unwrap();

        grapple.auto_retract(speed, -1.0);
        let mut previous = grapple.active_joint_count();
        let mut ticks = 0;
        while grapple.is_extended() {
            grapple.tick(&mut world, 1.0 / 60.0).unwrap();
            let current = grapple.active_joint_count();
            prop_assert!(current <= previous);
            previous = current;
            ticks += 1;
            prop_assert!(ticks < 1_000_000);
        }
        prop_assert_eq!(grapple.active_joint_count(), 0);
    }
}
