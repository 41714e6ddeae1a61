//! Retraction scenarios: single steps, auto-retraction and the length floor.

use grapple_core::{Grapple, GrapplePhase, PhysicsBackend};
use grapple_tests::{add_obstacle, add_player, run_extension, unit_config, EventCounters, DT};
use approx::assert_relative_eq;
use grapple_types::Pose;
use nalgebra::Point3;
use grapple_world::World;

fn latched(world: &mut World, distance: f64) -> Grapple {
    add_obstacle(world, distance);
    let mut grapple = Grapple::new(unit_config(), Pose::identity(), world).expect("grapple");
    grapple.fire(world).expect("fire");
    let (outcome, _) = run_extension(&mut grapple, world, DT, 1000)
        .expect("tick")
        .expect("extension should finish");
    assert!(outcome.is_contact());
    grapple
}

/// Test: connect, then auto-retract with a 5 m floor → stalls at the floor, stays extended.
#[test]
fn auto_retract_stalls_at_floor() {
    let mut world = World::new();
    let mut grapple = latched(&mut world, 8.05);
    let player = add_player(&mut world);
    assert_eq!(grapple.active_joint_count(), 8);

    grapple.connect_player(&mut world, player).expect("connect");
    grapple.auto_retract(20.0, 5.0);

    for _ in 0..200 {
        grapple.tick(&mut world, 0.1).expect("tick");
    }

    let reach = grapple.reach(&world).expect("reach");
    let spacing = grapple.config().link_spacing;
    assert!(reach <= 5.0 + 1e-9, "reach {reach} above floor");
    assert!(reach > 5.0 - spacing - 1e-9, "reach {reach} retracted past floor");
    assert!(grapple.is_extended());
    assert_eq!(grapple.phase(), GrapplePhase::Retracting);
    assert_eq!(grapple.attached_player(), Some(player));

    // Stable: more ticks change nothing
    let count = grapple.active_joint_count();
    for _ in 0..50 {
        grapple.tick(&mut world, 0.1).expect("tick");
    }
    assert_eq!(grapple.active_joint_count(), count);

    // Player hangs from the current tail
    let tail = grapple.pool().link(count - 1).expect("tail").body();
    let joint = grapple.attachment().expect("attachment").joint();
    assert_eq!(world.joint_connection(joint).expect("joint"), Some(tail));
}

/// Test: disconnect from target, auto-retract with no floor → fully retracted and idle.
#[test]
fn auto_retract_without_floor_empties_chain() {
    let mut world = World::new();
    let counters = EventCounters::default();
    let mut grapple = latched(&mut world, 6.05);
    *grapple.handlers_mut() = counters.handlers();
    let player = add_player(&mut world);
    grapple.connect_player(&mut world, player).expect("connect");

    grapple.disconnect_from_target(&mut world).expect("disconnect target");
    assert!(grapple.target().is_none());
    assert!(grapple.pool().link(0).expect("head").joint().is_none());

    grapple.auto_retract(5.0, -1.0);
    let mut ticks = 0;
    while grapple.is_extended() {
        grapple.tick(&mut world, DT).expect("tick");
        ticks += 1;
        assert!(ticks < 10_000, "retraction never finished");
    }

    assert_eq!(grapple.active_joint_count(), 0);
    assert_eq!(grapple.pool().active_count(), 0);
    assert_eq!(grapple.phase(), GrapplePhase::Idle);
    // Reset detached the player
    assert!(grapple.attached_player().is_none());
    assert_eq!(counters.disconnected.get(), 1);
    assert!(world.joints_owned_by(player).is_empty());
}

/// Test: active links never increase while retracting.
#[test]
fn retraction_is_monotonic() {
    let mut world = World::new();
    let mut grapple = latched(&mut world, 9.05);
    grapple.auto_retract(3.0, 0.0);

    let mut previous = grapple.active_joint_count();
    while grapple.is_extended() {
        grapple.tick(&mut world, DT).expect("tick");
        let current = grapple.active_joint_count();
        assert!(current <= previous, "{current} > {previous}");
        assert!(previous - current <= 1);
        previous = current;
    }
    assert_eq!(previous, 0);
}

/// Test: fast enough to clear a link per tick → empty within one tick per link.
#[test]
fn fast_retraction_takes_one_tick_per_link() {
    let mut world = World::new();
    let mut grapple = latched(&mut world, 5.05);
    let links = grapple.active_joint_count();

    for _ in 0..links {
        grapple.retract(&mut world, 1000.0, DT).expect("retract");
    }

    assert_eq!(grapple.active_joint_count(), 0);
    assert!(!grapple.is_extended());
}

/// Test: a single retract step reels the tail toward the origin.
#[test]
fn retract_step_moves_tail() {
    let mut world = World::new();
    let mut grapple = latched(&mut world, 5.05);
    let count = grapple.active_joint_count();
    let tail = grapple.pool().link(count - 1).expect("tail").body();
    let before = world.transform(tail).expect("tail").position();

    grapple.retract(&mut world, 0.3, DT).expect("retract");

    let after = world.transform(tail).expect("tail").position();
    assert!(after.coords.norm() < before.coords.norm());
    assert_eq!(grapple.active_joint_count(), count);
}

/// Test: retract cancels an extension in flight.
#[test]
fn retract_cancels_extension() {
    let mut world = World::new();
    let mut grapple = Grapple::new(unit_config(), Pose::identity(), &mut world).expect("grapple");
    grapple.fire(&mut world).expect("fire");
    for _ in 0..12 {
        grapple.tick(&mut world, DT).expect("tick");
    }
    let count = grapple.active_joint_count();

    grapple.retract(&mut world, 1.0, DT).expect("retract");
    assert_ne!(grapple.phase(), GrapplePhase::Extending);

    // Nothing left to advance the scan
    assert_eq!(grapple.tick(&mut world, DT).expect("tick"), None);
    assert!(grapple.active_joint_count() <= count);
}

/// Test: auto-retract on an idle grapple does nothing and drops itself.
#[test]
fn auto_retract_when_idle_is_noop() {
    let mut world = World::new();
    let mut grapple = Grapple::new(unit_config(), Pose::identity(), &mut world).expect("grapple");
    grapple.auto_retract(5.0, 2.0);
    assert_eq!(grapple.tick(&mut world, DT).expect("tick"), None);
    assert_eq!(grapple.phase(), GrapplePhase::Idle);
    assert!((grapple.max_retract_length() - 2.0).abs() < f64::EPSILON);
}

/// Test: with no player attached the tail reels toward the origin's current position.
#[test]
fn origin_moved_during_retraction() {
    let mut world = World::new();
    let mut grapple = latched(&mut world, 5.05);
    let count = grapple.active_joint_count();
    let tail = grapple.pool().link(count - 1).expect("tail").body();
    let before = world.transform(tail).expect("tail").position();

    let origin = Point3::new(2.0, before.y, 0.0);
    grapple.set_origin(Pose::from_position(origin));
    grapple.retract(&mut world, 1.0, 0.1).expect("retract");

    // 0.1 m sideways toward the new origin
    let after = world.transform(tail).expect("tail").position();
    assert_relative_eq!(after.x, before.x + 0.1, epsilon = 1e-9);
    assert_relative_eq!(after.y, before.y, epsilon = 1e-9);
    assert_eq!(grapple.active_joint_count(), count);
    assert_eq!(grapple.origin().position, origin);
}
