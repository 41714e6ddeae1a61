//! Extension scenarios: fire, contact, fail and re-firing.

use approx::assert_relative_eq;
use grapple_core::{ExtensionOutcome, Grapple, GrapplePhase, PhysicsBackend};
use grapple_tests::{
    add_dynamic_obstacle, add_obstacle, run_extension, unit_config, EventCounters, DT,
};
use grapple_types::{GrappleConfig, Pose};
use grapple_world::World;
use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Test: clear range → FAIL once the cast reaches full range, one link per metre.
#[test]
fn fail_at_full_range() {
    let mut world = World::new();
    // Beyond the 10 m range, never reached by the probe
    add_obstacle(&mut world, 11.5);

    let counters = EventCounters::default();
    let mut grapple = Grapple::new(unit_config(), Pose::identity(), &mut world)
        .expect("grapple")
        .with_handlers(counters.handlers());
    assert!(grapple.capacity() >= 10);

    grapple.fire(&mut world).expect("fire");
    let (outcome, ticks) = run_extension(&mut grapple, &mut world, DT, 1000)
        .expect("tick")
        .expect("extension should finish");

    assert_eq!(outcome, ExtensionOutcome::Fail);
    // 10 m at 10 m/s, one tick of slack
    assert!(ticks <= 61, "took {ticks} ticks");
    assert_eq!(grapple.active_joint_count(), 10);
    assert!(grapple.is_extended());
    assert_eq!(grapple.phase(), GrapplePhase::Linked);
    assert_eq!((counters.fail.get(), counters.contact.get()), (1, 0));

    let head = world
        .transform(grapple.pool().link(0).expect("head").body())
        .expect("head transform");
    assert_relative_eq!(head.position().y, 10.0, epsilon = 1e-6);
}

/// Test: after FAIL the head has no joint and nothing outside the chain is held.
#[test]
fn fail_leaves_no_external_connection() {
    let mut world = World::new();
    let mut grapple = Grapple::new(unit_config(), Pose::identity(), &mut world).expect("grapple");
    grapple.fire(&mut world).expect("fire");
    run_extension(&mut grapple, &mut world, DT, 1000).expect("tick");

    let pool = grapple.pool();
    assert!(pool.link(0).expect("head").joint().is_none());

    let link_bodies: Vec<_> = pool.links().iter().map(|l| l.body()).collect();
    for joint in world.joints() {
        let connected = joint.connected.expect("chain joints are connected");
        assert!(link_bodies.contains(&connected));
    }
    assert!(grapple.target().is_none());
}

/// Test: obstruction at 4 m → CONTACT with four links and the head latched on.
#[test]
fn contact_with_static_obstacle() {
    let mut world = World::new();
    let collider = add_obstacle(&mut world, 4.05);

    let counters = EventCounters::default();
    let config = unit_config();
    let mut grapple = Grapple::new(config.clone(), Pose::identity(), &mut world)
        .expect("grapple")
        .with_handlers(counters.handlers());

    grapple.fire(&mut world).expect("fire");
    let (outcome, _) = run_extension(&mut grapple, &mut world, DT, 1000)
        .expect("tick")
        .expect("extension should finish");

    let ExtensionOutcome::Contact { body, point } = outcome else {
        panic!("expected contact, got {outcome:?}");
    };
    assert_relative_eq!(point.y, 4.05, epsilon = 1e-9);
    assert_eq!(grapple.active_joint_count(), 4);
    assert_eq!((counters.contact.get(), counters.fail.get()), (1, 0));

    // The static collider was given a kinematic body to hang from
    assert_eq!(world.collider(collider).expect("collider").body, Some(body));
    assert!(world.body(body).expect("target body").kinematic);

    let head = grapple.pool().link(0).expect("head");
    let head_joint = head.joint().expect("head joint");
    assert_eq!(world.joint_connection(head_joint).expect("joint"), Some(body));
    assert_eq!(grapple.target(), Some(body));

    // Every chain joint carries the configured limits
    for joint in world.joints() {
        assert_eq!(joint.config, config.chain_joint);
    }
}

/// Test: a body that already exists is latched onto directly.
#[test]
fn contact_with_dynamic_body() {
    let mut world = World::new();
    let (obstacle, _) = add_dynamic_obstacle(&mut world, 6.0);
    let bodies_before = world.body_count();

    let mut grapple = Grapple::new(unit_config(), Pose::identity(), &mut world).expect("grapple");
    grapple.fire(&mut world).expect("fire");
    let (outcome, _) = run_extension(&mut grapple, &mut world, DT, 1000)
        .expect("tick")
        .expect("extension should finish");

    assert!(matches!(outcome, ExtensionOutcome::Contact { body, .. } if body == obstacle));
    // Only the pool's own bodies were created
    assert_eq!(world.body_count(), bodies_before + grapple.capacity());
}

/// Test: links form a daisy chain, head to tail, all simulated.
#[test]
fn chain_is_linked_in_order() {
    let mut world = World::new();
    add_obstacle(&mut world, 6.05);
    let mut grapple = Grapple::new(unit_config(), Pose::identity(), &mut world).expect("grapple");
    grapple.fire(&mut world).expect("fire");
    run_extension(&mut grapple, &mut world, DT, 1000).expect("tick");

    let pool = grapple.pool();
    let count = grapple.active_joint_count();
    assert_eq!(count, 6);
    for i in 1..count {
        let link = pool.link(i).expect("link");
        let joint = world.joint(link.joint().expect("joint")).expect("joint entry");
        assert_eq!(joint.owner, link.body());
        assert_eq!(joint.connected, Some(pool.link(i - 1).expect("prev").body()));
        assert!(!world.body(link.body()).expect("body").kinematic);
    }

    // Links behind the tail are parked
    for link in &pool.links()[count..] {
        assert!(!link.is_active());
        assert!(!world.body(link.body()).expect("body").enabled);
    }
}

/// Test: firing mid-flight cancels the scan and empties the chain first.
#[test]
fn fire_is_reentrant() {
    let mut world = World::new();
    let mut grapple = Grapple::new(unit_config(), Pose::identity(), &mut world).expect("grapple");

    grapple.fire(&mut world).expect("fire");
    for _ in 0..20 {
        grapple.tick(&mut world, DT).expect("tick");
    }
    assert!(grapple.active_joint_count() >= 3);

    grapple.fire(&mut world).expect("refire");
    assert_eq!(grapple.active_joint_count(), 0);
    assert_eq!(grapple.pool().active_count(), 0);
    assert_eq!(grapple.phase(), GrapplePhase::Extending);

    grapple.tick(&mut world, DT).expect("tick");
    assert_eq!(grapple.active_joint_count(), 1);
}

/// Test: firing again after CONTACT detaches from the old target.
#[test]
fn refire_after_contact_releases_target() {
    let mut world = World::new();
    add_obstacle(&mut world, 4.05);
    let mut grapple = Grapple::new(unit_config(), Pose::identity(), &mut world).expect("grapple");
    grapple.fire(&mut world).expect("fire");
    run_extension(&mut grapple, &mut world, DT, 1000).expect("tick");
    let target = grapple.target().expect("target");

    grapple.fire(&mut world).expect("refire");
    assert!(grapple.target().is_none());
    assert!(!grapple.is_extended());
    assert!(world.joints_connected_to(target).is_empty());
}

/// Test: the rope follows the origin's forward axis.
#[test]
fn fires_along_origin_forward() {
    let mut world = World::new();
    // Turned a quarter to the left: forward is -X
    let origin = Pose::from_position_rotation(
        Point3::new(1.0, 2.0, 3.0),
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2),
    );
    let config = GrappleConfig::short_range();
    let mut grapple = Grapple::new(config.clone(), origin, &mut world).expect("grapple");

    grapple.fire(&mut world).expect("fire");
    let (outcome, _) = run_extension(&mut grapple, &mut world, DT, 1000)
        .expect("tick")
        .expect("extension should finish");
    assert_eq!(outcome, ExtensionOutcome::Fail);

    let head = world
        .transform(grapple.pool().link(0).expect("head").body())
        .expect("transform");
    assert_relative_eq!(head.position().x, 1.0 - config.max_extension, epsilon = 1e-6);
    assert_relative_eq!(head.position().y, 2.0, epsilon = 1e-6);
    assert_relative_eq!(head.pose.forward().x, -1.0, epsilon = 1e-9);
    assert_relative_eq!(head.scale, config.link_scale);
}

/// Test: a zero-range grapple fails immediately with no links.
#[test]
fn zero_range_fails_without_links() {
    let mut world = World::new();
    let config = unit_config().with_max_extension(0.0);
    let mut grapple = Grapple::new(config, Pose::identity(), &mut world).expect("grapple");

    grapple.fire(&mut world).expect("fire");
    let outcome = grapple.tick(&mut world, DT).expect("tick");
    assert_eq!(outcome, Some(ExtensionOutcome::Fail));
    assert_eq!(grapple.active_joint_count(), 0);
}

/// Test: obstacle just past full range → the final ray cast reports CONTACT, not FAIL.
#[test]
fn contact_wins_at_range_end() {
    let mut world = World::new();
    add_obstacle(&mut world, 10.05);
    let counters = EventCounters::default();
    let mut grapple = Grapple::new(unit_config(), Pose::identity(), &mut world)
        .expect("grapple")
        .with_handlers(counters.handlers());

    grapple.fire(&mut world).expect("fire");
    let (outcome, ticks) = run_extension(&mut grapple, &mut world, 0.1, 1000)
        .expect("tick")
        .expect("extension should finish");

    let ExtensionOutcome::Contact { point, .. } = outcome else {
        panic!("expected contact, got {outcome:?}");
    };
    assert_relative_eq!(point.y, 10.05, epsilon = 1e-9);
    // Cast arrives at the range end on the same tick
    assert_eq!(ticks, 10);
    assert_eq!(grapple.active_joint_count(), 10);
    assert_eq!((counters.contact.get(), counters.fail.get()), (1, 0));
}

/// Test: moving the origin mid-extension re-lays the chain from the new origin.
#[test]
fn origin_moved_during_extension() {
    let mut world = World::new();
    let mut grapple = Grapple::new(unit_config(), Pose::identity(), &mut world).expect("grapple");
    grapple.fire(&mut world).expect("fire");
    for _ in 0..3 {
        grapple.tick(&mut world, 0.1).expect("tick");
    }
    assert_eq!(grapple.active_joint_count(), 3);

    // Step forward past two links; the cast point keeps travelling
    grapple.set_origin(Pose::from_position(Point3::new(0.0, 2.0, 0.0)));
    grapple.tick(&mut world, 0.1).expect("tick");
    assert_eq!(grapple.active_joint_count(), 2);
    assert_eq!(grapple.pool().active_count(), 2);

    // Destination follows the origin: 10 m past y = 2
    let (outcome, _) = run_extension(&mut grapple, &mut world, 0.1, 1000)
        .expect("tick")
        .expect("extension should finish");
    assert_eq!(outcome, ExtensionOutcome::Fail);
    assert_eq!(grapple.active_joint_count(), 10);
    let head = world
        .transform(grapple.pool().link(0).expect("head").body())
        .expect("head transform");
    assert_relative_eq!(head.position().y, 12.0, epsilon = 1e-6);
}
