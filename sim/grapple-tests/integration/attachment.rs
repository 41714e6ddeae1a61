//! Player attachment, target release and reset.

use grapple_core::{Grapple, GrappleError, GrapplePhase, PhysicsBackend};
use grapple_tests::{add_obstacle, add_player, run_extension, unit_config, EventCounters, DT};
use grapple_types::{CharacterJointConfig, Pose};
use grapple_world::World;

fn latched_with_counters(world: &mut World) -> (Grapple, EventCounters) {
    add_obstacle(world, 5.05);
    let counters = EventCounters::default();
    let mut grapple = Grapple::new(unit_config(), Pose::identity(), world)
        .expect("grapple")
        .with_handlers(counters.handlers());
    grapple.fire(world).expect("fire");
    run_extension(&mut grapple, world, DT, 1000).expect("tick");
    (grapple, counters)
}

/// Test: connecting couples the actor to the tail with the player joint limits.
#[test]
fn connect_player_to_tail() {
    let mut world = World::new();
    let (mut grapple, counters) = latched_with_counters(&mut world);
    let player = add_player(&mut world);

    grapple.connect_player(&mut world, player).expect("connect");

    let joints = world.joints_owned_by(player);
    assert_eq!(joints.len(), 1);
    let joint = world.joint(joints[0]).expect("joint");
    let tail = grapple
        .pool()
        .link(grapple.active_joint_count() - 1)
        .expect("tail")
        .body();
    assert_eq!(joint.connected, Some(tail));
    assert_eq!(joint.config, CharacterJointConfig::player());
    assert_eq!(counters.connected.get(), 1);
}

/// Test: connecting a second actor replaces the first.
#[test]
fn connect_replaces_existing_attachment() {
    let mut world = World::new();
    let (mut grapple, counters) = latched_with_counters(&mut world);
    let first = add_player(&mut world);
    let second = add_player(&mut world);

    grapple.connect_player(&mut world, first).expect("connect first");
    grapple.connect_player(&mut world, second).expect("connect second");

    assert_eq!(grapple.attached_player(), Some(second));
    assert!(world.joints_owned_by(first).is_empty());
    assert_eq!(world.joints_owned_by(second).len(), 1);
    assert_eq!(counters.connected.get(), 2);
    assert_eq!(counters.disconnected.get(), 1);
}

/// Test: connecting with no chain is an error and changes nothing.
#[test]
fn connect_without_chain_fails() {
    let mut world = World::new();
    let player = add_player(&mut world);
    let mut grapple = Grapple::new(unit_config(), Pose::identity(), &mut world).expect("grapple");

    let err = grapple
        .connect_player(&mut world, player)
        .expect_err("no links");
    assert_eq!(err, GrappleError::EmptyChain);
    assert!(world.joints_owned_by(player).is_empty());
}

/// Test: disconnect destroys the actor joint; unknown bodies are ignored.
#[test]
fn disconnect_player() {
    let mut world = World::new();
    let (mut grapple, counters) = latched_with_counters(&mut world);
    let player = add_player(&mut world);
    let stranger = add_player(&mut world);
    grapple.connect_player(&mut world, player).expect("connect");

    grapple
        .disconnect_player(&mut world, stranger)
        .expect("ignored");
    assert_eq!(grapple.attached_player(), Some(player));
    assert_eq!(counters.disconnected.get(), 0);

    grapple.disconnect_player(&mut world, player).expect("disconnect");
    assert!(grapple.attached_player().is_none());
    assert!(world.joints_owned_by(player).is_empty());
    assert_eq!(counters.disconnected.get(), 1);

    // Second disconnect is a no-op
    grapple.disconnect_player(&mut world, player).expect("noop");
    assert_eq!(counters.disconnected.get(), 1);
}

/// Test: releasing the target leaves the rest of the chain linked.
#[test]
fn disconnect_from_target_keeps_chain() {
    let mut world = World::new();
    let (mut grapple, _) = latched_with_counters(&mut world);
    let target = grapple.target().expect("target");
    let count = grapple.active_joint_count();

    grapple.disconnect_from_target(&mut world).expect("disconnect");
    assert!(world.joints_connected_to(target).is_empty());
    assert!(grapple.is_extended());
    assert_eq!(grapple.active_joint_count(), count);

    // Again, with nothing to release
    grapple.disconnect_from_target(&mut world).expect("noop");
    assert_eq!(grapple.phase(), GrapplePhase::Linked);
}

/// Test: reset twice in a row leaves identical state.
#[test]
fn reset_links_is_idempotent() {
    let mut world = World::new();
    let (mut grapple, counters) = latched_with_counters(&mut world);
    let player = add_player(&mut world);
    grapple.connect_player(&mut world, player).expect("connect");

    grapple.reset_links(&mut world).expect("reset");
    let links = grapple.pool().links().to_vec();
    let joint_count = world.joint_count();
    let disconnected = counters.disconnected.get();

    grapple.reset_links(&mut world).expect("reset again");
    assert_eq!(grapple.pool().links(), links.as_slice());
    assert_eq!(world.joint_count(), joint_count);
    assert_eq!(counters.disconnected.get(), disconnected);

    assert_eq!(grapple.active_joint_count(), 0);
    assert!(!grapple.is_extended());
    assert!(grapple.attached_player().is_none());
    assert!(grapple.target().is_none());
    assert!(world.joints().all(|j| j.connected.is_none()));
    for link in grapple.pool().links() {
        let body = world.body(link.body()).expect("body");
        assert!(body.kinematic);
        assert!(!body.enabled);
    }
}

/// Test: destroy hands every body and joint back to the world.
#[test]
fn destroy_releases_backend_resources() {
    let mut world = World::new();
    let (mut grapple, _) = latched_with_counters(&mut world);
    let player = add_player(&mut world);
    grapple.connect_player(&mut world, player).expect("connect");
    let target = grapple.target().expect("target");

    grapple.destroy(&mut world).expect("destroy");

    assert_eq!(world.joint_count(), 0);
    // Player and the target's kinematic body remain
    assert_eq!(world.body_count(), 2);
    assert!(world.body(player).is_some());
    assert!(world.body(target).is_some());
    assert!(world.transform(target).is_ok());
}

/// Test: the host removing the actor body does not wedge auto-retraction.
#[test]
fn removed_player_does_not_block_retraction() {
    let mut world = World::new();
    let (mut grapple, counters) = latched_with_counters(&mut world);
    let player = add_player(&mut world);
    grapple.connect_player(&mut world, player).expect("connect");
    world.destroy_body(player).expect("remove player");

    grapple.auto_retract(5.0, -1.0);
    grapple.tick(&mut world, DT).expect("tick with player gone");
    assert!(grapple.attached_player().is_none());
    assert_eq!(counters.disconnected.get(), 1);

    let mut ticks = 0;
    while grapple.is_extended() {
        grapple.tick(&mut world, DT).expect("tick");
        ticks += 1;
        assert!(ticks < 10_000, "retraction never finished");
    }
    assert_eq!(grapple.active_joint_count(), 0);
    assert_eq!(grapple.pool().active_count(), 0);
    assert_eq!(grapple.phase(), GrapplePhase::Idle);
}

/// Test: reset with the actor body removed still parks every link.
#[test]
fn reset_with_removed_player_parks_links() {
    let mut world = World::new();
    let (mut grapple, _) = latched_with_counters(&mut world);
    let player = add_player(&mut world);
    grapple.connect_player(&mut world, player).expect("connect");
    world.destroy_body(player).expect("remove player");

    grapple.reset_links(&mut world).expect("reset");

    assert_eq!(grapple.active_joint_count(), 0);
    assert!(!grapple.is_extended());
    assert!(grapple.attached_player().is_none());
    assert_eq!(grapple.pool().active_count(), 0);
    for link in grapple.pool().links() {
        let body = world.body(link.body()).expect("body");
        assert!(body.kinematic);
        assert!(!body.enabled);
    }
}
