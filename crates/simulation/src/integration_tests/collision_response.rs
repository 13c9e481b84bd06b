use bevy::math::Vec3;

use crate::fleet::{VehicleId, VehicleSpec};
use crate::sim_params::DriveParams;
use crate::test_harness::TestYard;
use crate::track::PathId;

use super::straight_points;

// ---------------------------------------------------------------------------
// Impact response
// ---------------------------------------------------------------------------
//
// Geometry cheat sheet for the stock vehicle on a straight east-running
// line: the front coupler anchor sits 0.7 ahead of the lead point and the
// rear coupler anchor 3.7 behind it. A trailing vehicle at lead d + 4.45
// therefore leaves a 0.05 anchor gap, right at the touch threshold.

fn strike_setup(loco_speed: f32, target_lead: f32) -> TestYard {
    TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_loco("loco", PathId(0), 20.0)
        .with_wagon("target", PathId(0), target_lead)
        .with_speed(VehicleId(0), loco_speed)
}

#[test]
fn rear_ending_free_stock_transfers_momentum_and_bounces() {
    let mut yard = strike_setup(5.0, 24.45);

    yard.tick(1);

    // The wagon takes 60% of the strike speed and friction starts shaving
    // it the same tick; the loco bounces to -1.5 and brakes toward zero.
    let wagon_speed = yard.speed(VehicleId(1));
    assert!(
        wagon_speed > 2.5 && wagon_speed < 3.0,
        "wagon should carry most of the transfer, got {wagon_speed}"
    );
    let loco_speed = yard.speed(VehicleId(0));
    assert!(
        loco_speed < 0.0 && loco_speed > -1.5,
        "loco should bounce backward, got {loco_speed}"
    );
    assert!(yard.lead(VehicleId(1)).distance > 24.45);
    assert!(yard.lead(VehicleId(0)).distance < 20.0);
}

#[test]
fn striking_a_static_obstacle_hard_stops_the_instigator() {
    let mut yard = TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_loco("loco", PathId(0), 20.0)
        .with_inert("buffer stop", PathId(0), 24.45)
        .with_speed(VehicleId(0), 5.0);

    yard.tick(1);
    assert_eq!(yard.speed(VehicleId(0)), 0.0, "no model to take the hit");
    assert_eq!(yard.lead(VehicleId(0)).distance, 20.0);
    assert_eq!(yard.lead(VehicleId(1)).distance, 24.45);

    // Stopped stock sits below the probe floor, so contact does not
    // re-trigger on later ticks.
    yard.tick(10);
    assert_eq!(yard.speed(VehicleId(0)), 0.0);
    assert_eq!(yard.lead(VehicleId(0)).distance, 20.0);
}

#[test]
fn slow_nudge_hard_stops_below_the_bounce_threshold() {
    let mut yard = strike_setup(1.0, 24.45);

    yard.tick(1);
    assert_eq!(
        yard.speed(VehicleId(0)),
        0.0,
        "1 u/s is under the bounce threshold"
    );
    let nudged = yard.speed(VehicleId(1));
    assert!(nudged > 0.5 && nudged < 0.6, "got {nudged}");

    // Friction shaves 0.04 per tick until the snap threshold catches it.
    yard.tick(20);
    assert_eq!(yard.speed(VehicleId(1)), 0.0);
    let travelled = yard.lead(VehicleId(1)).distance - 24.45;
    assert!(
        travelled > 0.05 && travelled < 0.2,
        "wagon rolls out a short way, got {travelled}"
    );
}

#[test]
fn stock_on_an_adjacent_track_is_ignored_by_the_probe() {
    let parallel: Vec<Vec3> = (0..5).map(|i| Vec3::new(i as f32 * 10.0, 0.0, 3.0)).collect();
    let mut yard = TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_line("siding", parallel)
        .with_vehicle(
            VehicleSpec {
                name: "loco".to_string(),
                drive: Some(DriveParams {
                    max_speed: 5.0,
                    acceleration: 5.0,
                    brake_force: 10.0,
                }),
                ..Default::default()
            },
            PathId(0),
            10.0,
        )
        .with_wagon("bystander", PathId(1), 15.7)
        .with_speed(VehicleId(0), 5.0)
        .with_throttle(VehicleId(0), 1);

    yard.tick(20);
    assert_eq!(yard.speed(VehicleId(1)), 0.0, "3 units off-axis is no contact");
    assert_eq!(yard.speed(VehicleId(0)), 5.0, "cruise is undisturbed");
    assert_eq!(yard.lead(VehicleId(0)).path, PathId(0));
}

#[test]
fn head_on_meeting_separates_both_locomotives() {
    let mut yard = TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_loco("eastbound", PathId(0), 10.0)
        .with_loco("westbound", PathId(0), 14.45)
        .with_speed(VehicleId(0), 5.0)
        .with_speed(VehicleId(1), -5.0);

    yard.tick(1);

    // Both probes fire off the same speed snapshot, so the pair pushes
    // apart regardless of resolution order.
    assert!(
        yard.speed(VehicleId(0)) < 0.0,
        "west loco rebounds west, got {}",
        yard.speed(VehicleId(0))
    );
    assert!(
        yard.speed(VehicleId(1)) > 0.0,
        "east loco rebounds east, got {}",
        yard.speed(VehicleId(1))
    );
}
