use crate::fleet::{VehicleId, VehicleSpec};
use crate::sim_params::DriveParams;
use crate::test_harness::TestYard;
use crate::track::PathId;

use super::straight_points;

// ---------------------------------------------------------------------------
// Towing and pushing a coupled consist
// ---------------------------------------------------------------------------

/// Loco + two wagons on a 40-unit line, coupled nose to tail.
fn consist(loco_drive: DriveParams) -> TestYard {
    let loco = VehicleSpec {
        name: "loco".to_string(),
        drive: Some(loco_drive),
        ..Default::default()
    };
    TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_vehicle(loco, PathId(0), 12.0)
        .with_wagon("car 1", PathId(0), 8.0)
        .with_wagon("car 2", PathId(0), 4.0)
        .with_coupled(VehicleId(0), VehicleId(1))
        .with_coupled(VehicleId(1), VehicleId(2))
}

#[test]
fn towed_consist_holds_gap_through_a_full_acceleration_run() {
    // Acceleration 5 with the cap at 10 means the 2 s run ends exactly as
    // the loco reaches max speed.
    let mut yard = consist(DriveParams {
        max_speed: 10.0,
        acceleration: 5.0,
        brake_force: 10.0,
    })
    .with_throttle(VehicleId(0), 1);

    let start = yard.lead(VehicleId(0)).distance;
    for _ in 0..10 {
        yard.tick(10);
        yard.assert_gap_settled(VehicleId(0), VehicleId(1), 0.01);
        yard.assert_gap_settled(VehicleId(1), VehicleId(2), 0.01);
    }

    // Discrete integration of v(t) = min(5t, 10) over 100 ticks of 0.02 s
    // sums to 10.1 (one half-step above the continuous 10.0).
    let travelled = yard.lead(VehicleId(0)).distance - start;
    assert!(
        (travelled - 10.1).abs() < 0.02,
        "expected ~10.1 units of travel, got {travelled}"
    );
    assert_eq!(yard.speed(VehicleId(0)), 10.0, "run ends at max speed");
}

#[test]
fn every_chain_member_advances_by_the_locomotive_delta() {
    let mut yard = consist(DriveParams::default()).with_throttle(VehicleId(0), 1);

    let before: Vec<f32> = (0..3)
        .map(|i| yard.lead(VehicleId(i)).distance)
        .collect();
    yard.tick(25);
    let deltas: Vec<f32> = (0..3)
        .map(|i| yard.lead(VehicleId(i)).distance - before[i as usize])
        .collect();

    assert!(deltas[0] > 0.5, "loco must make headway, got {}", deltas[0]);
    for (i, delta) in deltas.iter().enumerate().skip(1) {
        assert!(
            (delta - deltas[0]).abs() < 0.01,
            "car {i} moved {delta}, loco moved {}",
            deltas[0]
        );
    }
}

#[test]
fn reversing_pushes_the_consist_back_without_opening_the_gaps() {
    let mut yard = consist(DriveParams::default()).with_throttle(VehicleId(0), -1);

    let before = yard.lead(VehicleId(2)).distance;
    for _ in 0..4 {
        yard.tick(5);
        yard.assert_gap_settled(VehicleId(0), VehicleId(1), 0.01);
        yard.assert_gap_settled(VehicleId(1), VehicleId(2), 0.01);
    }
    let after = yard.lead(VehicleId(2)).distance;
    assert!(
        after < before - 0.3,
        "tail car should be pushed back: {before} -> {after}"
    );
    assert!(yard.speed(VehicleId(0)) < 0.0);
}

#[test]
fn braking_to_neutral_stops_the_consist_dead() {
    let mut yard = consist(DriveParams::default()).with_throttle(VehicleId(0), 1);
    yard.tick(30);
    assert!(yard.speed(VehicleId(0)) > 2.0);

    let mut yard = yard.with_throttle(VehicleId(0), 0);
    // Brake force 10 sheds 3 u/s of speed in 15 ticks.
    yard.tick(20);
    assert_eq!(yard.speed(VehicleId(0)), 0.0);

    let parked = yard.lead(VehicleId(0)).distance;
    yard.tick(20);
    assert!(
        (yard.lead(VehicleId(0)).distance - parked).abs() < 1e-6,
        "consist must hold still after braking"
    );
}
