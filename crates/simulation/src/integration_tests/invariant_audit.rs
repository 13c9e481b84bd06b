use bevy::math::Vec3;

use crate::fleet::{CouplerEnd, CouplerKey, Fleet, VehicleId};
use crate::test_harness::TestYard;
use crate::track::PathId;

use super::straight_points;

// ---------------------------------------------------------------------------
// Slow-cycle invariant sweeps
// ---------------------------------------------------------------------------
//
// Each test corrupts committed state directly, runs one full slow cycle so
// the validators fire, and checks both the repair and the violation count.

#[test]
fn nan_location_is_reset_and_counted() {
    let mut yard = TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_inert("crate load", PathId(0), 20.0);
    yard.world_mut()
        .resource_mut::<Fleet>()
        .vehicle_mut(VehicleId(0))
        .unwrap()
        .location
        .distance = f32::NAN;

    yard.tick_slow_cycle();
    assert_eq!(yard.violations().location_not_finite, 1);
    assert_eq!(yard.lead(VehicleId(0)).distance, 0.0);
    assert!(yard.vehicle(VehicleId(0)).body_position.is_finite());

    // A clean sweep resets the counters.
    yard.tick_slow_cycle();
    assert_eq!(yard.violations().location_not_finite, 0);
}

#[test]
fn runaway_location_clamps_to_the_open_path_end() {
    let mut yard = TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_inert("crate load", PathId(0), 20.0);
    let total = yard.net().paths()[0].total_length();
    yard.world_mut()
        .resource_mut::<Fleet>()
        .vehicle_mut(VehicleId(0))
        .unwrap()
        .location
        .distance = 55.0;

    yard.tick_slow_cycle();
    assert_eq!(yard.violations().location_out_of_range, 1);
    assert!((yard.lead(VehicleId(0)).distance - total).abs() < 1e-3);
}

#[test]
fn runaway_location_wraps_on_a_loop() {
    let ring = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(40.0, 0.0, 0.0),
        Vec3::new(40.0, 0.0, 40.0),
        Vec3::new(0.0, 0.0, 40.0),
    ];
    let mut yard = TestYard::new()
        .with_loop("ring", ring)
        .with_inert("crate load", PathId(0), 5.0);
    let total = yard.net().paths()[0].total_length();
    yard.world_mut()
        .resource_mut::<Fleet>()
        .vehicle_mut(VehicleId(0))
        .unwrap()
        .location
        .distance = total + 7.0;

    yard.tick_slow_cycle();
    assert_eq!(yard.violations().location_out_of_range, 1);
    assert!(
        (yard.lead(VehicleId(0)).distance - 7.0).abs() < 1e-3,
        "loops wrap instead of clamping, got {}",
        yard.lead(VehicleId(0)).distance
    );
}

#[test]
fn one_sided_coupler_link_is_severed() {
    let mut yard = TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_wagon("wagon a", PathId(0), 20.0)
        .with_wagon("wagon b", PathId(0), 15.55);
    yard.world_mut()
        .resource_mut::<Fleet>()
        .vehicle_mut(VehicleId(0))
        .unwrap()
        .coupler_mut(CouplerEnd::Rear)
        .linked = Some(CouplerKey::new(VehicleId(1), CouplerEnd::Front));

    yard.tick_slow_cycle();
    assert_eq!(yard.violations().coupler_asymmetry, 1);
    assert_eq!(yard.vehicle(VehicleId(0)).coupler(CouplerEnd::Rear).linked, None);
}

#[test]
fn nan_speed_on_held_stock_is_zeroed_with_the_throttle() {
    let mut yard = TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_loco("switcher", PathId(0), 20.0)
        .with_throttle(VehicleId(0), 1)
        .with_held(VehicleId(0));
    yard.world_mut()
        .resource_mut::<Fleet>()
        .vehicle_mut(VehicleId(0))
        .unwrap()
        .drive
        .as_mut()
        .unwrap()
        .speed = f32::NAN;

    yard.tick_slow_cycle();
    assert_eq!(yard.violations().speed_not_finite, 1);
    let drive = yard.vehicle(VehicleId(0)).drive.as_ref().unwrap();
    assert_eq!(drive.speed, 0.0);
    assert_eq!(drive.throttle, 0, "a corrupt drive also drops to neutral");
}

#[test]
fn corrupt_body_pose_is_resolved_from_the_rails() {
    let mut yard = TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_inert("crate load", PathId(0), 20.0);
    yard.world_mut()
        .resource_mut::<Fleet>()
        .vehicle_mut(VehicleId(0))
        .unwrap()
        .body_position = Vec3::NAN;

    yard.tick_slow_cycle();
    assert_eq!(yard.violations().transform_not_finite, 1);
    let v = yard.vehicle(VehicleId(0));
    assert!(v.body_position.is_finite());
    assert!((v.body_position.x - 18.5).abs() < 0.1, "back on the rails");
}
