use crate::fleet::{FleetTransforms, VehicleId};
use crate::test_harness::TestYard;
use crate::TickCounter;

// ---------------------------------------------------------------------------
// Harness bootstrap
// ---------------------------------------------------------------------------

#[test]
fn empty_yard_has_no_track_or_stock() {
    let yard = TestYard::new();
    assert!(yard.net().paths().is_empty(), "empty yard should have no paths");
    assert!(yard.fleet().is_empty(), "empty yard should have no vehicles");
}

#[test]
fn empty_yard_ticks_without_panicking() {
    let mut yard = TestYard::new();
    yard.tick(50);
    assert_eq!(yard.resource::<TickCounter>().0, 50);
    assert!((yard.clock().now() - 1.0).abs() < 1e-6, "50 ticks is 1 s");
}

#[test]
fn demo_yard_builds_main_siding_and_consist() {
    let yard = TestYard::with_demo_yard();

    let paths = yard.net().paths();
    assert_eq!(paths.len(), 2, "demo yard is a main line plus one siding");
    assert!(paths[0].total_length() > 100.0);
    assert!(paths[1].parent().is_some(), "siding attaches to the main");
    assert!(paths[1].switch_open, "demo siding switch starts open");

    assert_eq!(yard.fleet().len(), 3);
    let head = yard.vehicle(VehicleId(0));
    assert!(head.drive.is_some(), "consist head is powered");
    assert!(head.is_coupled());
    yard.assert_gap_settled(VehicleId(0), VehicleId(1), 5e-3);
    yard.assert_gap_settled(VehicleId(1), VehicleId(2), 5e-3);
}

#[test]
fn demo_yard_publishes_transforms_each_tick() {
    let mut yard = TestYard::with_demo_yard();
    yard.tick(1);

    let transforms = yard.resource::<FleetTransforms>();
    assert_eq!(transforms.transforms.len(), 3);
    for t in &transforms.transforms {
        assert!(
            t.position.is_finite() && t.rotation.is_finite(),
            "published pose must be finite, got {t:?}"
        );
    }
}

#[test]
fn demo_yard_consist_stays_parked_without_throttle() {
    let mut yard = TestYard::with_demo_yard();
    let before = yard.lead(VehicleId(0));
    yard.tick(100);
    let after = yard.lead(VehicleId(0));
    assert_eq!(before.path, after.path);
    assert!(
        (before.distance - after.distance).abs() < 1e-6,
        "parked consist must not creep: {} -> {}",
        before.distance,
        after.distance
    );
}
