use crate::drivetrain::{ThrottleCommand, ThrottleInput};
use crate::fleet::{CoupleRequest, CouplerEnd, CouplerKey, HoldCommand, VehicleId};
use crate::test_harness::TestYard;
use crate::track::PathId;

use super::straight_points;

// ---------------------------------------------------------------------------
// Coupler interaction requests
// ---------------------------------------------------------------------------

fn front(v: u32) -> CouplerKey {
    CouplerKey::new(VehicleId(v), CouplerEnd::Front)
}

fn rear(v: u32) -> CouplerKey {
    CouplerKey::new(VehicleId(v), CouplerEnd::Rear)
}

#[test]
fn interact_couples_the_nearest_eligible_candidate() {
    // Loco rear anchor sits at x 16.3; wagon front anchors at 16.7 and
    // 15.7, so the wagon at lead 16 is the closer of the two.
    let mut yard = TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_loco("loco", PathId(0), 20.0)
        .with_wagon("near wagon", PathId(0), 16.0)
        .with_wagon("far wagon", PathId(0), 15.0);

    yard.world_mut().send_event(CoupleRequest {
        coupler: rear(0),
        // Listed farthest-first; distance decides, not order.
        candidates: vec![front(2), front(1)],
    });
    yard.tick(1);

    assert_eq!(
        yard.vehicle(VehicleId(0)).coupler(CouplerEnd::Rear).linked,
        Some(front(1))
    );
    assert_eq!(
        yard.vehicle(VehicleId(1)).coupler(CouplerEnd::Front).linked,
        Some(rear(0))
    );
    assert_eq!(yard.vehicle(VehicleId(2)).coupler(CouplerEnd::Front).linked, None);
}

#[test]
fn racing_requests_for_one_coupler_leave_the_first_winner() {
    let mut yard = TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_loco("loco", PathId(0), 20.0)
        .with_wagon("wagon a", PathId(0), 16.0)
        .with_wagon("wagon b", PathId(0), 15.4);

    // Both wagons claim the loco's rear coupler in the same tick. The
    // second request finds it already linked and connects nothing.
    yard.world_mut().send_event(CoupleRequest {
        coupler: front(1),
        candidates: vec![rear(0)],
    });
    yard.world_mut().send_event(CoupleRequest {
        coupler: front(2),
        candidates: vec![rear(0)],
    });
    yard.tick(1);

    assert_eq!(
        yard.vehicle(VehicleId(0)).coupler(CouplerEnd::Rear).linked,
        Some(front(1))
    );
    assert_eq!(yard.vehicle(VehicleId(2)).coupler(CouplerEnd::Front).linked, None);
}

#[test]
fn connect_leaves_both_vehicles_in_place_until_towed() {
    // Wagon parked ahead of the loco with a 0.3 anchor gap.
    let mut yard = TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_loco("loco", PathId(0), 20.0)
        .with_wagon("wagon", PathId(0), 24.7);

    yard.world_mut().send_event(CoupleRequest {
        coupler: front(0),
        candidates: vec![rear(1)],
    });
    yard.tick(1);

    assert_eq!(
        yard.vehicle(VehicleId(0)).coupler(CouplerEnd::Front).linked,
        Some(rear(1))
    );
    assert_eq!(yard.lead(VehicleId(0)).distance, 20.0, "connect moves nobody");
    assert_eq!(yard.lead(VehicleId(1)).distance, 24.7);

    // The slack closes on the first towed tick.
    yard.world_mut().send_event(ThrottleCommand {
        vehicle: VehicleId(0),
        input: ThrottleInput::Set(1),
    });
    yard.tick(25);
    let gap = yard.coupler_gap(front(0), rear(1));
    let want = yard.params().coupling.coupling_gap;
    assert!(
        (gap - want).abs() < 1e-3,
        "towing should settle the gap to {want}, got {gap}"
    );
}

#[test]
fn same_facing_candidates_are_refused() {
    let mut yard = TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_loco("loco", PathId(0), 20.0)
        .with_wagon("wagon", PathId(0), 24.45);

    // The wagon's rear anchor is touching the loco's front anchor, but the
    // request offers the wrong end of it.
    yard.world_mut().send_event(CoupleRequest {
        coupler: front(0),
        candidates: vec![front(1)],
    });
    yard.tick(1);
    assert_eq!(yard.vehicle(VehicleId(0)).coupler(CouplerEnd::Front).linked, None);

    yard.world_mut().send_event(CoupleRequest {
        coupler: front(0),
        candidates: vec![rear(1)],
    });
    yard.tick(1);
    assert_eq!(
        yard.vehicle(VehicleId(0)).coupler(CouplerEnd::Front).linked,
        Some(rear(1))
    );
}

#[test]
fn decoupling_arms_a_cooldown_on_both_couplers() {
    let mut yard = TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_loco("loco", PathId(0), 20.0)
        .with_wagon("wagon", PathId(0), 16.0)
        .with_coupled(VehicleId(0), VehicleId(1));

    // A linked coupler interprets the pulse as disconnect.
    yard.world_mut().send_event(CoupleRequest {
        coupler: rear(0),
        candidates: vec![],
    });
    yard.tick(1);
    assert_eq!(yard.vehicle(VehicleId(0)).coupler(CouplerEnd::Rear).linked, None);
    assert_eq!(yard.vehicle(VehicleId(1)).coupler(CouplerEnd::Front).linked, None);

    // An immediate re-couple bounces off the half-second cooldown.
    yard.world_mut().send_event(CoupleRequest {
        coupler: rear(0),
        candidates: vec![front(1)],
    });
    yard.tick(1);
    assert_eq!(yard.vehicle(VehicleId(0)).coupler(CouplerEnd::Rear).linked, None);

    // Past the deadline the same request goes through.
    yard.tick(27);
    yard.world_mut().send_event(CoupleRequest {
        coupler: rear(0),
        candidates: vec![front(1)],
    });
    yard.tick(1);
    assert_eq!(
        yard.vehicle(VehicleId(0)).coupler(CouplerEnd::Rear).linked,
        Some(front(1))
    );
}

#[test]
fn held_stock_stays_pinned_while_the_chain_moves_on() {
    let mut yard = TestYard::new()
        .with_line("main", straight_points(5, 10.0))
        .with_loco("loco", PathId(0), 20.0)
        .with_wagon("wagon", PathId(0), 16.0)
        .with_coupled(VehicleId(0), VehicleId(1));
    let pinned_at = yard.lead(VehicleId(1)).distance;

    yard.world_mut().send_event(HoldCommand {
        vehicle: VehicleId(1),
        held: true,
    });
    yard.world_mut().send_event(ThrottleCommand {
        vehicle: VehicleId(0),
        input: ThrottleInput::Set(1),
    });
    yard.tick(25);

    assert_eq!(
        yard.lead(VehicleId(1)).distance,
        pinned_at,
        "held stock ignores propagation"
    );
    assert!(yard.lead(VehicleId(0)).distance > 20.5);
    let opened = yard.coupler_gap(rear(0), front(1));
    assert!(opened > 0.5, "link stays but the gap opens, got {opened}");

    // Releasing lets the next moved tick snap the wagon back into tow.
    yard.world_mut().send_event(HoldCommand {
        vehicle: VehicleId(1),
        held: false,
    });
    yard.tick(1);
    assert!(yard.lead(VehicleId(1)).distance > pinned_at);
    let gap = yard.coupler_gap(rear(0), front(1));
    let want = yard.params().coupling.coupling_gap;
    assert!((gap - want).abs() < 1e-3, "gap re-settles to {want}, got {gap}");
}
