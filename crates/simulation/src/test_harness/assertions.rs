//! Assertion helpers for `TestYard` integration tests.

use crate::fleet::{CouplerEnd, CouplerKey, VehicleId};
use crate::track::PathId;

use super::TestYard;

impl TestYard {
    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    /// Assert the rear-to-front coupler gap between a coupled pair is within
    /// `tolerance` of the stock coupling gap.
    pub fn assert_gap_settled(&self, leader: VehicleId, trailer: VehicleId, tolerance: f32) {
        let expected = self.params().coupling.coupling_gap;
        let gap = self.coupler_gap(
            CouplerKey::new(leader, CouplerEnd::Rear),
            CouplerKey::new(trailer, CouplerEnd::Front),
        );
        assert!(
            (gap - expected).abs() <= tolerance,
            "Expected gap {expected} +/- {tolerance} between {leader:?} and {trailer:?}, got {gap}"
        );
    }

    /// Assert a vehicle's speed is within `tolerance` of `expected`.
    pub fn assert_speed_near(&self, id: VehicleId, expected: f32, tolerance: f32) {
        let speed = self.speed(id);
        assert!(
            (speed - expected).abs() <= tolerance,
            "Expected {id:?} speed {expected} +/- {tolerance}, got {speed}"
        );
    }

    /// Assert a vehicle sits on the given path.
    pub fn assert_on_path(&self, id: VehicleId, path: PathId) {
        let loc = self.lead(id);
        assert_eq!(
            loc.path, path,
            "Expected {id:?} on {path:?}, found it at {loc:?}"
        );
    }
}
