//! Builder methods for track and rolling-stock setup in integration tests.

use bevy::prelude::*;

use crate::fleet::{
    connect, propagate, CoupleOutcome, CouplerEnd, CouplerKey, Fleet, VehicleId, VehicleSpec,
};
use crate::sim_clock::SimClock;
use crate::sim_params::SimParams;
use crate::track::{PathId, PathLocation, TrackNetwork};

use super::TestYard;

impl TestYard {
    // -----------------------------------------------------------------------
    // Track authoring
    // -----------------------------------------------------------------------

    /// Lay an open path through the given control points.
    pub fn with_line(mut self, name: &str, points: Vec<Vec3>) -> Self {
        let mut net = self.app.world_mut().resource_mut::<TrackNetwork>();
        net.add_path(name, points, false);
        net.rebuild();
        self
    }

    /// Lay a closed loop through the given control points.
    pub fn with_loop(mut self, name: &str, points: Vec<Vec3>) -> Self {
        let mut net = self.app.world_mut().resource_mut::<TrackNetwork>();
        net.add_path(name, points, true);
        net.rebuild();
        self
    }

    /// Attach a branch at `parent`'s control point `point_index` and set its
    /// switch. Panics if the attachment point does not exist, which in a
    /// test means the layout itself is wrong.
    pub fn with_branch(
        mut self,
        name: &str,
        parent: PathId,
        point_index: usize,
        points: Vec<Vec3>,
        open: bool,
    ) -> Self {
        let mut net = self.app.world_mut().resource_mut::<TrackNetwork>();
        let Some(id) = net.add_branch(name, parent, point_index, points) else {
            panic!("with_branch: no control point {point_index} on {parent:?}");
        };
        net.rebuild();
        net.set_switch(id, open);
        self
    }

    /// Flip a branch switch directly (no event round-trip).
    pub fn with_switch(mut self, branch: PathId, open: bool) -> Self {
        let mut net = self.app.world_mut().resource_mut::<TrackNetwork>();
        net.set_switch(branch, open);
        self
    }

    // -----------------------------------------------------------------------
    // Rolling stock
    // -----------------------------------------------------------------------

    /// Register a powered locomotive (stock drive params) with its front
    /// axle at `distance` along `path`.
    pub fn with_loco(self, name: &str, path: PathId, distance: f32) -> Self {
        let drive = self.app.world().resource::<SimParams>().drive.clone();
        let spec = VehicleSpec {
            name: name.to_string(),
            drive: Some(drive),
            ..Default::default()
        };
        self.with_vehicle(spec, path, distance)
    }

    /// Register an unpowered wagon (stock rolling params).
    pub fn with_wagon(self, name: &str, path: PathId, distance: f32) -> Self {
        let rolling = self.app.world().resource::<SimParams>().rolling.clone();
        let spec = VehicleSpec {
            name: name.to_string(),
            rolling: Some(rolling),
            ..Default::default()
        };
        self.with_vehicle(spec, path, distance)
    }

    /// Register stock with no motion model at all. It never moves on its
    /// own and absorbs impacts like a wall.
    pub fn with_inert(self, name: &str, path: PathId, distance: f32) -> Self {
        let spec = VehicleSpec {
            name: name.to_string(),
            ..Default::default()
        };
        self.with_vehicle(spec, path, distance)
    }

    /// Register a vehicle from a full spec, for tests that need custom
    /// anchor or coupler geometry.
    pub fn with_vehicle(mut self, spec: VehicleSpec, path: PathId, distance: f32) -> Self {
        let world = self.app.world_mut();
        world.resource_scope(|world, mut fleet: Mut<Fleet>| {
            let net = world.resource::<TrackNetwork>();
            fleet.register(spec, PathLocation::new(path, distance), net);
        });
        self
    }

    // -----------------------------------------------------------------------
    // Fleet state
    // -----------------------------------------------------------------------

    /// Couple `leader`'s rear coupler to `trailer`'s front coupler and pull
    /// the pair to the stock gap. Panics if the link is refused.
    pub fn with_coupled(mut self, leader: VehicleId, trailer: VehicleId) -> Self {
        let world = self.app.world_mut();
        world.resource_scope(|world, mut fleet: Mut<Fleet>| {
            let net = world.resource::<TrackNetwork>();
            let params = world.resource::<SimParams>();
            let now = world.resource::<SimClock>().now();
            let outcome = connect(
                &mut fleet,
                net,
                now,
                CouplerKey::new(leader, CouplerEnd::Rear),
                CouplerKey::new(trailer, CouplerEnd::Front),
            );
            assert!(
                matches!(outcome, CoupleOutcome::Connected),
                "with_coupled({leader:?}, {trailer:?}) refused: {outcome:?}"
            );
            propagate(&mut fleet, net, &params.coupling, leader);
        });
        self
    }

    /// Pin a vehicle in place, as the service equipment would.
    pub fn with_held(mut self, vehicle: VehicleId) -> Self {
        let mut fleet = self.app.world_mut().resource_mut::<Fleet>();
        if let Some(v) = fleet.vehicle_mut(vehicle) {
            v.held = true;
        }
        self
    }

    /// Set a locomotive's throttle notch directly (no event round-trip).
    pub fn with_throttle(mut self, vehicle: VehicleId, notch: i8) -> Self {
        let mut fleet = self.app.world_mut().resource_mut::<Fleet>();
        if let Some(drive) = fleet.vehicle_mut(vehicle).and_then(|v| v.drive.as_mut()) {
            drive.set_throttle(notch);
        }
        self
    }

    /// Force a vehicle's current speed, on whichever motion model it owns.
    pub fn with_speed(mut self, vehicle: VehicleId, speed: f32) -> Self {
        let mut fleet = self.app.world_mut().resource_mut::<Fleet>();
        if let Some(v) = fleet.vehicle_mut(vehicle) {
            v.receive_speed(speed);
        }
        self
    }
}
