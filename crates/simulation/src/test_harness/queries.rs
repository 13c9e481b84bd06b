//! Query and simulation-tick methods for `TestYard`.

use bevy::prelude::*;

use crate::fleet::{CouplerKey, Fleet, FleetTransforms, PublishedTransform, Vehicle, VehicleId};
use crate::invariant_checks::FleetInvariantViolations;
use crate::sim_clock::SimClock;
use crate::sim_params::SimParams;
use crate::track::{PathLocation, TrackNetwork};
use crate::SlowTickTimer;

use super::TestYard;

impl TestYard {
    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run N fixed-update ticks by directly executing the `FixedUpdate`
    /// schedule. This bypasses Bevy's time system entirely, which avoids
    /// issues with `MinimalPlugins` + `ScheduleRunnerPlugin` not advancing
    /// virtual time between updates.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
        }
    }

    /// Run until the SlowTickTimer fires at least once (~100 ticks).
    pub fn tick_slow_cycle(&mut self) {
        self.tick(SlowTickTimer::INTERVAL);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Access the ECS world mutably (event sending, direct state pokes).
    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    /// Get any resource by type.
    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn net(&self) -> &TrackNetwork {
        self.resource::<TrackNetwork>()
    }

    pub fn fleet(&self) -> &Fleet {
        self.resource::<Fleet>()
    }

    pub fn params(&self) -> &SimParams {
        self.resource::<SimParams>()
    }

    pub fn clock(&self) -> &SimClock {
        self.resource::<SimClock>()
    }

    pub fn violations(&self) -> &FleetInvariantViolations {
        self.resource::<FleetInvariantViolations>()
    }

    /// Look up a vehicle, panicking on an unknown id (a test bug).
    pub fn vehicle(&self, id: VehicleId) -> &Vehicle {
        match self.fleet().vehicle(id) {
            Some(v) => v,
            None => panic!("TestYard: no vehicle {id:?}"),
        }
    }

    /// The vehicle's front-axle location on the network.
    pub fn lead(&self, id: VehicleId) -> PathLocation {
        self.vehicle(id).location
    }

    /// Current speed from whichever motion model the vehicle owns.
    pub fn speed(&self, id: VehicleId) -> f32 {
        self.vehicle(id).current_speed()
    }

    /// The vehicle's transform as published at the end of the last tick.
    pub fn published(&self, id: VehicleId) -> PublishedTransform {
        match self.resource::<FleetTransforms>().get(id) {
            Some(t) => *t,
            None => panic!("TestYard: no published transform for {id:?}"),
        }
    }

    /// World-space distance between two coupler anchors.
    pub fn coupler_gap(&self, a: CouplerKey, b: CouplerKey) -> f32 {
        let va = self.vehicle(a.vehicle);
        let vb = self.vehicle(b.vehicle);
        va.coupler_world_anchor(a.end)
            .distance(vb.coupler_world_anchor(b.end))
    }
}
