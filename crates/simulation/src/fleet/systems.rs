//! Fleet interaction systems and per-tick transform publication.

use bevy::prelude::*;

use crate::sim_clock::SimClock;
use crate::sim_params::SimParams;
use crate::track::{revalidate_topology, TrackNetwork};
use crate::SimulationSet;

use super::couplings::{self, CoupleOutcome};
use super::types::{CouplerKey, Fleet, VehicleId};

/// One interaction pulse on a coupler, carrying the candidate couplers an
/// outer interaction layer found nearby. A linked coupler disconnects; an
/// open one connects to the nearest eligible candidate.
#[derive(Event, Debug, Clone)]
pub struct CoupleRequest {
    pub coupler: CouplerKey,
    pub candidates: Vec<CouplerKey>,
}

/// Pin a vehicle in place (maintenance jack, loading clamp) or release it.
/// While held, the solver, propagation, and drivetrain all skip the vehicle.
#[derive(Event, Debug, Clone, Copy)]
pub struct HoldCommand {
    pub vehicle: VehicleId,
    pub held: bool,
}

/// Drain coupler interaction requests in arrival order. When two requests
/// race for the same coupler in one tick, the first one wins and the loser
/// reads back `AlreadyLinked` or `CoolingDown`.
pub fn process_couple_requests(
    mut fleet: ResMut<Fleet>,
    net: Res<TrackNetwork>,
    params: Res<SimParams>,
    clock: Res<SimClock>,
    mut requests: EventReader<CoupleRequest>,
) {
    for request in requests.read() {
        let outcome = couplings::try_interact(
            &mut fleet,
            &net,
            &params.coupling,
            clock.now(),
            request.coupler,
            &request.candidates,
        );
        match outcome {
            CoupleOutcome::Connected | CoupleOutcome::Disconnected => {
                info!("coupler {:?}: {:?}", request.coupler, outcome);
            }
            _ => debug!("coupler {:?}: {:?}", request.coupler, outcome),
        }
    }
}

pub fn process_hold_commands(mut fleet: ResMut<Fleet>, mut commands: EventReader<HoldCommand>) {
    for command in commands.read() {
        match fleet.vehicle_mut(command.vehicle) {
            Some(vehicle) => {
                vehicle.held = command.held;
                info!(
                    "'{}' {}",
                    vehicle.name,
                    if command.held { "held in place" } else { "released" }
                );
            }
            None => warn!("hold command for unknown {:?}", command.vehicle),
        }
    }
}

/// One vehicle's committed body transform for this tick.
#[derive(Debug, Clone, Copy)]
pub struct PublishedTransform {
    pub vehicle: VehicleId,
    pub position: Vec3,
    pub rotation: Quat,
}

/// Snapshot of every vehicle's transform, rebuilt at the end of each tick.
/// Outer layers (rendering, audio, telemetry) read this instead of touching
/// the fleet mid-tick.
#[derive(Resource, Default, Debug)]
pub struct FleetTransforms {
    pub transforms: Vec<PublishedTransform>,
}

impl FleetTransforms {
    pub fn get(&self, vehicle: VehicleId) -> Option<&PublishedTransform> {
        self.transforms.iter().find(|t| t.vehicle == vehicle)
    }
}

pub fn publish_transforms(fleet: Res<Fleet>, mut out: ResMut<FleetTransforms>) {
    out.transforms.clear();
    out.transforms
        .extend(fleet.vehicles().iter().map(|v| PublishedTransform {
            vehicle: v.id,
            position: v.body_position,
            rotation: v.body_rotation,
        }));
}

pub struct FleetPlugin;

impl Plugin for FleetPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Fleet>()
            .init_resource::<FleetTransforms>()
            .add_event::<CoupleRequest>()
            .add_event::<HoldCommand>()
            .add_systems(
                FixedUpdate,
                (process_hold_commands, process_couple_requests)
                    .chain()
                    .in_set(SimulationSet::PreSim)
                    .after(revalidate_topology),
            )
            .add_systems(FixedUpdate, publish_transforms.in_set(SimulationSet::PostSim));
    }
}
