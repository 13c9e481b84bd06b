//! Per-tick drive systems.
//!
//! Runs in the Simulation set as one fixed chain: collision probing on the
//! previous tick's transforms, then locomotive integration and movement
//! with chain propagation, then free-rolling stock. Each stage sees the
//! committed results of the one before it.

use std::collections::HashSet;

use bevy::prelude::*;

use crate::config::MIN_PROBE_SPEED;
use crate::fleet::{
    chain_end, chain_members, propagate, resolve_axles, CouplerEnd, DriveUnit, Fleet, VehicleId,
};
use crate::sim_clock::SimClock;
use crate::sim_params::SimParams;
use crate::track::{revalidate_topology, TrackNetwork};
use crate::SimulationSet;

use super::probe::{apply_impact, probe_end, Impact};

/// Throttle input for one driving vehicle, pushed in by an outer control
/// layer at any tick boundary.
#[derive(Event, Debug, Clone, Copy)]
pub struct ThrottleCommand {
    pub vehicle: VehicleId,
    pub input: ThrottleInput,
}

#[derive(Debug, Clone, Copy)]
pub enum ThrottleInput {
    /// Set the throttle to an absolute notch in {-1, 0, 1}.
    Set(i8),
    /// Move the throttle one notch, as a cab lever would.
    Shift(i8),
    /// Zero the speed and drop to neutral.
    EmergencyStop,
}

pub fn process_throttle_commands(
    mut fleet: ResMut<Fleet>,
    mut commands: EventReader<ThrottleCommand>,
) {
    for command in commands.read() {
        let Some(vehicle) = fleet.vehicle_mut(command.vehicle) else {
            warn!("throttle command for unknown {:?}", command.vehicle);
            continue;
        };
        let Some(drive) = vehicle.drive.as_mut() else {
            warn!("throttle command for driveless {:?}", command.vehicle);
            continue;
        };
        match command.input {
            ThrottleInput::Set(notch) => drive.set_throttle(notch),
            ThrottleInput::Shift(delta) => drive.shift(delta),
            ThrottleInput::EmergencyStop => drive.emergency_stop(),
        }
        debug!("{:?} throttle {}", command.vehicle, drive.throttle);
    }
}

/// Probe for contacts using last tick's committed transforms and resolve
/// any impacts before movement starts.
///
/// A coupled chain probes once, at its leading extremity in the direction
/// of travel. Free-rolling stock probes both of its own ends. Vehicles
/// slower than [`MIN_PROBE_SPEED`] skip probing entirely, so stock resting
/// in contact does not re-trigger an impact every tick.
pub fn probe_collisions(mut fleet: ResMut<Fleet>, params: Res<SimParams>, clock: Res<SimClock>) {
    #[cfg(feature = "trace")]
    let _span = bevy::log::info_span!("probe_collisions").entered();
    if clock.paused {
        return;
    }
    let dt = clock.dt;

    let mut impacts = Vec::new();
    for vehicle in fleet.vehicles() {
        if vehicle.held {
            continue;
        }
        let speed = vehicle.current_speed();
        if speed.abs() < MIN_PROBE_SPEED {
            continue;
        }
        if vehicle.drive.is_some() {
            let travel_end = if speed > 0.0 {
                CouplerEnd::Front
            } else {
                CouplerEnd::Rear
            };
            let Some((tip, tip_end)) = chain_end(&fleet, vehicle.id, travel_end) else {
                continue;
            };
            let members = chain_members(&fleet, vehicle.id);
            if let Some(struck) = probe_end(&fleet, tip, tip_end, speed.abs(), dt, &members) {
                impacts.push(Impact {
                    instigator: vehicle.id,
                    struck,
                    speed,
                });
            }
        } else if !vehicle.is_coupled() {
            let mut exclude = HashSet::new();
            exclude.insert(vehicle.id);
            for end in [CouplerEnd::Front, CouplerEnd::Rear] {
                // Only the end the vehicle moves toward gets the extended
                // closing reach; the other still reports raw touch.
                let closing = match end {
                    CouplerEnd::Front => speed,
                    CouplerEnd::Rear => -speed,
                };
                if let Some(struck) = probe_end(&fleet, vehicle.id, end, closing, dt, &exclude) {
                    impacts.push(Impact {
                        instigator: vehicle.id,
                        struck,
                        speed,
                    });
                    break;
                }
            }
        }
    }

    for impact in &impacts {
        apply_impact(&mut fleet, impact, &params.impact);
    }
}

/// Integrate every drive unit, move its vehicle along the track, and drag
/// the coupled chain after it.
pub fn advance_locomotives(
    mut fleet: ResMut<Fleet>,
    net: Res<TrackNetwork>,
    params: Res<SimParams>,
    clock: Res<SimClock>,
) {
    #[cfg(feature = "trace")]
    let _span = bevy::log::info_span!("advance_locomotives").entered();
    if clock.paused {
        return;
    }
    let dt = clock.dt;

    let ids: Vec<VehicleId> = fleet.ids().collect();
    for id in ids {
        let moved = {
            let Some(vehicle) = fleet.vehicle_mut(id) else {
                continue;
            };
            if vehicle.held {
                continue;
            }
            let Some(drive) = vehicle.drive.as_mut() else {
                continue;
            };
            integrate_drive(drive, dt);
            let delta = drive.speed * dt;
            if delta != 0.0 {
                vehicle.location = net.advance(vehicle.location, delta);
                resolve_axles(&net, vehicle);
                true
            } else {
                false
            }
        };
        if moved {
            propagate(&mut fleet, &net, &params.coupling, id);
        }
    }
}

/// Roll free (uncoupled, driveless) stock under friction.
pub fn roll_free_vehicles(mut fleet: ResMut<Fleet>, net: Res<TrackNetwork>, clock: Res<SimClock>) {
    if clock.paused {
        return;
    }
    let dt = clock.dt;

    for vehicle in fleet.vehicles_mut() {
        if vehicle.held || vehicle.drive.is_some() || vehicle.is_coupled() {
            continue;
        }
        let Some(rolling) = vehicle.rolling.as_mut() else {
            continue;
        };
        if rolling.speed == 0.0 {
            continue;
        }
        rolling.speed = move_towards(rolling.speed, 0.0, rolling.friction * dt);
        if rolling.speed.abs() < rolling.stop_threshold {
            rolling.speed = 0.0;
        }
        let delta = rolling.speed * dt;
        if delta != 0.0 {
            vehicle.location = net.advance(vehicle.location, delta);
            resolve_axles(&net, vehicle);
        }
    }
}

/// Step a drive's speed toward its throttle target, never past it.
pub(crate) fn integrate_drive(drive: &mut DriveUnit, dt: f32) {
    let target = f32::from(drive.throttle) * drive.max_speed;
    let rate = if drive.throttle != 0 {
        drive.acceleration
    } else {
        drive.brake_force
    };
    drive.speed = move_towards(drive.speed, target, rate * dt);
    drive.speed = drive.speed.clamp(-drive.max_speed, drive.max_speed);
}

fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

pub struct DrivetrainPlugin;

impl Plugin for DrivetrainPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ThrottleCommand>()
            .add_systems(
                FixedUpdate,
                process_throttle_commands
                    .in_set(SimulationSet::PreSim)
                    .after(revalidate_topology),
            )
            .add_systems(
                FixedUpdate,
                (probe_collisions, advance_locomotives, roll_free_vehicles)
                    .chain()
                    .in_set(SimulationSet::Simulation),
            );
    }
}
