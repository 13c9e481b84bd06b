//! Runtime invariant guards for the track network and fleet.
//!
//! These systems run every slow-tick cycle (~100 ticks) and validate that
//! core simulation values haven't become corrupted (NaN, infinity, or
//! out-of-range). On violation, a warning is logged and the value is
//! clamped or reset to a safe default.

use bevy::prelude::*;

use crate::fleet::{resolve_axles, Fleet};
use crate::track::TrackNetwork;
use crate::SlowTickTimer;

/// Allowed overshoot past a path's endpoints before a location counts as
/// out of range. Covers float drift from repeated advance calls.
const LOCATION_SLACK: f32 = 1e-3;

/// Tracks the number of invariant violations detected during the last
/// validation pass. Used by integration tests.
#[derive(Resource, Default, Debug)]
pub struct FleetInvariantViolations {
    pub location_not_finite: u32,
    pub location_out_of_range: u32,
    pub transform_not_finite: u32,
    pub speed_not_finite: u32,
    pub coupler_asymmetry: u32,
}

// ---------------------------------------------------------------------------
// Per-vehicle state checks
// ---------------------------------------------------------------------------

/// Validate that every vehicle sits at a finite, in-range distance with
/// finite motion state. Corrupt vehicles are clamped or reset and re-run
/// through the axle solver.
pub fn validate_fleet_state(
    slow_tick: Res<SlowTickTimer>,
    net: Res<TrackNetwork>,
    mut fleet: ResMut<Fleet>,
    mut violations: ResMut<FleetInvariantViolations>,
) {
    if !slow_tick.should_run() {
        return;
    }
    violations.location_not_finite = 0;
    violations.location_out_of_range = 0;
    violations.transform_not_finite = 0;
    violations.speed_not_finite = 0;

    let mut dirty = Vec::new();
    for vehicle in fleet.vehicles_mut() {
        // Location distance: not NaN, not infinity
        if !vehicle.location.distance.is_finite() {
            warn!(
                "Invariant violation: '{}' location distance is {}. Resetting to 0.",
                vehicle.name, vehicle.location.distance
            );
            vehicle.location.distance = 0.0;
            violations.location_not_finite += 1;
            dirty.push(vehicle.id);
        }

        // Location range: clamp to the path (wrap on loops)
        if let Some(path) = net.path(vehicle.location.path) {
            let total = path.total_length();
            let d = vehicle.location.distance;
            let fixed = if path.looped && total > f32::EPSILON {
                d.rem_euclid(total)
            } else {
                d.clamp(0.0, total)
            };
            if (fixed - d).abs() > LOCATION_SLACK {
                warn!(
                    "Invariant violation: '{}' at distance {} on '{}' (length {}). Clamping.",
                    vehicle.name, d, path.name, total
                );
                vehicle.location.distance = fixed;
                violations.location_out_of_range += 1;
                dirty.push(vehicle.id);
            }
        }

        // Speeds: not NaN, not infinity
        if let Some(drive) = vehicle.drive.as_mut() {
            if !drive.speed.is_finite() {
                warn!(
                    "Invariant violation: '{}' drive speed is {}. Resetting to 0.",
                    vehicle.name, drive.speed
                );
                drive.speed = 0.0;
                drive.throttle = 0;
                violations.speed_not_finite += 1;
            }
        }
        if let Some(rolling) = vehicle.rolling.as_mut() {
            if !rolling.speed.is_finite() {
                warn!(
                    "Invariant violation: '{}' rolling speed is {}. Resetting to 0.",
                    vehicle.name, rolling.speed
                );
                rolling.speed = 0.0;
                violations.speed_not_finite += 1;
            }
        }

        // Published pose: not NaN, not infinity
        if !vehicle.body_position.is_finite() || !vehicle.body_rotation.is_finite() {
            warn!(
                "Invariant violation: '{}' has a non-finite body pose. Re-solving.",
                vehicle.name
            );
            violations.transform_not_finite += 1;
            dirty.push(vehicle.id);
        }
    }

    for id in dirty {
        if let Some(vehicle) = fleet.vehicle_mut(id) {
            resolve_axles(&net, vehicle);
        }
    }
}

// ---------------------------------------------------------------------------
// Coupler graph checks
// ---------------------------------------------------------------------------

/// Validate that every coupler link is mutual: if A points at B, the named
/// coupler on B must point back at A. One-sided links are severed.
pub fn validate_coupler_symmetry(
    slow_tick: Res<SlowTickTimer>,
    mut fleet: ResMut<Fleet>,
    mut violations: ResMut<FleetInvariantViolations>,
) {
    if !slow_tick.should_run() {
        return;
    }
    violations.coupler_asymmetry = 0;

    let mut broken = Vec::new();
    for vehicle in fleet.vehicles() {
        for coupler in &vehicle.couplers {
            let Some(partner) = coupler.linked else {
                continue;
            };
            let mutual = fleet
                .vehicle(partner.vehicle)
                .is_some_and(|v| v.coupler(partner.end).linked.map(|k| k.vehicle) == Some(vehicle.id));
            if !mutual {
                warn!(
                    "Invariant violation: '{}' linked to {:?} without a backlink. Severing.",
                    vehicle.name, partner
                );
                broken.push((vehicle.id, partner));
            }
        }
    }

    for (id, partner) in broken {
        violations.coupler_asymmetry += 1;
        if let Some(vehicle) = fleet.vehicle_mut(id) {
            for coupler in vehicle.couplers.iter_mut() {
                if coupler.linked == Some(partner) {
                    coupler.linked = None;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct InvariantChecksPlugin;

impl Plugin for InvariantChecksPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FleetInvariantViolations>().add_systems(
            FixedUpdate,
            (validate_fleet_state, validate_coupler_symmetry)
                .in_set(crate::SimulationSet::PostSim),
        );
    }
}
