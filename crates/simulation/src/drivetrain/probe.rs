//! Collision probing and impact response.
//!
//! Probes run against the transforms committed at the end of the previous
//! tick, before anyone moves, so detection carries one tick of latency.
//! Per-tick displacement is small against the probe range, and the contact
//! reach stretches by the distance the prober will cover this tick, so a
//! closing vehicle cannot tunnel through the touch window.

use std::collections::HashSet;

use bevy::prelude::*;

use crate::config::{
    COLLISION_LATERAL_TOLERANCE, COLLISION_PROBE_RANGE, COLLISION_TOUCH_THRESHOLD,
};
use crate::fleet::{CouplerEnd, Fleet, VehicleId};
use crate::sim_params::ImpactParams;

/// A contact found by a probe, pending response.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Impact {
    pub instigator: VehicleId,
    pub struck: VehicleId,
    /// Instigator speed at probe time; the response math uses this
    /// snapshot, not whatever the speed is once impacts apply.
    pub speed: f32,
}

/// Outward world direction of a vehicle end.
pub(crate) fn probe_direction(rotation: Quat, end: CouplerEnd) -> Vec3 {
    match end {
        CouplerEnd::Front => rotation * Vec3::NEG_Z,
        CouplerEnd::Rear => rotation * Vec3::Z,
    }
}

/// Cast a bounded probe outward from one coupler anchor and return the
/// nearest foreign vehicle in contact.
///
/// `closing_speed` is the prober's speed projected on the end's outward
/// direction; only a positive component extends the contact reach.
pub(crate) fn probe_end(
    fleet: &Fleet,
    tip: VehicleId,
    end: CouplerEnd,
    closing_speed: f32,
    dt: f32,
    exclude: &HashSet<VehicleId>,
) -> Option<VehicleId> {
    let tip_vehicle = fleet.vehicle(tip)?;
    let origin = tip_vehicle.coupler_world_anchor(end);
    let outward = probe_direction(tip_vehicle.body_rotation, end);
    let reach = COLLISION_TOUCH_THRESHOLD + closing_speed.max(0.0) * dt;

    let mut best: Option<(f32, VehicleId)> = None;
    for other in fleet.vehicles() {
        if exclude.contains(&other.id) {
            continue;
        }
        for other_end in [CouplerEnd::Front, CouplerEnd::Rear] {
            let to = other.coupler_world_anchor(other_end) - origin;
            let along = to.dot(outward);
            if along < 0.0 || along > COLLISION_PROBE_RANGE {
                continue;
            }
            let lateral = (to - outward * along).length();
            if lateral > COLLISION_LATERAL_TOLERANCE {
                continue;
            }
            if to.length() <= reach && best.map_or(true, |(b, _)| along < b) {
                best = Some((along, other.id));
            }
        }
    }
    best.map(|(_, id)| id)
}

/// Resolve one contact: transfer speed into the struck vehicle's own motion
/// model, then bounce or hard-stop the instigator. A struck vehicle without
/// any model is a static obstacle and the instigator always hard-stops.
/// The instigating throttle drops to neutral either way.
pub(crate) fn apply_impact(fleet: &mut Fleet, impact: &Impact, params: &ImpactParams) {
    info!(
        "{:?} struck {:?} at speed {:.2}",
        impact.instigator, impact.struck, impact.speed
    );

    let struck_has_model = match fleet.vehicle_mut(impact.struck) {
        Some(struck) => struck.receive_speed(params.impact_transfer * impact.speed),
        None => {
            warn!("impact against missing {:?}", impact.struck);
            return;
        }
    };

    let Some(instigator) = fleet.vehicle_mut(impact.instigator) else {
        return;
    };
    let response = if struck_has_model && impact.speed.abs() > params.bounce_threshold {
        -impact.speed * params.bounce_factor
    } else {
        0.0
    };
    instigator.receive_speed(response);
    if let Some(drive) = instigator.drive.as_mut() {
        drive.throttle = 0;
    }
}
