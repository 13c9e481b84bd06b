//! Rigid two-axle placement.
//!
//! The leading axle rides at `Vehicle::location`. The trailing axle is found
//! by walking back through the network until the straight-line distance
//! between the two samples matches the vehicle's rigid axle spacing; on a
//! curve that arc distance is slightly longer than the chord, so the walk
//! refines iteratively. Near a junction the two axles sample different
//! paths, and `TrackNetwork::advance` carries the walk across the boundary
//! so the body never jumps when the lead crosses onto a branch. The body
//! transform is then derived from both axle samples.

use bevy::prelude::*;

use crate::config::AXLE_SOLVER_ITERATIONS;
use crate::track::{facing, TrackNetwork};

use super::types::Vehicle;

/// Settle a vehicle onto the track: canonicalize its lead distance, solve
/// both axles, and write the derived body transform.
///
/// Held vehicles are left exactly where they are.
pub fn resolve_axles(net: &TrackNetwork, vehicle: &mut Vehicle) {
    if vehicle.held {
        return;
    }
    let Some(path) = net.path(vehicle.location.path) else {
        warn!(
            "resolve_axles: vehicle '{}' references unknown {:?}",
            vehicle.name, vehicle.location.path
        );
        return;
    };

    let total = path.total_length();
    let lead = if total <= f32::EPSILON {
        0.0
    } else if path.looped {
        vehicle.location.distance.rem_euclid(total)
    } else {
        vehicle.location.distance.clamp(0.0, total)
    };
    vehicle.location.distance = lead;
    let lead_loc = vehicle.location;

    let (front_pos, front_rot) = path.evaluate(lead);

    // Degenerate geometry rides the front sample alone.
    if vehicle.axle_spacing <= f32::EPSILON || total < vehicle.axle_spacing {
        vehicle.body_position = front_pos;
        vehicle.body_rotation = front_rot;
        return;
    }

    let mut trail_offset = -vehicle.axle_spacing;
    for _ in 0..AXLE_SOLVER_ITERATIONS {
        let (rear_pos, _) = net.evaluate(net.advance(lead_loc, trail_offset));
        trail_offset -= vehicle.axle_spacing - front_pos.distance(rear_pos);
    }
    let rear_loc = net.advance(lead_loc, trail_offset);
    let (rear_pos, rear_rot) = net.evaluate(rear_loc);

    let forward = front_pos - rear_pos;
    // Averaging the ups hides the twist snap when the axles straddle a
    // junction and sample two different curves.
    let up = (front_rot * Vec3::Y + rear_rot * Vec3::Y).normalize_or_zero();
    let up_hint = if up == Vec3::ZERO { Vec3::Y } else { up };
    let rotation = facing(forward, up_hint);

    let rail_center = (front_pos + rear_pos) * 0.5;
    vehicle.body_position = rail_center - rotation * vehicle.axle_center_local;
    vehicle.body_rotation = rotation;
}
