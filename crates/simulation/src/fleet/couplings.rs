//! Coupler graph operations.
//!
//! Links are symmetric and nullable; connect and disconnect are the only
//! writers, so the graph can never hold a half-link. Chain motion is
//! propagated by arc-distance targeting: each neighbor is placed so its
//! linked coupler anchor sits exactly one coupling gap from the host's,
//! then a damped correction trims whatever straight-line error the curve
//! introduced.

use std::collections::HashSet;

use bevy::prelude::*;

use crate::config::COUPLER_COOLDOWN_SECONDS;
use crate::sim_params::CouplingParams;
use crate::track::TrackNetwork;

use super::solver;
use super::types::{CouplerEnd, CouplerKey, Fleet, VehicleId};

/// Residual straight-line gap error below which the damped correction pass
/// leaves a neighbor where the arc targeting put it.
const GAP_SETTLE_TOLERANCE: f32 = 1e-4;

/// What a coupler operation did, reported to the caller for logging and
/// interaction feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoupleOutcome {
    Connected,
    Disconnected,
    /// Disconnect was requested on a coupler that holds no link.
    NotLinked,
    /// No candidate within range passed the eligibility checks.
    NoEligiblePartner,
    /// Both couplers belong to the same vehicle.
    SameVehicle,
    /// Two front or two rear couplers; accepting them would flip one
    /// vehicle's travel direction relative to the chain.
    SameFacing,
    AlreadyLinked,
    CoolingDown,
}

/// Link two couplers and settle both vehicles so the next tick starts from
/// a committed transform. Neither vehicle's lead distance is moved; the
/// coupling gap closes over the following ticks through propagation's
/// damped correction.
pub fn connect(
    fleet: &mut Fleet,
    net: &TrackNetwork,
    now: f64,
    a: CouplerKey,
    b: CouplerKey,
) -> CoupleOutcome {
    if a.vehicle == b.vehicle {
        return CoupleOutcome::SameVehicle;
    }
    if a.end == b.end {
        return CoupleOutcome::SameFacing;
    }
    {
        let Some(va) = fleet.vehicle(a.vehicle) else {
            warn!("connect: unknown {:?}", a.vehicle);
            return CoupleOutcome::NoEligiblePartner;
        };
        let Some(vb) = fleet.vehicle(b.vehicle) else {
            warn!("connect: unknown {:?}", b.vehicle);
            return CoupleOutcome::NoEligiblePartner;
        };
        if va.coupler(a.end).linked.is_some() || vb.coupler(b.end).linked.is_some() {
            return CoupleOutcome::AlreadyLinked;
        }
        if va.coupler(a.end).is_cooling(now) || vb.coupler(b.end).is_cooling(now) {
            return CoupleOutcome::CoolingDown;
        }
    }

    let deadline = now + f64::from(COUPLER_COOLDOWN_SECONDS);
    if let Some(va) = fleet.vehicle_mut(a.vehicle) {
        let coupler = va.coupler_mut(a.end);
        coupler.linked = Some(b);
        coupler.cooldown_until = deadline;
        solver::resolve_axles(net, va);
    }
    if let Some(vb) = fleet.vehicle_mut(b.vehicle) {
        let coupler = vb.coupler_mut(b.end);
        coupler.linked = Some(a);
        coupler.cooldown_until = deadline;
        solver::resolve_axles(net, vb);
    }
    CoupleOutcome::Connected
}

/// Null both sides of a link. A dangling partner reference (partner vehicle
/// gone) is logged and cleared from the surviving side.
pub fn disconnect(fleet: &mut Fleet, now: f64, a: CouplerKey) -> CoupleOutcome {
    let partner = {
        let Some(va) = fleet.vehicle(a.vehicle) else {
            warn!("disconnect: unknown {:?}", a.vehicle);
            return CoupleOutcome::NotLinked;
        };
        match va.coupler(a.end).linked {
            Some(partner) => partner,
            None => return CoupleOutcome::NotLinked,
        }
    };

    let deadline = now + f64::from(COUPLER_COOLDOWN_SECONDS);
    if let Some(va) = fleet.vehicle_mut(a.vehicle) {
        let coupler = va.coupler_mut(a.end);
        coupler.linked = None;
        coupler.cooldown_until = deadline;
    }
    match fleet.vehicle_mut(partner.vehicle) {
        Some(vb) => {
            let coupler = vb.coupler_mut(partner.end);
            coupler.linked = None;
            coupler.cooldown_until = deadline;
        }
        None => warn!(
            "disconnect: {:?} held a link to missing {:?}",
            a.vehicle, partner.vehicle
        ),
    }
    CoupleOutcome::Disconnected
}

/// Handle one interaction signal on a coupler: disconnect if linked,
/// otherwise connect to the nearest eligible candidate in range.
///
/// When several candidates tie for the same link, whoever is processed
/// first wins; later requests bounce off `AlreadyLinked` or the cooldown.
pub fn try_interact(
    fleet: &mut Fleet,
    net: &TrackNetwork,
    params: &CouplingParams,
    now: f64,
    a: CouplerKey,
    candidates: &[CouplerKey],
) -> CoupleOutcome {
    let (origin, linked) = {
        let Some(va) = fleet.vehicle(a.vehicle) else {
            warn!("try_interact: unknown {:?}", a.vehicle);
            return CoupleOutcome::NoEligiblePartner;
        };
        let coupler = va.coupler(a.end);
        if coupler.is_cooling(now) {
            return CoupleOutcome::CoolingDown;
        }
        (va.coupler_world_anchor(a.end), coupler.linked.is_some())
    };

    if linked {
        return disconnect(fleet, now, a);
    }

    let mut best: Option<(f32, CouplerKey)> = None;
    for &candidate in candidates {
        if candidate.vehicle == a.vehicle || candidate.end == a.end {
            continue;
        }
        let Some(vehicle) = fleet.vehicle(candidate.vehicle) else {
            continue;
        };
        let coupler = vehicle.coupler(candidate.end);
        if coupler.linked.is_some() || coupler.is_cooling(now) {
            continue;
        }
        let distance = vehicle.coupler_world_anchor(candidate.end).distance(origin);
        if distance <= params.interact_range && best.map_or(true, |(b, _)| distance < b) {
            best = Some((distance, candidate));
        }
    }

    match best {
        Some((_, b)) => connect(fleet, net, now, a, b),
        None => CoupleOutcome::NoEligiblePartner,
    }
}

/// Drag every vehicle coupled to `host` so the chain follows its move.
///
/// The host's location and body transform must already be settled for this
/// tick; each neighbor is placed relative to that committed state, then
/// passes its own settled state down the chain. A vehicle reached twice
/// means the graph holds a cycle; traversal stops there.
pub fn propagate(fleet: &mut Fleet, net: &TrackNetwork, params: &CouplingParams, host: VehicleId) {
    let mut visited = HashSet::new();
    visited.insert(host);
    pull_neighbor(fleet, net, params, host, CouplerEnd::Front, &mut visited);
    pull_neighbor(fleet, net, params, host, CouplerEnd::Rear, &mut visited);
}

fn pull_neighbor(
    fleet: &mut Fleet,
    net: &TrackNetwork,
    params: &CouplingParams,
    host_id: VehicleId,
    end: CouplerEnd,
    visited: &mut HashSet<VehicleId>,
) {
    let (partner, anchor_loc, anchor_world, gap_sign) = {
        let Some(host) = fleet.vehicle(host_id) else {
            return;
        };
        let coupler = host.coupler(end);
        let Some(partner) = coupler.linked else {
            return;
        };
        let gap_sign = match end {
            CouplerEnd::Front => 1.0,
            CouplerEnd::Rear => -1.0,
        };
        (
            partner,
            net.advance(host.location, coupler.arc_offset),
            host.coupler_world_anchor(end),
            gap_sign,
        )
    };

    if visited.contains(&partner.vehicle) {
        warn!(
            "propagate: coupler graph cycle at {:?}; chain truncated",
            partner.vehicle
        );
        return;
    }

    let partner_offset = {
        let Some(neighbor) = fleet.vehicle(partner.vehicle) else {
            warn!(
                "propagate: {:?} links missing {:?}",
                host_id, partner.vehicle
            );
            return;
        };
        if neighbor.held {
            return;
        }
        neighbor.coupler(partner.end).arc_offset
    };

    // Place the neighbor so its linked anchor sits one gap from ours,
    // measured along the track.
    let target = net.advance(anchor_loc, gap_sign * params.coupling_gap - partner_offset);
    visited.insert(partner.vehicle);
    if let Some(neighbor) = fleet.vehicle_mut(partner.vehicle) {
        neighbor.location = target;
        solver::resolve_axles(net, neighbor);
    }

    // Trim the straight-line gap error the curvature left behind.
    if params.gap_correction > 0.0 {
        let error = match fleet.vehicle(partner.vehicle) {
            Some(neighbor) => {
                neighbor.coupler_world_anchor(partner.end).distance(anchor_world)
                    - params.coupling_gap
            }
            None => return,
        };
        if error.abs() > GAP_SETTLE_TOLERANCE {
            let nudge = -gap_sign * params.gap_correction * error;
            if let Some(neighbor) = fleet.vehicle_mut(partner.vehicle) {
                neighbor.location = net.advance(neighbor.location, nudge);
                solver::resolve_axles(net, neighbor);
            }
        }
    }

    pull_neighbor(fleet, net, params, partner.vehicle, partner.end.opposite(), visited);
}

/// Every vehicle transitively linked to `start`, including itself.
pub fn chain_members(fleet: &Fleet, start: VehicleId) -> HashSet<VehicleId> {
    let mut members = HashSet::new();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if !members.insert(id) {
            continue;
        }
        let Some(vehicle) = fleet.vehicle(id) else {
            continue;
        };
        for coupler in &vehicle.couplers {
            if let Some(partner) = coupler.linked {
                stack.push(partner.vehicle);
            }
        }
    }
    members
}

/// Walk from `start` through `toward`-side links to the chain's open end.
/// Returns the terminal vehicle and its unlinked end, or `None` if the walk
/// hits a cycle.
pub fn chain_end(fleet: &Fleet, start: VehicleId, toward: CouplerEnd) -> Option<(VehicleId, CouplerEnd)> {
    let mut visited = HashSet::new();
    let mut current = start;
    let mut end = toward;
    loop {
        if !visited.insert(current) {
            warn!("chain_end: coupler graph cycle while walking from {:?}", start);
            return None;
        }
        let vehicle = fleet.vehicle(current)?;
        match vehicle.coupler(end).linked {
            None => return Some((current, end)),
            Some(partner) => {
                current = partner.vehicle;
                end = partner.end.opposite();
            }
        }
    }
}
