//! Demo yard: a curved main line with one open siding, plus a three-unit
//! consist (shunter + two boxcars) parked mid-line.

use bevy::prelude::*;

use crate::fleet::{connect, propagate, CouplerEnd, CouplerKey, Fleet, VehicleSpec};
use crate::sim_clock::SimClock;
use crate::sim_params::SimParams;
use crate::track::{PathLocation, TrackNetwork};

/// Marker resource that, when present, causes `init_yard` to skip the demo
/// yard entirely. Used by the test harness to start with an empty network.
#[derive(Resource)]
pub struct SkipYardInit;

pub fn init_yard(
    mut net: ResMut<TrackNetwork>,
    mut fleet: ResMut<Fleet>,
    params: Res<SimParams>,
    clock: Res<SimClock>,
    skip: Option<Res<SkipYardInit>>,
) {
    if skip.is_some() {
        return;
    }

    // --- Track: main line sweeping gently south, siding forking off east ---
    let main = net.add_path("main line", main_line_points(), false);
    let siding = net.add_branch("siding", main, 2, siding_points());
    net.rebuild();
    if let Some(siding) = siding {
        net.set_switch(siding, true);
    }

    // --- Rolling stock: shunter up front, two boxcars trailing ---
    // Spawn points are authored in world space and snapped onto the main
    // line; exact consist spacing comes from the propagation pass below.
    let spawns = [
        ("Shunter 1", Vec3::new(62.0, 0.0, -7.8), true),
        ("Boxcar 1", Vec3::new(57.0, 0.0, -8.2), false),
        ("Boxcar 2", Vec3::new(52.0, 0.0, -7.5), false),
    ];
    let mut ids = Vec::with_capacity(spawns.len());
    for (name, spawn, powered) in spawns {
        let Some(distance) = net.path(main).map(|p| p.closest_distance(spawn)) else {
            continue;
        };
        let spec = VehicleSpec {
            name: name.to_string(),
            drive: powered.then_some(params.drive.clone()),
            rolling: (!powered).then_some(params.rolling.clone()),
            ..Default::default()
        };
        ids.push(fleet.register(spec, PathLocation::new(main, distance), &net));
    }

    // --- Couple the consist and settle it to the stock gap ---
    let now = clock.now();
    for pair in ids.windows(2) {
        connect(
            &mut fleet,
            &net,
            now,
            CouplerKey::new(pair[0], CouplerEnd::Rear),
            CouplerKey::new(pair[1], CouplerEnd::Front),
        );
    }
    if let Some(&head) = ids.first() {
        propagate(&mut fleet, &net, &params.coupling, head);
    }

    info!(
        "init_yard: {} paths, {} vehicles",
        net.paths().len(),
        fleet.len()
    );
}

// =============================================================================
// Yard geometry
// =============================================================================

/// Main line control points: a shallow S heading east, dipping south around
/// its midpoint. Chords are ~15 units, so the arc table stays cheap.
fn main_line_points() -> Vec<Vec3> {
    vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(15.0, 0.0, 0.0),
        Vec3::new(30.0, 0.0, -2.0),
        Vec3::new(45.0, 0.0, -6.0),
        Vec3::new(60.0, 0.0, -8.0),
        Vec3::new(75.0, 0.0, -6.0),
        Vec3::new(90.0, 0.0, -2.0),
        Vec3::new(105.0, 0.0, 0.0),
        Vec3::new(120.0, 0.0, 0.0),
    ]
}

/// Siding control points after the junction at main-line point 2. Curves
/// away north and runs parallel for a few car lengths.
fn siding_points() -> Vec<Vec3> {
    vec![
        Vec3::new(45.0, 0.0, 2.0),
        Vec3::new(60.0, 0.0, 6.0),
        Vec3::new(75.0, 0.0, 8.0),
        Vec3::new(90.0, 0.0, 8.0),
    ]
}
