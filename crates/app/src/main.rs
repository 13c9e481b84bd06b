use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use simulation::drivetrain::{ThrottleCommand, ThrottleInput};
use simulation::fleet::{Fleet, VehicleId};
use simulation::sim_clock::SimClock;
use simulation::sim_params::SimParams;
use simulation::{SimulationPlugin, SimulationSet, SlowTickTimer, TickCounter};

fn main() {
    let mut app = App::new();

    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / 60.0,
        ))),
    )
    .add_plugins(LogPlugin::default());

    // Parameter overrides: RAILYARD_PARAMS=<file.json> replaces the stock
    // tunables before the plugin initializes its defaults.
    if let Ok(path) = std::env::var("RAILYARD_PARAMS") {
        match load_params(&path) {
            Ok(params) => {
                app.insert_resource(params);
            }
            Err(err) => {
                eprintln!("railyard: ignoring RAILYARD_PARAMS ({path}): {err}");
            }
        }
    }

    app.add_plugins(SimulationPlugin)
        .add_systems(PostStartup, depart_demo_consist)
        .add_systems(
            FixedUpdate,
            log_yard_status.in_set(SimulationSet::PostSim),
        );

    // Bounded runs: RAILYARD_TICKS=<n> exits cleanly after n fixed ticks.
    if let Ok(ticks) = std::env::var("RAILYARD_TICKS") {
        match ticks.parse::<u64>() {
            Ok(limit) => {
                app.insert_resource(RunLimit(limit));
                app.add_systems(Update, enforce_run_limit);
            }
            Err(err) => {
                eprintln!("railyard: ignoring RAILYARD_TICKS ({ticks}): {err}");
            }
        }
    }

    app.run();
}

fn load_params(path: &str) -> Result<SimParams, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    SimParams::from_json_str(&text).map_err(|e| e.to_string())
}

#[derive(Resource)]
struct RunLimit(u64);

/// Notch the demo shunter up once the yard is built, so a plain run shows
/// the consist pulling away.
fn depart_demo_consist(fleet: Res<Fleet>, mut throttle: EventWriter<ThrottleCommand>) {
    if fleet.vehicle(VehicleId(0)).is_none() {
        return;
    }
    throttle.send(ThrottleCommand {
        vehicle: VehicleId(0),
        input: ThrottleInput::Set(1),
    });
}

/// One status line per slow cycle (~2 simulated seconds).
fn log_yard_status(
    slow_tick: Res<SlowTickTimer>,
    tick: Res<TickCounter>,
    clock: Res<SimClock>,
    fleet: Res<Fleet>,
) {
    if !slow_tick.should_run() {
        return;
    }
    let moving = fleet
        .vehicles()
        .iter()
        .filter(|v| v.current_speed().abs() > 0.01)
        .count();
    info!(
        "tick {} t={:.1}s: {} vehicles, {} moving",
        tick.0,
        clock.now(),
        fleet.vehicles().len(),
        moving
    );
}

fn enforce_run_limit(
    limit: Res<RunLimit>,
    tick: Res<TickCounter>,
    mut exit: EventWriter<AppExit>,
) {
    if tick.0 >= limit.0 {
        exit.send(AppExit::Success);
    }
}
