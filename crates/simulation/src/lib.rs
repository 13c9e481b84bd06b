use bevy::prelude::*;

pub mod config;
pub mod drivetrain;
pub mod fleet;
pub mod invariant_checks;
pub mod sim_clock;
pub mod sim_params;
pub mod simulation_sets;
pub mod track;
pub mod yard_init;

#[cfg(test)]
mod integration_tests;
#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use simulation_sets::SimulationSet;

// ---------------------------------------------------------------------------
// Core resources
// ---------------------------------------------------------------------------

/// Global tick counter incremented each FixedUpdate, used for throttling
/// simulation systems.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

/// Shared throttle timer for audit systems that don't need to run every
/// tick. The invariant validators only run every N ticks.
#[derive(Resource, Default)]
pub struct SlowTickTimer {
    pub counter: u32,
}

impl SlowTickTimer {
    /// Run slow systems every 100 ticks (~2 simulated seconds at 50 Hz).
    pub const INTERVAL: u32 = config::INVARIANT_CHECK_INTERVAL;

    pub fn tick(&mut self) {
        self.counter += 1;
    }

    pub fn should_run(&self) -> bool {
        self.counter.is_multiple_of(Self::INTERVAL)
    }
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Phase contract: everything in FixedUpdate runs inside one of
        // these sets, in this order.
        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::PreSim,
                SimulationSet::Simulation,
                SimulationSet::PostSim,
            )
                .chain(),
        );

        // Core resources and systems that don't belong to any feature
        app.init_resource::<TickCounter>()
            .init_resource::<SlowTickTimer>()
            .init_resource::<sim_clock::SimClock>()
            .init_resource::<sim_params::SimParams>()
            .add_systems(Startup, yard_init::init_yard)
            .add_systems(
                FixedUpdate,
                (tick_slow_timer, sim_clock::tick_sim_clock)
                    .in_set(SimulationSet::PreSim)
                    .before(track::revalidate_topology),
            )
            .add_systems(Update, sim_clock::sync_fixed_timestep);

        // Track geometry, fleet state, motion
        app.add_plugins((
            track::TrackPlugin,
            fleet::FleetPlugin,
            drivetrain::DrivetrainPlugin,
        ));

        // Slow-tick auditing
        app.add_plugins(invariant_checks::InvariantChecksPlugin);
    }
}

pub fn tick_slow_timer(mut timer: ResMut<SlowTickTimer>, mut tick: ResMut<TickCounter>) {
    timer.tick();
    tick.0 = tick.0.wrapping_add(1);
}
