use bevy::prelude::*;

use crate::config::TICK_SECONDS;

/// Discrete simulation clock. Every FixedUpdate tick advances simulated time
/// by exactly `dt` seconds regardless of playback speed, so motion math is
/// identical at 1x and 16x.
#[derive(Resource, Debug, Clone)]
pub struct SimClock {
    /// Simulated seconds per tick.
    pub dt: f32,
    /// Playback speed multiplier, applied to the FixedUpdate timestep only.
    pub speed: f32,
    pub paused: bool,
    /// Total simulated seconds since startup. f64 so long runs do not lose
    /// sub-tick precision (coupler cooldown deadlines compare against this).
    pub elapsed: f64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            dt: TICK_SECONDS,
            speed: 1.0,
            paused: false,
            elapsed: 0.0,
        }
    }
}

impl SimClock {
    pub fn tick(&mut self) {
        if self.paused {
            return;
        }
        // Speed is handled by scaling the FixedUpdate timestep
        // (sync_fixed_timestep), so each tick always advances the same
        // amount of simulated time.
        self.elapsed += f64::from(self.dt);
    }

    /// Current simulated time in seconds.
    pub fn now(&self) -> f64 {
        self.elapsed
    }
}

pub fn tick_sim_clock(mut clock: ResMut<SimClock>) {
    clock.tick();
}

/// Scales the FixedUpdate timestep based on SimClock speed.
/// Base rate is 50 Hz (20 ms). At 2x speed it becomes 10 ms, at 4x -> 5 ms.
pub fn sync_fixed_timestep(clock: Res<SimClock>, mut time: ResMut<Time<Fixed>>) {
    let base = std::time::Duration::from_secs_f32(clock.dt);
    let effective = if clock.paused || clock.speed <= 0.0 {
        // When paused, keep the timestep; tick_sim_clock won't advance.
        base
    } else {
        base.div_f32(clock.speed.clamp(0.25, 16.0))
    };
    time.set_timestep(effective);
}
