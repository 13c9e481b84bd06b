//! Integration tests using the `TestYard` harness.
//!
//! These tests spin up a headless Bevy App with `SimulationPlugin` and
//! verify emergent behavior across the track, fleet, and drivetrain
//! systems working together.

mod chain_motion;
mod collision_response;
mod coupling_flow;
mod harness_bootstrap;
mod invariant_audit;

use bevy::math::Vec3;

/// A straight east-running line: `count` control points spaced `step`
/// apart, starting at the origin.
fn straight_points(count: usize, step: f32) -> Vec<Vec3> {
    (0..count)
        .map(|i| Vec3::new(i as f32 * step, 0.0, 0.0))
        .collect()
}
