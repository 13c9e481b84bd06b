//! Compile-time constants for the rail core.
//!
//! Runtime-tunable values (acceleration, friction, coupling gap, impact
//! response) live in [`crate::sim_params::SimParams`] instead; everything
//! here is structural and never changes while the simulation runs.

/// Seconds of simulated time per FixedUpdate tick (50 Hz).
pub const TICK_SECONDS: f32 = 0.02;

/// Chord-sampling sub-steps per curve segment when building the arc-length
/// table. Higher values tighten the distance<->position mapping on sharp
/// curves at the cost of rebuild time.
pub const CURVE_RESOLUTION: u32 = 20;

/// Fixed iteration count for the rigid axle solver. Chord and arc length
/// agree quickly at track-scale curvature; three Newton-style corrections
/// land well inside the 1e-3 spacing tolerance.
pub const AXLE_SOLVER_ITERATIONS: u32 = 3;

/// Step size in path units for the coarse nearest-distance scan used when
/// snapping a spawn point onto a path.
pub const ALIGN_SCAN_STEP: f32 = 0.5;

/// Transition bound for a single `advance` call. One crossing per tick is
/// the normal case; the bound only guards degenerate zero-length branches.
pub const MAX_JUNCTION_TRANSITIONS: u32 = 8;

/// Seconds a coupler stays unresponsive after any connect or disconnect,
/// so one interaction signal cannot toggle the same coupler twice.
pub const COUPLER_COOLDOWN_SECONDS: f32 = 0.5;

/// How far a leading coupler searches for a foreign coupler ahead of it.
pub const COLLISION_PROBE_RANGE: f32 = 1.0;

/// Anchor-to-anchor distance at which a probe result counts as contact.
pub const COLLISION_TOUCH_THRESHOLD: f32 = 0.05;

/// Sideways distance from the probe axis beyond which a foreign coupler is
/// ignored, so stock on an adjacent track never registers as contact.
pub const COLLISION_LATERAL_TOLERANCE: f32 = 0.5;

/// Speeds below this skip collision probing entirely, so a stopped vehicle
/// resting in contact does not re-trigger impacts every tick.
pub const MIN_PROBE_SPEED: f32 = 0.1;

/// Speed magnitude below which an emergency stop is a no-op.
pub const EMERGENCY_STOP_THRESHOLD: f32 = 0.1;

/// How many ticks between slow invariant-check passes.
pub const INVARIANT_CHECK_INTERVAL: u32 = 100;
