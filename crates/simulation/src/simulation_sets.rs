//! Deterministic simulation ordering via `SystemSet` phases.
//!
//! These sets establish a **contract** for system execution order within the
//! `FixedUpdate` schedule.  Plugins place their systems into the appropriate
//! set so that inter-plugin ordering is explicit and testable rather than
//! relying on implicit timing assumptions.
//!
//! # FixedUpdate phases (`SimulationSet`)
//!
//! ```text
//! PreSim  →  Simulation  →  PostSim
//! ```
//!
//! * **PreSim** – Tick counters, sim clock, topology revalidation, and input
//!   event draining (throttle commands, coupler requests, switch toggles).
//!   These set up per-tick state that the motion systems read.
//! * **Simulation** – The motion core, internally chained: collision probing
//!   against end-of-previous-tick transforms, locomotive speed integration
//!   and chain propagation, free-vehicle rolling.  The probe MUST run before
//!   any position is written this tick; systems here use `.chain()` rather
//!   than relying on registration order.
//! * **PostSim** – Publication and auditing: vehicle transforms are copied to
//!   the render-facing output resource, and the slow-tick invariant pass
//!   runs.  These only *read* motion state, so downstream consumers (a
//!   renderer, telemetry) can safely read their output on the next frame.

use bevy::prelude::*;

/// Ordered phases for systems running in the `FixedUpdate` schedule.
///
/// Configured as a chain: `PreSim` → `Simulation` → `PostSim`.
/// Individual plugins use `.in_set(SimulationSet::X)` when registering their
/// systems, which gives them automatic ordering relative to other phases
/// while retaining the ability to add fine-grained `.after()` / `.before()`
/// constraints within the same phase.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Pre-simulation setup: tick counters, sim clock, topology rebuild,
    /// input event handling.
    PreSim,
    /// Motion core: collision probe, drive integration, chain propagation,
    /// free rolling.
    Simulation,
    /// Post-simulation publication: transform output, invariant checks.
    PostSim,
}
