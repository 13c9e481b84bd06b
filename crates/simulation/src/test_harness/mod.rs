//! # TestYard: headless integration test harness
//!
//! Provides a fluent builder that wraps `bevy::app::App` + `SimulationPlugin`
//! for running integration tests without a window or renderer.

mod assertions;
mod queries;
mod setup;

use bevy::app::App;
use bevy::prelude::*;

use crate::yard_init::SkipYardInit;
use crate::SimulationPlugin;

/// A headless Bevy App wrapping `SimulationPlugin` for integration testing.
///
/// Use builder methods to lay track and register rolling stock, then call
/// `tick()` to advance the simulation and query/assert on the result.
///
/// Ids are assigned in registration order: the first `with_line` call makes
/// `PathId(0)`, the first vehicle builder makes `VehicleId(0)`, and so on.
pub struct TestYard {
    app: App,
}

impl TestYard {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Create a new **empty** yard: no track, no vehicles. The demo layout
    /// is NOT built.
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);

        // Insert the marker BEFORE SimulationPlugin so init_yard skips.
        app.insert_resource(SkipYardInit);
        app.add_plugins(SimulationPlugin);

        // Run one update so Startup systems execute (init_yard will no-op).
        app.update();

        Self { app }
    }

    /// Create a yard with the full demo layout from `init_yard`: the curved
    /// main line, the open siding, and the parked three-unit consist.
    pub fn with_demo_yard() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(SimulationPlugin);
        // Run one update so Startup systems execute (init_yard runs fully).
        app.update();

        Self { app }
    }
}

impl Default for TestYard {
    fn default() -> Self {
        Self::new()
    }
}
