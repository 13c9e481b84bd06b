//! Data-driven simulation parameters.
//!
//! Extracts per-vehicle tunables into a single [`SimParams`] resource so
//! scenarios can adjust drive and collision behavior without recompilation.
//! Structural constants that never change at runtime stay in
//! [`crate::config`].
//!
//! Defaults reproduce the stock vehicle behavior; a scenario file can
//! override them via [`SimParams::from_json_str`].

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Drive parameters
// ---------------------------------------------------------------------------

/// Locomotive drive tunables, used as defaults when a vehicle spec does not
/// override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveParams {
    /// Top speed in path units per second, applied symmetrically in reverse.
    pub max_speed: f32,
    /// Speed gained per second while the throttle is engaged.
    pub acceleration: f32,
    /// Speed shed per second while the throttle is neutral.
    pub brake_force: f32,
}

impl Default for DriveParams {
    fn default() -> Self {
        Self {
            max_speed: 15.0,
            acceleration: 5.0,
            brake_force: 10.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Rolling parameters
// ---------------------------------------------------------------------------

/// Free-roll tunables for uncoupled vehicles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingParams {
    /// Frictional deceleration in path units per second squared.
    pub friction: f32,
    /// Speed magnitude below which a rolling vehicle snaps to rest.
    pub stop_threshold: f32,
}

impl Default for RollingParams {
    fn default() -> Self {
        Self {
            friction: 2.0,
            stop_threshold: 0.1,
        }
    }
}

// ---------------------------------------------------------------------------
// Coupling parameters
// ---------------------------------------------------------------------------

/// Chain propagation tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouplingParams {
    /// Target anchor-to-anchor separation between linked couplers.
    pub coupling_gap: f32,
    /// Fraction of the measured live gap error fed back as extra
    /// displacement each tick. Zero disables the correction.
    pub gap_correction: f32,
    /// World distance within which `try_interact` accepts a candidate.
    pub interact_range: f32,
}

impl Default for CouplingParams {
    fn default() -> Self {
        Self {
            coupling_gap: 0.05,
            gap_correction: 0.5,
            interact_range: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Impact parameters
// ---------------------------------------------------------------------------

/// Collision response tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactParams {
    /// Fraction of the instigator's speed transferred to the struck vehicle.
    pub impact_transfer: f32,
    /// Fraction of the instigator's speed reflected back as a bounce.
    pub bounce_factor: f32,
    /// Pre-impact speed magnitude above which the instigator bounces
    /// instead of hard-stopping.
    pub bounce_threshold: f32,
}

impl Default for ImpactParams {
    fn default() -> Self {
        Self {
            impact_transfer: 0.6,
            bounce_factor: 0.3,
            bounce_threshold: 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level resource
// ---------------------------------------------------------------------------

/// All runtime-tunable simulation parameters, grouped by concern.
///
/// `#[serde(default)]` lets an override file specify only the groups it
/// changes; everything else keeps its stock value.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub drive: DriveParams,
    pub rolling: RollingParams,
    pub coupling: CouplingParams,
    pub impact: ImpactParams,
}

impl SimParams {
    /// Parse a JSON override document. Groups absent from the document
    /// keep their stock values.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
