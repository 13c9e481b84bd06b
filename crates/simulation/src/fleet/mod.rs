//! RAIL-003: Fleet, Axle Solver, and Coupler Graph
//!
//! Owns every rail vehicle in the simulation: where each one sits on the
//! track, how its rigid two-axle body is placed over a curve, and which
//! vehicles are coupled into trains.
//!
//! ## Data model
//! - `Vehicle`: a two-axle unit with fixed axle spacing, a lead-axle
//!   `PathLocation`, two coupler slots, and an optional drive or rolling
//!   motion model
//! - `Fleet`: arena resource holding all vehicles under stable `VehicleId`
//!   handles; vehicles register at yard load and are never removed
//! - `Coupler`: one end slot with a symmetric nullable link and a
//!   re-toggle cooldown
//!
//! ## Key behaviors
//! - The axle solver walks the trailing axle back along the path until the
//!   straight-line axle separation matches the rigid spacing, then derives
//!   the body transform from both samples
//! - Connect/disconnect are the only coupler link writers; both sides are
//!   always updated together
//! - Chain propagation drags neighbors to arc-distance targets one coupling
//!   gap from the host's anchor, depth-first with a visited-set guard
//!
//! The `Fleet` resource is the source of truth; rendering reads the
//! [`FleetTransforms`] snapshot published at the end of each tick.

mod couplings;
mod solver;
mod systems;
mod types;


// Re-export all public items so external code sees the same API.
pub use couplings::{
    chain_end, chain_members, connect, disconnect, propagate, try_interact, CoupleOutcome,
};
pub use solver::resolve_axles;
pub use systems::{
    process_couple_requests, process_hold_commands, publish_transforms, CoupleRequest, FleetPlugin,
    FleetTransforms, HoldCommand, PublishedTransform,
};
pub use types::*;
