//! RAIL-004: Drivetrain and Collision Response
//!
//! Converts discrete throttle commands into motion and keeps trains from
//! passing through each other.
//!
//! ## Data model
//! - Throttle lives on each vehicle's `DriveUnit` (notch in {-1, 0, 1});
//!   this module owns integration, not the state itself
//! - `Impact`: an internal contact record carrying a pre-impact speed
//!   snapshot
//!
//! ## Key behaviors
//! - Fixed per-tick chain: probe contacts on last tick's transforms,
//!   integrate and move locomotives (dragging their chains), then roll
//!   free stock under friction
//! - A chain probes only its leading extremity in the travel direction;
//!   free stock probes both ends
//! - Impact response: transfer a speed fraction into the struck vehicle,
//!   bounce the instigator above the bounce threshold, hard-stop it
//!   otherwise, and always drop its throttle to neutral

mod probe;
mod systems;


pub use systems::{
    advance_locomotives, probe_collisions, process_throttle_commands, roll_free_vehicles,
    DrivetrainPlugin, ThrottleCommand, ThrottleInput,
};
