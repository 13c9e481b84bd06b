//! RAIL-002: Track geometry and topology
//!
//! Curved rail paths with branching junctions, the geometric foundation the
//! fleet rides on.
//!
//! ## Data model
//! - `TrackPath`: ordered control points interpolated by a Catmull-Rom
//!   curve, with a chord-sampled arc-length table mapping distance to
//!   position + orientation
//! - `Junction` / `ParentLink`: a branch's forward registration on its
//!   parent and its backlink, kept mutually consistent by `rebuild`
//! - `TrackNetwork`: the arena of paths, indexed by stable `PathId` handles
//!
//! ## Key behaviors
//! - Branch entry stays tangent-continuous: the branch's virtual first
//!   control point is placed behind the junction along the parent's
//!   incoming tangent, so there is no kink where a switch diverges
//! - `advance` carries a location across junctions (switch permitting),
//!   back onto parents, around loops, and clamps at dead ends
//! - Degenerate geometry degrades instead of failing: short paths evaluate
//!   to their anchor, zero tangents map to identity orientation
//!
//! The `TrackNetwork` resource is the source of truth; structural edits
//! mark it dirty and `revalidate_topology` rebuilds at the next tick
//! boundary.

mod curve;
mod network;


pub(crate) use curve::facing;
pub use curve::TrackPath;
pub use network::{
    process_switch_toggles, revalidate_topology, Junction, ParentLink, PathId, PathLocation,
    SwitchToggle, TrackNetwork, TrackPlugin,
};
