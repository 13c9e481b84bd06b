//! Track topology: the path arena, junction wiring, and the crossing rules
//! that carry a location across path boundaries.

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::config::MAX_JUNCTION_TRANSITIONS;

use super::curve::TrackPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathId(pub u32);

/// A point on the network: which path, and how far along it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathLocation {
    pub path: PathId,
    pub distance: f32,
}

impl PathLocation {
    pub fn new(path: PathId, distance: f32) -> Self {
        Self { path, distance }
    }
}

/// Backlink from a branch to the path it leaves.
#[derive(Debug, Clone, Copy)]
pub struct ParentLink {
    pub parent: PathId,
    /// Index of the parent control point the branch hangs off.
    pub point_index: usize,
    /// Arc distance of that point along the parent. Derived by `rebuild`.
    pub start_distance: f32,
}

/// A branch attachment registered on the parent path.
#[derive(Debug, Clone, Copy)]
pub struct Junction {
    /// Arc distance of the attachment point along the parent.
    pub distance: f32,
    pub branch: PathId,
}

/// The source of truth for track geometry and topology.
///
/// Paths live in an arena indexed by `PathId` and are never removed during
/// simulation (removal is an authoring-time operation). Structural edits
/// mark the network dirty; `rebuild` runs at the next tick boundary and
/// recomputes every derived quantity in one pass, keeping junction entries
/// and branch backlinks mutually consistent.
#[derive(Resource, Default, Debug)]
pub struct TrackNetwork {
    paths: Vec<TrackPath>,
    /// Bumped on every rebuild so consumers (track mesh builders) can
    /// detect structural change cheaply.
    pub generation: u32,
    dirty: bool,
}

impl TrackNetwork {
    // -----------------------------------------------------------------------
    // Authoring
    // -----------------------------------------------------------------------

    /// Add a root path. Lengths are computed on the next rebuild.
    pub fn add_path(&mut self, name: impl Into<String>, points: Vec<Vec3>, looped: bool) -> PathId {
        let id = PathId(self.paths.len() as u32);
        self.paths.push(TrackPath::new(id, name.into(), points, looped));
        self.dirty = true;
        id
    }

    /// Add a branch leaving `parent` at control point `point_index`. The
    /// attachment point itself becomes the branch's first control point;
    /// `points` are the control points after it. The switch starts closed.
    ///
    /// Returns `None` (with a warning) when the parent or point index does
    /// not exist.
    pub fn add_branch(
        &mut self,
        name: impl Into<String>,
        parent: PathId,
        point_index: usize,
        points: Vec<Vec3>,
    ) -> Option<PathId> {
        let name = name.into();
        let Some(junction_pos) = self
            .path(parent)
            .and_then(|p| p.points.get(point_index))
            .copied()
        else {
            warn!(
                "TrackNetwork::add_branch: '{}' attaches at {:?} point {}, which does not exist",
                name, parent, point_index
            );
            return None;
        };
        let id = PathId(self.paths.len() as u32);
        let mut branch_points = Vec::with_capacity(points.len() + 1);
        branch_points.push(junction_pos);
        branch_points.extend(points);
        let mut path = TrackPath::new(id, name, branch_points, false);
        path.switch_open = false;
        path.parent = Some(ParentLink {
            parent,
            point_index,
            start_distance: 0.0,
        });
        self.paths.push(path);
        self.dirty = true;
        Some(id)
    }

    /// Open or close a branch's switch. Read live by crossing checks; no
    /// rebuild needed.
    pub fn set_switch(&mut self, id: PathId, open: bool) {
        if let Some(path) = self.paths.get_mut(id.0 as usize) {
            path.switch_open = open;
        } else {
            warn!("TrackNetwork::set_switch: unknown path {:?}", id);
        }
    }

    /// Replace a path's control points and schedule a rebuild.
    pub fn set_points(&mut self, id: PathId, points: Vec<Vec3>) {
        if let Some(path) = self.paths.get_mut(id.0 as usize) {
            path.points = points;
            self.dirty = true;
        } else {
            warn!("TrackNetwork::set_points: unknown path {:?}", id);
        }
    }

    /// Force revalidation on the next tick after direct field edits.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn path(&self, id: PathId) -> Option<&TrackPath> {
        self.paths.get(id.0 as usize)
    }

    /// Mutable path access. Callers editing geometry (not switch state)
    /// must `mark_dirty` afterwards.
    pub fn path_mut(&mut self, id: PathId) -> Option<&mut TrackPath> {
        self.paths.get_mut(id.0 as usize)
    }

    pub fn paths(&self) -> &[TrackPath] {
        &self.paths
    }

    /// Sample the network at a location. Unknown paths warn and return the
    /// origin rather than stalling the tick.
    pub fn evaluate(&self, loc: PathLocation) -> (Vec3, Quat) {
        match self.path(loc.path) {
            Some(p) => p.evaluate(loc.distance),
            None => {
                warn!("TrackNetwork::evaluate: unknown path {:?}", loc.path);
                (Vec3::ZERO, Quat::IDENTITY)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Rebuild
    // -----------------------------------------------------------------------

    /// Recompute all derived topology state: length tables, junction
    /// distances, branch backlinks, and continuity phantom points.
    ///
    /// Roots are processed before their branches because a branch's start
    /// distance and phantom point need the parent's finished length table.
    pub fn rebuild(&mut self) {
        for path in &mut self.paths {
            path.junctions.clear();
            path.phantom_start = None;
        }

        let mut queue: VecDeque<PathId> = self
            .paths
            .iter()
            .filter(|p| p.parent.is_none())
            .map(|p| p.id)
            .collect();
        let mut processed = vec![false; self.paths.len()];

        while let Some(id) = queue.pop_front() {
            let idx = id.0 as usize;
            if processed[idx] {
                warn!(
                    "TrackNetwork::rebuild: path '{}' reached twice; topology is not a forest",
                    self.paths[idx].name
                );
                continue;
            }
            processed[idx] = true;

            self.wire_branch(id);
            self.paths[idx].rebuild_length_table();

            for child in self
                .paths
                .iter()
                .filter(|p| p.parent.map(|l| l.parent) == Some(id))
                .map(|p| p.id)
            {
                queue.push_back(child);
            }
        }

        // Anything unprocessed had a broken parent chain; rebuild its
        // geometry standalone so evaluate still works.
        for idx in 0..self.paths.len() {
            if !processed[idx] {
                warn!(
                    "TrackNetwork::rebuild: path '{}' unreachable from any root",
                    self.paths[idx].name
                );
                self.paths[idx].rebuild_length_table();
            }
        }

        for path in &mut self.paths {
            path.junctions
                .sort_by(|a, b| a.distance.total_cmp(&b.distance));
        }

        self.generation = self.generation.wrapping_add(1);
        self.dirty = false;
    }

    /// Wire one branch to its (already processed) parent: pin the shared
    /// control point, derive the start distance, register the junction, and
    /// compute the continuity phantom point behind the junction along the
    /// parent's incoming tangent.
    fn wire_branch(&mut self, id: PathId) {
        let idx = id.0 as usize;
        let Some(link) = self.paths[idx].parent else {
            return;
        };
        let parent_idx = link.parent.0 as usize;
        let Some(&junction_pos) = self
            .paths
            .get(parent_idx)
            .and_then(|p| p.points.get(link.point_index))
        else {
            warn!(
                "TrackNetwork::rebuild: branch '{}' attachment point no longer exists; detaching",
                self.paths[idx].name
            );
            self.paths[idx].parent = None;
            return;
        };

        if let Some(first) = self.paths[idx].points.first_mut() {
            *first = junction_pos;
        }

        let start_distance = self.paths[parent_idx].distance_at_point(link.point_index);
        self.paths[idx].parent = Some(ParentLink {
            start_distance,
            ..link
        });

        if self.paths[idx].points.len() >= 2 {
            let (_, tangent) = self.paths[parent_idx].sample(start_distance);
            let first_chord = (self.paths[idx].points[1] - self.paths[idx].points[0]).length();
            if let Some(dir) = tangent.try_normalize() {
                self.paths[idx].phantom_start = Some(junction_pos - dir * first_chord);
            }
        }

        self.paths[parent_idx].junctions.push(Junction {
            distance: start_distance,
            branch: id,
        });
    }

    // -----------------------------------------------------------------------
    // Crossing
    // -----------------------------------------------------------------------

    /// Move a location by a signed arc distance, applying junction and loop
    /// transitions until the result is stable.
    ///
    /// Forward motion enters the first open branch whose junction distance
    /// lies in `[old, new)`; the switch flag is read once at that instant.
    /// Motion past the start of a branch continues on the parent at
    /// `start_distance + overshoot`. Loops wrap; open ends clamp. The
    /// transition count is bounded so degenerate zero-length branch chains
    /// cannot spin forever.
    pub fn advance(&self, from: PathLocation, delta: f32) -> PathLocation {
        let mut path = from.path;
        let mut old = from.distance;
        let mut dist = from.distance + delta;

        for _ in 0..MAX_JUNCTION_TRANSITIONS {
            let Some(p) = self.path(path) else {
                warn!("TrackNetwork::advance: unknown path {:?}", path);
                return from;
            };
            if p.points.len() < 2 || p.total_length() <= f32::EPSILON {
                return PathLocation::new(path, 0.0);
            }

            // CrossForward
            if dist > old {
                let crossed = p.junctions.iter().find(|j| {
                    j.distance >= old
                        && j.distance < dist
                        && self.path(j.branch).is_some_and(|b| b.switch_open)
                });
                if let Some(j) = crossed {
                    dist -= j.distance;
                    old = 0.0;
                    path = j.branch;
                    continue;
                }
            }

            // CrossBackward / WrapLoop / ClampAtEnd at the start side
            if dist < 0.0 {
                if let Some(link) = p.parent {
                    dist += link.start_distance;
                    old = link.start_distance;
                    path = link.parent;
                    continue;
                }
                if p.looped {
                    dist += p.total_length();
                    old = p.total_length();
                    continue;
                }
                return PathLocation::new(path, 0.0);
            }

            // WrapLoop / ClampAtEnd at the far side
            if dist >= p.total_length() {
                if p.looped {
                    dist -= p.total_length();
                    old = 0.0;
                    continue;
                }
                return PathLocation::new(path, p.total_length());
            }

            return PathLocation::new(path, dist);
        }

        warn!(
            "TrackNetwork::advance: transition bound hit on {:?}; clamping",
            path
        );
        match self.path(path) {
            Some(p) if p.total_length() <= f32::EPSILON => PathLocation::new(path, 0.0),
            Some(p) if p.looped => PathLocation::new(path, dist.rem_euclid(p.total_length())),
            Some(p) => PathLocation::new(path, dist.clamp(0.0, p.total_length())),
            None => from,
        }
    }
}

/// Runs at the start of every tick; rebuilds derived topology after any
/// structural edit so the motion systems always see consistent state.
pub fn revalidate_topology(mut net: ResMut<TrackNetwork>) {
    if net.is_dirty() {
        net.rebuild();
    }
}

/// Flip a branch switch. The flag is read at crossing time, so a toggle
/// takes effect for any movement from this tick on, never mid-step.
#[derive(Event, Debug, Clone, Copy)]
pub struct SwitchToggle {
    pub branch: PathId,
    pub open: bool,
}

pub fn process_switch_toggles(
    mut net: ResMut<TrackNetwork>,
    mut toggles: EventReader<SwitchToggle>,
) {
    for toggle in toggles.read() {
        net.set_switch(toggle.branch, toggle.open);
        info!(
            "switch on {:?} now {}",
            toggle.branch,
            if toggle.open { "open" } else { "closed" }
        );
    }
}

pub struct TrackPlugin;

impl Plugin for TrackPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TrackNetwork>()
            .add_event::<SwitchToggle>()
            .add_systems(
                FixedUpdate,
                (revalidate_topology, process_switch_toggles)
                    .chain()
                    .in_set(crate::SimulationSet::PreSim),
            );
    }
}
