use bevy::prelude::*;

use crate::config::{ALIGN_SCAN_STEP, CURVE_RESOLUTION};

use super::network::{Junction, ParentLink, PathId};

/// One path segment of the track network: an ordered run of control points
/// interpolated by a Catmull-Rom curve, with a cached arc-length table.
///
/// Geometry-derived fields (`seg_lengths`, `total_length`, `phantom_start`,
/// `junctions`, the `start_distance` of the parent link) are owned by
/// `TrackNetwork::rebuild`; everything else is authoring input.
#[derive(Debug, Clone)]
pub struct TrackPath {
    pub id: PathId,
    pub name: String,
    /// Control points in world space. A branch's first point is pinned to
    /// its parent's attachment point on every rebuild.
    pub points: Vec<Vec3>,
    pub looped: bool,
    /// Chord-sampling sub-steps per segment for the arc-length table.
    pub resolution: u32,
    /// Whether a vehicle crossing this branch's junction may enter it.
    /// Mutated by the interaction layer; the simulation only reads it.
    /// Meaningless on root paths (nothing enters them via a junction).
    pub switch_open: bool,
    /// Virtual control point before the first real one. `None` extrapolates
    /// from the first two points; branches get a computed point that keeps
    /// the tangent continuous across the junction.
    pub(crate) phantom_start: Option<Vec3>,
    /// Set for branches: which path this one leaves, and where.
    pub(crate) parent: Option<ParentLink>,
    /// Branch attachments on this path, ascending by distance.
    pub(crate) junctions: Vec<Junction>,
    /// Per-segment arc length, estimated by chord sampling.
    pub(crate) seg_lengths: Vec<f32>,
    pub(crate) total_length: f32,
}

impl TrackPath {
    pub(crate) fn new(id: PathId, name: String, points: Vec<Vec3>, looped: bool) -> Self {
        Self {
            id,
            name,
            points,
            looped,
            resolution: CURVE_RESOLUTION,
            switch_open: true,
            phantom_start: None,
            parent: None,
            junctions: Vec::new(),
            seg_lengths: Vec::new(),
            total_length: 0.0,
        }
    }

    /// Total arc length of the path. Zero until the first rebuild, and for
    /// paths with fewer than 2 control points.
    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    pub fn junctions(&self) -> &[Junction] {
        &self.junctions
    }

    pub fn parent(&self) -> Option<ParentLink> {
        self.parent
    }

    /// Fallback transform origin for degenerate paths.
    pub fn anchor_position(&self) -> Vec3 {
        self.points.first().copied().unwrap_or(Vec3::ZERO)
    }

    /// Number of curve segments: one per point pair, plus the closing
    /// segment when looped.
    pub fn segment_count(&self) -> usize {
        match self.points.len() {
            0 | 1 => 0,
            n if self.looped => n,
            n => n - 1,
        }
    }

    /// Control point lookup with virtual endpoints. Looped paths wrap;
    /// open paths extrapolate past either end, except that a branch start
    /// uses its computed phantom point. Requires >= 2 real points.
    fn control_point(&self, i: isize) -> Vec3 {
        let n = self.points.len() as isize;
        if self.looped {
            return self.points[i.rem_euclid(n) as usize];
        }
        if i < 0 {
            return self
                .phantom_start
                .unwrap_or_else(|| self.points[0] - (self.points[1] - self.points[0]));
        }
        if i >= n {
            let last = self.points[(n - 1) as usize];
            let prev = self.points[(n - 2) as usize];
            return last + (last - prev);
        }
        self.points[i as usize]
    }

    fn segment_point(&self, seg: usize, t: f32) -> Vec3 {
        let s = seg as isize;
        catmull_position(
            self.control_point(s - 1),
            self.control_point(s),
            self.control_point(s + 1),
            self.control_point(s + 2),
            t,
        )
    }

    fn segment_tangent(&self, seg: usize, t: f32) -> Vec3 {
        let s = seg as isize;
        catmull_velocity(
            self.control_point(s - 1),
            self.control_point(s),
            self.control_point(s + 1),
            self.control_point(s + 2),
            t,
        )
    }

    /// Recompute the per-segment arc-length table by chord sampling
    /// `resolution` sub-steps per segment.
    pub(crate) fn rebuild_length_table(&mut self) {
        self.seg_lengths.clear();
        self.total_length = 0.0;
        if self.points.len() < 2 {
            return;
        }
        let steps = self.resolution.max(1);
        for seg in 0..self.segment_count() {
            let mut len = 0.0;
            let mut prev = self.segment_point(seg, 0.0);
            for k in 1..=steps {
                let t = k as f32 / steps as f32;
                let pt = self.segment_point(seg, t);
                len += pt.distance(prev);
                prev = pt;
            }
            self.seg_lengths.push(len);
            self.total_length += len;
        }
    }

    /// Arc distance of control point `index` from the path start.
    pub(crate) fn distance_at_point(&self, index: usize) -> f32 {
        self.seg_lengths.iter().take(index).sum()
    }

    /// Position and (unnormalized) tangent at an arc distance. Distance is
    /// wrapped on loops and clamped on open paths; degenerate paths return
    /// the anchor with a zero tangent.
    pub(crate) fn sample(&self, distance: f32) -> (Vec3, Vec3) {
        if self.points.len() < 2 || self.total_length <= f32::EPSILON {
            return (self.anchor_position(), Vec3::ZERO);
        }
        let d = if self.looped {
            distance.rem_euclid(self.total_length)
        } else {
            distance.clamp(0.0, self.total_length)
        };
        let mut accumulated = 0.0;
        for (seg, &len) in self.seg_lengths.iter().enumerate() {
            if accumulated + len >= d {
                let t = if len <= f32::EPSILON {
                    0.0
                } else {
                    (d - accumulated) / len
                };
                return (self.segment_point(seg, t), self.segment_tangent(seg, t));
            }
            accumulated += len;
        }
        // Float accumulation can leave d a hair past the table.
        let last = self.segment_count() - 1;
        (self.segment_point(last, 1.0), self.segment_tangent(last, 1.0))
    }

    /// Position and orientation at an arc distance. Orientation faces along
    /// the local tangent with world-up as the up hint; a zero tangent maps
    /// to identity.
    pub fn evaluate(&self, distance: f32) -> (Vec3, Quat) {
        let (pos, tangent) = self.sample(distance);
        (pos, facing(tangent, Vec3::Y))
    }

    /// Coarse nearest-distance scan, used to snap a world position (e.g. a
    /// spawn point) onto the path. Resolution is `ALIGN_SCAN_STEP`.
    pub fn closest_distance(&self, target: Vec3) -> f32 {
        if self.total_length <= f32::EPSILON {
            return 0.0;
        }
        let mut best_distance = 0.0;
        let mut best_sq = f32::MAX;
        let mut d: f32 = 0.0;
        loop {
            let clamped = d.min(self.total_length);
            let (pos, _) = self.sample(clamped);
            let sq = pos.distance_squared(target);
            if sq < best_sq {
                best_sq = sq;
                best_distance = clamped;
            }
            if clamped >= self.total_length {
                return best_distance;
            }
            d += ALIGN_SCAN_STEP;
        }
    }
}

/// Catmull-Rom position for one segment, t in [0, 1].
fn catmull_position(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

/// First derivative of [`catmull_position`] with respect to t.
fn catmull_velocity(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    0.5 * ((p2 - p0)
        + 2.0 * (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t
        + 3.0 * (3.0 * p1 - p0 - 3.0 * p2 + p3) * t2)
}

/// Rotation looking along `dir` (local -Z) with `up_hint` resolving roll.
/// Degenerate inputs (zero direction, parallel up) fall back gracefully
/// instead of producing NaN.
pub(crate) fn facing(dir: Vec3, up_hint: Vec3) -> Quat {
    let Some(fwd) = dir.try_normalize() else {
        return Quat::IDENTITY;
    };
    let back = -fwd;
    let right = up_hint
        .cross(back)
        .try_normalize()
        .unwrap_or_else(|| back.any_orthonormal_vector());
    let up = back.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, back))
}
