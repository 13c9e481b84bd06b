//! Data types for the vehicle fleet.

use bevy::prelude::*;

use crate::config::EMERGENCY_STOP_THRESHOLD;
use crate::sim_params::{DriveParams, RollingParams};
use crate::track::{PathLocation, TrackNetwork};

use super::solver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VehicleId(pub u32);

/// Which end of a vehicle a coupler occupies. Front faces the leading axle;
/// a well-formed chain alternates Front and Rear links so every vehicle
/// points the same way along the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CouplerEnd {
    Front,
    Rear,
}

impl CouplerEnd {
    pub fn opposite(self) -> Self {
        match self {
            CouplerEnd::Front => CouplerEnd::Rear,
            CouplerEnd::Rear => CouplerEnd::Front,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            CouplerEnd::Front => 0,
            CouplerEnd::Rear => 1,
        }
    }
}

/// Address of one coupler in the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CouplerKey {
    pub vehicle: VehicleId,
    pub end: CouplerEnd,
}

impl CouplerKey {
    pub fn new(vehicle: VehicleId, end: CouplerEnd) -> Self {
        Self { vehicle, end }
    }
}

/// One coupler slot. Link state is symmetric: if A links B then B links A,
/// maintained exclusively by the connect/disconnect operations.
#[derive(Debug, Clone)]
pub struct Coupler {
    /// Anchor position in vehicle-local space.
    pub anchor_local: Vec3,
    /// Signed arc offset of the anchor from the leading axle along the
    /// vehicle's forward axis. Computed once at registration.
    pub arc_offset: f32,
    pub linked: Option<CouplerKey>,
    /// Simulated-time deadline. Interactions before it are ignored so one
    /// signal cannot toggle the same coupler twice.
    pub cooldown_until: f64,
}

impl Coupler {
    fn new(anchor_local: Vec3) -> Self {
        Self {
            anchor_local,
            arc_offset: 0.0,
            linked: None,
            cooldown_until: 0.0,
        }
    }

    pub fn is_cooling(&self, now: f64) -> bool {
        self.cooldown_until > now
    }
}

/// Throttle/speed state for a driving vehicle.
#[derive(Debug, Clone)]
pub struct DriveUnit {
    /// Discrete drive command: -1 reverse, 0 neutral, 1 forward.
    pub throttle: i8,
    pub speed: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    pub brake_force: f32,
}

impl DriveUnit {
    pub fn from_params(params: &DriveParams) -> Self {
        Self {
            throttle: 0,
            speed: 0.0,
            max_speed: params.max_speed,
            acceleration: params.acceleration,
            brake_force: params.brake_force,
        }
    }

    pub fn set_throttle(&mut self, throttle: i8) {
        self.throttle = throttle.clamp(-1, 1);
    }

    /// Step the throttle up or down one notch, as a gear lever would.
    pub fn shift(&mut self, delta: i8) {
        self.set_throttle(self.throttle + delta.clamp(-1, 1));
    }

    /// Kill speed and drop to neutral. A near-stationary drive is left
    /// untouched so an idle locomotive does not flap its throttle.
    pub fn emergency_stop(&mut self) {
        if self.speed.abs() > EMERGENCY_STOP_THRESHOLD {
            self.speed = 0.0;
            self.throttle = 0;
        }
    }
}

/// Free-roll state for an uncoupled, non-driving vehicle.
#[derive(Debug, Clone)]
pub struct RollingUnit {
    pub speed: f32,
    pub friction: f32,
    pub stop_threshold: f32,
}

impl RollingUnit {
    pub fn from_params(params: &RollingParams) -> Self {
        Self {
            speed: 0.0,
            friction: params.friction,
            stop_threshold: params.stop_threshold,
        }
    }
}

/// A two-axle rail vehicle.
///
/// Axle anchors and coupler anchors are fixed local-space offsets; the
/// derived `axle_spacing` and coupler arc offsets are computed once at
/// registration and hold for the vehicle's lifetime. `location` tracks the
/// leading axle; the body transform is derived from both axles by the
/// solver every time the vehicle moves.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    pub location: PathLocation,
    pub front_anchor_local: Vec3,
    pub rear_anchor_local: Vec3,
    /// Rigid distance between the two axles. Invariant for the vehicle's
    /// lifetime.
    pub axle_spacing: f32,
    /// Local offset from the body origin to the axle midpoint.
    pub(crate) axle_center_local: Vec3,
    /// Indexed by `CouplerEnd::index` (Front, Rear).
    pub couplers: [Coupler; 2],
    pub drive: Option<DriveUnit>,
    pub rolling: Option<RollingUnit>,
    /// Held in place by external equipment; the solver and propagation
    /// skip a held vehicle entirely.
    pub held: bool,
    pub body_position: Vec3,
    pub body_rotation: Quat,
}

impl Vehicle {
    pub fn coupler(&self, end: CouplerEnd) -> &Coupler {
        &self.couplers[end.index()]
    }

    pub fn coupler_mut(&mut self, end: CouplerEnd) -> &mut Coupler {
        &mut self.couplers[end.index()]
    }

    /// Local forward axis: from the rear axle anchor toward the front one.
    pub fn local_forward(&self) -> Vec3 {
        (self.front_anchor_local - self.rear_anchor_local)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }

    /// World position of a coupler anchor under the current body transform.
    pub fn coupler_world_anchor(&self, end: CouplerEnd) -> Vec3 {
        self.body_position + self.body_rotation * self.coupler(end).anchor_local
    }

    pub fn is_coupled(&self) -> bool {
        self.couplers.iter().any(|c| c.linked.is_some())
    }

    /// Speed from whichever motion model the vehicle owns; zero for inert
    /// stock (chain-dragged or static).
    pub fn current_speed(&self) -> f32 {
        if let Some(drive) = &self.drive {
            drive.speed
        } else if let Some(rolling) = &self.rolling {
            rolling.speed
        } else {
            0.0
        }
    }

    /// Write a speed into the vehicle's own motion model, if it has one.
    /// Returns false for inert stock (static-obstacle semantics).
    pub(crate) fn receive_speed(&mut self, speed: f32) -> bool {
        if let Some(drive) = &mut self.drive {
            drive.speed = speed;
            true
        } else if let Some(rolling) = &mut self.rolling {
            rolling.speed = speed;
            true
        } else {
            false
        }
    }
}

/// Authoring description of a vehicle. Anchors use vehicle-local space with
/// forward along -Z, so the front anchors sit at negative Z.
#[derive(Debug, Clone)]
pub struct VehicleSpec {
    pub name: String,
    pub front_anchor: Vec3,
    pub rear_anchor: Vec3,
    pub front_coupler: Vec3,
    pub rear_coupler: Vec3,
    pub drive: Option<DriveParams>,
    pub rolling: Option<RollingParams>,
}

impl Default for VehicleSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            front_anchor: Vec3::new(0.0, 0.0, -1.5),
            rear_anchor: Vec3::new(0.0, 0.0, 1.5),
            front_coupler: Vec3::new(0.0, 0.0, -2.2),
            rear_coupler: Vec3::new(0.0, 0.0, 2.2),
            drive: None,
            rolling: None,
        }
    }
}

/// The vehicle arena. Vehicles are registered at yard load and never
/// removed during simulation; `VehicleId` indexes are stable handles.
#[derive(Resource, Default, Debug)]
pub struct Fleet {
    vehicles: Vec<Vehicle>,
}

impl Fleet {
    /// Register a vehicle at a location, derive its rigid geometry, and
    /// settle it onto the track so the first tick sees a valid transform.
    pub fn register(
        &mut self,
        spec: VehicleSpec,
        location: PathLocation,
        net: &TrackNetwork,
    ) -> VehicleId {
        let id = VehicleId(self.vehicles.len() as u32);
        let axle_spacing = spec.front_anchor.distance(spec.rear_anchor);
        if axle_spacing <= f32::EPSILON {
            warn!(
                "Fleet::register: '{}' has coincident axle anchors; it will ride a single sample",
                spec.name
            );
        }
        let axle_center_local = (spec.front_anchor + spec.rear_anchor) * 0.5;
        let forward = (spec.front_anchor - spec.rear_anchor)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z);

        let mut front_coupler = Coupler::new(spec.front_coupler);
        front_coupler.arc_offset = (spec.front_coupler - spec.front_anchor).dot(forward);
        let mut rear_coupler = Coupler::new(spec.rear_coupler);
        rear_coupler.arc_offset = (spec.rear_coupler - spec.front_anchor).dot(forward);

        let mut vehicle = Vehicle {
            id,
            name: spec.name,
            location,
            front_anchor_local: spec.front_anchor,
            rear_anchor_local: spec.rear_anchor,
            axle_spacing,
            axle_center_local,
            couplers: [front_coupler, rear_coupler],
            drive: spec.drive.as_ref().map(DriveUnit::from_params),
            rolling: spec.rolling.as_ref().map(RollingUnit::from_params),
            held: false,
            body_position: Vec3::ZERO,
            body_rotation: Quat::IDENTITY,
        };
        solver::resolve_axles(net, &mut vehicle);
        self.vehicles.push(vehicle);
        id
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.0 as usize)
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(id.0 as usize)
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicles_mut(&mut self) -> &mut [Vehicle] {
        &mut self.vehicles
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.vehicles.iter().map(|v| v.id)
    }
}
