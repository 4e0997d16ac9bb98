//! Physics service boundary
//!
//! The combat core never integrates bodies itself. It talks to a physics
//! service through [`PhysicsService`]: apply impulses, set velocities, query
//! transforms, and drain contact events. [`ArenaPhysics`] implements it on a
//! rapier3d world and is what both the browser and native builds run; tests
//! wrap it to observe the calls made against it.

use std::sync::Mutex;

use glam::{Quat, Vec3};
use rapier3d::prelude::{
    ActiveEvents, BroadPhaseBvh, CCDSolver, ColliderBuilder, ColliderHandle, ColliderSet,
    CollisionEvent as RapierCollisionEvent, ContactPair, EventHandler, ImpulseJointSet,
    IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, Point,
    Real, RigidBody, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, Vector,
};
use serde::{Deserialize, Serialize};

use crate::consts::GRAVITY;

/// Handle to a body owned by the physics service
pub type BodyHandle = RigidBodyHandle;

/// What a body represents in the game. Stands in for mesh-name lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyTag {
    Player,
    Enemy,
    Projectile,
    Obstacle,
    Ground,
}

impl BodyTag {
    /// Bodies that carry a health counter
    pub fn is_vehicle(self) -> bool {
        matches!(self, BodyTag::Player | BodyTag::Enemy)
    }

    /// Packed into rapier's per-body `user_data`
    fn to_user_data(self) -> u128 {
        match self {
            BodyTag::Player => 1,
            BodyTag::Enemy => 2,
            BodyTag::Projectile => 3,
            BodyTag::Obstacle => 4,
            BodyTag::Ground => 5,
        }
    }

    fn from_user_data(data: u128) -> Option<Self> {
        match data {
            1 => Some(BodyTag::Player),
            2 => Some(BodyTag::Enemy),
            3 => Some(BodyTag::Projectile),
            4 => Some(BodyTag::Obstacle),
            5 => Some(BodyTag::Ground),
            _ => None,
        }
    }
}

/// Collision proxy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { radius: f32 },
    /// Box with the given half extents
    Cuboid { half_extents: Vec3 },
    /// Half-space below the given height
    Ground { height: f32 },
}

/// Parameters for creating a body
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub tag: BodyTag,
    pub shape: Shape,
    pub position: Vec3,
    pub rotation: Quat,
    /// Zero mass means static
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl BodyDesc {
    pub fn dynamic(tag: BodyTag, radius: f32, mass: f32, position: Vec3) -> Self {
        Self {
            tag,
            shape: Shape::Sphere { radius },
            position,
            rotation: Quat::IDENTITY,
            mass,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    pub fn fixed(tag: BodyTag, shape: Shape, position: Vec3) -> Self {
        Self {
            tag,
            shape,
            position,
            rotation: Quat::IDENTITY,
            mass: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }
}

/// A contact reported for a body with contact reporting enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    /// The reporting body
    pub body: BodyHandle,
    /// What it touched
    pub other: BodyHandle,
}

/// Narrow interface to the rigid-body engine.
///
/// Queries on a removed handle return `None`; mutations on a removed handle
/// are ignored.
pub trait PhysicsService {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle;
    fn remove_body(&mut self, body: BodyHandle);
    fn contains(&self, body: BodyHandle) -> bool;
    fn tag(&self, body: BodyHandle) -> Option<BodyTag>;

    fn position(&self, body: BodyHandle) -> Option<Vec3>;
    fn rotation(&self, body: BodyHandle) -> Option<Quat>;
    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3>;
    fn angular_velocity(&self, body: BodyHandle) -> Option<Vec3>;

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3);
    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3);
    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec3, at_point: Vec3);
    fn set_damping(&mut self, body: BodyHandle, linear: f32, angular: f32);
    /// Enable or disable contact events for a body
    fn set_contact_reporting(&mut self, body: BodyHandle, enabled: bool);

    /// Advance the world by `dt` seconds
    fn step(&mut self, dt: f32);
    /// Take all contact events produced since the last drain
    fn drain_collisions(&mut self) -> Vec<CollisionEvent>;
}

/// Restitution for dynamic bodies; static geometry absorbs impacts
const RESTITUTION: f32 = 0.2;

#[inline]
fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

#[inline]
fn to_vec3(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// Queues rapier's contact-start events until the next drain
#[derive(Debug, Default)]
struct ContactCollector {
    started: Mutex<Vec<(ColliderHandle, ColliderHandle)>>,
}

impl ContactCollector {
    fn take(&self) -> Vec<(ColliderHandle, ColliderHandle)> {
        match self.started.lock() {
            Ok(mut started) => std::mem::take(&mut *started),
            Err(_) => Vec::new(),
        }
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: RapierCollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        // Only the first touch matters; separation and sensor events are dropped
        if event.started() && !event.sensor() {
            if let Ok(mut started) = self.started.lock() {
                started.push((event.collider1(), event.collider2()));
            }
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Rapier-backed physics world.
///
/// Dynamic bodies only yaw: pitch and roll are locked so hulls stay upright
/// and their forward axis is always horizontal. Colliders are frictionless;
/// the vehicles drive by setting velocities directly.
pub struct ArenaPhysics {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    collector: ContactCollector,
    events: Vec<CollisionEvent>,
}

impl Default for ArenaPhysics {
    fn default() -> Self {
        Self {
            gravity: to_vector(GRAVITY),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collector: ContactCollector::default(),
            events: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ArenaPhysics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaPhysics")
            .field("bodies", &self.bodies.len())
            .field("colliders", &self.colliders.len())
            .field("pending_events", &self.events.len())
            .finish()
    }
}

impl ArenaPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn dynamic_body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle).filter(|b| b.is_dynamic())
    }

    /// Translate collider pairs from the last step into body contacts, one
    /// per side that asked for reports
    fn collect_contacts(&mut self) {
        for (c1, c2) in self.collector.take() {
            let (Some(a), Some(b)) = (self.colliders.get(c1), self.colliders.get(c2)) else {
                continue;
            };
            let (Some(body_a), Some(body_b)) = (a.parent(), b.parent()) else {
                continue;
            };
            if a.active_events().contains(ActiveEvents::COLLISION_EVENTS) {
                self.events.push(CollisionEvent {
                    body: body_a,
                    other: body_b,
                });
            }
            if b.active_events().contains(ActiveEvents::COLLISION_EVENTS) {
                self.events.push(CollisionEvent {
                    body: body_b,
                    other: body_a,
                });
            }
        }
    }
}

impl PhysicsService for ArenaPhysics {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let dynamic = desc.mass > 0.0;
        let (translation, collider) = match desc.shape {
            Shape::Sphere { radius } => (desc.position, ColliderBuilder::ball(radius)),
            Shape::Cuboid { half_extents } => (
                desc.position,
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z),
            ),
            Shape::Ground { height } => (
                desc.position + Vec3::Y * height,
                ColliderBuilder::halfspace(Vector::y_axis()),
            ),
        };

        let builder = if dynamic {
            RigidBodyBuilder::dynamic()
                .enabled_rotations(false, true, false)
                .linear_damping(desc.linear_damping)
                .angular_damping(desc.angular_damping)
                .ccd_enabled(desc.tag == BodyTag::Projectile)
        } else {
            RigidBodyBuilder::fixed()
        };
        let body = builder
            .translation(to_vector(translation))
            .rotation(to_vector(desc.rotation.to_scaled_axis()))
            .user_data(desc.tag.to_user_data())
            .build();

        let collider = collider
            .friction(0.0)
            .restitution(if dynamic { RESTITUTION } else { 0.0 });
        let collider = if dynamic {
            collider.mass(desc.mass)
        } else {
            collider
        };

        let handle = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(collider.build(), handle, &mut self.bodies);
        if let Some(body) = self.bodies.get_mut(handle) {
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }
        handle
    }

    fn remove_body(&mut self, body: BodyHandle) {
        self.bodies.remove(
            body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    fn contains(&self, body: BodyHandle) -> bool {
        self.bodies.contains(body)
    }

    fn tag(&self, body: BodyHandle) -> Option<BodyTag> {
        BodyTag::from_user_data(self.bodies.get(body)?.user_data)
    }

    fn position(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(body).map(|b| to_vec3(b.translation()))
    }

    fn rotation(&self, body: BodyHandle) -> Option<Quat> {
        let q = self.bodies.get(body)?.rotation();
        Some(Quat::from_xyzw(q.i, q.j, q.k, q.w))
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(body).map(|b| to_vec3(b.linvel()))
    }

    fn angular_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(body).map(|b| to_vec3(b.angvel()))
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(b) = self.dynamic_body_mut(body) {
            b.set_linvel(to_vector(velocity), true);
        }
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(b) = self.dynamic_body_mut(body) {
            b.set_angvel(to_vector(velocity), true);
        }
    }

    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec3, at_point: Vec3) {
        if let Some(b) = self.dynamic_body_mut(body) {
            b.apply_impulse_at_point(to_vector(impulse), Point::from(to_vector(at_point)), true);
        }
    }

    fn set_damping(&mut self, body: BodyHandle, linear: f32, angular: f32) {
        if let Some(b) = self.dynamic_body_mut(body) {
            b.set_linear_damping(linear);
            b.set_angular_damping(angular);
        }
    }

    fn set_contact_reporting(&mut self, body: BodyHandle, enabled: bool) {
        let Some(b) = self.bodies.get(body) else {
            return;
        };
        let events = if enabled {
            ActiveEvents::COLLISION_EVENTS
        } else {
            ActiveEvents::empty()
        };
        for &handle in b.colliders() {
            if let Some(collider) = self.colliders.get_mut(handle) {
                collider.set_active_events(events);
            }
        }
    }

    fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &self.collector,
        );
        self.collect_contacts();
    }

    fn drain_collisions(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.events)
    }
}
