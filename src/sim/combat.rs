//! Projectiles and hit resolution
//!
//! Each projectile is armed for exactly one contact. The first contact it
//! reports disarms it, stops it, removes its body, and damages the struck
//! vehicle if it was one. Deferred recoil kicks are also held here so they can
//! be cancelled or skipped when their vehicle is gone.

use glam::Vec3;

use super::physics::{BodyDesc, BodyHandle, BodyTag, CollisionEvent, PhysicsService};
use super::state::GameEvent;
use super::vehicle::Vehicle;
use crate::consts::*;

/// A shell in flight
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u32,
    pub body: BodyHandle,
    /// Vehicle id of the shooter
    pub owner: u32,
    pub spawned_ms: f64,
    armed: bool,
}

impl Projectile {
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

/// Forward counter-kick waiting to land after a shot
#[derive(Debug, Clone, Copy)]
struct PendingRecoil {
    body: BodyHandle,
    impulse: Vec3,
    due_ms: f64,
}

/// Owns every projectile and deferred recoil
#[derive(Debug, Clone, Default)]
pub struct Combat {
    projectiles: Vec<Projectile>,
    recoils: Vec<PendingRecoil>,
    next_id: u32,
}

impl Combat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn live_projectiles(&self) -> usize {
        self.projectiles.len()
    }

    pub fn pending_recoils(&self) -> usize {
        self.recoils.len()
    }

    /// Spawn a shell at the vehicle's muzzle, oriented with the turret, and
    /// launch it along the barrel. Returns the firing axis.
    pub fn fire_projectile(
        &mut self,
        physics: &mut impl PhysicsService,
        shooter: &Vehicle,
        now_ms: f64,
    ) -> Option<Vec3> {
        let (muzzle, axis) = shooter.muzzle(physics)?;
        let rotation = shooter.turret_rotation(physics)?;

        let desc = BodyDesc::dynamic(
            BodyTag::Projectile,
            PROJECTILE_RADIUS,
            PROJECTILE_MASS,
            muzzle,
        )
        .with_rotation(rotation);
        let body = physics.add_body(desc);
        physics.apply_impulse(body, axis * PROJECTILE_IMPULSE, muzzle);
        physics.set_contact_reporting(body, true);

        self.next_id += 1;
        self.projectiles.push(Projectile {
            id: self.next_id,
            body,
            owner: shooter.id,
            spawned_ms: now_ms,
            armed: true,
        });
        log::debug!("Vehicle {} fired projectile {}", shooter.id, self.next_id);

        Some(axis)
    }

    pub fn schedule_recoil_return(&mut self, body: BodyHandle, impulse: Vec3, due_ms: f64) {
        self.recoils.push(PendingRecoil {
            body,
            impulse,
            due_ms,
        });
    }

    /// Drop every deferred action that targets this body
    pub fn cancel_for(&mut self, body: BodyHandle) {
        self.recoils.retain(|r| r.body != body);
    }

    /// Resolve this step's contacts, expire stale shells, and land any
    /// counter-kicks that have come due
    pub fn update(
        &mut self,
        physics: &mut impl PhysicsService,
        now_ms: f64,
        vehicles: &mut [&mut Vehicle],
        events: &mut Vec<GameEvent>,
    ) {
        for contact in physics.drain_collisions() {
            self.on_collision(physics, contact, vehicles, events);
        }
        self.projectiles.retain(|p| p.armed);

        self.expire(physics, now_ms);
        self.land_recoils(physics, now_ms, vehicles);
    }

    /// One-shot contact handler. Returns true if it consumed a projectile.
    pub fn on_collision(
        &mut self,
        physics: &mut impl PhysicsService,
        contact: CollisionEvent,
        vehicles: &mut [&mut Vehicle],
        events: &mut Vec<GameEvent>,
    ) -> bool {
        let Some(projectile) = self
            .projectiles
            .iter_mut()
            .find(|p| p.armed && p.body == contact.body)
        else {
            return false;
        };

        projectile.armed = false;
        physics.set_contact_reporting(projectile.body, false);
        physics.set_linear_velocity(projectile.body, Vec3::ZERO);
        physics.set_angular_velocity(projectile.body, Vec3::ZERO);
        physics.remove_body(projectile.body);

        let struck_vehicle = physics.tag(contact.other).is_some_and(BodyTag::is_vehicle);
        if !struck_vehicle {
            return true;
        }

        // Damage lands regardless of remaining health; health may go negative
        if let Some(target) = vehicles.iter_mut().find(|v| v.body == contact.other) {
            target.health -= PROJECTILE_DAMAGE;
            log::debug!(
                "Projectile {} hit vehicle {} (health {})",
                projectile.id,
                target.id,
                target.health
            );
            events.push(GameEvent::VehicleHit {
                vehicle: target.id,
                health: target.health,
            });
        }
        true
    }

    fn expire(&mut self, physics: &mut impl PhysicsService, now_ms: f64) {
        self.projectiles.retain(|p| {
            let alive = now_ms - p.spawned_ms < PROJECTILE_LIFETIME_MS;
            if !alive {
                physics.remove_body(p.body);
            }
            alive
        });
    }

    fn land_recoils(
        &mut self,
        physics: &mut impl PhysicsService,
        now_ms: f64,
        vehicles: &[&mut Vehicle],
    ) {
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.recoils)
            .into_iter()
            .partition(|r| r.due_ms <= now_ms);
        self.recoils = waiting;

        for recoil in due {
            // The vehicle may have been destroyed or removed since it fired
            let owner_alive = vehicles
                .iter()
                .any(|v| v.body == recoil.body && v.is_alive());
            if !owner_alive {
                continue;
            }
            if let Some(position) = physics.position(recoil.body) {
                physics.apply_impulse(recoil.body, recoil.impulse, position);
            }
        }
    }
}
