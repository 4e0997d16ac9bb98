//! Per-vehicle controller
//!
//! Turns an [`Intent`] into actuator calls once per tick, and gates firing on
//! the vehicle's fire gap.

use serde::{Deserialize, Serialize};

use super::combat::Combat;
use super::physics::PhysicsService;
use super::state::GameEvent;
use super::vehicle::Vehicle;

/// The six commands a vehicle can receive in one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub forward: bool,
    pub backward: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub brake: bool,
    pub fire: bool,
}

/// Whether enough time has passed since the last shot
pub fn fire_ready(last_fire_ms: Option<f64>, fire_gap_ms: f64, now_ms: f64) -> bool {
    match last_fire_ms {
        Some(last) => now_ms - last > fire_gap_ms,
        None => true,
    }
}

/// Apply one tick of intent to a vehicle
pub fn tick_vehicle(
    vehicle: &mut Vehicle,
    intent: &Intent,
    physics: &mut impl PhysicsService,
    combat: &mut Combat,
    now_ms: f64,
    events: &mut Vec<GameEvent>,
) {
    if !vehicle.is_alive() {
        return;
    }

    vehicle.settle(physics);

    if intent.forward {
        vehicle.direction = 1.0;
        vehicle.drive(physics, 1.0);
    }
    if intent.backward {
        vehicle.direction = -1.0;
        vehicle.drive(physics, -1.0);
    }

    if intent.turn_right {
        vehicle.steer(physics, 1.0);
    }
    if intent.turn_left {
        vehicle.steer(physics, -1.0);
    }
    if !intent.turn_left && !intent.turn_right {
        vehicle.center_steering();
    }

    if intent.brake {
        vehicle.brake(physics);
    }

    if intent.fire && fire_ready(vehicle.last_fire_ms, vehicle.fire_gap_ms, now_ms) {
        vehicle.last_fire_ms = Some(now_ms);
        vehicle.fire(physics, combat, now_ms, events);
    }

    vehicle.update_visuals(physics);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::physics::ArenaPhysics;
    use crate::sim::vehicle::VehicleKind;
    use glam::Vec3;

    fn setup(fire_gap_ms: f64) -> (ArenaPhysics, Vehicle, Combat) {
        let mut physics = ArenaPhysics::new();
        let vehicle = Vehicle::spawn(
            &mut physics,
            0,
            VehicleKind::Player,
            Vec3::new(0.0, 1.5, 0.0),
            fire_gap_ms,
        );
        (physics, vehicle, Combat::new())
    }

    #[test]
    fn test_fire_gating_one_shot_per_gap() {
        let (mut physics, mut tank, mut combat) = setup(PLAYER_FIRE_GAP_MS);
        let mut events = Vec::new();
        let intent = Intent {
            fire: true,
            ..Default::default()
        };

        // 60 ticks at 60 Hz: one second of held trigger
        for i in 0..60 {
            let now = i as f64 * 1000.0 / 60.0;
            tick_vehicle(&mut tank, &intent, &mut physics, &mut combat, now, &mut events);
        }

        let shots = events
            .iter()
            .filter(|e| matches!(e, GameEvent::ShotFired { .. }))
            .count();
        // Shots at 0, 116.7, 233.3, ... strictly more than 100 ms apart
        assert_eq!(shots, 9);
        assert_eq!(combat.live_projectiles(), 9);
    }

    #[test]
    fn test_fire_ready_is_strict() {
        assert!(fire_ready(None, 100.0, 0.0));
        assert!(!fire_ready(Some(0.0), 100.0, 100.0));
        assert!(fire_ready(Some(0.0), 100.0, 100.5));
    }

    #[test]
    fn test_direction_sign_follows_last_drive() {
        let (mut physics, mut tank, mut combat) = setup(100.0);
        let mut events = Vec::new();
        let back = Intent {
            backward: true,
            ..Default::default()
        };
        tick_vehicle(&mut tank, &back, &mut physics, &mut combat, 0.0, &mut events);
        assert_eq!(tank.direction, -1.0);

        // Neutral ticks keep the last sign
        tick_vehicle(&mut tank, &Intent::default(), &mut physics, &mut combat, 16.0, &mut events);
        assert_eq!(tank.direction, -1.0);
    }

    #[test]
    fn test_firing_kicks_hull_backward() {
        let (mut physics, mut tank, mut combat) = setup(100.0);
        let mut events = Vec::new();
        let intent = Intent {
            fire: true,
            ..Default::default()
        };
        tick_vehicle(&mut tank, &intent, &mut physics, &mut combat, 0.0, &mut events);

        let v = physics.linear_velocity(tank.body).unwrap();
        assert!((v.z + RECOIL_IMPULSE / VEHICLE_MASS).abs() < 1e-5);
        assert_eq!(combat.pending_recoils(), 1);
    }

    #[test]
    fn test_residual_velocity_zeroed() {
        let (mut physics, mut tank, mut combat) = setup(100.0);
        let mut events = Vec::new();
        physics.set_linear_velocity(tank.body, Vec3::new(0.005, 0.0, 0.0));
        physics.set_angular_velocity(tank.body, Vec3::new(0.0, 0.004, 0.0));
        tick_vehicle(&mut tank, &Intent::default(), &mut physics, &mut combat, 0.0, &mut events);
        assert_eq!(physics.linear_velocity(tank.body), Some(Vec3::ZERO));
        assert_eq!(physics.angular_velocity(tank.body), Some(Vec3::ZERO));
    }

    #[test]
    fn test_dead_vehicle_ignores_intent() {
        let (mut physics, mut tank, mut combat) = setup(100.0);
        let mut events = Vec::new();
        tank.health = -5;
        let everything = Intent {
            forward: true,
            backward: false,
            turn_left: true,
            turn_right: false,
            brake: true,
            fire: true,
        };
        tick_vehicle(&mut tank, &everything, &mut physics, &mut combat, 500.0, &mut events);
        assert_eq!(physics.linear_velocity(tank.body), Some(Vec3::ZERO));
        assert_eq!(tank.last_fire_ms, None);
        assert!(events.is_empty());
    }
}
