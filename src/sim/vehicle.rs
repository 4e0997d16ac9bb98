//! Vehicle model and actuator
//!
//! A vehicle is a physical hull with a kinematic turret and four purely visual
//! wheels. Every actuation method starts with the same guard: once health has
//! dropped to zero or below the vehicle is disabled and nothing it does
//! touches the physics service again.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::combat::Combat;
use super::hud::HealthBar;
use super::physics::{BodyDesc, BodyHandle, BodyTag, PhysicsService};
use super::state::GameEvent;
use crate::consts::*;
use crate::signed_yaw_to;

/// Which side a vehicle fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleKind {
    Player,
    Enemy,
}

impl VehicleKind {
    pub fn tag(self) -> BodyTag {
        match self {
            VehicleKind::Player => BodyTag::Player,
            VehicleKind::Enemy => BodyTag::Enemy,
        }
    }
}

/// Visual state of one wheel
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelVisual {
    /// Accumulated roll about the axle (radians)
    pub roll: f32,
    /// Steering yaw (radians)
    pub yaw: f32,
}

/// A tank: hull body, turret, wheels, health and weapon timing
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: u32,
    pub kind: VehicleKind,
    pub body: BodyHandle,
    /// Starts at 100. May go negative; anything `<= 0` is dead.
    pub health: i32,
    /// Sign of the last drive command (+1 forward, -1 backward)
    pub direction: f32,
    /// Visual steering accumulator, bounded by `MAX_STEERING_ANGLE`
    pub steering_angle: f32,
    /// Turret yaw relative to the hull
    pub turret_yaw: f32,
    pub wheels: [WheelVisual; 4],
    /// Sim time of the last shot, if any
    pub last_fire_ms: Option<f64>,
    pub fire_gap_ms: f64,
    /// Hull position at the end of the previous tick
    pub previous_position: Vec3,
    /// Floating health bar (enemies only)
    pub health_bar: Option<HealthBar>,
}

impl Vehicle {
    /// Create the hull body and the vehicle that drives it
    pub fn spawn(
        physics: &mut impl PhysicsService,
        id: u32,
        kind: VehicleKind,
        position: Vec3,
        fire_gap_ms: f64,
    ) -> Self {
        let desc = BodyDesc::dynamic(kind.tag(), VEHICLE_RADIUS, VEHICLE_MASS, position);
        let body = physics.add_body(desc);
        physics.set_damping(body, VEHICLE_LINEAR_DAMPING, VEHICLE_ANGULAR_DAMPING);

        let health_bar = match kind {
            VehicleKind::Player => None,
            VehicleKind::Enemy => Some(HealthBar::for_health(MAX_HEALTH)),
        };

        Self {
            id,
            kind,
            body,
            health: MAX_HEALTH,
            direction: 1.0,
            steering_angle: 0.0,
            turret_yaw: 0.0,
            wheels: [WheelVisual::default(); 4],
            last_fire_ms: None,
            fire_gap_ms,
            previous_position: position,
            health_bar,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Remove the hull from the physics world
    pub fn dispose(&self, physics: &mut impl PhysicsService) {
        physics.remove_body(self.body);
    }

    /// Push along the hull's forward axis (`sign` +1 forward, -1 backward).
    /// Ignored once the hull is at the speed cap.
    pub fn drive(&mut self, physics: &mut impl PhysicsService, sign: f32) {
        if !self.is_alive() {
            return;
        }
        let (Some(velocity), Some(rotation)) = (
            physics.linear_velocity(self.body),
            physics.rotation(self.body),
        ) else {
            return;
        };
        if velocity.length() >= MAX_DRIVE_SPEED {
            return;
        }

        let push = rotation * (Vec3::Z * sign * DRIVE_SPEED);
        physics.set_linear_velocity(self.body, velocity + push);
    }

    /// Turn the hull (`turn` +1 right, -1 left).
    ///
    /// The physical turn is mirrored while reversing so the hull swings the
    /// way the wheels point. The visual steering angle always advances.
    pub fn steer(&mut self, physics: &mut impl PhysicsService, turn: f32) {
        if !self.is_alive() {
            return;
        }

        if let (Some(spin), Some(rotation)) = (
            physics.angular_velocity(self.body),
            physics.rotation(self.body),
        ) {
            if spin.length() < MAX_STEER_SPEED {
                let torque = rotation * (Vec3::Y * turn * self.direction * STEER_SPEED);
                physics.set_angular_velocity(self.body, spin + torque);
            }
        }

        self.steering_angle = (self.steering_angle + turn.signum() * STEER_SPEED)
            .clamp(-MAX_STEERING_ANGLE, MAX_STEERING_ANGLE);
        self.apply_wheel_steering();
    }

    /// Relax the visual steering angle back toward zero
    pub fn center_steering(&mut self) {
        if !self.is_alive() {
            return;
        }
        if self.steering_angle > 0.0 {
            self.steering_angle = (self.steering_angle - STEER_SPEED).max(0.0);
        } else if self.steering_angle < 0.0 {
            self.steering_angle = (self.steering_angle + STEER_SPEED).min(0.0);
        }
        self.apply_wheel_steering();
    }

    fn apply_wheel_steering(&mut self) {
        self.wheels[0].yaw = self.steering_angle;
        self.wheels[1].yaw = self.steering_angle;
        self.wheels[2].yaw = self.steering_angle * REAR_STEER_FACTOR;
        self.wheels[3].yaw = self.steering_angle * REAR_STEER_FACTOR;
    }

    /// Impulse against the current direction of travel
    pub fn brake(&mut self, physics: &mut impl PhysicsService) {
        if !self.is_alive() {
            return;
        }
        let (Some(velocity), Some(position)) = (
            physics.linear_velocity(self.body),
            physics.position(self.body),
        ) else {
            return;
        };
        let Some(against) = (-velocity).try_normalize() else {
            return;
        };
        physics.apply_impulse(self.body, against * BRAKE_FORCE, position);
    }

    /// Point the turret at `target`, clamped to the turret's traverse.
    ///
    /// Returns the yaw that was set, or `None` if nothing changed.
    pub fn aim_turret_at(&mut self, physics: &impl PhysicsService, target: Vec3) -> Option<f32> {
        if !self.is_alive() {
            return None;
        }
        let position = physics.position(self.body)?;
        let rotation = physics.rotation(self.body)?;
        let angle = signed_yaw_to(position, rotation, target)?;

        self.turret_yaw = angle.clamp(-TURRET_YAW_LIMIT, TURRET_YAW_LIMIT);
        Some(self.turret_yaw)
    }

    /// Spin the hull toward `target` at a rate proportional to the angle off
    pub fn align_hull_at(&mut self, physics: &mut impl PhysicsService, target: Vec3) -> Option<f32> {
        if !self.is_alive() {
            return None;
        }
        let position = physics.position(self.body)?;
        let rotation = physics.rotation(self.body)?;
        let angle = signed_yaw_to(position, rotation, target)?;

        physics.set_angular_velocity(self.body, Vec3::new(0.0, angle, 0.0));
        Some(angle)
    }

    /// World-space turret orientation
    pub fn turret_rotation(&self, physics: &impl PhysicsService) -> Option<Quat> {
        let hull = physics.rotation(self.body)?;
        Some(hull * Quat::from_rotation_y(self.turret_yaw))
    }

    /// World-space muzzle point and firing axis
    pub fn muzzle(&self, physics: &impl PhysicsService) -> Option<(Vec3, Vec3)> {
        let position = physics.position(self.body)?;
        let hull = physics.rotation(self.body)?;
        let turret = Quat::from_rotation_y(self.turret_yaw);

        let point = position + hull * (TURRET_MOUNT + turret * MUZZLE_OFFSET);
        let axis = hull * turret * Vec3::Z;
        Some((point, axis))
    }

    /// Launch a projectile and kick the hull back.
    ///
    /// The forward counter-kick is deferred and only lands if this vehicle is
    /// still alive when it comes due.
    pub fn fire(
        &mut self,
        physics: &mut impl PhysicsService,
        combat: &mut Combat,
        now_ms: f64,
        events: &mut Vec<GameEvent>,
    ) {
        if !self.is_alive() {
            return;
        }
        let Some(axis) = combat.fire_projectile(physics, self, now_ms) else {
            return;
        };
        let Some(position) = physics.position(self.body) else {
            return;
        };

        physics.apply_impulse(self.body, axis * -RECOIL_IMPULSE, position);
        combat.schedule_recoil_return(
            self.body,
            axis * RECOIL_RETURN_IMPULSE,
            now_ms + RECOIL_RETURN_DELAY_MS,
        );
        events.push(GameEvent::ShotFired { vehicle: self.id });
    }

    /// Kill residual drift below `REST_EPSILON`
    pub fn settle(&mut self, physics: &mut impl PhysicsService) {
        if !self.is_alive() {
            return;
        }
        if let Some(v) = physics.linear_velocity(self.body) {
            if v != Vec3::ZERO && v.length() < REST_EPSILON {
                physics.set_linear_velocity(self.body, Vec3::ZERO);
            }
        }
        if let Some(w) = physics.angular_velocity(self.body) {
            if w != Vec3::ZERO && w.length() < REST_EPSILON {
                physics.set_angular_velocity(self.body, Vec3::ZERO);
            }
        }
    }

    /// Roll the wheels by the distance covered since the last call and
    /// refresh the floating health bar
    pub fn update_visuals(&mut self, physics: &impl PhysicsService) {
        if !self.is_alive() {
            return;
        }
        let Some(position) = physics.position(self.body) else {
            return;
        };

        let distance = position.distance(self.previous_position);
        let circumference = WHEEL_RADIUS * std::f32::consts::TAU;
        let roll = distance / circumference * self.direction * WHEEL_ROLL_GAIN;
        for wheel in &mut self.wheels {
            wheel.roll += roll;
        }
        self.previous_position = position;

        if self.health_bar.is_some() {
            self.health_bar = Some(HealthBar::for_health(self.health));
        }
    }
}
