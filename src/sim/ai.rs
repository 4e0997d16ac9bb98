//! Enemy AI
//!
//! Two layers. A wander layer picks a coarse movement mode every
//! `WANDER_PERIOD_MS` of sim time. An engage layer runs every tick: if the
//! player is inside a freshly rolled engagement radius the enemy fires and
//! swings turret and hull toward the player. The radius is re-rolled each
//! tick on purpose, which makes engagement range jittery.

use glam::Vec3;
use rand::Rng;

use super::controller::Intent;
use super::physics::PhysicsService;
use super::vehicle::Vehicle;
use crate::consts::*;

/// Coarse movement modes of the wander layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WanderMode {
    ForwardLeft,
    ForwardRight,
    BackwardLeft,
    BackwardRight,
}

impl WanderMode {
    /// Pick a mode from a uniform roll in [0, 1)
    pub fn from_roll(roll: f64) -> Self {
        if roll < 0.25 {
            WanderMode::ForwardLeft
        } else if roll < 0.5 {
            WanderMode::ForwardRight
        } else if roll < 0.75 {
            WanderMode::BackwardLeft
        } else {
            WanderMode::BackwardRight
        }
    }

    /// Movement intent for this mode. `turning` decides whether the mode's
    /// turn direction is actually held.
    pub fn intent(self, turning: bool) -> Intent {
        let forward = matches!(self, WanderMode::ForwardLeft | WanderMode::ForwardRight);
        let left = matches!(self, WanderMode::ForwardLeft | WanderMode::BackwardLeft);
        Intent {
            forward,
            backward: !forward,
            turn_left: left && turning,
            turn_right: !left && turning,
            brake: false,
            fire: false,
        }
    }
}

/// Per-enemy decision state
#[derive(Debug, Clone)]
pub struct EnemyBrain {
    pub intent: Intent,
    /// Sim time since the last wander resample
    wander_elapsed_ms: f64,
}

impl Default for EnemyBrain {
    fn default() -> Self {
        Self::new()
    }
}

impl EnemyBrain {
    /// Fresh enemies roll forward while turning left until the first resample
    pub fn new() -> Self {
        Self {
            intent: Intent {
                forward: true,
                turn_left: true,
                ..Default::default()
            },
            wander_elapsed_ms: 0.0,
        }
    }

    /// Advance the wander timer. Returns true if the movement intent was
    /// resampled this call.
    pub fn advance_wander(&mut self, dt_ms: f64, rng: &mut impl Rng) -> bool {
        self.wander_elapsed_ms += dt_ms;
        if self.wander_elapsed_ms < WANDER_PERIOD_MS {
            return false;
        }
        self.wander_elapsed_ms -= WANDER_PERIOD_MS;
        self.resample(rng);
        true
    }

    /// Replace the movement part of the intent with a new wander mode
    pub fn resample(&mut self, rng: &mut impl Rng) {
        let mode = WanderMode::from_roll(rng.random::<f64>());
        let turning = rng.random_bool(WANDER_TURN_CHANCE);
        let fire = self.intent.fire;
        self.intent = Intent {
            fire,
            ..mode.intent(turning)
        };
    }

    /// Roll this tick's engagement radius
    pub fn roll_engage_radius(rng: &mut impl Rng) -> f32 {
        rng.random_range(ENGAGE_RADIUS_MIN..ENGAGE_RADIUS_MAX)
    }

    /// Engage the player if within `radius`. Sets the fire flag either way
    /// and returns whether the enemy engaged.
    pub fn engage(
        &mut self,
        vehicle: &mut Vehicle,
        physics: &mut impl PhysicsService,
        player_position: Vec3,
        radius: f32,
    ) -> bool {
        let Some(position) = physics.position(vehicle.body) else {
            self.intent.fire = false;
            return false;
        };

        if position.distance(player_position) < radius {
            self.intent.fire = true;
            vehicle.aim_turret_at(physics, player_position);
            vehicle.align_hull_at(physics, player_position);
            true
        } else {
            self.intent.fire = false;
            false
        }
    }
}
