//! Render snapshot
//!
//! Meshes and materials belong to the host renderer. Each frame the browser
//! entry point serializes one of these and hands it over; the renderer only
//! has to copy transforms onto its scene graph.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::hud::HealthBar;
use super::physics::PhysicsService;
use super::state::{GamePhase, GameState};
use super::vehicle::{Vehicle, VehicleKind, WheelVisual};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleFrame {
    pub id: u32,
    pub kind: VehicleKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub turret_yaw: f32,
    pub wheels: [WheelVisual; 4],
    pub health: i32,
    pub health_bar: Option<HealthBar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileFrame {
    pub id: u32,
    pub position: Vec3,
    pub rotation: Quat,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub wave: u32,
    pub vehicles: Vec<VehicleFrame>,
    pub projectiles: Vec<ProjectileFrame>,
}

fn vehicle_frame(vehicle: &Vehicle, physics: &impl PhysicsService) -> Option<VehicleFrame> {
    Some(VehicleFrame {
        id: vehicle.id,
        kind: vehicle.kind,
        position: physics.position(vehicle.body)?,
        rotation: physics.rotation(vehicle.body)?,
        turret_yaw: vehicle.turret_yaw,
        wheels: vehicle.wheels,
        health: vehicle.health,
        health_bar: vehicle.health_bar,
    })
}

impl<P: PhysicsService> GameState<P> {
    /// Capture the current frame. Bodies already gone from the physics world
    /// are left out.
    pub fn snapshot(&self) -> FrameSnapshot {
        let vehicles = std::iter::once(&self.player)
            .chain(self.director.roster().iter().map(|slot| &slot.vehicle))
            .filter_map(|v| vehicle_frame(v, &self.physics))
            .collect();

        let projectiles = self
            .combat
            .projectiles()
            .iter()
            .filter_map(|p| {
                Some(ProjectileFrame {
                    id: p.id,
                    position: self.physics.position(p.body)?,
                    rotation: self.physics.rotation(p.body)?,
                })
            })
            .collect();

        FrameSnapshot {
            tick: self.time_ticks,
            phase: self.phase,
            wave: self.director.wave_number,
            vehicles,
            projectiles,
        }
    }

    /// Snapshot as JSON, for the host renderer
    pub fn snapshot_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::controller::Intent;
    use crate::sim::input::TickInput;
    use crate::sim::tick::tick;

    #[test]
    fn test_snapshot_lists_player_first() {
        let state = GameState::new(12345);
        let frame = state.snapshot();
        assert_eq!(frame.tick, 0);
        assert_eq!(frame.wave, 1);
        assert_eq!(frame.phase, GamePhase::Playing);
        assert_eq!(frame.vehicles.len(), 2);
        assert_eq!(frame.vehicles[0].kind, VehicleKind::Player);
        assert_eq!(frame.vehicles[0].position, PLAYER_START);
        assert!(frame.vehicles[0].health_bar.is_none());
        assert_eq!(frame.vehicles[1].kind, VehicleKind::Enemy);
        assert_eq!(
            frame.vehicles[1].health_bar.map(|b| b.width),
            Some(HEALTH_BAR_WIDTH)
        );
        assert!(frame.projectiles.is_empty());
    }

    #[test]
    fn test_snapshot_includes_projectiles() {
        let mut state = GameState::new(12345);
        let input = TickInput {
            intent: Intent {
                fire: true,
                ..Default::default()
            },
            turret_target: None,
        };
        tick(&mut state, &input, SIM_DT);
        let frame = state.snapshot();
        assert!(!frame.projectiles.is_empty());
    }

    #[test]
    fn test_snapshot_json_shape() {
        let state = GameState::new(1);
        let json = state.snapshot_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["phase"], "Playing");
        assert_eq!(value["vehicles"][0]["kind"], "Player");
        // glam serializes vectors as arrays
        assert_eq!(value["vehicles"][0]["position"].as_array().map(|a| a.len()), Some(3));
        assert_eq!(value["vehicles"][0]["rotation"].as_array().map(|a| a.len()), Some(4));
    }
}
