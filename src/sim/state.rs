//! Game state and core simulation types
//!
//! Everything the tick function reads or writes lives in [`GameState`]. The
//! physics service is a type parameter so tests can wrap the rapier backend
//! and observe what the simulation asks of it.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::{Arena, BLOCK_SIZE};
use super::combat::Combat;
use super::input::PickTarget;
use super::physics::{ArenaPhysics, PhysicsService};
use super::vehicle::{Vehicle, VehicleKind};
use super::waves::WaveDirector;
use crate::consts::*;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Player destroyed; the simulation no longer advances
    GameOver,
}

/// Things that happened during a tick, for audio and logging on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    ShotFired { vehicle: u32 },
    VehicleHit { vehicle: u32, health: i32 },
    EnemyDestroyed { vehicle: u32 },
    WaveSpawned { wave: u32, enemies: u32 },
    PlayerDestroyed,
}

/// Vehicle id reserved for the player
pub const PLAYER_ID: u32 = 0;

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState<P: PhysicsService = ArenaPhysics> {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub physics: P,
    pub arena: Arena,
    pub player: Vehicle,
    pub director: WaveDirector,
    pub combat: Combat,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulated milliseconds since start
    pub time_ms: f64,
    /// Pending events, drained by the host
    pub(crate) events: Vec<GameEvent>,
}

impl GameState<ArenaPhysics> {
    /// New game on the built-in physics backend
    pub fn new(seed: u64) -> Self {
        Self::with_physics(ArenaPhysics::new(), seed)
    }
}

impl<P: PhysicsService> GameState<P> {
    /// New game on the given physics service: arena, player, first wave
    pub fn with_physics(mut physics: P, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut events = Vec::new();

        let arena = Arena::build(&mut physics);
        let player = Vehicle::spawn(
            &mut physics,
            PLAYER_ID,
            VehicleKind::Player,
            PLAYER_START,
            PLAYER_FIRE_GAP_MS,
        );
        let mut director = WaveDirector::new();
        director.start(&mut physics, &mut rng, &mut events);

        log::info!("Game initialized with seed {seed}");

        Self {
            seed,
            rng,
            physics,
            arena,
            player,
            director,
            combat: Combat::new(),
            phase: GamePhase::Playing,
            time_ticks: 0,
            time_ms: 0.0,
            events,
        }
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Player hull position (last known if the body is gone)
    pub fn player_position(&self) -> glam::Vec3 {
        self.physics
            .position(self.player.body)
            .unwrap_or(self.player.previous_position)
    }

    pub fn enemy_count(&self) -> usize {
        self.director.roster().len()
    }

    pub fn find_vehicle(&self, id: u32) -> Option<&Vehicle> {
        if id == PLAYER_ID {
            return Some(&self.player);
        }
        self.director
            .roster()
            .iter()
            .map(|slot| &slot.vehicle)
            .find(|v| v.id == id)
    }

    /// Obstacle blocks and live enemy hulls, for pointer picking. The
    /// player's own hull is left out so the camera never aims it at itself.
    pub fn pick_targets(&self) -> Vec<PickTarget> {
        let blocks = self.arena.obstacles.iter().filter_map(|&body| {
            let center = self.physics.position(body)?;
            Some(PickTarget::Block {
                center,
                half_extents: glam::Vec3::splat(BLOCK_SIZE / 2.0),
            })
        });
        let hulls = self
            .director
            .roster()
            .iter()
            .filter(|slot| slot.vehicle.is_alive())
            .filter_map(|slot| {
                let center = self.physics.position(slot.vehicle.body)?;
                Some(PickTarget::Hull {
                    center,
                    radius: VEHICLE_RADIUS,
                })
            });
        blocks.chain(hulls).collect()
    }
}
