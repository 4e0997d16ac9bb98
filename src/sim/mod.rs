//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (player first, then roster order)
//! - No rendering or platform dependencies; physics behind [`PhysicsService`]

pub mod ai;
pub mod arena;
pub mod combat;
pub mod controller;
pub mod hud;
pub mod input;
pub mod physics;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod vehicle;
pub mod waves;

pub use ai::{EnemyBrain, WanderMode};
pub use arena::Arena;
pub use combat::{Combat, Projectile};
pub use controller::{Intent, fire_ready, tick_vehicle};
pub use hud::{GAME_OVER_MESSAGE, HealthBar, HudBridge, HudSink};
pub use input::{Camera, Control, PickTarget, PlayerInput, TickInput, TurretTracker};
pub use physics::{
    ArenaPhysics, BodyDesc, BodyHandle, BodyTag, CollisionEvent, PhysicsService, Shape,
};
pub use snapshot::{FrameSnapshot, ProjectileFrame, VehicleFrame};
pub use state::{GameEvent, GamePhase, GameState, PLAYER_ID};
pub use tick::tick;
pub use vehicle::{Vehicle, VehicleKind, WheelVisual};
pub use waves::{EnemySlot, WaveDirector, escalate};
