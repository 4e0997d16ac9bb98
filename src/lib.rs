//! Tank Arena - A 3D arena tank combat game
//!
//! Core modules:
//! - `sim`: Deterministic combat simulation (vehicles, projectiles, AI, waves)
//! - `settings`: User preferences (audio, HUD)
//! - `platform`: Host page lookups and the DOM HUD
//! - `audio`: Procedural Web Audio effects (browser only)

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod platform;
pub mod settings;
pub mod sim;

pub use settings::Settings;

use glam::{EulerRot, Quat, Vec3};

/// Game configuration constants
///
/// The arena uses the host renderer's convention: +Y up, +Z forward, and a
/// positive yaw turns the forward axis toward +X.
pub mod consts {
    use glam::Vec3;

    /// Fixed simulation timestep (60 Hz, one tick per rendered frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Starting (and maximum) vehicle health
    pub const MAX_HEALTH: i32 = 100;

    /// Velocity added per drive command (local forward axis)
    pub const DRIVE_SPEED: f32 = 0.08;
    /// Drive commands are ignored at or above this linear speed
    pub const MAX_DRIVE_SPEED: f32 = 8.0;
    /// Angular velocity added per steer command
    pub const STEER_SPEED: f32 = 0.02;
    /// Steer commands are ignored at or above this angular speed
    pub const MAX_STEER_SPEED: f32 = 1.0;
    /// Brake impulse magnitude
    pub const BRAKE_FORCE: f32 = 2.0;
    /// Visual wheel steering limit (radians)
    pub const MAX_STEERING_ANGLE: f32 = std::f32::consts::FRAC_PI_4;
    /// Rear wheels steer at this fraction of the front wheels
    pub const REAR_STEER_FACTOR: f32 = 0.2;
    /// Turret yaw limit relative to the hull (radians)
    pub const TURRET_YAW_LIMIT: f32 = 1.2;
    /// Residual velocities below this are zeroed each tick
    pub const REST_EPSILON: f32 = 0.01;

    /// Hull physical properties
    pub const VEHICLE_MASS: f32 = 20.0;
    pub const VEHICLE_RADIUS: f32 = 1.5;
    pub const VEHICLE_LINEAR_DAMPING: f32 = 0.5;
    pub const VEHICLE_ANGULAR_DAMPING: f32 = 1.0;

    /// Wheel geometry (diameter 1.2)
    pub const WHEEL_RADIUS: f32 = 0.6;
    /// Visual gain applied to wheel roll
    pub const WHEEL_ROLL_GAIN: f32 = 10.0;

    /// Turret pivot in hull space
    pub const TURRET_MOUNT: Vec3 = Vec3::new(0.0, 0.3, 0.0);
    /// Muzzle point in turret space (gun center plus half the barrel)
    pub const MUZZLE_OFFSET: Vec3 = Vec3::new(0.0, 0.7, 3.2);

    /// Projectile properties
    pub const PROJECTILE_MASS: f32 = 1.0;
    pub const PROJECTILE_RADIUS: f32 = 0.2;
    pub const PROJECTILE_IMPULSE: f32 = 100.0;
    /// Projectiles that never hit anything are removed after this long
    pub const PROJECTILE_LIFETIME_MS: f64 = 3000.0;
    /// Health removed per projectile hit
    pub const PROJECTILE_DAMAGE: i32 = 5;

    /// Recoil impulse applied backward along the firing axis
    pub const RECOIL_IMPULSE: f32 = 20.0;
    /// Counter impulse applied forward after the recoil delay
    pub const RECOIL_RETURN_IMPULSE: f32 = 18.0;
    pub const RECOIL_RETURN_DELAY_MS: f64 = 100.0;

    /// Minimum time between player shots
    pub const PLAYER_FIRE_GAP_MS: f64 = 100.0;
    /// Enemy fire gaps are rolled uniformly from this range
    pub const ENEMY_FIRE_GAP_MIN_MS: f64 = 200.0;
    pub const ENEMY_FIRE_GAP_MAX_MS: f64 = 400.0;

    /// Enemy wander intent is resampled on this period
    pub const WANDER_PERIOD_MS: f64 = 5000.0;
    /// Chance that a wander mode also turns
    pub const WANDER_TURN_CHANCE: f64 = 0.2;
    /// Engagement radius is rolled uniformly from this range every tick
    pub const ENGAGE_RADIUS_MIN: f32 = 10.0;
    pub const ENGAGE_RADIUS_MAX: f32 = 30.0;

    /// Wave escalation saturates here
    pub const MAX_WAVE_SIZE: u32 = 4;
    /// Enemy spawn band
    pub const SPAWN_X_MIN: f32 = -25.0;
    pub const SPAWN_X_MAX: f32 = 25.0;
    pub const SPAWN_Z_MIN: f32 = 42.0;
    pub const SPAWN_Z_MAX: f32 = 47.0;
    pub const SPAWN_HEIGHT: f32 = 2.0;

    /// Player start position
    pub const PLAYER_START: Vec3 = Vec3::new(0.0, 2.0, 10.0);

    /// Player turret tracking interpolation step per tick
    pub const TURRET_LERP_STEP: f32 = 0.01;

    /// Enemy health bar width in pixels
    pub const HEALTH_BAR_WIDTH: f32 = 100.0;
    /// Delay between player death and the game-over panel
    pub const GAME_OVER_DELAY_MS: f64 = 2000.0;

    /// Gravity (m/s²)
    pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.8, 0.0);
}

/// Yaw (rotation about +Y) of an orientation
#[inline]
pub fn yaw_of(rotation: Quat) -> f32 {
    let (yaw, _, _) = rotation.to_euler(EulerRot::YXZ);
    yaw
}

/// Signed horizontal angle from the hull's forward axis to a target point.
///
/// The forward axis is derived from the hull yaw only, and the direction to
/// the target is flattened onto the ground plane. The sign follows the
/// vertical component of `forward × direction`. Returns `None` when the target
/// sits directly above or below `origin`.
pub fn signed_yaw_to(origin: Vec3, rotation: Quat, target: Vec3) -> Option<f32> {
    let forward = Quat::from_rotation_y(yaw_of(rotation)) * Vec3::Z;

    let mut direction = target - origin;
    direction.y = 0.0;
    let direction = direction.try_normalize()?;

    let mut angle = forward.dot(direction).clamp(-1.0, 1.0).acos();
    if forward.cross(direction).y < 0.0 {
        angle = -angle;
    }
    Some(angle)
}
