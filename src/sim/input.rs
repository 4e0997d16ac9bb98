//! Player input adapter
//!
//! Keyboard and pointer events become a persistent [`Intent`]. Pointer moves
//! are picked against the scene and fed to a [`TurretTracker`], which eases
//! the turret's aim point toward the latest target one tick at a time.

use glam::{Vec2, Vec3};

use super::arena::Arena;
use super::controller::Intent;
use crate::consts::TURRET_LERP_STEP;

/// Bound controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    Brake,
    Fire,
}

impl Control {
    /// Map a `KeyboardEvent.code` value to a control
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "KeyW" => Some(Control::Forward),
            "KeyS" => Some(Control::Backward),
            "KeyA" => Some(Control::TurnLeft),
            "KeyD" => Some(Control::TurnRight),
            "Space" => Some(Control::Brake),
            "KeyF" => Some(Control::Fire),
            _ => None,
        }
    }
}

/// Eases an aim point toward the most recent pointer target.
///
/// Each step raises the interpolation parameter by `TURRET_LERP_STEP` and
/// moves the current point that fraction of the remaining way. A new target
/// restarts the ease from wherever the current point is.
#[derive(Debug, Clone, Default)]
pub struct TurretTracker {
    current: Option<Vec3>,
    target: Option<Vec3>,
    t: f32,
}

impl TurretTracker {
    pub fn retarget(&mut self, target: Vec3) {
        if self.current.is_none() {
            self.current = Some(target);
        }
        self.target = Some(target);
        self.t = 0.0;
    }

    pub fn is_tracking(&self) -> bool {
        self.target.is_some()
    }

    /// Advance one tick. Returns the point to aim at, if tracking.
    pub fn advance(&mut self) -> Option<Vec3> {
        let target = self.target?;
        let current = self.current.unwrap_or(target);

        self.t += TURRET_LERP_STEP;
        let point = if self.t >= 1.0 {
            self.target = None;
            target
        } else {
            current.lerp(target, self.t)
        };
        self.current = Some(point);
        Some(point)
    }
}

/// Input for one simulation tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub intent: Intent,
    /// Where the player's turret should point this tick
    pub turret_target: Option<Vec3>,
}

/// Accumulates raw events between ticks
#[derive(Debug, Clone, Default)]
pub struct PlayerInput {
    intent: Intent,
    tracker: TurretTracker,
}

impl PlayerInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    fn set(&mut self, control: Control, held: bool) {
        match control {
            Control::Forward => self.intent.forward = held,
            Control::Backward => self.intent.backward = held,
            Control::TurnLeft => self.intent.turn_left = held,
            Control::TurnRight => self.intent.turn_right = held,
            Control::Brake => self.intent.brake = held,
            Control::Fire => self.intent.fire = held,
        }
    }

    /// Returns true if the key is bound
    pub fn key_down(&mut self, code: &str) -> bool {
        Control::from_code(code).map(|c| self.set(c, true)).is_some()
    }

    /// Returns true if the key is bound
    pub fn key_up(&mut self, code: &str) -> bool {
        Control::from_code(code).map(|c| self.set(c, false)).is_some()
    }

    pub fn pointer_down(&mut self) {
        self.intent.fire = true;
    }

    pub fn pointer_up(&mut self) {
        self.intent.fire = false;
    }

    /// Feed a pointer pick. A miss leaves tracking untouched.
    pub fn pointer_move(&mut self, pick: Option<Vec3>) {
        if let Some(point) = pick {
            self.tracker.retarget(point);
        }
    }

    /// Drop held controls (e.g. when the window loses focus)
    pub fn release_all(&mut self) {
        self.intent = Intent::default();
    }

    /// Produce the input for the next tick and advance turret easing
    pub fn sample(&mut self) -> TickInput {
        TickInput {
            intent: self.intent,
            turret_target: self.tracker.advance(),
        }
    }
}

/// Fixed arena camera, used to turn pointer positions into ground points
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view (radians)
    pub fov: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 35.0, -25.0),
            target: Vec3::new(0.0, 0.0, 18.0),
            fov: 0.8,
        }
    }
}

impl Camera {
    /// World-space ray through a pixel of a `viewport`-sized canvas
    pub fn ray(&self, pixel: Vec2, viewport: Vec2) -> Option<(Vec3, Vec3)> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        let ndc = Vec2::new(
            2.0 * pixel.x / viewport.x - 1.0,
            1.0 - 2.0 * pixel.y / viewport.y,
        );
        let aspect = viewport.x / viewport.y;
        let half_height = (self.fov / 2.0).tan();

        let forward = (self.target - self.position).try_normalize()?;
        let right = Vec3::Y.cross(forward).try_normalize()?;
        let up = forward.cross(right);

        let direction =
            forward + right * (ndc.x * half_height * aspect) + up * (ndc.y * half_height);
        Some((self.position, direction.normalize()))
    }

    /// Ground point under a pixel, or `None` if the ray misses the arena floor
    pub fn pick_ground(&self, pixel: Vec2, viewport: Vec2) -> Option<Vec3> {
        self.pick(pixel, viewport, &[])
    }

    /// First surface under a pixel: the nearest of `targets` and the arena
    /// floor. `None` if the ray hits nothing.
    pub fn pick(&self, pixel: Vec2, viewport: Vec2, targets: &[PickTarget]) -> Option<Vec3> {
        let (origin, direction) = self.ray(pixel, viewport)?;

        let floor = (direction.y < 0.0)
            .then(|| -origin.y / direction.y)
            .filter(|&t| Arena::over_ground(origin + direction * t));
        let nearest = targets
            .iter()
            .filter_map(|target| target.hit_distance(origin, direction))
            .chain(floor)
            .min_by(f32::total_cmp)?;
        Some(origin + direction * nearest)
    }
}

/// Scene geometry a pointer ray can land on besides the floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickTarget {
    Block { center: Vec3, half_extents: Vec3 },
    Hull { center: Vec3, radius: f32 },
}

impl PickTarget {
    /// Distance along a unit-length ray to the first surface hit
    pub fn hit_distance(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        match *self {
            PickTarget::Block {
                center,
                half_extents,
            } => {
                let inv = direction.recip();
                let a = (center - half_extents - origin) * inv;
                let b = (center + half_extents - origin) * inv;
                let enter = a.min(b).max_element();
                let exit = a.max(b).min_element();
                if exit < 0.0 || enter > exit {
                    return None;
                }
                Some(enter.max(0.0))
            }
            PickTarget::Hull { center, radius } => {
                let offset = origin - center;
                let b = offset.dot(direction);
                let c = offset.length_squared() - radius * radius;
                let disc = b * b - c;
                if disc < 0.0 {
                    return None;
                }
                let root = disc.sqrt();
                [-b - root, -b + root].into_iter().find(|&t| t >= 0.0)
            }
        }
    }
}
