//! Health/HUD bridge
//!
//! The HUD widgets belong to the host page. This module computes what they
//! should show and pushes it through [`HudSink`], including the delayed
//! game-over panel after the player dies.

use serde::{Deserialize, Serialize};

use crate::consts::{GAME_OVER_DELAY_MS, HEALTH_BAR_WIDTH, MAX_HEALTH};

/// Floating health bar geometry for an enemy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthBar {
    /// Filled width in pixels
    pub width: f32,
    /// Horizontal offset that keeps the fill left-aligned in the frame
    pub offset_x: f32,
}

impl HealthBar {
    pub fn for_health(health: i32) -> Self {
        let fraction = health.clamp(0, MAX_HEALTH) as f32 / MAX_HEALTH as f32;
        let width = HEALTH_BAR_WIDTH * fraction;
        Self {
            width,
            offset_x: -(HEALTH_BAR_WIDTH / 2.0 - width / 2.0),
        }
    }
}

/// Host-owned HUD widgets
pub trait HudSink {
    /// Player health bar fill, in percent
    fn set_player_health(&mut self, percent: f32);
    fn hide_player_health(&mut self);
    /// Show the terminal panel. Called at most once.
    fn show_game_over(&mut self, message: &str);
}

/// Message shown on the terminal panel
pub const GAME_OVER_MESSAGE: &str = "You Lose!";

/// Drives the HUD from observed player health
#[derive(Debug, Clone, Default)]
pub struct HudBridge {
    /// Time left before the game-over panel appears
    countdown_ms: Option<f64>,
    shown: bool,
}

impl HudBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reflect the player's health into the HUD.
    ///
    /// Call once per rendered frame with the frame time, including frames
    /// after the simulation has stopped, so the game-over delay can run out.
    pub fn update(&mut self, player_health: i32, frame_ms: f64, sink: &mut impl HudSink) {
        if self.shown {
            return;
        }

        if player_health >= 0 {
            sink.set_player_health(player_health as f32 / MAX_HEALTH as f32 * 100.0);
        }

        if player_health > 0 {
            return;
        }

        let remaining = self.countdown_ms.get_or_insert_with(|| {
            log::info!("Player destroyed, showing game over shortly");
            GAME_OVER_DELAY_MS
        });
        *remaining -= frame_ms;

        if *remaining <= 0.0 {
            sink.hide_player_health();
            sink.show_game_over(GAME_OVER_MESSAGE);
            self.shown = true;
        }
    }

    /// The terminal panel is up; nothing further will change
    pub fn finished(&self) -> bool {
        self.shown
    }
}
