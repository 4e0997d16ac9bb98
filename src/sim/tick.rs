//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use super::controller::tick_vehicle;
use super::input::TickInput;
use super::physics::PhysicsService;
use super::state::{GameEvent, GamePhase, GameState};
use super::vehicle::Vehicle;

/// Advance the game state by one fixed timestep.
///
/// Order within a tick: player controller, enemy AI and controllers (with
/// pruning), physics step, then contact resolution and deferred recoil.
pub fn tick<P: PhysicsService>(state: &mut GameState<P>, input: &TickInput, dt: f32) {
    if state.phase == GamePhase::GameOver {
        return;
    }

    state.time_ticks += 1;
    let dt_ms = dt as f64 * 1000.0;
    state.time_ms += dt_ms;
    let now_ms = state.time_ms;

    // Player
    if let Some(target) = input.turret_target {
        state.player.aim_turret_at(&state.physics, target);
    }
    tick_vehicle(
        &mut state.player,
        &input.intent,
        &mut state.physics,
        &mut state.combat,
        now_ms,
        &mut state.events,
    );

    // Enemies
    let player_position = state.player_position();
    state.director.update(
        &mut state.physics,
        &mut state.combat,
        &mut state.rng,
        player_position,
        now_ms,
        dt_ms,
        &mut state.events,
    );

    state.physics.step(dt);

    let mut vehicles: Vec<&mut Vehicle> = std::iter::once(&mut state.player)
        .chain(state.director.vehicles_mut())
        .collect();
    state
        .combat
        .update(&mut state.physics, now_ms, &mut vehicles, &mut state.events);

    if !state.player.is_alive() {
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::PlayerDestroyed);
        log::info!(
            "Player destroyed at wave {} after {} ticks",
            state.director.wave_number,
            state.time_ticks
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::controller::Intent;
    use glam::Vec3;

    #[test]
    fn test_tick_advances_clock() {
        let mut state = GameState::new(12345);
        tick(&mut state, &TickInput::default(), SIM_DT);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ticks, 2);
        assert!((state.time_ms - 2000.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_player_fire_spawns_projectile() {
        let mut state = GameState::new(12345);
        state.drain_events();
        let input = TickInput {
            intent: Intent {
                fire: true,
                ..Default::default()
            },
            turret_target: None,
        };
        tick(&mut state, &input, SIM_DT);

        assert!(
            state
                .drain_events()
                .contains(&GameEvent::ShotFired { vehicle: 0 })
        );
        assert!(state.combat.projectiles().iter().any(|p| p.owner == 0));
    }

    #[test]
    fn test_turret_target_swings_turret() {
        let mut state = GameState::new(5);
        let right = PLAYER_START + Vec3::new(20.0, 0.0, 0.0);
        let input = TickInput {
            intent: Intent::default(),
            turret_target: Some(right),
        };
        tick(&mut state, &input, SIM_DT);
        assert!(state.player.turret_yaw > 0.0);
    }

    #[test]
    fn test_player_death_ends_game() {
        let mut state = GameState::new(99);
        state.player.health = 0;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.drain_events().contains(&GameEvent::PlayerDestroyed));

        // No further advancement
        let ticks = state.time_ticks;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ticks, ticks);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_hit_enemy_removed_next_tick() {
        let mut state = GameState::new(3);
        let enemy = state.director.roster()[0].vehicle.id;
        state.director.roster_mut()[0].vehicle.health = 0;
        tick(&mut state, &TickInput::default(), SIM_DT);

        assert!(state.find_vehicle(enemy).is_none());
        assert_eq!(state.director.wave_number, 2);
        assert_eq!(state.enemy_count(), 2);
    }

    #[test]
    fn test_determinism() {
        let mut state1 = GameState::new(42);
        let mut state2 = GameState::new(42);
        let input = TickInput {
            intent: Intent {
                forward: true,
                turn_left: true,
                fire: true,
                ..Default::default()
            },
            turret_target: Some(Vec3::new(5.0, 0.0, 30.0)),
        };

        for _ in 0..600 {
            tick(&mut state1, &input, SIM_DT);
            tick(&mut state2, &input, SIM_DT);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.player.health, state2.player.health);
        assert_eq!(state1.player_position(), state2.player_position());
        assert_eq!(state1.enemy_count(), state2.enemy_count());
        assert_eq!(
            state1.combat.live_projectiles(),
            state2.combat.live_projectiles()
        );
        for (a, b) in state1
            .director
            .roster()
            .iter()
            .zip(state2.director.roster())
        {
            assert_eq!(
                state1.physics.position(a.vehicle.body),
                state2.physics.position(b.vehicle.body)
            );
        }
    }
}
