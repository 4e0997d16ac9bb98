//! Wave director
//!
//! Owns the enemy roster. Every tick it runs each enemy's AI and controller,
//! then compacts out the dead ones in a single pass. When a removal leaves
//! the roster empty the next, larger wave is spawned.

use glam::Vec3;
use rand::Rng;

use super::ai::EnemyBrain;
use super::combat::Combat;
use super::controller::tick_vehicle;
use super::physics::PhysicsService;
use super::state::GameEvent;
use super::vehicle::{Vehicle, VehicleKind};
use crate::consts::*;

/// Size of the wave that follows one of `current` enemies
pub fn escalate(current: u32) -> u32 {
    match current {
        1 => 2,
        2 => 3,
        _ => MAX_WAVE_SIZE,
    }
}

/// One live enemy and the brain driving it
#[derive(Debug, Clone)]
pub struct EnemySlot {
    pub vehicle: Vehicle,
    pub brain: EnemyBrain,
}

/// Roster and escalation state
#[derive(Debug, Clone)]
pub struct WaveDirector {
    roster: Vec<EnemySlot>,
    /// Enemies spawned in the current wave
    pub wave_size: u32,
    /// 1-based wave number
    pub wave_number: u32,
    next_id: u32,
}

impl Default for WaveDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveDirector {
    /// Vehicle ids handed out to enemies start here; 0 is the player
    pub const FIRST_ENEMY_ID: u32 = 1;

    pub fn new() -> Self {
        Self {
            roster: Vec::new(),
            wave_size: 0,
            wave_number: 0,
            next_id: Self::FIRST_ENEMY_ID,
        }
    }

    pub fn roster(&self) -> &[EnemySlot] {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut [EnemySlot] {
        &mut self.roster
    }

    pub fn vehicles_mut(&mut self) -> impl Iterator<Item = &mut Vehicle> {
        self.roster.iter_mut().map(|slot| &mut slot.vehicle)
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    /// Spawn the opening wave of a single enemy
    pub fn start(
        &mut self,
        physics: &mut impl PhysicsService,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) {
        self.spawn_wave(physics, rng, 1, events);
    }

    /// Add one enemy at a random point in the spawn band with a random fire gap
    pub fn spawn_enemy(&mut self, physics: &mut impl PhysicsService, rng: &mut impl Rng) -> u32 {
        let position = Vec3::new(
            rng.random_range(SPAWN_X_MIN..SPAWN_X_MAX),
            SPAWN_HEIGHT,
            rng.random_range(SPAWN_Z_MIN..SPAWN_Z_MAX),
        );
        let fire_gap_ms = rng.random_range(ENEMY_FIRE_GAP_MIN_MS..ENEMY_FIRE_GAP_MAX_MS);

        let id = self.next_id;
        self.next_id += 1;
        let vehicle = Vehicle::spawn(physics, id, VehicleKind::Enemy, position, fire_gap_ms);
        self.roster.push(EnemySlot {
            vehicle,
            brain: EnemyBrain::new(),
        });
        id
    }

    fn spawn_wave(
        &mut self,
        physics: &mut impl PhysicsService,
        rng: &mut impl Rng,
        count: u32,
        events: &mut Vec<GameEvent>,
    ) {
        for _ in 0..count {
            self.spawn_enemy(physics, rng);
        }
        self.wave_size = count;
        self.wave_number += 1;
        log::info!("Wave {} spawned with {} enemies", self.wave_number, count);
        events.push(GameEvent::WaveSpawned {
            wave: self.wave_number,
            enemies: count,
        });
    }

    /// Run every enemy for one tick, then prune the dead and refill
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        physics: &mut impl PhysicsService,
        combat: &mut Combat,
        rng: &mut impl Rng,
        player_position: Vec3,
        now_ms: f64,
        dt_ms: f64,
        events: &mut Vec<GameEvent>,
    ) {
        for slot in &mut self.roster {
            slot.brain.advance_wander(dt_ms, rng);
            let radius = EnemyBrain::roll_engage_radius(rng);
            slot.brain
                .engage(&mut slot.vehicle, physics, player_position, radius);

            tick_vehicle(
                &mut slot.vehicle,
                &slot.brain.intent,
                physics,
                combat,
                now_ms,
                events,
            );
        }

        self.prune(physics, combat, rng, events);
    }

    /// Remove destroyed enemies. Spawns the next wave if that empties the
    /// roster. Returns how many were removed.
    pub fn prune(
        &mut self,
        physics: &mut impl PhysicsService,
        combat: &mut Combat,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) -> usize {
        let (alive, dead): (Vec<_>, Vec<_>) = std::mem::take(&mut self.roster)
            .into_iter()
            .partition(|slot| slot.vehicle.is_alive());
        self.roster = alive;

        for slot in &dead {
            combat.cancel_for(slot.vehicle.body);
            slot.vehicle.dispose(physics);
            log::info!("Enemy {} destroyed", slot.vehicle.id);
            events.push(GameEvent::EnemyDestroyed {
                vehicle: slot.vehicle.id,
            });
        }

        if !dead.is_empty() && self.roster.is_empty() {
            let next = escalate(self.wave_size);
            self.spawn_wave(physics, rng, next, events);
        }
        dead.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::ArenaPhysics;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn director_with_wave(size: u32) -> (ArenaPhysics, WaveDirector, Pcg32) {
        let mut physics = ArenaPhysics::new();
        let mut rng = Pcg32::seed_from_u64(42);
        let mut director = WaveDirector::new();
        let mut events = Vec::new();
        director.spawn_wave(&mut physics, &mut rng, size, &mut events);
        (physics, director, rng)
    }

    #[test]
    fn test_escalation_table() {
        assert_eq!(escalate(1), 2);
        assert_eq!(escalate(2), 3);
        assert_eq!(escalate(3), 4);
        assert_eq!(escalate(4), 4);
    }

    #[test]
    fn test_start_spawns_single_enemy() {
        let mut physics = ArenaPhysics::new();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut director = WaveDirector::new();
        let mut events = Vec::new();
        director.start(&mut physics, &mut rng, &mut events);

        assert_eq!(director.roster().len(), 1);
        assert_eq!(director.wave_number, 1);
        assert_eq!(
            events,
            vec![GameEvent::WaveSpawned {
                wave: 1,
                enemies: 1
            }]
        );
    }

    #[test]
    fn test_spawn_band_and_fire_gap() {
        let (physics, director, _) = director_with_wave(4);
        for slot in director.roster() {
            let pos = physics.position(slot.vehicle.body).unwrap();
            assert!((SPAWN_X_MIN..SPAWN_X_MAX).contains(&pos.x));
            assert!((SPAWN_Z_MIN..SPAWN_Z_MAX).contains(&pos.z));
            assert!(
                (ENEMY_FIRE_GAP_MIN_MS..ENEMY_FIRE_GAP_MAX_MS).contains(&slot.vehicle.fire_gap_ms)
            );
            assert_eq!(slot.vehicle.kind, VehicleKind::Enemy);
        }
    }

    #[test]
    fn test_prune_removes_dead_and_disposes() {
        let (mut physics, mut director, mut rng) = director_with_wave(3);
        let mut combat = Combat::new();
        let mut events = Vec::new();

        let doomed = director.roster()[1].vehicle.body;
        director.roster_mut()[1].vehicle.health = 0;
        combat.schedule_recoil_return(doomed, Vec3::Z, 100.0);

        let removed = director.prune(&mut physics, &mut combat, &mut rng, &mut events);
        assert_eq!(removed, 1);
        assert_eq!(director.roster().len(), 2);
        assert!(!physics.contains(doomed));
        assert_eq!(combat.pending_recoils(), 0);
        assert_eq!(director.wave_number, 1);
    }

    #[test]
    fn test_adjacent_deaths_in_one_pass() {
        let (mut physics, mut director, mut rng) = director_with_wave(4);
        let mut combat = Combat::new();
        let mut events = Vec::new();
        let survivor = director.roster()[2].vehicle.id;

        for i in [0, 1, 3] {
            director.roster_mut()[i].vehicle.health = -5;
        }
        director.prune(&mut physics, &mut combat, &mut rng, &mut events);

        assert_eq!(director.roster().len(), 1);
        assert_eq!(director.roster()[0].vehicle.id, survivor);
    }

    #[test]
    fn test_emptied_roster_spawns_next_wave_once() {
        let (mut physics, mut director, mut rng) = director_with_wave(3);
        let mut combat = Combat::new();
        let mut events = Vec::new();

        for slot in director.roster_mut() {
            slot.vehicle.health = 0;
        }
        director.prune(&mut physics, &mut combat, &mut rng, &mut events);

        assert_eq!(director.roster().len(), 4);
        assert_eq!(director.wave_size, 4);
        let waves = events
            .iter()
            .filter(|e| matches!(e, GameEvent::WaveSpawned { .. }))
            .count();
        assert_eq!(waves, 1);

        let gaps: Vec<f64> = director
            .roster()
            .iter()
            .map(|s| s.vehicle.fire_gap_ms)
            .collect();
        assert!(gaps.iter().all(|g| (200.0..400.0).contains(g)));
        assert!(gaps.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_enemy_engages_nearby_player() {
        let (mut physics, mut director, mut rng) = director_with_wave(1);
        let mut combat = Combat::new();
        let mut events = Vec::new();

        // Park the player right on top of the enemy's engagement range
        let enemy_pos = physics.position(director.roster()[0].vehicle.body).unwrap();
        let player = enemy_pos + Vec3::new(0.0, 0.0, -5.0);
        director.update(
            &mut physics,
            &mut combat,
            &mut rng,
            player,
            0.0,
            1000.0 / 60.0,
            &mut events,
        );

        assert!(director.roster()[0].brain.intent.fire);
        assert_eq!(combat.live_projectiles(), 1);
    }

    proptest! {
        #[test]
        fn prop_escalation_saturates(current in 0u32..100) {
            let next = escalate(current);
            prop_assert!((2..=MAX_WAVE_SIZE).contains(&next));
            if current >= 3 {
                prop_assert_eq!(next, MAX_WAVE_SIZE);
            } else if current >= 1 {
                prop_assert_eq!(next, current + 1);
            }
        }
    }
}
