//! Full-match scenarios driven through the public API.
//!
//! The physics service is wrapped in a recorder so tests can assert which
//! bodies were actuated, not just where they ended up.

use glam::{Quat, Vec3};
use tank_arena::consts::*;
use tank_arena::sim::{
    ArenaPhysics, BodyDesc, BodyHandle, BodyTag, CollisionEvent, Combat, EnemyBrain, GameEvent,
    GamePhase, GameState, Intent, PhysicsService, TickInput, Vehicle, VehicleKind, tick,
    tick_vehicle,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Call {
    Remove(BodyHandle),
    SetLinear(BodyHandle),
    SetAngular(BodyHandle),
    Impulse(BodyHandle, Vec3),
    Damping(BodyHandle),
}

impl Call {
    fn body(&self) -> BodyHandle {
        match *self {
            Call::Remove(b)
            | Call::SetLinear(b)
            | Call::SetAngular(b)
            | Call::Impulse(b, _)
            | Call::Damping(b) => b,
        }
    }
}

/// `ArenaPhysics` plus a log of every mutation
#[derive(Debug, Default)]
struct RecordingPhysics {
    inner: ArenaPhysics,
    calls: Vec<Call>,
}

impl RecordingPhysics {
    fn calls_for(&self, body: BodyHandle) -> Vec<Call> {
        self.calls
            .iter()
            .copied()
            .filter(|c| c.body() == body)
            .collect()
    }
}

impl PhysicsService for RecordingPhysics {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        self.inner.add_body(desc)
    }

    fn remove_body(&mut self, body: BodyHandle) {
        self.calls.push(Call::Remove(body));
        self.inner.remove_body(body);
    }

    fn contains(&self, body: BodyHandle) -> bool {
        self.inner.contains(body)
    }

    fn tag(&self, body: BodyHandle) -> Option<BodyTag> {
        self.inner.tag(body)
    }

    fn position(&self, body: BodyHandle) -> Option<Vec3> {
        self.inner.position(body)
    }

    fn rotation(&self, body: BodyHandle) -> Option<Quat> {
        self.inner.rotation(body)
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.inner.linear_velocity(body)
    }

    fn angular_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.inner.angular_velocity(body)
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        self.calls.push(Call::SetLinear(body));
        self.inner.set_linear_velocity(body, velocity);
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        self.calls.push(Call::SetAngular(body));
        self.inner.set_angular_velocity(body, velocity);
    }

    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec3, at_point: Vec3) {
        self.calls.push(Call::Impulse(body, impulse));
        self.inner.apply_impulse(body, impulse, at_point);
    }

    fn set_damping(&mut self, body: BodyHandle, linear: f32, angular: f32) {
        self.calls.push(Call::Damping(body));
        self.inner.set_damping(body, linear, angular);
    }

    fn set_contact_reporting(&mut self, body: BodyHandle, enabled: bool) {
        self.inner.set_contact_reporting(body, enabled);
    }

    fn step(&mut self, dt: f32) {
        self.inner.step(dt);
    }

    fn drain_collisions(&mut self) -> Vec<CollisionEvent> {
        self.inner.drain_collisions()
    }
}

fn new_game(seed: u64) -> GameState<RecordingPhysics> {
    GameState::with_physics(RecordingPhysics::default(), seed)
}

fn kill_all_enemies<P: PhysicsService>(state: &mut GameState<P>) {
    for slot in state.director.roster_mut() {
        slot.vehicle.health = 0;
    }
}

#[test]
fn disabled_vehicle_never_touches_physics() {
    let mut physics = RecordingPhysics::default();
    let mut combat = Combat::new();
    let mut events = Vec::new();
    let mut tank = Vehicle::spawn(
        &mut physics,
        7,
        VehicleKind::Enemy,
        Vec3::new(0.0, 1.5, 20.0),
        250.0,
    );
    physics.set_linear_velocity(tank.body, Vec3::new(0.005, 0.0, 0.0));
    physics.calls.clear();

    tank.health = 0;
    let everything = Intent {
        forward: true,
        backward: true,
        turn_left: true,
        turn_right: true,
        brake: true,
        fire: true,
    };
    for i in 0..30 {
        tick_vehicle(
            &mut tank,
            &everything,
            &mut physics,
            &mut combat,
            i as f64 * 16.0,
            &mut events,
        );
    }
    assert_eq!(tank.aim_turret_at(&physics, Vec3::ZERO), None);
    assert_eq!(tank.align_hull_at(&mut physics, Vec3::ZERO), None);

    assert!(physics.calls.is_empty(), "unexpected calls: {:?}", physics.calls);
    assert_eq!(combat.live_projectiles(), 0);
    assert!(events.is_empty());
}

#[test]
fn spawned_hull_gets_vehicle_damping() {
    let mut physics = RecordingPhysics::default();
    let tank = Vehicle::spawn(
        &mut physics,
        3,
        VehicleKind::Enemy,
        Vec3::new(0.0, 1.5, 20.0),
        250.0,
    );
    assert_eq!(physics.calls_for(tank.body), vec![Call::Damping(tank.body)]);

    // Coasting slows down without any further commands
    physics.set_linear_velocity(tank.body, Vec3::new(0.0, 0.0, 5.0));
    for _ in 0..30 {
        physics.step(SIM_DT);
    }
    let v = physics.linear_velocity(tank.body).unwrap();
    assert!(v.z < 5.0 && v.z > 0.0, "coasting speed was {}", v.z);
}

#[test]
fn enemy_inside_rolled_radius_engages() {
    let mut physics = RecordingPhysics::default();
    let mut enemy = Vehicle::spawn(
        &mut physics,
        1,
        VehicleKind::Enemy,
        Vec3::new(0.0, 1.5, 15.0),
        300.0,
    );
    let mut brain = EnemyBrain::new();
    // Player 15 units behind the enemy, radius 20
    let player = Vec3::new(0.0, 1.5, 0.0);

    assert!(brain.engage(&mut enemy, &mut physics, player, 20.0));
    assert!(brain.intent.fire);
    assert!(physics.calls_for(enemy.body).contains(&Call::SetAngular(enemy.body)));
    // Directly behind is past the turret's traverse
    assert_eq!(enemy.turret_yaw.abs(), TURRET_YAW_LIMIT);
}

#[test]
fn last_hit_removes_enemy_on_next_tick() {
    let mut state = new_game(2024);
    state.drain_events();

    let enemy_id = state.director.roster()[0].vehicle.id;
    let enemy_body = state.director.roster()[0].vehicle.body;
    state.director.roster_mut()[0].vehicle.health = PROJECTILE_DAMAGE;

    let fired = state
        .combat
        .fire_projectile(&mut state.physics, &state.player, state.time_ms);
    assert!(fired.is_some());
    let shell = state.combat.projectiles()[0].body;

    let contact = CollisionEvent {
        body: shell,
        other: enemy_body,
    };
    let mut events = Vec::new();
    {
        let mut vehicles: Vec<&mut Vehicle> = state.director.vehicles_mut().collect();
        assert!(
            state
                .combat
                .on_collision(&mut state.physics, contact, &mut vehicles, &mut events)
        );
        // A second report from the same shell is ignored
        assert!(
            !state
                .combat
                .on_collision(&mut state.physics, contact, &mut vehicles, &mut events)
        );
    }
    assert_eq!(
        events,
        vec![GameEvent::VehicleHit {
            vehicle: enemy_id,
            health: 0
        }]
    );
    assert!(!state.physics.contains(shell));

    // Disabled but still present until the director observes it
    assert!(state.find_vehicle(enemy_id).is_some());
    tick(&mut state, &TickInput::default(), SIM_DT);

    assert!(state.find_vehicle(enemy_id).is_none());
    assert!(!state.physics.contains(enemy_body));
    let drained = state.drain_events();
    assert!(drained.contains(&GameEvent::EnemyDestroyed { vehicle: enemy_id }));
    assert!(drained.contains(&GameEvent::WaveSpawned {
        wave: 2,
        enemies: 2
    }));
}

#[test]
fn waves_escalate_to_four_and_hold() {
    let mut state = new_game(11);
    let mut sizes = vec![state.enemy_count()];

    for _ in 0..4 {
        kill_all_enemies(&mut state);
        tick(&mut state, &TickInput::default(), SIM_DT);
        sizes.push(state.enemy_count());
    }
    assert_eq!(sizes, vec![1, 2, 3, 4, 4]);
    assert_eq!(state.director.wave_number, 5);

    for slot in state.director.roster() {
        let gap = slot.vehicle.fire_gap_ms;
        assert!((ENEMY_FIRE_GAP_MIN_MS..ENEMY_FIRE_GAP_MAX_MS).contains(&gap));
        let pos = state.physics.position(slot.vehicle.body).unwrap();
        assert!((SPAWN_X_MIN..SPAWN_X_MAX).contains(&pos.x));
    }
}

#[test]
fn destroyed_enemy_gets_no_recoil_return() {
    let mut state = new_game(5);
    let now = state.time_ms;
    {
        let slot = &mut state.director.roster_mut()[0];
        slot.vehicle
            .fire(&mut state.physics, &mut state.combat, now, &mut Vec::new());
    }
    let body = state.director.roster()[0].vehicle.body;
    assert_eq!(state.combat.pending_recoils(), 1);

    kill_all_enemies(&mut state);
    tick(&mut state, &TickInput::default(), SIM_DT);
    state.physics.calls.clear();

    // Well past the counter-kick delay
    for _ in 0..20 {
        tick(&mut state, &TickInput::default(), SIM_DT);
    }
    assert!(
        !state
            .physics
            .calls_for(body)
            .iter()
            .any(|c| matches!(c, Call::Impulse(..)))
    );
}

#[test]
fn player_death_is_terminal() {
    let mut state = new_game(8);
    state.player.health = 3;

    let shell_owner = state.director.roster()[0].vehicle.id;
    let shooter_body = state.director.roster()[0].vehicle.body;
    let now = state.time_ms;
    {
        let slot = &mut state.director.roster_mut()[0];
        slot.vehicle
            .fire(&mut state.physics, &mut state.combat, now, &mut Vec::new());
    }
    let shell = state
        .combat
        .projectiles()
        .iter()
        .find(|p| p.owner == shell_owner)
        .map(|p| p.body)
        .expect("enemy fired");

    let player_body = state.player.body;
    let mut vehicles = vec![&mut state.player];
    state.combat.on_collision(
        &mut state.physics,
        CollisionEvent {
            body: shell,
            other: player_body,
        },
        &mut vehicles,
        &mut Vec::new(),
    );
    assert_eq!(state.player.health, -2);

    tick(&mut state, &TickInput::default(), SIM_DT);
    assert_eq!(state.phase, GamePhase::GameOver);
    assert!(state.drain_events().contains(&GameEvent::PlayerDestroyed));

    let frozen = state.physics.position(shooter_body);
    for _ in 0..60 {
        tick(&mut state, &TickInput::default(), SIM_DT);
    }
    assert_eq!(state.physics.position(shooter_body), frozen);
}
