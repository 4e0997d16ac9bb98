//! Static arena geometry
//!
//! The arena is a walled rectangle of 2-unit blocks with a few rows of cover
//! in the middle. Everything here is a static body; projectiles that hit it
//! are simply disposed.

use glam::Vec3;

use super::physics::{BodyDesc, BodyHandle, BodyTag, PhysicsService, Shape};

/// Edge length of one obstacle block
pub const BLOCK_SIZE: f32 = 2.0;
/// Spacing between consecutive blocks in a row
pub const BLOCK_SPACING: f32 = 2.5;

/// Ground extents (x, z)
pub const GROUND_MIN: (f32, f32) = (-100.0, -70.0);
pub const GROUND_MAX: (f32, f32) = (100.0, 120.0);

/// A straight run of obstacle blocks
#[derive(Debug, Clone, Copy)]
pub struct ObstacleRow {
    pub count: u32,
    pub start: Vec3,
    pub spacing: f32,
    pub direction: Vec3,
}

impl ObstacleRow {
    const fn new(count: u32, start: Vec3, spacing: f32, direction: Vec3) -> Self {
        Self {
            count,
            start,
            spacing,
            direction,
        }
    }

    /// Block centers along this row. Blocks sit on the ground.
    pub fn block_centers(&self) -> impl Iterator<Item = Vec3> + '_ {
        (0..self.count).map(move |i| {
            let along = self.direction * (self.spacing * i as f32);
            self.start + along + Vec3::new(0.0, BLOCK_SIZE / 2.0, 0.0)
        })
    }
}

/// The fixed arena layout
pub const ARENA_ROWS: [ObstacleRow; 11] = [
    // Left wall and its second course
    ObstacleRow::new(21, Vec3::new(-30.0, 0.0, BLOCK_SPACING), BLOCK_SPACING, Vec3::Z),
    ObstacleRow::new(6, Vec3::new(-30.0, BLOCK_SIZE, 0.0), BLOCK_SPACING, Vec3::Z),
    // Right wall and its second course
    ObstacleRow::new(21, Vec3::new(30.0, 0.0, BLOCK_SPACING), BLOCK_SPACING, Vec3::Z),
    ObstacleRow::new(8, Vec3::new(30.0, BLOCK_SIZE, BLOCK_SPACING * 2.0), BLOCK_SPACING, Vec3::Z),
    // Far wall and its second course
    ObstacleRow::new(25, Vec3::new(-30.0, 0.0, 21.0 * BLOCK_SPACING), BLOCK_SPACING, Vec3::X),
    ObstacleRow::new(10, Vec3::new(-30.0, BLOCK_SIZE, 21.0 * BLOCK_SPACING), BLOCK_SPACING, Vec3::X),
    // Near wall
    ObstacleRow::new(25, Vec3::new(-30.0, 0.0, 0.0), BLOCK_SPACING, Vec3::X),
    // Center cover: two diagonals and two short rows
    ObstacleRow::new(5, Vec3::new(-20.0, 0.0, 20.0), BLOCK_SPACING * 2.0, Vec3::new(1.0, 0.0, 1.0)),
    ObstacleRow::new(5, Vec3::new(0.0, 0.0, 40.0), BLOCK_SPACING * 2.0, Vec3::new(1.0, 0.0, -1.0)),
    ObstacleRow::new(2, Vec3::new(8.0, 0.0, 20.0), BLOCK_SPACING, Vec3::X),
    ObstacleRow::new(2, Vec3::new(-8.0, 0.0, 20.0), BLOCK_SPACING, Vec3::X),
];

/// Handles of the static arena bodies
#[derive(Debug, Clone)]
pub struct Arena {
    pub ground: BodyHandle,
    pub obstacles: Vec<BodyHandle>,
}

impl Arena {
    /// Register the ground and every obstacle block with the physics service
    pub fn build(physics: &mut impl PhysicsService) -> Self {
        let ground = physics.add_body(BodyDesc::fixed(
            BodyTag::Ground,
            Shape::Ground { height: 0.0 },
            Vec3::ZERO,
        ));

        let half = Vec3::splat(BLOCK_SIZE / 2.0);
        let obstacles: Vec<BodyHandle> = ARENA_ROWS
            .iter()
            .flat_map(|row| row.block_centers().collect::<Vec<_>>())
            .map(|center| {
                physics.add_body(BodyDesc::fixed(
                    BodyTag::Obstacle,
                    Shape::Cuboid { half_extents: half },
                    center,
                ))
            })
            .collect();

        log::debug!("Arena built with {} obstacle blocks", obstacles.len());
        Self { ground, obstacles }
    }

    /// Whether a point lies over the ground area
    pub fn over_ground(point: Vec3) -> bool {
        (GROUND_MIN.0..=GROUND_MAX.0).contains(&point.x)
            && (GROUND_MIN.1..=GROUND_MAX.1).contains(&point.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::ArenaPhysics;

    #[test]
    fn test_block_count() {
        let expected: u32 = ARENA_ROWS.iter().map(|r| r.count).sum();
        let mut physics = ArenaPhysics::new();
        let arena = Arena::build(&mut physics);
        assert_eq!(arena.obstacles.len() as u32, expected);
        assert_eq!(physics.body_count() as u32, expected + 1);
    }

    #[test]
    fn test_blocks_sit_on_ground() {
        let row = ARENA_ROWS[6];
        let first = row.block_centers().next().unwrap();
        assert_eq!(first, Vec3::new(-30.0, 1.0, 0.0));

        let second_course = ARENA_ROWS[1].block_centers().next().unwrap();
        assert_eq!(second_course.y, BLOCK_SIZE + 1.0);
    }

    #[test]
    fn test_spawn_band_is_inside_walls() {
        use crate::consts::*;
        let far_wall_z = 21.0 * BLOCK_SPACING;
        assert!(SPAWN_Z_MAX < far_wall_z);
        assert!(SPAWN_X_MIN > -30.0 && SPAWN_X_MAX < 30.0);
        assert!(Arena::over_ground(PLAYER_START));
    }
}
