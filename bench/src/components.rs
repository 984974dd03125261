//! ECS world used by the storage benchmarks.

use meme_engine::ecs::{EntityIndex, HasSignature, System, ecs_settings};

/// 3D position component (12 bytes).
#[derive(Clone, Copy, Debug, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 3D velocity component (12 bytes).
#[derive(Clone, Copy, Debug, Default)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Health component (8 bytes).
#[derive(Clone, Copy, Debug, Default)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

/// Marks entities excluded from movement.
pub struct Static;

ecs_settings! {
    pub struct BenchWorld {
        components: [Position, Velocity, Health],
        tags: [Static],
        signatures: {
            Moving: [Position, Velocity],
            Living: [Health],
            Scenery: [Position, Static],
        },
    }
}

/// Integrates velocity into position.
pub struct Integrate {
    pub dt: f32,
}

impl System<BenchWorld, Moving> for Integrate {
    fn run(&mut self, _index: EntityIndex, components: <BenchWorld as HasSignature<Moving>>::Fetch<'_>) {
        let (position, velocity) = components;
        position.x += velocity.x * self.dt;
        position.y += velocity.y * self.dt;
        position.z += velocity.z * self.dt;
    }
}
