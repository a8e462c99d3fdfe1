//! Bouncing — headless movers in a box, with orbiting satellites and a
//! scripted spawner. Runs 120 fixed ticks and logs a diagnostics snapshot.
//!
//! Run with: `RUST_LOG=info cargo run --example bouncing`

use terran::prelude::*;

const TICKS: u32 = 120;
const DT: f32 = 1.0 / 60.0;
const HALF_EXTENT: f32 = 200.0;

#[derive(Debug, Clone, Copy)]
struct Velocity(Vec2);

/// Counts wall hits; a system reads it back at the end.
#[derive(Default)]
struct BounceCounter {
    bounces: u32,
}

impl System for BounceCounter {
    fn update(&mut self, world: &mut World, dt: f32) -> Result<(), SystemError> {
        let mut bounces = 0;
        world.for_each::<(Transform2D, Velocity)>(|_, (t, v)| {
            t.position += v.0 * dt;
            for axis in 0..2 {
                if t.position[axis].abs() > HALF_EXTENT {
                    t.position[axis] = t.position[axis].clamp(-HALF_EXTENT, HALF_EXTENT);
                    v.0[axis] = -v.0[axis];
                    bounces += 1;
                }
            }
        });
        self.bounces += bounces;
        Ok(())
    }
}

/// Spawns a new mover every `every` fixed steps, up to `limit`.
struct Spawner {
    every: u32,
    steps: u32,
    limit: u32,
}

impl Behaviour for Spawner {
    fn start(&mut self, entity: Entity, _world: &mut World) {
        log::info!("Spawner {entity} started");
    }

    fn fixed_update(&mut self, _entity: Entity, world: &mut World, _fixed_dt: f32) {
        self.steps += 1;
        if self.limit == 0 || self.steps % self.every != 0 {
            return;
        }
        self.limit -= 1;
        let angle = self.steps as f32 * 0.7;
        spawn_mover(world, Vec2::ZERO, Vec2::from_angle(angle) * 150.0);
    }
}

fn spawn_mover(world: &mut World, at: Vec2, velocity: Vec2) -> Entity {
    let e = world.create_entity();
    world.add_component(e, Transform2D::from_xy(at.x, at.y));
    world.add_component(e, Velocity(velocity));
    e
}

fn main() {
    env_logger::init();

    let config = WorldConfig::from_json_str(r#"{ "initial_entity_capacity": 64 }"#)
        .unwrap_or_else(|e| panic!("Bad demo config: {e}"));
    let mut world = World::with_config(config);

    world.add_system(SystemPhase::Update, 0, BounceCounter::default());
    let scripts = ScriptSystem::from_config(world.config());
    world.add_system(SystemPhase::Update, 10, scripts);
    world.add_system(SystemPhase::PostUpdate, 0, HierarchySystem);

    for i in 0..8 {
        let angle = i as f32 * std::f32::consts::TAU / 8.0;
        let mover = spawn_mover(&mut world, Vec2::ZERO, Vec2::from_angle(angle) * 120.0);
        // Every other mover drags a satellite along.
        if i % 2 == 0 {
            let satellite = world.create_entity();
            world.add_component(satellite, Transform2D::IDENTITY.with_scale(0.5));
            world.add_component(
                satellite,
                Relationship::child_of(mover, Vec2::new(12.0, 0.0)).with_inherit_scale(false),
            );
        }
    }

    let spawner = world.create_entity();
    world.add_component(
        spawner,
        Script::new(Spawner {
            every: 20,
            steps: 0,
            limit: 4,
        }),
    );

    for _ in 0..TICKS {
        if let Err(e) = world.tick(DT) {
            log::error!("Tick {} failed: {e}", world.tick_count());
        }
    }

    let bounces = world
        .system_mut::<BounceCounter>()
        .map(|c| c.bounces)
        .unwrap_or_default();
    log::info!(
        "{} ticks, {} entities, {} bounces",
        world.tick_count(),
        world.entity_count(),
        bounces
    );
    match world.diagnostics_snapshot().to_json() {
        Ok(json) => log::info!("Snapshot: {json}"),
        Err(e) => log::error!("Snapshot failed to serialize: {e}"),
    }
}
