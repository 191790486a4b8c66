//! Particle emitter system.
//!
//! Processes [`ParticleEmitter`] components and injects bursts into the
//! shared particle pool.
//!
//! # Behavior
//!
//! - Accumulates time and fires bursts based on `emissions_per_second`
//! - Supports catch-up: if dt is large, may fire multiple times per frame
//! - Picks a random preset per burst, offset by the emitter's position
//! - Stops firing when `emissions_remaining` reaches 0

use bevy_ecs::prelude::*;
use fastrand::Rng;

use crate::components::emitter::ParticleEmitter;
use crate::resources::particles::{ParticleSim, SpawnPreset};
use crate::resources::worldtime::WorldTime;

/// System that processes particle emitters and fires bursts.
///
/// Queries all entities with `ParticleEmitter`, accumulates time, and spawns
/// particle batches into [`ParticleSim`] when thresholds are met.
///
/// # Ordering
///
/// Should run **before** the particle update so new particles age from
/// their spawn frame.
pub fn particle_emitter_system(
    mut emitter_query: Query<&mut ParticleEmitter>,
    mut sim: ResMut<ParticleSim>,
    time: Res<WorldTime>,
    mut rng: Local<Rng>,
) {
    let dt = time.delta; // delta is already scaled
    if dt <= 0.0 {
        return;
    }

    for mut emitter in emitter_query.iter_mut() {
        // Skip if no presets, no emissions remaining, or rate is zero/negative
        if emitter.presets.is_empty()
            || emitter.emissions_remaining == 0
            || emitter.emissions_per_second <= 0.0
        {
            continue;
        }

        let period = 1.0 / emitter.emissions_per_second;
        emitter.time_since_emit += dt;

        // Catch-up loop: fire multiple bursts if dt is large
        while emitter.time_since_emit >= period && emitter.emissions_remaining > 0 {
            let preset_idx = rng.usize(0..emitter.presets.len());
            let burst = offset_preset(&emitter.presets[preset_idx], emitter.position);
            sim.spawn_preset(&burst, &mut rng);
            emitter.time_since_emit -= period;
            if emitter.emissions_remaining != u32::MAX {
                emitter.emissions_remaining -= 1;
            }
        }
    }
}

/// Translate a preset's spawn box by the emitter's world position.
fn offset_preset(preset: &SpawnPreset, position: raylib::prelude::Vector3) -> SpawnPreset {
    let mut burst = preset.clone();
    for axis in 0..3 {
        let delta = [position.x, position.y, position.z][axis];
        burst.position_from[axis] += delta;
        burst.position_to[axis] += delta;
    }
    burst
}

#[cfg(test)]
mod tests {
    use super::*;
    use raylib::prelude::Vector3;

    fn tick(world: &mut World, schedule: &mut Schedule, dt: f32) {
        world.resource_mut::<WorldTime>().delta = dt;
        schedule.run(world);
    }

    fn test_world() -> (World, Schedule) {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(ParticleSim::new());
        let mut schedule = Schedule::default();
        schedule.add_systems(particle_emitter_system);
        (world, schedule)
    }

    #[test]
    fn emits_at_configured_rate() {
        let (mut world, mut schedule) = test_world();
        let preset = SpawnPreset {
            count: (1, 1),
            ..Default::default()
        };
        world.spawn(ParticleEmitter {
            presets: vec![preset],
            emissions_per_second: 10.0,
            emissions_remaining: 100,
            ..Default::default()
        });

        // 0.05s is below the 0.1s period, nothing yet.
        tick(&mut world, &mut schedule, 0.05);
        assert_eq!(world.resource::<ParticleSim>().len(), 0);

        // Crossing the period fires exactly one burst.
        tick(&mut world, &mut schedule, 0.06);
        assert_eq!(world.resource::<ParticleSim>().len(), 1);
    }

    #[test]
    fn catches_up_on_large_delta() {
        let (mut world, mut schedule) = test_world();
        world.spawn(ParticleEmitter {
            presets: vec![SpawnPreset::default()],
            emissions_per_second: 10.0,
            emissions_remaining: 3,
            ..Default::default()
        });

        // One second covers ten periods but only three emissions remain.
        tick(&mut world, &mut schedule, 1.0);
        assert_eq!(world.resource::<ParticleSim>().len(), 3);

        let mut query = world.query::<&ParticleEmitter>();
        let emitter = query.single(&world).unwrap();
        assert!(emitter.is_finished());
    }

    #[test]
    fn offsets_spawn_box_by_emitter_position() {
        let preset = SpawnPreset {
            position_from: [1.0, 0.0, 0.0],
            position_to: [2.0, 0.0, 0.0],
            ..Default::default()
        };
        let burst = offset_preset(&preset, Vector3::new(10.0, 20.0, 30.0));
        assert_eq!(burst.position_from, [11.0, 20.0, 30.0]);
        assert_eq!(burst.position_to, [12.0, 20.0, 30.0]);
    }
}
