//! Particle update system.
//!
//! Advances the shared [`ParticleSim`](crate::resources::particles::ParticleSim)
//! pool by the scaled frame delta and drops expired particles.
use bevy_ecs::prelude::*;
use log::trace;

use crate::resources::particles::ParticleSim;
use crate::resources::worldtime::WorldTime;

/// Step the particle simulation by this frame's delta.
///
/// # Ordering
///
/// Should run **after** the emitter system so particles age from their
/// spawn frame, and before the render pass.
pub fn update_particles(mut sim: ResMut<ParticleSim>, time: Res<WorldTime>) {
    let alive = sim.update(time.delta);
    trace!("particles alive: {}", alive);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::particles::{ParticleParams, SpawnPreset};

    #[test]
    fn system_ages_and_expires_particles() {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        let mut sim = ParticleSim::new();
        sim.spawn(ParticleParams {
            duration: 0.5,
            ..Default::default()
        });
        world.insert_resource(sim);

        let mut schedule = Schedule::default();
        schedule.add_systems(update_particles);

        world.resource_mut::<WorldTime>().delta = 0.3;
        schedule.run(&mut world);
        assert_eq!(world.resource::<ParticleSim>().len(), 1);

        schedule.run(&mut world);
        assert_eq!(world.resource::<ParticleSim>().len(), 0);
    }

    #[test]
    fn zero_delta_is_a_no_op() {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        let mut sim = ParticleSim::new();
        let mut rng = fastrand::Rng::with_seed(7);
        sim.spawn_preset(&SpawnPreset::default(), &mut rng);
        world.insert_resource(sim);

        let mut schedule = Schedule::default();
        schedule.add_systems(update_particles);
        schedule.run(&mut world);
        assert_eq!(world.resource::<ParticleSim>().len(), 1);
    }
}
