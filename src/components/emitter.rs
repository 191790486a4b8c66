//! Particle emitter component for continuous effects.
//!
//! The [`ParticleEmitter`] component makes an entity inject particle bursts
//! into the shared [`ParticleSim`](crate::resources::particles::ParticleSim)
//! pool at a configurable rate.
//!
//! # How It Works
//!
//! 1. Entity is spawned with a `ParticleEmitter` holding one or more spawn
//!    presets, an emission rate, and a remaining-emission budget.
//! 2. The `particle_emitter_system` runs each frame:
//!    - Accumulates time and fires a burst when the period elapses
//!    - Supports catch-up behavior for large delta times
//!    - Picks a random preset per burst and offsets its spawn box by the
//!      emitter's `position`
//!    - Stops when `emissions_remaining` reaches 0
//!
//! # Related
//!
//! - [`crate::systems::emitter::particle_emitter_system`] – system that fires bursts
//! - [`crate::resources::particles::SpawnPreset`] – the ranged burst description

use bevy_ecs::prelude::*;
use raylib::prelude::Vector3;

use crate::resources::particles::SpawnPreset;

/// Particle emitter component.
///
/// Fires bursts from its preset list into the particle pool. Each burst
/// samples one preset; the preset's spawn box is treated as relative to
/// the emitter's `position`.
#[derive(Component, Debug, Clone)]
pub struct ParticleEmitter {
    /// Presets to sample bursts from. Must be non-empty to emit.
    pub presets: Vec<SpawnPreset>,
    /// World-space origin added to every sampled spawn position.
    pub position: Vector3,
    /// Bursts per second. If <= 0, no emissions occur.
    pub emissions_per_second: f32,
    /// Remaining bursts. When 0, emitter stops.
    pub emissions_remaining: u32,
    /// Time accumulated since the last burst.
    pub time_since_emit: f32,
}

impl Default for ParticleEmitter {
    fn default() -> Self {
        Self {
            presets: Vec::new(),
            position: Vector3::zero(),
            emissions_per_second: 10.0,
            emissions_remaining: 100,
            time_since_emit: 0.0,
        }
    }
}

impl ParticleEmitter {
    /// Single-preset emitter at a world position.
    pub fn new(preset: SpawnPreset, position: Vector3) -> Self {
        Self {
            presets: vec![preset],
            position,
            ..Default::default()
        }
    }

    /// Emitter that never runs out of bursts.
    pub fn endless(mut self) -> Self {
        self.emissions_remaining = u32::MAX;
        self
    }

    pub fn is_finished(&self) -> bool {
        self.emissions_remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn default_emitter_has_no_presets() {
        let e = ParticleEmitter::default();
        assert!(e.presets.is_empty());
        assert!((e.emissions_per_second - 10.0).abs() < EPSILON);
        assert_eq!(e.emissions_remaining, 100);
        assert!((e.time_since_emit).abs() < EPSILON);
    }

    #[test]
    fn new_emitter_carries_preset_and_position() {
        let e = ParticleEmitter::new(SpawnPreset::default(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(e.presets.len(), 1);
        assert!((e.position.y - 2.0).abs() < EPSILON);
    }

    #[test]
    fn endless_emitter_never_finishes() {
        let e = ParticleEmitter::default().endless();
        assert_eq!(e.emissions_remaining, u32::MAX);
        assert!(!e.is_finished());
    }
}
