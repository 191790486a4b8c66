//! Particle simulation resource.
//!
//! A flat pool of billboard particles stepped once per frame with explicit
//! Euler integration: gravity scaled by per-particle influence, velocity
//! damped by air density times per-particle drag, position and spin angle
//! integrated, colour and size interpolated linearly over the particle's
//! lifetime. Expired particles are dropped by the same pass.
//!
//! Spawning comes in two shapes, mirroring the render system's needs:
//! [`ParticleSim::spawn`] with exact parameters, and
//! [`ParticleSim::spawn_preset`] which samples every `(from, to)` range of
//! a [`SpawnPreset`] uniformly. Presets are serde types so effects can be
//! authored as JSON files next to the textures they use.

use bevy_ecs::prelude::Resource;
use fastrand::Rng;
use log::info;
use raylib::prelude::{Vector3, Vector4};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fs;
use std::path::Path;

/// Source blend coefficient for billboard rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SrcBlend {
    Zero,
    One,
    DstColor,
    OneMinusDstColor,
    #[default]
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturate,
}

/// Destination blend coefficient for billboard rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstBlend {
    Zero,
    #[default]
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Exact parameters for one particle.
#[derive(Debug, Clone)]
pub struct ParticleParams {
    pub position: Vector3,
    pub velocity: Vector3,
    pub start_color: Vector4,
    pub end_color: Vector4,
    pub start_size: f32,
    pub end_size: f32,
    /// Lifetime in seconds; the particle dies when its age reaches this.
    pub duration: f32,
    /// 0 = ignores gravity, 1 = full gravity.
    pub gravity_influence: f32,
    /// Drag coefficient multiplied by the sim's air density.
    pub air_resistance: f32,
    pub angle: f32,
    pub angle_speed: f32,
    /// Animation frames as texture-store keys; the frame shown advances
    /// over the particle's lifetime.
    pub frames: SmallVec<[String; 4]>,
    pub src_blend: SrcBlend,
    pub dst_blend: DstBlend,
}

impl Default for ParticleParams {
    fn default() -> Self {
        Self {
            position: Vector3::zero(),
            velocity: Vector3::zero(),
            start_color: Vector4::new(1.0, 1.0, 1.0, 1.0),
            end_color: Vector4::new(1.0, 1.0, 1.0, 0.0),
            start_size: 1.0,
            end_size: 1.0,
            duration: 1.0,
            gravity_influence: 0.0,
            air_resistance: 0.0,
            angle: 0.0,
            angle_speed: 0.0,
            frames: SmallVec::new(),
            src_blend: SrcBlend::default(),
            dst_blend: DstBlend::default(),
        }
    }
}

/// A live particle.
#[derive(Debug, Clone)]
pub struct Particle {
    pub params: ParticleParams,
    pub age: f32,
}

impl Particle {
    /// Normalised lifetime position in [0, 1].
    pub fn t(&self) -> f32 {
        if self.params.duration <= 0.0 {
            1.0
        } else {
            (self.age / self.params.duration).clamp(0.0, 1.0)
        }
    }

    /// Current colour, lerped from start to end.
    pub fn color(&self) -> Vector4 {
        let t = self.t();
        lerp4(self.params.start_color, self.params.end_color, t)
    }

    /// Current billboard size, lerped from start to end.
    pub fn size(&self) -> f32 {
        let t = self.t();
        self.params.start_size + (self.params.end_size - self.params.start_size) * t
    }

    /// Texture key of the animation frame to show, if any.
    pub fn frame(&self) -> Option<&str> {
        if self.params.frames.is_empty() {
            return None;
        }
        let idx = ((self.t() * self.params.frames.len() as f32) as usize)
            .min(self.params.frames.len() - 1);
        Some(&self.params.frames[idx])
    }
}

/// Ranged spawn description; every `(from, to)` pair is sampled uniformly
/// per particle. Serialisable so effects can live in JSON preset files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnPreset {
    /// Opposite corners of the axis-aligned spawn box.
    pub position_from: [f32; 3],
    pub position_to: [f32; 3],
    /// Base emission direction; need not be normalised.
    pub direction: [f32; 3],
    pub speed: (f32, f32),
    /// Cone half-angle range around `direction`, degrees.
    pub pitch: (f32, f32),
    pub start_size: (f32, f32),
    pub end_size: (f32, f32),
    pub duration: (f32, f32),
    pub start_color_from: [f32; 4],
    pub start_color_to: [f32; 4],
    pub end_color_from: [f32; 4],
    pub end_color_to: [f32; 4],
    pub angle: (f32, f32),
    pub angle_speed: (f32, f32),
    pub gravity_influence: f32,
    pub air_resistance: f32,
    pub count: (u32, u32),
    pub frames: Vec<String>,
    pub src_blend: SrcBlend,
    pub dst_blend: DstBlend,
}

impl Default for SpawnPreset {
    fn default() -> Self {
        Self {
            position_from: [0.0; 3],
            position_to: [0.0; 3],
            direction: [0.0, 1.0, 0.0],
            speed: (1.0, 1.0),
            pitch: (0.0, 0.0),
            start_size: (1.0, 1.0),
            end_size: (1.0, 1.0),
            duration: (1.0, 1.0),
            start_color_from: [1.0, 1.0, 1.0, 1.0],
            start_color_to: [1.0, 1.0, 1.0, 1.0],
            end_color_from: [1.0, 1.0, 1.0, 0.0],
            end_color_to: [1.0, 1.0, 1.0, 0.0],
            angle: (0.0, 0.0),
            angle_speed: (0.0, 0.0),
            gravity_influence: 0.0,
            air_resistance: 0.0,
            count: (1, 1),
            frames: Vec::new(),
            src_blend: SrcBlend::default(),
            dst_blend: DstBlend::default(),
        }
    }
}

impl SpawnPreset {
    /// Load a preset from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| format!("failed to read preset {}: {}", path.display(), e))?;
        serde_json::from_str(&text)
            .map_err(|e| format!("invalid preset {}: {}", path.display(), e))
    }
}

/// The particle pool plus its global simulation parameters.
#[derive(Resource)]
pub struct ParticleSim {
    particles: Vec<Particle>,
    gravity: Vector3,
    air_density: f32,
    /// Render back-to-front by camera distance when set.
    sorting: bool,
}

impl Default for ParticleSim {
    fn default() -> Self {
        Self {
            particles: Vec::new(),
            gravity: Vector3::new(0.0, -9.8, 0.0),
            air_density: 1.0,
            sorting: false,
        }
    }
}

impl ParticleSim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_gravity(&mut self, gravity: Vector3) {
        self.gravity = gravity;
    }

    pub fn set_air_density(&mut self, density: f32) {
        self.air_density = density;
    }

    pub fn set_sorting(&mut self, sorting: bool) {
        self.sorting = sorting;
    }

    pub fn sorting(&self) -> bool {
        self.sorting
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Drop every live particle.
    pub fn reset(&mut self) {
        info!("particle sim reset ({} particles dropped)", self.particles.len());
        self.particles.clear();
    }

    /// Spawn one particle with exact parameters.
    pub fn spawn(&mut self, params: ParticleParams) {
        self.particles.push(Particle { params, age: 0.0 });
    }

    /// Spawn a batch from a ranged preset. Returns how many were spawned.
    pub fn spawn_preset(&mut self, preset: &SpawnPreset, rng: &mut Rng) -> usize {
        let count = sample_u32(rng, preset.count.0, preset.count.1);
        let dir = Vector3::new(
            preset.direction[0],
            preset.direction[1],
            preset.direction[2],
        );
        for _ in 0..count {
            let position = Vector3::new(
                sample_f32(rng, preset.position_from[0], preset.position_to[0]),
                sample_f32(rng, preset.position_from[1], preset.position_to[1]),
                sample_f32(rng, preset.position_from[2], preset.position_to[2]),
            );
            let speed = sample_f32(rng, preset.speed.0, preset.speed.1);
            let pitch = sample_f32(rng, preset.pitch.0, preset.pitch.1);
            let velocity = cone_deviate(dir, pitch, rng).scale_by(speed);
            self.spawn(ParticleParams {
                position,
                velocity,
                start_color: sample_color(rng, preset.start_color_from, preset.start_color_to),
                end_color: sample_color(rng, preset.end_color_from, preset.end_color_to),
                start_size: sample_f32(rng, preset.start_size.0, preset.start_size.1),
                end_size: sample_f32(rng, preset.end_size.0, preset.end_size.1),
                duration: sample_f32(rng, preset.duration.0, preset.duration.1),
                gravity_influence: preset.gravity_influence,
                air_resistance: preset.air_resistance,
                angle: sample_f32(rng, preset.angle.0, preset.angle.1),
                angle_speed: sample_f32(rng, preset.angle_speed.0, preset.angle_speed.1),
                frames: preset.frames.iter().cloned().collect(),
                src_blend: preset.src_blend,
                dst_blend: preset.dst_blend,
            });
        }
        count as usize
    }

    /// Advance every particle by `dt` seconds and drop the expired ones.
    /// Returns the number of particles still alive.
    pub fn update(&mut self, dt: f32) -> usize {
        if dt <= 0.0 {
            return self.particles.len();
        }
        let gravity = self.gravity;
        let air_density = self.air_density;
        self.particles.retain_mut(|p| {
            p.age += dt;
            if p.age >= p.params.duration {
                return false;
            }
            let params = &mut p.params;
            params.velocity += gravity.scale_by(params.gravity_influence * dt);
            let damp = (1.0 - air_density * params.air_resistance * dt).max(0.0);
            params.velocity = params.velocity.scale_by(damp);
            params.position += params.velocity.scale_by(dt);
            params.angle += params.angle_speed * dt;
            true
        });
        self.particles.len()
    }

    /// Indices of live particles in render order. When sorting is on,
    /// the farthest particle from `camera_pos` comes first so alpha
    /// blending composes as expected.
    pub fn draw_order(&self, camera_pos: Vector3) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.particles.len()).collect();
        if self.sorting {
            order.sort_by(|&a, &b| {
                let da = (self.particles[a].params.position - camera_pos).length();
                let db = (self.particles[b].params.position - camera_pos).length();
                db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        order
    }
}

fn sample_f32(rng: &mut Rng, from: f32, to: f32) -> f32 {
    if (to - from).abs() < f32::EPSILON {
        return from;
    }
    from + rng.f32() * (to - from)
}

fn sample_u32(rng: &mut Rng, from: u32, to: u32) -> u32 {
    if from >= to {
        return from;
    }
    rng.u32(from..=to)
}

fn sample_color(rng: &mut Rng, from: [f32; 4], to: [f32; 4]) -> Vector4 {
    Vector4::new(
        sample_f32(rng, from[0], to[0]),
        sample_f32(rng, from[1], to[1]),
        sample_f32(rng, from[2], to[2]),
        sample_f32(rng, from[3], to[3]),
    )
}

fn lerp4(a: Vector4, b: Vector4, t: f32) -> Vector4 {
    Vector4::new(
        a.x + (b.x - a.x) * t,
        a.y + (b.y - a.y) * t,
        a.z + (b.z - a.z) * t,
        a.w + (b.w - a.w) * t,
    )
}

/// Deviate `dir` by `pitch` degrees towards a uniformly random azimuth.
fn cone_deviate(dir: Vector3, pitch: f32, rng: &mut Rng) -> Vector3 {
    let dir = if dir.length() < f32::EPSILON {
        Vector3::new(0.0, 1.0, 0.0)
    } else {
        dir.normalized()
    };
    if pitch.abs() < f32::EPSILON {
        return dir;
    }
    // Orthonormal basis perpendicular to dir.
    let helper = if dir.y.abs() < 0.99 {
        Vector3::new(0.0, 1.0, 0.0)
    } else {
        Vector3::new(1.0, 0.0, 0.0)
    };
    let u = dir.cross(helper).normalized();
    let v = dir.cross(u);
    let tilt = pitch.to_radians();
    let yaw = rng.f32() * std::f32::consts::TAU;
    (dir.scale_by(tilt.cos())
        + (u.scale_by(yaw.cos()) + v.scale_by(yaw.sin())).scale_by(tilt.sin()))
    .normalized()
}
