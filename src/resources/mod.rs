//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the ECS world and
//! accessed by systems during execution: input state, timing, asset stores,
//! and the console variable registry. Each submodule documents the semantics
//! and intended usage of its resource(s).
//!
//! Overview
//! - `audio` – bridge and channels for the background audio thread
//! - `camera` – shared 3D camera used for billboards and the audio listener
//! - `cvars` – typed console variables with config load/save
//! - `engineconfig` – window and audio settings from the INI file
//! - `fontstore` – bitmap fonts scanned from texture atlases
//! - `input` – per-frame edge state of keys, mouse, and gamepad
//! - `particles` – the particle pool and its simulation parameters
//! - `texturestore` – decoded textures keyed by string IDs, with GPU upload tracking
//! - `worldtime` – simulation time and delta
pub mod audio;
pub mod camera;
pub mod cvars;
pub mod engineconfig;
pub mod fontstore;
pub mod input;
pub mod particles;
pub mod texturestore;
pub mod worldtime;
