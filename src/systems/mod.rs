//! Engine systems.
//!
//! This module groups all ECS systems that advance simulation, input, and
//! rendering.
//!
//! Submodules overview
//! - [`audio`] – bridge with the audio thread (poll/update message queues)
//! - [`console`] – feed submitted console lines into the cvar registry
//! - [`emitter`] – fire particle bursts from emitter components
//! - [`input`] – read hardware input and update [`crate::resources::input::InputState`]
//! - [`particles`] – step the particle pool by the frame delta
//! - [`render`] – upload dirty textures and draw particles and text using Raylib
//! - [`time`] – update simulation time and delta

pub mod audio;
pub mod console;
pub mod emitter;
pub mod input;
pub mod particles;
pub mod render;
pub mod time;
