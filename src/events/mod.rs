//! Event types used by the engine.
//!
//! This module groups the domain messages exchanged across systems. Messages
//! provide a decoupled way for systems to communicate without direct
//! dependencies.
//!
//! Submodules:
//! - [`audio`] – commands and messages for the background audio thread
//! - [`console`] – console lines submitted for cvar evaluation
//!
//! See each submodule for concrete message data and semantics.
pub mod audio;
pub mod console;
