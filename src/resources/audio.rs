//! ECS resources that bridge the main thread with the background audio
//! thread.
//!
//! Use [`setup_audio`] once during initialization to spawn the audio
//! thread and insert the [`AudioBridge`] and `Messages` resources. Call
//! [`shutdown_audio`] during teardown to gracefully stop the thread and
//! free every loaded sample.

use crate::events::audio::{AudioCmd, AudioMessage};
use crate::systems::audio::audio_thread;
use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};

/// Mixer parameters handed to the audio thread at startup.
#[derive(Debug, Clone, Copy)]
pub struct AudioConfig {
    /// Sample rate the middleware mixes at. Recorded and logged; the
    /// device owns the actual rate.
    pub mixrate: u32,
    /// Upper bound on simultaneously playing mixer channels.
    pub max_channels: u32,
    /// Master volume every playback is scaled by, 0..=255.
    pub master_volume: u8,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            mixrate: 44100,
            max_channels: 32,
            master_volume: 255,
        }
    }
}

/// Shared bridge between the ECS world and the audio thread.
///
/// Systems send commands via [`AudioBridge::tx_cmd`] and poll for events
/// via [`AudioBridge::rx_msg`].
#[derive(Resource)]
pub struct AudioBridge {
    /// Sender for [`AudioCmd`] messages (ECS -> audio thread).
    pub tx_cmd: Sender<AudioCmd>,
    /// Receiver for [`AudioMessage`] messages (audio thread -> ECS).
    pub rx_msg: Receiver<AudioMessage>,
    /// Join handle for the background audio thread.
    pub handle: std::thread::JoinHandle<()>,
}

/// Spawn the audio thread and register bridge resources.
pub fn setup_audio(world: &mut World, config: AudioConfig) {
    let (tx_cmd, rx_cmd) = unbounded::<AudioCmd>();
    let (tx_msg, rx_msg) = unbounded::<AudioMessage>();

    let handle = std::thread::spawn(move || audio_thread(config, rx_cmd, tx_msg));

    world.insert_resource(AudioBridge {
        tx_cmd,
        rx_msg,
        handle,
    });
    world.insert_resource(Messages::<AudioMessage>::default());
    world.insert_resource(Messages::<AudioCmd>::default());
}

/// Gracefully request shutdown of the audio thread and join it.
///
/// If the bridge resource exists, sends [`AudioCmd::Shutdown`], waits for
/// the thread to exit, and removes the resource from the world.
pub fn shutdown_audio(world: &mut World) {
    if let Some(bridge) = world.remove_resource::<AudioBridge>() {
        let _ = bridge.tx_cmd.send(AudioCmd::Shutdown);
        let _ = bridge.handle.join();
    }
}
