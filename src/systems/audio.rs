//! Audio playback on a dedicated thread.
//!
//! [`audio_thread`] owns the raylib audio device and every loaded sample;
//! the ECS world talks to it exclusively through crossbeam channels. The
//! bridging systems here run each frame on the main thread:
//! - [`forward_audio_cmds`] pushes `AudioCmd` messages into the channel.
//! - [`poll_audio_messages`] drains the thread's replies into the ECS
//!   message queue.
//! - [`update_bevy_audio_cmds`] / [`update_bevy_audio_messages`] advance
//!   the respective queues so same-frame readers see the writes.
//!
//! Samples are deduplicated by file path: two ids loaded from the same
//! file share one decoded sample, which is freed only after both ids are
//! deleted. Playback goes through numbered mixer channels bounded by the
//! configured channel count; each occupied channel owns its own voice
//! built from the shared decoded data, so the same sample can overlap on
//! several channels at once. Positional plays attenuate and pan against
//! the listener position last set via `AudioCmd::SetListener`, and every
//! playback is scaled by the master volume.

use crate::events::audio::{AudioCmd, AudioMessage};
use crate::resources::audio::{AudioBridge, AudioConfig};
use bevy_ecs::prelude::{MessageReader, MessageWriter, Messages, Res, ResMut};
use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};
use raylib::core::audio::{Music, RaylibAudio, Sound, Wave};
use rustc_hash::FxHashMap;

/// Drain pending events from the audio thread into the ECS
/// [`Messages<AudioMessage>`] mailbox. Non-blocking, runs every frame.
pub fn poll_audio_messages(bridge: Res<AudioBridge>, mut writer: MessageWriter<AudioMessage>) {
    writer.write_batch(bridge.rx_msg.try_iter());
}

/// Advance the ECS message queue for [`AudioMessage`]. Run after
/// [`poll_audio_messages`] in the schedule.
pub fn update_bevy_audio_messages(mut messages: ResMut<Messages<AudioMessage>>) {
    messages.update();
}

/// Forward ECS [`AudioCmd`] messages to the audio thread.
pub fn forward_audio_cmds(bridge: Res<AudioBridge>, mut reader: MessageReader<AudioCmd>) {
    for cmd in reader.read() {
        // Send errors only happen during shutdown; ignore them.
        let _ = bridge.tx_cmd.send(cmd.clone());
    }
}

/// Advance the ECS message queue for [`AudioCmd`].
pub fn update_bevy_audio_cmds(mut messages: ResMut<Messages<AudioCmd>>) {
    messages.update();
}

/// Distance-attenuated volume and pan for a positional play.
///
/// Volume falls off linearly from `volume` at the listener to zero at
/// `range`; pan moves with the lateral (x) offset, 0.5 being centred.
/// Pure so it can be tested without an audio device.
pub fn spatialize(listener: [f32; 3], position: [f32; 3], range: f32, volume: f32) -> (f32, f32) {
    if range <= 0.0 {
        return (0.0, 0.5);
    }
    let dx = position[0] - listener[0];
    let dy = position[1] - listener[1];
    let dz = position[2] - listener[2];
    let dist = (dx * dx + dy * dy + dz * dz).sqrt();
    let attenuated = (1.0 - dist / range).clamp(0.0, 1.0) * volume;
    let pan = (0.5 - dx / range * 0.5).clamp(0.0, 1.0);
    (attenuated, pan)
}

/// Pick the channel a play lands on: an explicit id must be in range;
/// -1 picks the lowest free channel. Returns `None` when the mixer is
/// full or the id is out of range.
pub fn resolve_channel(requested: i32, busy: &[i32], max_channels: u32) -> Option<i32> {
    if requested >= 0 {
        return (requested < max_channels as i32).then_some(requested);
    }
    (0..max_channels as i32).find(|ch| !busy.contains(ch))
}

/// Apply the master volume to a per-play volume. Both are in [0, 1].
/// Pure so the scaling contract can be tested without an audio device.
pub fn scale_volume(volume: f32, master: f32) -> f32 {
    (volume * master).clamp(0.0, 1.0)
}

struct ChannelSlot<'aud> {
    id: String,
    path: String,
    looped: bool,
    /// Per-play volume before the master scale, in [0, 1].
    volume: f32,
    pan: f32,
    /// This channel's own voice; dropping it unloads the playback.
    voice: Sound<'aud>,
}

/// Entry point of the dedicated audio thread.
///
/// Owns the audio device and all `Sound`/`Music` handles; reacts to
/// [`AudioCmd`] inputs and emits [`AudioMessage`] outputs. Blocks until
/// [`AudioCmd::Shutdown`], then unloads everything and exits.
pub fn audio_thread(config: AudioConfig, rx_cmd: Receiver<AudioCmd>, tx_msg: Sender<AudioMessage>) {
    let audio = match RaylibAudio::init_audio_device() {
        Ok(device) => device,
        Err(e) => {
            log::error!("failed to initialize audio device: {}", e);
            return;
        }
    };
    info!(
        "audio thread up: mixrate {} Hz, {} channels, master volume {}",
        config.mixrate, config.max_channels, config.master_volume
    );

    // Decoded samples keyed by file path; ids alias into them. Channels
    // each own a voice minted from the shared wave data at play time.
    let mut samples: FxHashMap<String, Wave> = FxHashMap::default();
    let mut id_to_path: FxHashMap<String, String> = FxHashMap::default();
    let mut looped_ids: FxHashMap<String, bool> = FxHashMap::default();
    let mut channels: FxHashMap<i32, ChannelSlot> = FxHashMap::default();
    let mut listener = [0.0f32; 3];
    let mut master = config.master_volume as f32 / 255.0;
    // Music keeps its pre-master volume so master changes can re-scale it.
    let mut music: Option<(String, f32, Music)> = None;

    'run: loop {
        for cmd in rx_cmd.try_iter() {
            match cmd {
                AudioCmd::LoadSound { id, path, looped } => {
                    if !samples.contains_key(&path) {
                        match audio.new_wave(&path) {
                            Ok(wave) => {
                                samples.insert(path.clone(), wave);
                            }
                            Err(e) => {
                                warn!("sound load failed id='{}' path='{}': {}", id, path, e);
                                let _ = tx_msg.send(AudioMessage::SoundLoadFailed {
                                    id,
                                    error: e.to_string(),
                                });
                                continue;
                            }
                        }
                        info!("sound loaded id='{}' path='{}'", id, path);
                    } else {
                        info!("sound alias id='{}' -> already loaded '{}'", id, path);
                    }
                    id_to_path.insert(id.clone(), path);
                    looped_ids.insert(id.clone(), looped);
                    let _ = tx_msg.send(AudioMessage::SoundLoaded { id });
                }
                AudioCmd::DeleteSound { id } => {
                    if let Some(path) = id_to_path.remove(&id) {
                        looped_ids.remove(&id);
                        // Dropping a slot unloads its voice.
                        channels.retain(|_, slot| slot.id != id);
                        // Free the sample once nothing references it.
                        if !id_to_path.values().any(|p| *p == path) {
                            samples.remove(&path);
                        }
                        let _ = tx_msg.send(AudioMessage::SoundDeleted { id });
                    }
                }
                AudioCmd::PlaySound {
                    id,
                    channel,
                    volume,
                } => {
                    start_play(
                        &audio,
                        &id,
                        channel,
                        volume as f32 / 255.0,
                        0.5,
                        master,
                        &id_to_path,
                        &looped_ids,
                        &mut channels,
                        &samples,
                        &tx_msg,
                        config.max_channels,
                    );
                }
                AudioCmd::PlaySound3d {
                    id,
                    channel,
                    range,
                    position,
                    volume,
                } => {
                    let (vol, pan) =
                        spatialize(listener, position, range, volume as f32 / 255.0);
                    start_play(
                        &audio,
                        &id,
                        channel,
                        vol,
                        pan,
                        master,
                        &id_to_path,
                        &looped_ids,
                        &mut channels,
                        &samples,
                        &tx_msg,
                        config.max_channels,
                    );
                }
                AudioCmd::StopChannel { channel } => {
                    if let Some(slot) = channels.remove(&channel) {
                        slot.voice.stop();
                    }
                }
                AudioCmd::PlayMusic { path, volume } => {
                    if let Some((_, _, old)) = music.take() {
                        old.stop_stream();
                    }
                    match audio.new_music(&path) {
                        Ok(stream) => {
                            let vol = volume as f32 / 255.0;
                            stream.set_volume(scale_volume(vol, master));
                            stream.play_stream();
                            info!("music started '{}'", path);
                            let _ = tx_msg.send(AudioMessage::MusicStarted { path: path.clone() });
                            music = Some((path, vol, stream));
                        }
                        Err(e) => {
                            warn!("music load failed path='{}': {}", path, e);
                        }
                    }
                }
                AudioCmd::StopMusic => {
                    if let Some((_, _, stream)) = music.take() {
                        stream.stop_stream();
                        let _ = tx_msg.send(AudioMessage::MusicStopped);
                    }
                }
                AudioCmd::SetListener { position } => {
                    listener = position;
                }
                AudioCmd::SetMasterVolume { volume } => {
                    master = volume as f32 / 255.0;
                    for slot in channels.values() {
                        slot.voice.set_volume(scale_volume(slot.volume, master));
                    }
                    if let Some((_, vol, stream)) = music.as_ref() {
                        stream.set_volume(scale_volume(*vol, master));
                    }
                }
                AudioCmd::Shutdown => {
                    info!("audio shutdown requested");
                    channels.clear();
                    samples.clear();
                    id_to_path.clear();
                    looped_ids.clear();
                    if let Some((_, _, stream)) = music.take() {
                        stream.stop_stream();
                    }
                    let _ = tx_msg.send(AudioMessage::AllUnloaded);
                    break 'run;
                }
            }
        }

        // Free finished channels; restart the looped ones on their own
        // voice so other channels on the same sample keep playing.
        let finished: Vec<i32> = channels
            .iter()
            .filter(|(_, slot)| !slot.voice.is_playing())
            .map(|(&ch, _)| ch)
            .collect();
        for ch in finished {
            if let Some(slot) = channels.remove(&ch) {
                if slot.looped {
                    slot.voice.set_volume(scale_volume(slot.volume, master));
                    slot.voice.set_pan(slot.pan);
                    slot.voice.play();
                    channels.insert(ch, slot);
                }
            }
        }

        // Pump the music stream and detect its natural end.
        let music_done = match music.as_ref() {
            Some((_, _, stream)) => {
                if stream.is_stream_playing() {
                    stream.update_stream();
                    false
                } else {
                    stream.get_time_played() >= stream.get_time_length() - 0.01
                }
            }
            None => false,
        };
        if music_done {
            music = None;
            let _ = tx_msg.send(AudioMessage::MusicFinished);
        }

        std::thread::sleep(std::time::Duration::from_millis(10));
    }

    info!("audio thread exiting");
    // samples, channel voices, and music drop before `audio`, satisfying
    // device lifetimes
}

#[allow(clippy::too_many_arguments)]
fn start_play<'aud>(
    audio: &'aud RaylibAudio,
    id: &str,
    requested: i32,
    volume: f32,
    pan: f32,
    master: f32,
    id_to_path: &FxHashMap<String, String>,
    looped_ids: &FxHashMap<String, bool>,
    channels: &mut FxHashMap<i32, ChannelSlot<'aud>>,
    samples: &FxHashMap<String, Wave<'aud>>,
    tx_msg: &Sender<AudioMessage>,
    max_channels: u32,
) {
    let Some(path) = id_to_path.get(id) else {
        warn!("play failed id='{}': not loaded", id);
        let _ = tx_msg.send(AudioMessage::PlayDropped { id: id.to_string() });
        return;
    };
    let Some(wave) = samples.get(path) else {
        warn!("play failed id='{}': sample missing for '{}'", id, path);
        let _ = tx_msg.send(AudioMessage::PlayDropped { id: id.to_string() });
        return;
    };
    let busy: Vec<i32> = channels.keys().copied().collect();
    let Some(channel) = resolve_channel(requested, &busy, max_channels) else {
        warn!("play dropped id='{}': no free channel", id);
        let _ = tx_msg.send(AudioMessage::PlayDropped { id: id.to_string() });
        return;
    };
    // Playing on a busy channel replaces whatever was there; only that
    // channel's voice stops.
    if let Some(old) = channels.remove(&channel) {
        old.voice.stop();
    }
    let voice = match audio.new_sound_from_wave(wave) {
        Ok(voice) => voice,
        Err(e) => {
            warn!("voice creation failed id='{}': {}", id, e);
            let _ = tx_msg.send(AudioMessage::PlayDropped { id: id.to_string() });
            return;
        }
    };
    voice.set_volume(scale_volume(volume, master));
    voice.set_pan(pan);
    voice.play();
    channels.insert(
        channel,
        ChannelSlot {
            id: id.to_string(),
            path: path.clone(),
            looped: looped_ids.get(id).copied().unwrap_or(false),
            volume,
            pan,
            voice,
        },
    );
    let _ = tx_msg.send(AudioMessage::ChannelStarted {
        channel,
        id: id.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn spatialize_attenuates_linearly() {
        let (vol, pan) = spatialize([0.0; 3], [0.0; 3], 10.0, 1.0);
        assert!((vol - 1.0).abs() < EPSILON);
        assert!((pan - 0.5).abs() < EPSILON);

        let (vol, _) = spatialize([0.0; 3], [5.0, 0.0, 0.0], 10.0, 1.0);
        assert!((vol - 0.5).abs() < EPSILON);

        let (vol, _) = spatialize([0.0; 3], [20.0, 0.0, 0.0], 10.0, 1.0);
        assert!(vol.abs() < EPSILON);
    }

    #[test]
    fn spatialize_pans_with_lateral_offset() {
        // Source to the listener's right pans right (below 0.5).
        let (_, pan) = spatialize([0.0; 3], [10.0, 0.0, 0.0], 10.0, 1.0);
        assert!(pan < 0.5);
        let (_, pan) = spatialize([0.0; 3], [-10.0, 0.0, 0.0], 10.0, 1.0);
        assert!(pan > 0.5);
    }

    #[test]
    fn spatialize_handles_degenerate_range() {
        let (vol, pan) = spatialize([0.0; 3], [1.0, 0.0, 0.0], 0.0, 1.0);
        assert_eq!(vol, 0.0);
        assert_eq!(pan, 0.5);
    }

    #[test]
    fn master_volume_scales_every_play() {
        assert!((scale_volume(1.0, 1.0) - 1.0).abs() < EPSILON);
        assert!((scale_volume(1.0, 0.5) - 0.5).abs() < EPSILON);
        assert!((scale_volume(0.5, 0.5) - 0.25).abs() < EPSILON);
        assert_eq!(scale_volume(1.0, 0.0), 0.0);
        assert_eq!(scale_volume(2.0, 1.0), 1.0);
    }

    #[test]
    fn resolve_channel_picks_free_slots() {
        assert_eq!(resolve_channel(3, &[], 8), Some(3));
        assert_eq!(resolve_channel(9, &[], 8), None);
        assert_eq!(resolve_channel(-1, &[], 8), Some(0));
        assert_eq!(resolve_channel(-1, &[0, 1], 8), Some(2));
        let full: Vec<i32> = (0..4).collect();
        assert_eq!(resolve_channel(-1, &full, 4), None);
    }
}
