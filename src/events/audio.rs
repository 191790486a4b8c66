use bevy_ecs::message::Message;

/// Commands sent *to* the audio thread.
///
/// Sounds are addressed by caller-chosen ids. Loading the same file path
/// under a second id reuses the already-loaded sample; the sample is only
/// unloaded once every id referring to it has been deleted.
#[derive(Message, Debug, Clone)]
pub enum AudioCmd {
    LoadSound {
        id: String,
        path: String,
        looped: bool,
    },
    DeleteSound {
        id: String,
    },
    /// Play on a mixer channel; `channel` -1 picks a free one. Volume is
    /// 0..=255.
    PlaySound {
        id: String,
        channel: i32,
        volume: u8,
    },
    /// Positional playback: volume falls off linearly to zero at `range`
    /// from the listener, pan follows the lateral offset.
    PlaySound3d {
        id: String,
        channel: i32,
        range: f32,
        position: [f32; 3],
        volume: u8,
    },
    StopChannel {
        channel: i32,
    },
    PlayMusic {
        path: String,
        volume: u8,
    },
    StopMusic,
    SetListener {
        position: [f32; 3],
    },
    /// Rescale every current and future playback, 0..=255.
    SetMasterVolume {
        volume: u8,
    },
    Shutdown,
}

/// Events sent *back* from the audio thread.
#[derive(Message, Debug, Clone)]
pub enum AudioMessage {
    SoundLoaded { id: String },
    SoundLoadFailed { id: String, error: String },
    SoundDeleted { id: String },
    /// A play command landed on this channel.
    ChannelStarted { channel: i32, id: String },
    /// No free channel (or the sound was missing); the play was dropped.
    PlayDropped { id: String },
    MusicStarted { path: String },
    MusicStopped,
    /// Non-looped music reached its natural end.
    MusicFinished,
    /// Everything was unloaded (shutdown path).
    AllUnloaded,
}
