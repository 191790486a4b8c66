//! Engine configuration resource.
//!
//! Manages engine settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [window]
//! width = 1280
//! height = 720
//! target_fps = 60
//!
//! [audio]
//! mixrate = 44100
//! max_channels = 32
//! master_volume = 255
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::resources::audio::AudioConfig;

/// Default safe values for startup
const DEFAULT_WINDOW_WIDTH: u32 = 1280;
const DEFAULT_WINDOW_HEIGHT: u32 = 720;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_MIXRATE: u32 = 44100;
const DEFAULT_MAX_CHANNELS: u32 = 32;
const DEFAULT_MASTER_VOLUME: u8 = 255;
const DEFAULT_CONFIG_PATH: &str = "./engine.ini";

/// Engine configuration resource.
///
/// Stores window settings and audio device parameters. Values not present in
/// the configuration file keep their defaults.
#[derive(Resource, Debug, Clone)]
pub struct EngineConfig {
    /// Window width in pixels.
    pub window_width: u32,
    /// Window height in pixels.
    pub window_height: u32,
    /// Target frames per second.
    pub target_fps: u32,
    /// Audio output sample rate in Hz.
    pub mixrate: u32,
    /// Maximum simultaneous sound channels.
    pub max_channels: u32,
    /// Master sound volume, 0..=255.
    pub master_volume: u8,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            mixrate: DEFAULT_MIXRATE,
            max_channels: DEFAULT_MAX_CHANNELS,
            master_volume: DEFAULT_MASTER_VOLUME,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [window] section
        if let Some(width) = config.getuint("window", "width").ok().flatten() {
            self.window_width = width as u32;
        }
        if let Some(height) = config.getuint("window", "height").ok().flatten() {
            self.window_height = height as u32;
        }
        if let Some(fps) = config.getuint("window", "target_fps").ok().flatten() {
            self.target_fps = fps as u32;
        }

        // [audio] section
        if let Some(rate) = config.getuint("audio", "mixrate").ok().flatten() {
            self.mixrate = rate as u32;
        }
        if let Some(channels) = config.getuint("audio", "max_channels").ok().flatten() {
            self.max_channels = channels as u32;
        }
        if let Some(volume) = config.getuint("audio", "master_volume").ok().flatten() {
            self.master_volume = volume.min(255) as u8;
        }

        info!(
            "Loaded config: {}x{} window, fps={}, mixrate={}, channels={}, volume={}",
            self.window_width,
            self.window_height,
            self.target_fps,
            self.mixrate,
            self.max_channels,
            self.master_volume
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [window] section
        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));
        config.set("window", "target_fps", Some(self.target_fps.to_string()));

        // [audio] section
        config.set("audio", "mixrate", Some(self.mixrate.to_string()));
        config.set(
            "audio",
            "max_channels",
            Some(self.max_channels.to_string()),
        );
        config.set(
            "audio",
            "master_volume",
            Some(self.master_volume.to_string()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Get the window size.
    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// Extract the audio device parameters for the playback thread.
    pub fn audio_config(&self) -> AudioConfig {
        AudioConfig {
            mixrate: self.mixrate,
            max_channels: self.max_channels,
            master_volume: self.master_volume,
        }
    }
}
