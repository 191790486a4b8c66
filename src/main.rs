//! Dusk Engine main entry point.
//!
//! A small game-engine runtime written in Rust using:
//! - **raylib** for windowing, graphics, and audio
//! - **bevy_ecs** for entity-component-system architecture
//!
//! This executable runs a demo scene: a particle fountain rendered as
//! billboards, bitmap-font text with inline colour escapes, and sound
//! playback on a background audio thread.
//!
//! # Project Structure
//!
//! - [`components`] – ECS components (particle emitters, screen text)
//! - [`events`] – Message types (audio thread commands, console lines)
//! - [`resources`] – ECS resources (cvars, asset stores, input, time)
//! - [`systems`] – ECS systems (rendering, input, particles, audio bridge)
//!
//! # Main Loop
//!
//! 1. Initialize the raylib window, ECS world, and resources
//! 2. Register cvars, execute the startup script, load demo assets
//! 3. Run the main loop: input, console, emitters, particles, audio
//!    bridge, render
//! 4. Clean up the audio thread on exit
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --config engine.ini --exec autoexec.cfg
//! ```

// Do not create console on Windows
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

mod components;
mod events;
mod resources;
mod systems;
mod tga;

use crate::components::emitter::ParticleEmitter;
use crate::components::screentext::ScreenText;
use crate::events::audio::AudioCmd;
use crate::events::console::{ConsoleLine, ConsoleReply};
use crate::resources::audio::{setup_audio, shutdown_audio};
use crate::resources::camera::CameraRes;
use crate::resources::cvars::{CvarRegistry, CvarValue};
use crate::resources::engineconfig::EngineConfig;
use crate::resources::fontstore::{Font, FontStore};
use crate::resources::input::{InputId, InputState, KeyPhase};
use crate::resources::particles::{DstBlend, ParticleSim, SpawnPreset, SrcBlend};
use crate::resources::texturestore::{FilterMode, PixelFormat, TextureStore};
use crate::resources::worldtime::WorldTime;
use crate::systems::audio::{
    forward_audio_cmds, poll_audio_messages, update_bevy_audio_cmds, update_bevy_audio_messages,
};
use crate::systems::console::{eval_console_lines, update_console_messages};
use crate::systems::emitter::particle_emitter_system;
use crate::systems::input::update_input_state;
use crate::systems::particles::update_particles;
use crate::systems::render::render_system;
use crate::systems::time::update_world_time;
use crate::tga::TgaImage;
use bevy_ecs::prelude::*;
use clap::Parser;
use raylib::prelude::{KeyboardKey, Vector3};
use std::path::PathBuf;

/// Dusk Engine
#[derive(Parser)]
#[command(version, about = "Dusk Engine demo runtime")]
struct Cli {
    /// Path to the INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./engine.ini")]
    config: PathBuf,

    /// Console script executed at startup (sequences of `set` commands).
    #[arg(long, value_name = "PATH")]
    exec: Option<PathBuf>,
}

/// Built-in effect used when no preset file is present next to the binary.
fn spark_preset() -> SpawnPreset {
    SpawnPreset {
        position_from: [-0.2, 0.0, -0.2],
        position_to: [0.2, 0.0, 0.2],
        direction: [0.0, 1.0, 0.0],
        speed: (4.0, 7.0),
        pitch: (0.0, 25.0),
        start_size: (0.3, 0.5),
        end_size: (0.0, 0.1),
        duration: (0.8, 1.6),
        start_color_from: [1.0, 0.8, 0.3, 1.0],
        start_color_to: [1.0, 0.5, 0.1, 1.0],
        end_color_from: [0.6, 0.1, 0.0, 0.0],
        end_color_to: [0.8, 0.2, 0.0, 0.0],
        gravity_influence: 1.0,
        air_resistance: 0.1,
        count: (2, 5),
        frames: vec!["spark".into()],
        src_blend: SrcBlend::SrcAlpha,
        dst_blend: DstBlend::One,
        ..Default::default()
    }
}

/// Keep the audio listener glued to the camera.
fn sync_listener(camera: Res<CameraRes>, mut writer: MessageWriter<AudioCmd>) {
    let p = camera.position();
    writer.write(AudioCmd::SetListener {
        position: [p.x, p.y, p.z],
    });
}

/// Demo interactions: space fires a sound, G toggles gravity via the
/// console path so the cvar machinery is exercised end to end.
fn demo_controls(
    input: Res<InputState>,
    cvars: Res<CvarRegistry>,
    mut audio: MessageWriter<AudioCmd>,
    mut console: MessageWriter<ConsoleLine>,
) {
    let volume = cvars.int_of("snd_volume").unwrap_or(255).clamp(0, 255) as u8;
    if input.phase(InputId::Key(KeyboardKey::KEY_SPACE as u32)) == KeyPhase::Down {
        audio.write(AudioCmd::PlaySound {
            id: "blip".into(),
            channel: -1,
            volume,
        });
    }
    if input.phase(InputId::Key(KeyboardKey::KEY_G as u32)) == KeyPhase::Down {
        let flipped = !cvars.bool_of("cl_gravity").unwrap_or(true);
        console.write(ConsoleLine::new(format!(
            "set cl_gravity {}",
            flipped as i32
        )));
    }
}

/// Push cvar-driven settings into the resources they steer.
fn apply_cvars(cvars: Res<CvarRegistry>, mut sim: ResMut<ParticleSim>) {
    let gravity_on = cvars.bool_of("cl_gravity").unwrap_or(true);
    sim.set_gravity(if gravity_on {
        Vector3::new(0.0, -9.8, 0.0)
    } else {
        Vector3::zero()
    });
    sim.set_sorting(cvars.bool_of("r_sortparticles").unwrap_or(false));
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = EngineConfig::with_path(&cli.config);
    config.load_from_file().ok(); // ignore errors, use defaults

    let (mut rl, thread) = raylib::init()
        .size(config.window_width as i32, config.window_height as i32)
        .title("Dusk Engine")
        .build();
    rl.set_target_fps(config.target_fps);

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    world.insert_resource(WorldTime::default());
    world.insert_resource(InputState::default());
    world.insert_resource(CameraRes::default());
    world.insert_resource(ParticleSim::new());
    world.insert_resource(FontStore::new());
    world.insert_resource(Messages::<ConsoleLine>::default());
    world.insert_resource(Messages::<ConsoleReply>::default());
    world.insert_non_send_resource(TextureStore::new());

    let mut cvars = CvarRegistry::new();
    cvars.register("cl_gravity", CvarValue::Bool(true), true);
    cvars.register("r_sortparticles", CvarValue::Bool(false), true);
    cvars.register_ranged("snd_volume", CvarValue::Int(255), 0.0, 255.0, true);
    cvars.register("sv_hostname", CvarValue::Str("dusk".into()), true);
    if let Some(script) = &cli.exec {
        if let Err(e) = cvars.exec_config(script) {
            log::error!("startup script failed: {}", e);
        }
    }
    world.insert_resource(cvars);

    setup_audio(&mut world, config.audio_config());
    world.insert_resource(config);

    // --------------- Demo assets ---------------
    let mut console_font: Option<Font> = None;
    {
        let mut textures = world.non_send_resource_mut::<TextureStore>();
        match TgaImage::from_file("./assets/fonts/console.tga") {
            Ok(img) => match Font::from_atlas(&img, "font_console") {
                Ok(font) => {
                    let format = PixelFormat::from_byte_per_pixel(img.byte_per_pixel)
                        .unwrap_or(PixelFormat::Rgba);
                    if let Err(e) = textures.replace_from_buffer(
                        "font_console",
                        &img.pixels,
                        img.width,
                        img.height,
                        format,
                        FilterMode::Nearest,
                    ) {
                        log::error!("font atlas store failed: {}", e);
                    }
                    console_font = Some(font);
                }
                Err(e) => log::error!("font atlas scan failed: {}", e),
            },
            Err(e) => log::warn!("no console font atlas: {}", e),
        }
        if let Err(e) = textures.load_tga("spark", "./assets/textures/spark.tga", FilterMode::Bilinear)
        {
            log::warn!("no spark texture: {}", e);
        }
    }
    if let Some(font) = console_font {
        world.resource_mut::<FontStore>().add("console", font);
    }

    let preset = match SpawnPreset::from_file("./assets/particles/sparks.json") {
        Ok(p) => p,
        Err(e) => {
            log::info!("using built-in spark preset: {}", e);
            spark_preset()
        }
    };
    world.spawn(ParticleEmitter::new(preset, Vector3::zero()).endless());
    world.spawn(ScreenText::new(
        "Dusk Engine\n\x02space\x01 plays a sound, \x02G\x01 flips gravity",
        16.0,
        16.0,
        24.0,
        raylib::prelude::Color::WHITE,
    ));

    {
        let bridge = world.resource::<crate::resources::audio::AudioBridge>();
        let _ = bridge.tx_cmd.send(AudioCmd::LoadSound {
            id: "blip".into(),
            path: "./assets/audio/blip.wav".into(),
            looped: false,
        });
    }

    world.insert_non_send_resource(rl);
    world.insert_non_send_resource(thread);

    // --------------- Schedule ---------------
    let mut update = Schedule::default();
    update.add_systems(update_input_state);
    update.add_systems(
        // console systems must be together
        (update_console_messages, demo_controls, eval_console_lines).chain(),
    );
    update.add_systems(apply_cvars.after(eval_console_lines));
    update.add_systems(
        // audio systems must be together
        (
            // First, advance AudioCmd messages and forward them to the audio thread
            sync_listener,
            update_bevy_audio_cmds,
            forward_audio_cmds,
            // Then, pull audio thread messages and advance them
            poll_audio_messages,
            update_bevy_audio_messages,
        )
            .chain(),
    );
    update.add_systems(particle_emitter_system.before(update_particles));
    update.add_systems(update_particles);
    update.add_systems(render_system.after(update_particles));

    update
        .initialize(&mut world)
        .expect("Failed to initialize schedule");

    // --------------- Main loop ---------------
    while !world
        .non_send_resource::<raylib::RaylibHandle>()
        .window_should_close()
    {
        let dt = world
            .non_send_resource::<raylib::RaylibHandle>()
            .get_frame_time();
        update_world_time(&mut world, dt);

        update.run(&mut world);

        world.clear_trackers(); // Clear changed components for next frame
    }
    shutdown_audio(&mut world);
}
