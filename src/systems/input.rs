//! Input systems.
//!
//! [`update_input_state`] reads hardware input from Raylib each frame and
//! writes the results into [`crate::resources::input::InputState`]. Every
//! tracked input walks the Nothing / Down / Hold / Up edge machine, so
//! consumers can distinguish a fresh press from a held key without keeping
//! their own previous-frame copies.
use bevy_ecs::prelude::*;
use raylib::core::input::key_from_i32;
use raylib::ffi::{GamepadAxis, GamepadButton, MouseButton};

use crate::resources::input::{InputId, InputState};

/// Mouse buttons polled every frame, paired with their stable indices.
const MOUSE_BUTTONS: [(u32, MouseButton); 6] = [
    (0, MouseButton::MOUSE_BUTTON_LEFT),
    (1, MouseButton::MOUSE_BUTTON_RIGHT),
    (2, MouseButton::MOUSE_BUTTON_MIDDLE),
    (3, MouseButton::MOUSE_BUTTON_SIDE),
    (4, MouseButton::MOUSE_BUTTON_EXTRA),
    (5, MouseButton::MOUSE_BUTTON_FORWARD),
];

/// Gamepad buttons polled when a pad is connected.
const GAMEPAD_BUTTONS: [(u32, GamepadButton); 14] = [
    (0, GamepadButton::GAMEPAD_BUTTON_LEFT_FACE_UP),
    (1, GamepadButton::GAMEPAD_BUTTON_LEFT_FACE_RIGHT),
    (2, GamepadButton::GAMEPAD_BUTTON_LEFT_FACE_DOWN),
    (3, GamepadButton::GAMEPAD_BUTTON_LEFT_FACE_LEFT),
    (4, GamepadButton::GAMEPAD_BUTTON_RIGHT_FACE_UP),
    (5, GamepadButton::GAMEPAD_BUTTON_RIGHT_FACE_RIGHT),
    (6, GamepadButton::GAMEPAD_BUTTON_RIGHT_FACE_DOWN),
    (7, GamepadButton::GAMEPAD_BUTTON_RIGHT_FACE_LEFT),
    (8, GamepadButton::GAMEPAD_BUTTON_LEFT_TRIGGER_1),
    (9, GamepadButton::GAMEPAD_BUTTON_LEFT_TRIGGER_2),
    (10, GamepadButton::GAMEPAD_BUTTON_RIGHT_TRIGGER_1),
    (11, GamepadButton::GAMEPAD_BUTTON_RIGHT_TRIGGER_2),
    (12, GamepadButton::GAMEPAD_BUTTON_MIDDLE_LEFT),
    (13, GamepadButton::GAMEPAD_BUTTON_MIDDLE_RIGHT),
];

/// Poll Raylib for keyboard, mouse, and gamepad input and update the
/// [`InputState`] resource.
pub fn update_input_state(
    mut input: ResMut<InputState>,
    mut rl: NonSendMut<raylib::RaylibHandle>,
) {
    input.begin_frame();
    if let Some((x, y)) = input.take_warp() {
        rl.set_mouse_position(raylib::prelude::Vector2::new(x as f32, y as f32));
    }

    // Advance every key already mid-gesture with its current hardware state,
    // then fold in the keys that went down this frame from the press queue.
    let tracked: Vec<InputId> = input.tracked().collect();
    for id in tracked {
        let is_down = match id {
            InputId::Key(code) => key_from_i32(code as i32)
                .map(|key| rl.is_key_down(key))
                .unwrap_or(false),
            // Buttons are advanced in their own passes below.
            InputId::MouseButton(_) | InputId::GamepadButton(_) => continue,
        };
        input.advance(id, is_down);
    }
    while let Some(key) = rl.get_key_pressed() {
        input.advance(InputId::Key(key as u32), true);
    }

    for (index, button) in MOUSE_BUTTONS {
        input.advance(InputId::MouseButton(index), rl.is_mouse_button_down(button));
    }

    // Mouse position is clamped to the window rect; velocity is the raw
    // per-frame delta so fast swipes keep their full magnitude.
    let width = rl.get_screen_width();
    let height = rl.get_screen_height();
    let raw = (rl.get_mouse_x(), rl.get_mouse_y());
    input.mouse_pos = (
        raw.0.clamp(0, width.max(1) - 1),
        raw.1.clamp(0, height.max(1) - 1),
    );
    let delta = rl.get_mouse_delta();
    input.mouse_vel = (delta.x as i32, delta.y as i32);
    input.wheel_vel = rl.get_mouse_wheel_move() as i32;

    // Gamepad 0 only; axes land in [-1, 1]. When the pad disconnects
    // mid-gesture, release every tracked pad button so nothing sticks.
    if !rl.is_gamepad_available(0) {
        let stale: Vec<InputId> = input
            .tracked()
            .filter(|id| matches!(id, InputId::GamepadButton(_)))
            .collect();
        for id in stale {
            input.advance(id, false);
        }
    } else {
        for (index, button) in GAMEPAD_BUTTONS {
            input.advance(
                InputId::GamepadButton(index),
                rl.is_gamepad_button_down(0, button),
            );
        }
        let joy_prev = input.joy;
        input.joy.x = rl.get_gamepad_axis_movement(0, GamepadAxis::GAMEPAD_AXIS_LEFT_X);
        input.joy.y = rl.get_gamepad_axis_movement(0, GamepadAxis::GAMEPAD_AXIS_LEFT_Y);
        input.joy.z = rl.get_gamepad_axis_movement(0, GamepadAxis::GAMEPAD_AXIS_LEFT_TRIGGER);
        input.joy_r.x = rl.get_gamepad_axis_movement(0, GamepadAxis::GAMEPAD_AXIS_RIGHT_X);
        input.joy_r.y = rl.get_gamepad_axis_movement(0, GamepadAxis::GAMEPAD_AXIS_RIGHT_Y);
        input.joy_r.z = rl.get_gamepad_axis_movement(0, GamepadAxis::GAMEPAD_AXIS_RIGHT_TRIGGER);
        input.joy_vel = input.joy - joy_prev;
    }
}
