//! Raw input device state resource.
//!
//! Every key, mouse button, and gamepad button walks the same edge state
//! machine each frame: `Nothing` while idle, `Down` for exactly the frame
//! the press lands, `Hold` while it stays pressed, `Up` for exactly the
//! frame it is released, then back to `Nothing`.
//!
//! The resource also tracks the mouse (position clamped to the window,
//! per-frame velocity, wheel clicks) and gamepad stick axes in [-1, 1]
//! with their per-frame velocity. No dead zone or response curve is
//! applied; callers layer their own.
//!
//! [`crate::systems::input::update_input_state`] polls the hardware once
//! per frame and advances everything here.

use bevy_ecs::prelude::Resource;
use raylib::prelude::Vector3;
use rustc_hash::FxHashMap;

/// Edge state of one key or button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPhase {
    /// Not pressed.
    #[default]
    Nothing,
    /// Pressed this frame.
    Down,
    /// Still pressed.
    Hold,
    /// Released this frame.
    Up,
}

impl KeyPhase {
    /// Advance one frame given whether the input is physically down.
    pub fn advance(self, is_down: bool) -> KeyPhase {
        match (self, is_down) {
            (KeyPhase::Nothing | KeyPhase::Up, true) => KeyPhase::Down,
            (KeyPhase::Down | KeyPhase::Hold, true) => KeyPhase::Hold,
            (KeyPhase::Down | KeyPhase::Hold, false) => KeyPhase::Up,
            (KeyPhase::Nothing | KeyPhase::Up, false) => KeyPhase::Nothing,
        }
    }

    pub fn is_pressed(self) -> bool {
        matches!(self, KeyPhase::Down | KeyPhase::Hold)
    }
}

/// Identifier of a pollable input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputId {
    /// Keyboard key, raylib key code.
    Key(u32),
    /// Mouse button index, 0-based.
    MouseButton(u32),
    /// Gamepad button index, 0-based.
    GamepadButton(u32),
}

/// Per-frame state of keyboard, mouse, and gamepad.
#[derive(Resource, Debug, Clone, Default)]
pub struct InputState {
    phases: FxHashMap<InputId, KeyPhase>,
    /// First input that went down this frame, if any.
    first_down: Option<InputId>,
    /// Mouse position in window pixels, origin top-left, clamped to the
    /// window rect.
    pub mouse_pos: (i32, i32),
    /// Mouse movement since the previous frame, unclamped.
    pub mouse_vel: (i32, i32),
    /// Wheel movement in clicks; negative is towards the user.
    pub wheel_vel: i32,
    /// Left stick / primary axes in [-1, 1].
    pub joy: Vector3,
    /// Right stick / secondary axes in [-1, 1].
    pub joy_r: Vector3,
    /// Per-frame change of the primary axes.
    pub joy_vel: Vector3,
    /// Pending cursor warp, consumed by the input system.
    warp: Option<(i32, i32)>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edge state of an input; untracked inputs report `Nothing`.
    pub fn phase(&self, id: InputId) -> KeyPhase {
        self.phases.get(&id).copied().unwrap_or_default()
    }

    /// First input pressed this frame, cleared on the next update.
    pub fn first_down(&self) -> Option<InputId> {
        self.first_down
    }

    /// Advance one input's state machine. Called by the input system for
    /// every tracked input each frame.
    pub fn advance(&mut self, id: InputId, is_down: bool) {
        let next = self.phase(id).advance(is_down);
        if next == KeyPhase::Down && self.first_down.is_none() {
            self.first_down = Some(id);
        }
        if next == KeyPhase::Nothing {
            // Keep the map to the inputs that are mid-gesture.
            self.phases.remove(&id);
        } else {
            self.phases.insert(id, next);
        }
    }

    /// Inputs currently being tracked (mid-gesture).
    pub fn tracked(&self) -> impl Iterator<Item = InputId> + '_ {
        self.phases.keys().copied()
    }

    /// Request a cursor warp. The actual move happens on the next input
    /// poll; `mouse_pos` reflects it the frame after.
    pub fn set_mouse(&mut self, pos: (i32, i32)) {
        self.warp = Some(pos);
    }

    /// Take the pending warp request, if any.
    pub fn take_warp(&mut self) -> Option<(i32, i32)> {
        self.warp.take()
    }

    /// Start a new frame: clears the first-down latch.
    pub fn begin_frame(&mut self) {
        self.first_down = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_sequence_matches_press_lifecycle() {
        // Nothing, Nothing, Down, Hold, Hold, Up, Nothing
        let mut phase = KeyPhase::Nothing;
        phase = phase.advance(false);
        assert_eq!(phase, KeyPhase::Nothing);
        phase = phase.advance(true);
        assert_eq!(phase, KeyPhase::Down);
        phase = phase.advance(true);
        assert_eq!(phase, KeyPhase::Hold);
        phase = phase.advance(true);
        assert_eq!(phase, KeyPhase::Hold);
        phase = phase.advance(false);
        assert_eq!(phase, KeyPhase::Up);
        phase = phase.advance(false);
        assert_eq!(phase, KeyPhase::Nothing);
    }

    #[test]
    fn instant_retap_goes_straight_back_down() {
        let phase = KeyPhase::Up.advance(true);
        assert_eq!(phase, KeyPhase::Down);
    }

    #[test]
    fn down_is_reported_for_exactly_one_frame() {
        let mut input = InputState::new();
        let key = InputId::Key(65);
        input.advance(key, true);
        assert_eq!(input.phase(key), KeyPhase::Down);
        input.advance(key, true);
        assert_eq!(input.phase(key), KeyPhase::Hold);
        input.advance(key, false);
        assert_eq!(input.phase(key), KeyPhase::Up);
        input.advance(key, false);
        assert_eq!(input.phase(key), KeyPhase::Nothing);
    }

    #[test]
    fn untracked_inputs_report_nothing() {
        let input = InputState::new();
        assert_eq!(input.phase(InputId::Key(32)), KeyPhase::Nothing);
        assert_eq!(input.phase(InputId::MouseButton(0)), KeyPhase::Nothing);
    }

    #[test]
    fn first_down_latches_the_first_press_only() {
        let mut input = InputState::new();
        input.begin_frame();
        input.advance(InputId::Key(10), true);
        input.advance(InputId::MouseButton(0), true);
        assert_eq!(input.first_down(), Some(InputId::Key(10)));

        // Next frame: both held, no new press.
        input.begin_frame();
        input.advance(InputId::Key(10), true);
        input.advance(InputId::MouseButton(0), true);
        assert_eq!(input.first_down(), None);
    }

    #[test]
    fn released_inputs_leave_the_tracking_map() {
        let mut input = InputState::new();
        let key = InputId::Key(1);
        input.advance(key, true);
        assert_eq!(input.tracked().count(), 1);
        input.advance(key, false); // Up
        assert_eq!(input.tracked().count(), 1);
        input.advance(key, false); // Nothing
        assert_eq!(input.tracked().count(), 0);
    }

    #[test]
    fn warp_request_is_consumed_once() {
        let mut input = InputState::new();
        assert_eq!(input.take_warp(), None);
        input.set_mouse((100, 50));
        assert_eq!(input.take_warp(), Some((100, 50)));
        assert_eq!(input.take_warp(), None);
    }

    #[test]
    fn is_pressed_covers_down_and_hold() {
        assert!(KeyPhase::Down.is_pressed());
        assert!(KeyPhase::Hold.is_pressed());
        assert!(!KeyPhase::Up.is_pressed());
        assert!(!KeyPhase::Nothing.is_pressed());
    }
}
