//! Screen-space text component.
//!
//! Entities with [`ScreenText`] get their string drawn by the render pass
//! using a bitmap font from the
//! [`FontStore`](crate::resources::fontstore::FontStore). Newlines start a
//! new line below the origin and inline escape characters `\x01`..=`\x09`
//! switch the tint for the rest of the line.

use bevy_ecs::prelude::*;
use raylib::prelude::{Color, Vector2};

/// Text drawn at a fixed window position.
#[derive(Component, Debug, Clone)]
pub struct ScreenText {
    pub text: String,
    /// Font key; `None` uses the store's bound font.
    pub font_id: Option<String>,
    /// Top-left corner of the first line, window pixels.
    pub pos: Vector2,
    /// Line height in pixels.
    pub size: f32,
    pub color: Color,
}

impl ScreenText {
    pub fn new(text: impl Into<String>, x: f32, y: f32, size: f32, color: Color) -> Self {
        Self {
            text: text.into(),
            font_id: None,
            pos: Vector2 { x, y },
            size,
            color,
        }
    }

    pub fn with_font(mut self, font_id: impl Into<String>) -> Self {
        self.font_id = Some(font_id.into());
        self
    }
}
