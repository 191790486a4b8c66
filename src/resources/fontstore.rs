//! Bitmap font store resource.
//!
//! Fonts are carved out of a 512x512 RGBA TGA atlas: 8 bands of 64 px,
//! glyphs for ASCII 33..160 laid out left to right, top band first, each
//! glyph at most 32 px wide. Inside a band, a fully transparent column
//! (alpha 0 over all 64 rows) separates one glyph from the next.
//!
//! Text may embed colour escapes `\x01`..`\x09` (blue, green, cyan, red,
//! magenta, brown, light gray, dark gray, yellow) which tint the glyphs
//! that follow, and `\n` which starts a new line. Escapes occupy no width.
//!
//! Measurement here is pure; drawing happens in the render system using
//! the glyph rectangles as source rects into the atlas texture.

use arrayvec::ArrayVec;
use bevy_ecs::prelude::Resource;
use log::info;
use raylib::prelude::Color;
use rustc_hash::FxHashMap;

use crate::tga::TgaImage;

/// Atlas geometry. Glyph cells are one band tall.
pub const ATLAS_SIZE: u32 = 512;
pub const GLYPH_HEIGHT: u32 = 64;
/// First and one-past-last character codes present in the atlas.
const FIRST_CHAR: u32 = 33;
const LAST_CHAR: u32 = 160;
/// Table slots: codes 32..160 map to indices 0..128.
const GLYPH_SLOTS: usize = (LAST_CHAR - FIRST_CHAR + 1) as usize;

/// A glyph's rectangle within the atlas, in texels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A bitmap font: one glyph table plus the atlas texture it indexes.
#[derive(Debug, Clone)]
pub struct Font {
    glyphs: ArrayVec<Option<GlyphRect>, GLYPH_SLOTS>,
    /// Key of the atlas texture in the texture store.
    pub texture_id: String,
}

impl Font {
    /// Build a font by scanning a decoded atlas image.
    ///
    /// The image must be 512x512 RGBA; the alpha channel is the glyph
    /// mask. Returns an error when the atlas has the wrong shape or no
    /// glyphs at all.
    pub fn from_atlas(img: &TgaImage, texture_id: impl Into<String>) -> Result<Self, String> {
        if img.width != ATLAS_SIZE || img.height != ATLAS_SIZE {
            return Err(format!(
                "font atlas must be {0}x{0}, got {1}x{2}",
                ATLAS_SIZE, img.width, img.height
            ));
        }
        if img.byte_per_pixel != 4 {
            return Err("font atlas must be RGBA (alpha is the glyph mask)".into());
        }

        let mut glyphs: ArrayVec<Option<GlyphRect>, GLYPH_SLOTS> = ArrayVec::new();
        for _ in 0..GLYPH_SLOTS {
            glyphs.push(None);
        }

        let mut code = FIRST_CHAR;
        let bands = ATLAS_SIZE / GLYPH_HEIGHT;
        'scan: for band in 0..bands {
            let y0 = band * GLYPH_HEIGHT;
            let mut run_start: Option<u32> = None;
            for x in 0..=ATLAS_SIZE {
                let empty = x == ATLAS_SIZE || column_is_empty(img, x, y0);
                match (empty, run_start) {
                    (false, None) => run_start = Some(x),
                    (true, Some(start)) => {
                        glyphs[(code - FIRST_CHAR + 1) as usize] = Some(GlyphRect {
                            x: start,
                            y: y0,
                            width: x - start,
                            height: GLYPH_HEIGHT,
                        });
                        run_start = None;
                        code += 1;
                        if code >= LAST_CHAR {
                            break 'scan;
                        }
                    }
                    _ => {}
                }
            }
        }

        if code == FIRST_CHAR {
            return Err("font atlas contains no glyphs".into());
        }
        info!("font atlas scanned: {} glyphs", code - FIRST_CHAR);

        Ok(Font {
            glyphs,
            texture_id: texture_id.into(),
        })
    }

    /// Glyph rectangle for a character, if the atlas supplies one.
    pub fn glyph(&self, ch: char) -> Option<GlyphRect> {
        let code = ch as u32;
        if !(FIRST_CHAR..LAST_CHAR).contains(&code) {
            return None;
        }
        self.glyphs[(code - FIRST_CHAR + 1) as usize]
    }

    /// Horizontal advance of one character at the given pixel size.
    ///
    /// The space character has no atlas cell; its advance is `size / 3`.
    /// Colour escapes advance by zero.
    pub fn advance(&self, size: f32, ch: char) -> f32 {
        if ch == ' ' {
            return size / 3.0;
        }
        if escape_color(ch).is_some() {
            return 0.0;
        }
        match self.glyph(ch) {
            Some(g) => g.width as f32 * size / GLYPH_HEIGHT as f32,
            None => 0.0,
        }
    }

    /// Width of the widest `\n`-delimited line at the given size.
    pub fn string_width(&self, size: f32, text: &str) -> f32 {
        text.split('\n')
            .map(|line| line.chars().map(|ch| self.advance(size, ch)).sum())
            .fold(0.0, f32::max)
    }

    /// Total height of the text at the given size, counting `\n`.
    pub fn string_height(&self, size: f32, text: &str) -> f32 {
        size * text.split('\n').count() as f32
    }

    /// Position of the first occurrence of `target` within `text`, in
    /// pixels from the top-left of the first character.
    pub fn char_pos(&self, size: f32, text: &str, target: char) -> Option<(f32, f32)> {
        let mut x = 0.0;
        let mut y = 0.0;
        for ch in text.chars() {
            if ch == target {
                return Some((x, y));
            }
            if ch == '\n' {
                x = 0.0;
                y += size;
            } else {
                x += self.advance(size, ch);
            }
        }
        None
    }

    /// Index (in chars) of the glyph under `pos`, with the origin at the
    /// top-left of the first character.
    pub fn char_index_at(&self, size: f32, text: &str, pos: (f32, f32)) -> Option<usize> {
        if pos.1 < 0.0 {
            return None;
        }
        let target_line = (pos.1 / size) as usize;
        let mut line = 0usize;
        let mut x = 0.0;
        for (idx, ch) in text.chars().enumerate() {
            if ch == '\n' {
                line += 1;
                x = 0.0;
                continue;
            }
            if line == target_line {
                let adv = self.advance(size, ch);
                if pos.0 >= x && pos.0 < x + adv {
                    return Some(idx);
                }
                x += adv;
            } else if line > target_line {
                break;
            }
        }
        None
    }
}

/// Tint selected by an inline colour escape, if `ch` is one.
pub fn escape_color(ch: char) -> Option<Color> {
    match ch as u32 {
        1 => Some(Color::BLUE),
        2 => Some(Color::GREEN),
        3 => Some(Color::new(0, 255, 255, 255)), // cyan
        4 => Some(Color::RED),
        5 => Some(Color::MAGENTA),
        6 => Some(Color::BROWN),
        7 => Some(Color::LIGHTGRAY),
        8 => Some(Color::DARKGRAY),
        9 => Some(Color::YELLOW),
        _ => None,
    }
}

/// Map of font keys to loaded fonts.
#[derive(Resource, Default)]
pub struct FontStore {
    fonts: FxHashMap<String, Font>,
    /// Font used by text drawing when no explicit id is given.
    active: Option<String>,
}

impl FontStore {
    /// Create an empty font store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a font with the given key.
    pub fn add(&mut self, id: impl Into<String>, font: Font) {
        let id = id.into();
        if self.active.is_none() {
            self.active = Some(id.clone());
        }
        self.fonts.insert(id, font);
    }

    /// Get a font by its key.
    pub fn get(&self, id: impl AsRef<str>) -> Option<&Font> {
        self.fonts.get(id.as_ref())
    }

    /// Select the font used when no explicit id is given.
    pub fn bind(&mut self, id: impl Into<String>) {
        self.active = Some(id.into());
    }

    /// Currently bound font, if any.
    pub fn bound(&self) -> Option<&Font> {
        self.active.as_deref().and_then(|id| self.fonts.get(id))
    }

    /// Remove one font. Unbinds it if it was active.
    pub fn remove(&mut self, id: &str) -> bool {
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        self.fonts.remove(id).is_some()
    }

    /// Remove all loaded fonts.
    pub fn clear(&mut self) {
        self.fonts.clear();
        self.active = None;
    }

    /// Get the number of loaded fonts.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

fn column_is_empty(img: &TgaImage, x: u32, y0: u32) -> bool {
    for y in y0..y0 + GLYPH_HEIGHT {
        let alpha = img.pixels[((y * img.width + x) * 4 + 3) as usize];
        if alpha != 0 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Atlas with opaque glyph cells at the given (x, width) runs in the
    /// first band. Every listed run becomes one glyph starting at '!'.
    fn make_atlas(runs: &[(u32, u32)]) -> TgaImage {
        let mut pixels = vec![0u8; (ATLAS_SIZE * ATLAS_SIZE * 4) as usize];
        for &(x0, w) in runs {
            for y in 0..GLYPH_HEIGHT {
                for x in x0..x0 + w {
                    let i = ((y * ATLAS_SIZE + x) * 4) as usize;
                    pixels[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);
                }
            }
        }
        TgaImage {
            width: ATLAS_SIZE,
            height: ATLAS_SIZE,
            byte_per_pixel: 4,
            pixels,
        }
    }

    #[test]
    fn atlas_scan_finds_separated_glyphs() {
        // '!' at x=0 (8 wide), '"' at x=10 (12 wide), '#' at x=30 (20 wide)
        let img = make_atlas(&[(0, 8), (10, 12), (30, 20)]);
        let font = Font::from_atlas(&img, "atlas").unwrap();

        let bang = font.glyph('!').unwrap();
        assert_eq!((bang.x, bang.width), (0, 8));
        let quote = font.glyph('"').unwrap();
        assert_eq!((quote.x, quote.width), (10, 12));
        let hash = font.glyph('#').unwrap();
        assert_eq!((hash.x, hash.width), (30, 20));
        assert_eq!(bang.y, 0);
        assert_eq!(bang.height, GLYPH_HEIGHT);
        assert!(font.glyph('$').is_none());
    }

    #[test]
    fn atlas_rejects_wrong_shape() {
        let img = TgaImage {
            width: 256,
            height: 512,
            byte_per_pixel: 4,
            pixels: vec![0; 256 * 512 * 4],
        };
        assert!(Font::from_atlas(&img, "atlas").is_err());
    }

    #[test]
    fn atlas_rejects_missing_alpha() {
        let img = TgaImage {
            width: ATLAS_SIZE,
            height: ATLAS_SIZE,
            byte_per_pixel: 3,
            pixels: vec![0; (ATLAS_SIZE * ATLAS_SIZE * 3) as usize],
        };
        assert!(Font::from_atlas(&img, "atlas").is_err());
    }

    #[test]
    fn advance_scales_with_size() {
        let img = make_atlas(&[(0, 32)]);
        let font = Font::from_atlas(&img, "atlas").unwrap();
        // 32 texels wide at size 64 -> 32 px; at size 32 -> 16 px.
        assert_eq!(font.advance(64.0, '!'), 32.0);
        assert_eq!(font.advance(32.0, '!'), 16.0);
        // Space is synthesised.
        assert_eq!(font.advance(30.0, ' '), 10.0);
        // Colour escapes are zero width.
        assert_eq!(font.advance(64.0, '\u{4}'), 0.0);
    }

    #[test]
    fn string_width_takes_widest_line() {
        let img = make_atlas(&[(0, 10), (20, 20)]);
        let font = Font::from_atlas(&img, "atlas").unwrap();
        // '!' = 10 texels, '"' = 20 texels at size 64.
        let w = font.string_width(64.0, "!\n\"\"");
        assert_eq!(w, 40.0);
    }

    #[test]
    fn string_height_counts_lines() {
        let img = make_atlas(&[(0, 10)]);
        let font = Font::from_atlas(&img, "atlas").unwrap();
        assert_eq!(font.string_height(20.0, "!"), 20.0);
        assert_eq!(font.string_height(20.0, "!\n!\n!"), 60.0);
    }

    #[test]
    fn char_pos_walks_lines_and_escapes() {
        let img = make_atlas(&[(0, 10), (20, 20)]);
        let font = Font::from_atlas(&img, "atlas").unwrap();
        // Escape before '"' adds no width.
        let pos = font.char_pos(64.0, "!\u{2}\"", '"').unwrap();
        assert_eq!(pos, (10.0, 0.0));
        let pos = font.char_pos(64.0, "!\n\"", '"').unwrap();
        assert_eq!(pos, (0.0, 64.0));
        assert!(font.char_pos(64.0, "!", '?').is_none());
    }

    #[test]
    fn char_index_at_inverts_char_pos() {
        let img = make_atlas(&[(0, 10), (20, 20)]);
        let font = Font::from_atlas(&img, "atlas").unwrap();
        let text = "!\"\n!";
        // Inside the second glyph of the first line.
        assert_eq!(font.char_index_at(64.0, text, (15.0, 10.0)), Some(1));
        // First glyph of the second line.
        assert_eq!(font.char_index_at(64.0, text, (5.0, 70.0)), Some(3));
        // Past the end of a line.
        assert_eq!(font.char_index_at(64.0, text, (500.0, 0.0)), None);
    }

    #[test]
    fn store_binds_first_font_and_clears() {
        let img = make_atlas(&[(0, 10)]);
        let font = Font::from_atlas(&img, "atlas").unwrap();
        let mut store = FontStore::new();
        store.add("main", font.clone());
        store.add("alt", font);
        assert!(store.bound().is_some());
        store.bind("alt");
        assert_eq!(store.len(), 2);
        assert!(store.remove("alt"));
        assert!(store.bound().is_none());
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn escape_colors_cover_one_through_nine() {
        for code in 1..=9u32 {
            assert!(escape_color(char::from_u32(code).unwrap()).is_some());
        }
        assert!(escape_color('a').is_none());
        assert!(escape_color('\n').is_none());
    }
}
