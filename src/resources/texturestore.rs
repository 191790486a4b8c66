//! Texture store resource.
//!
//! Owns every texture loaded by the engine: the CPU pixel buffer (so
//! textures can be inspected and edited at runtime) plus the GPU handle
//! once it has been uploaded. CPU edits mark the texture dirty; the
//! [`upload_next`](TextureStore::upload_next) round-robin re-uploads at
//! most one dirty texture per call, so an external editor touching a
//! texture shows up in-game within a few frames without stalling one.
//!
//! Note: this is a non-send resource because GPU handles must stay on the
//! main thread; use `NonSend`/`NonSendMut` in system parameters.

use log::{debug, info};
use raylib::prelude::*;
use rustc_hash::FxHashMap;

use crate::tga::TgaImage;

/// Channels per pixel of a stored texture. The discriminants are the
/// byte-per-pixel counts callers see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// One byte per pixel, 256 gray levels.
    Luminance = 1,
    /// Three bytes per pixel, RGB.
    Rgb = 3,
    /// Four bytes per pixel, RGBA.
    Rgba = 4,
}

impl PixelFormat {
    pub fn byte_per_pixel(self) -> u32 {
        self as u32
    }

    pub fn from_byte_per_pixel(bpp: u32) -> Result<Self, String> {
        match bpp {
            1 => Ok(PixelFormat::Luminance),
            3 => Ok(PixelFormat::Rgb),
            4 => Ok(PixelFormat::Rgba),
            other => Err(format!("unsupported byte-per-pixel count {}", other)),
        }
    }
}

/// Texture sampling filter, applied on upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    Nearest,
    Linear,
    Bilinear,
    Trilinear,
}

impl FilterMode {
    fn to_raylib(self) -> TextureFilter {
        match self {
            FilterMode::Nearest => TextureFilter::TEXTURE_FILTER_POINT,
            FilterMode::Linear | FilterMode::Bilinear => TextureFilter::TEXTURE_FILTER_BILINEAR,
            FilterMode::Trilinear => TextureFilter::TEXTURE_FILTER_TRILINEAR,
        }
    }
}

/// CPU side of a texture: pixel buffer plus metadata.
#[derive(Debug, Clone)]
pub struct TexturePixels {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub filter: FilterMode,
    pub data: Vec<u8>,
}

impl TexturePixels {
    /// All-white texture of the given size and format.
    pub fn blank(width: u32, height: u32, format: PixelFormat, filter: FilterMode) -> Self {
        let len = (width * height * format.byte_per_pixel()) as usize;
        Self {
            width,
            height,
            format,
            filter,
            data: vec![255; len],
        }
    }

    /// Expand the buffer to RGBA8 for upload.
    fn to_rgba(&self) -> Vec<u8> {
        let count = (self.width * self.height) as usize;
        let mut out = Vec::with_capacity(count * 4);
        match self.format {
            PixelFormat::Rgba => out.extend_from_slice(&self.data),
            PixelFormat::Rgb => {
                for px in self.data.chunks_exact(3) {
                    out.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
            }
            PixelFormat::Luminance => {
                for &l in &self.data {
                    out.extend_from_slice(&[l, l, l, 255]);
                }
            }
        }
        out
    }

    /// In-place box blur: each pass replaces every pixel channel with the
    /// average of itself and its 8 neighbours (edges clamp to the image).
    pub fn blur(&mut self, passes: u32) {
        let w = self.width as i64;
        let h = self.height as i64;
        let bpp = self.format.byte_per_pixel() as i64;
        for _ in 0..passes {
            let src = self.data.clone();
            for y in 0..h {
                for x in 0..w {
                    for c in 0..bpp {
                        let mut sum = 0u32;
                        for dy in -1..=1i64 {
                            for dx in -1..=1i64 {
                                let sx = (x + dx).clamp(0, w - 1);
                                let sy = (y + dy).clamp(0, h - 1);
                                sum += src[((sy * w + sx) * bpp + c) as usize] as u32;
                            }
                        }
                        self.data[((y * w + x) * bpp + c) as usize] = (sum / 9) as u8;
                    }
                }
            }
        }
    }
}

struct TextureEntry {
    pixels: TexturePixels,
    gpu: Option<Texture2D>,
    dirty: bool,
}

/// Map of texture keys to loaded textures, with dirty-tracking for GPU
/// re-upload. Non-send resource.
pub struct TextureStore {
    entries: FxHashMap<String, TextureEntry>,
    upload_cursor: usize,
}

impl Default for TextureStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureStore {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            upload_cursor: 0,
        }
    }

    /// Decode a TGA file and store it under `id`. Atlas rules apply:
    /// uncompressed, power-of-two dimensions in 16..=512.
    pub fn load_tga(
        &mut self,
        id: impl Into<String>,
        path: &str,
        filter: FilterMode,
    ) -> Result<(), String> {
        let img = TgaImage::from_file(path)?;
        img.require_pow2()?;
        let id = id.into();
        info!(
            "texture '{}' loaded from {} ({}x{}, {} bpp)",
            id, path, img.width, img.height, img.byte_per_pixel
        );
        self.insert_pixels(id, tga_to_pixels(img, filter));
        Ok(())
    }

    /// Store an all-white texture under `id`.
    pub fn create_blank(
        &mut self,
        id: impl Into<String>,
        width: u32,
        height: u32,
        format: PixelFormat,
        filter: FilterMode,
    ) {
        self.insert_pixels(id.into(), TexturePixels::blank(width, height, format, filter));
    }

    /// Replace the contents of `id` (creating it if absent) with a raw
    /// pixel buffer. The buffer length must match the declared geometry.
    pub fn replace_from_buffer(
        &mut self,
        id: impl Into<String>,
        buffer: &[u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        filter: FilterMode,
    ) -> Result<(), String> {
        let expected = (width * height * format.byte_per_pixel()) as usize;
        if buffer.len() != expected {
            return Err(format!(
                "buffer length {} does not match {}x{} at {} bpp (expected {})",
                buffer.len(),
                width,
                height,
                format.byte_per_pixel(),
                expected
            ));
        }
        self.insert_pixels(
            id.into(),
            TexturePixels {
                width,
                height,
                format,
                filter,
                data: buffer.to_vec(),
            },
        );
        Ok(())
    }

    /// Insert already-decoded pixels, marking the entry dirty for upload.
    pub fn insert_pixels(&mut self, id: String, pixels: TexturePixels) {
        self.entries.insert(
            id,
            TextureEntry {
                pixels,
                gpu: None,
                dirty: true,
            },
        );
    }

    /// Box-blur a stored texture; marks it dirty.
    pub fn blur(&mut self, id: &str, passes: u32) -> Result<(), String> {
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| format!("unknown texture '{}'", id))?;
        entry.pixels.blur(passes);
        entry.dirty = true;
        Ok(())
    }

    /// Change the sampling filter of every stored texture.
    pub fn set_filter_all(&mut self, filter: FilterMode) {
        for entry in self.entries.values_mut() {
            entry.pixels.filter = filter;
            entry.dirty = true;
        }
    }

    pub fn size(&self, id: &str) -> Option<(u32, u32)> {
        self.entries
            .get(id)
            .map(|e| (e.pixels.width, e.pixels.height))
    }

    pub fn byte_per_pixel(&self, id: &str) -> Option<u32> {
        self.entries
            .get(id)
            .map(|e| e.pixels.format.byte_per_pixel())
    }

    pub fn data(&self, id: &str) -> Option<&[u8]> {
        self.entries.get(id).map(|e| e.pixels.data.as_slice())
    }

    /// CPU pixels of a stored texture.
    pub fn pixels(&self, id: &str) -> Option<&TexturePixels> {
        self.entries.get(id).map(|e| &e.pixels)
    }

    /// GPU handle, present once the texture has been uploaded.
    pub fn gpu(&self, id: &str) -> Option<&Texture2D> {
        self.entries.get(id).and_then(|e| e.gpu.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop one texture.
    pub fn remove(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Drop every texture (process-wide shutdown of the store).
    pub fn clear(&mut self) {
        info!("texture store cleared ({} textures)", self.entries.len());
        self.entries.clear();
        self.upload_cursor = 0;
    }

    /// Upload at most one dirty texture to the GPU, advancing a round-robin
    /// cursor so successive calls visit every texture in turn. Returns the
    /// key of the texture uploaded, if any.
    pub fn upload_next(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        let start = self.upload_cursor % keys.len();
        for offset in 0..keys.len() {
            let key = keys[(start + offset) % keys.len()].clone();
            self.upload_cursor = (start + offset + 1) % keys.len();
            let entry = match self.entries.get_mut(&key) {
                Some(entry) => entry,
                None => continue,
            };
            if !entry.dirty {
                continue;
            }
            upload_entry(entry, rl, thread);
            debug!("texture '{}' uploaded", key);
            return Some(key);
        }
        None
    }

    /// Upload every dirty texture immediately (startup path).
    pub fn upload_all(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread) {
        for entry in self.entries.values_mut() {
            if entry.dirty {
                upload_entry(entry, rl, thread);
            }
        }
    }
}

fn tga_to_pixels(img: TgaImage, filter: FilterMode) -> TexturePixels {
    // from_bytes only yields 1/3/4 bpp, so the format lookup cannot fail.
    let format =
        PixelFormat::from_byte_per_pixel(img.byte_per_pixel).unwrap_or(PixelFormat::Rgba);
    TexturePixels {
        width: img.width,
        height: img.height,
        format,
        filter,
        data: img.pixels,
    }
}

fn upload_entry(entry: &mut TextureEntry, rl: &mut RaylibHandle, thread: &RaylibThread) {
    let rgba = entry.pixels.to_rgba();
    let needs_new = match &entry.gpu {
        Some(tex) => {
            tex.width() as u32 != entry.pixels.width || tex.height() as u32 != entry.pixels.height
        }
        None => true,
    };
    if needs_new {
        let image = Image::gen_image_color(
            entry.pixels.width as i32,
            entry.pixels.height as i32,
            Color::WHITE,
        );
        match rl.load_texture_from_image(thread, &image) {
            Ok(tex) => entry.gpu = Some(tex),
            Err(e) => {
                log::error!("texture upload failed: {}", e);
                entry.dirty = false;
                return;
            }
        }
    }
    if let Some(tex) = entry.gpu.as_mut() {
        let _ = tex.update_texture(&rgba);
        tex.set_texture_filter(thread, entry.pixels.filter.to_raylib());
    }
    entry.dirty = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_texture_is_all_white() {
        let px = TexturePixels::blank(4, 2, PixelFormat::Rgb, FilterMode::Nearest);
        assert_eq!(px.data.len(), 4 * 2 * 3);
        assert!(px.data.iter().all(|&b| b == 255));
    }

    #[test]
    fn replace_from_buffer_validates_length() {
        let mut store = TextureStore::new();
        let err = store.replace_from_buffer(
            "t",
            &[0u8; 10],
            2,
            2,
            PixelFormat::Rgba,
            FilterMode::Nearest,
        );
        assert!(err.is_err());
        assert!(!store.contains("t"));

        store
            .replace_from_buffer("t", &[0u8; 16], 2, 2, PixelFormat::Rgba, FilterMode::Nearest)
            .unwrap();
        assert_eq!(store.size("t"), Some((2, 2)));
        assert_eq!(store.byte_per_pixel("t"), Some(4));
    }

    #[test]
    fn blur_flattens_an_impulse() {
        let mut px = TexturePixels::blank(3, 3, PixelFormat::Luminance, FilterMode::Nearest);
        px.data = vec![0; 9];
        px.data[4] = 90; // centre impulse
        px.blur(1);
        // Every 3x3 neighbourhood (clamped) of this image contains the
        // impulse exactly once, so every pixel becomes 90/9 = 10.
        assert_eq!(px.data[4], 10);
        assert_eq!(px.data[0], 10);
        assert!(px.data.iter().all(|&v| v > 0));
    }

    #[test]
    fn blur_preserves_constant_images() {
        let mut px = TexturePixels::blank(4, 4, PixelFormat::Rgb, FilterMode::Nearest);
        let before = px.data.clone();
        px.blur(3);
        assert_eq!(px.data, before);
    }

    #[test]
    fn luminance_expands_to_rgba() {
        let px = TexturePixels {
            width: 1,
            height: 1,
            format: PixelFormat::Luminance,
            filter: FilterMode::Nearest,
            data: vec![100],
        };
        assert_eq!(px.to_rgba(), vec![100, 100, 100, 255]);
    }

    #[test]
    fn set_filter_all_touches_every_entry() {
        let mut store = TextureStore::new();
        store.create_blank("a", 2, 2, PixelFormat::Rgba, FilterMode::Nearest);
        store.create_blank("b", 2, 2, PixelFormat::Rgba, FilterMode::Nearest);
        store.set_filter_all(FilterMode::Trilinear);
        for id in ["a", "b"] {
            let entry = store.entries.get(id).unwrap();
            assert_eq!(entry.pixels.filter, FilterMode::Trilinear);
            assert!(entry.dirty);
        }
    }

    #[test]
    fn remove_and_clear() {
        let mut store = TextureStore::new();
        store.create_blank("a", 2, 2, PixelFormat::Rgba, FilterMode::Nearest);
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        store.create_blank("b", 2, 2, PixelFormat::Rgba, FilterMode::Nearest);
        store.clear();
        assert!(store.is_empty());
    }
}
