//! Minimal TGA (Truevision Targa) decoder for engine assets.
//!
//! Only the subset the asset pipeline produces is accepted: uncompressed
//! true-color (type 2) and grayscale (type 3) images, 8/24/32 bits per
//! pixel. Pixel data is returned top-down in RGB(A)/luminance byte order,
//! regardless of the file's row order or BGR channel layout.
//!
//! Atlas call sites additionally require power-of-two dimensions between
//! 16 and 512; use [`TgaImage::require_pow2`] for that check.

use std::fs;
use std::path::Path;

/// Raw TGA file header, 18 bytes.
const HEADER_LEN: usize = 18;

/// Uncompressed true-color image (24/32 bpp).
const TYPE_TRUECOLOR: u8 = 2;
/// Uncompressed grayscale image (8 bpp).
const TYPE_GRAYSCALE: u8 = 3;

/// Descriptor bit set when rows are stored top-down.
const DESC_TOP_ORIGIN: u8 = 0x20;

/// A decoded TGA image.
///
/// `pixels` holds rows top-down, `byte_per_pixel` channels per pixel:
/// 1 = luminance, 3 = RGB, 4 = RGBA.
#[derive(Debug, Clone, PartialEq)]
pub struct TgaImage {
    pub width: u32,
    pub height: u32,
    pub byte_per_pixel: u32,
    pub pixels: Vec<u8>,
}

impl TgaImage {
    /// Decode a TGA file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| format!("failed to read TGA file {}: {}", path.display(), e))?;
        Self::from_bytes(&bytes)
            .map_err(|e| format!("invalid TGA file {}: {}", path.display(), e))
    }

    /// Decode a TGA image from an in-memory byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() < HEADER_LEN {
            return Err(format!(
                "truncated header ({} bytes, need {})",
                bytes.len(),
                HEADER_LEN
            ));
        }

        let id_len = bytes[0] as usize;
        let colormap_type = bytes[1];
        let image_type = bytes[2];
        let width = u16::from_le_bytes([bytes[12], bytes[13]]) as u32;
        let height = u16::from_le_bytes([bytes[14], bytes[15]]) as u32;
        let bpp_bits = bytes[16];
        let descriptor = bytes[17];

        if colormap_type != 0 {
            return Err("color-mapped TGA images are not supported".into());
        }
        match (image_type, bpp_bits) {
            (TYPE_TRUECOLOR, 24) | (TYPE_TRUECOLOR, 32) | (TYPE_GRAYSCALE, 8) => {}
            _ => {
                return Err(format!(
                    "unsupported image type {} at {} bpp (need uncompressed 8/24/32)",
                    image_type, bpp_bits
                ));
            }
        }
        if width == 0 || height == 0 {
            return Err(format!("degenerate dimensions {}x{}", width, height));
        }

        let byte_per_pixel = (bpp_bits / 8) as u32;
        // Widen before multiplying; a hostile header can claim 65535x65535
        // at 32 bpp, which overflows u32.
        let data_len = width as usize * height as usize * byte_per_pixel as usize;
        let data_start = HEADER_LEN + id_len;
        let data = bytes
            .get(data_start..data_start + data_len)
            .ok_or_else(|| {
                format!(
                    "truncated pixel data (need {} bytes after header)",
                    data_len
                )
            })?;

        let row_len = (width * byte_per_pixel) as usize;
        let top_down = descriptor & DESC_TOP_ORIGIN != 0;
        let mut pixels = Vec::with_capacity(data_len);
        for row in 0..height as usize {
            // TGA default origin is bottom-left; emit rows top-down.
            let src_row = if top_down {
                row
            } else {
                height as usize - 1 - row
            };
            let src = &data[src_row * row_len..(src_row + 1) * row_len];
            match byte_per_pixel {
                1 => pixels.extend_from_slice(src),
                3 => {
                    for px in src.chunks_exact(3) {
                        pixels.extend_from_slice(&[px[2], px[1], px[0]]);
                    }
                }
                _ => {
                    for px in src.chunks_exact(4) {
                        pixels.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                    }
                }
            }
        }

        Ok(TgaImage {
            width,
            height,
            byte_per_pixel,
            pixels,
        })
    }

    /// Require power-of-two dimensions in the 16..=512 range the atlas
    /// pipeline expects.
    pub fn require_pow2(&self) -> Result<(), String> {
        for dim in [self.width, self.height] {
            if !dim.is_power_of_two() || !(16..=512).contains(&dim) {
                return Err(format!(
                    "dimensions {}x{} are not powers of two in 16..=512",
                    self.width, self.height
                ));
            }
        }
        Ok(())
    }
}
