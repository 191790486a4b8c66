//! Asset pipeline integration tests: TGA files on disk through the texture
//! store and the font atlas scanner.

use duskengine::resources::fontstore::{Font, FontStore, GLYPH_HEIGHT};
use duskengine::resources::texturestore::{FilterMode, TextureStore};
use duskengine::tga::TgaImage;

/// Write an uncompressed top-down 32-bit TGA to `path`.
fn write_tga(path: &std::path::Path, width: u32, height: u32, bgra: &[u8]) {
    assert_eq!(bgra.len(), (width * height * 4) as usize);
    let mut bytes = Vec::with_capacity(18 + bgra.len());
    bytes.extend_from_slice(&[0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    bytes.extend_from_slice(&(width as u16).to_le_bytes());
    bytes.extend_from_slice(&(height as u16).to_le_bytes());
    bytes.push(32);
    bytes.push(0x28); // top-down, 8 alpha bits
    bytes.extend_from_slice(bgra);
    std::fs::write(path, bytes).unwrap();
}

/// Build a 512x512 atlas with glyphs for codes 33 and 34 in the first band:
/// `!` spanning columns 4..10 and `"` spanning columns 12..20.
fn atlas_pixels() -> Vec<u8> {
    let mut bgra = vec![0u8; 512 * 512 * 4];
    for (x0, x1) in [(4u32, 10u32), (12, 20)] {
        for y in 0..GLYPH_HEIGHT {
            for x in x0..x1 {
                let idx = ((y * 512 + x) * 4) as usize;
                bgra[idx..idx + 4].copy_from_slice(&[255, 255, 255, 255]);
            }
        }
    }
    bgra
}

#[test]
fn atlas_file_loads_into_store_and_font() {
    let path = std::env::temp_dir().join("duskengine_atlas_integration.tga");
    write_tga(&path, 512, 512, &atlas_pixels());

    let mut textures = TextureStore::new();
    textures
        .load_tga("atlas", path.to_str().unwrap(), FilterMode::Nearest)
        .unwrap();
    assert_eq!(textures.size("atlas"), Some((512, 512)));
    assert_eq!(textures.byte_per_pixel("atlas"), Some(4));

    let img = TgaImage::from_file(path.to_str().unwrap()).unwrap();
    let font = Font::from_atlas(&img, "atlas").unwrap();

    let bang = font.glyph('!').unwrap();
    assert_eq!((bang.x, bang.width), (4, 6));
    let quote = font.glyph('"').unwrap();
    assert_eq!((quote.x, quote.width), (12, 8));
    assert!(font.glyph('#').is_none());

    // Advance scales glyph width by size over the 64px band height.
    assert!((font.advance(64.0, '!') - 6.0).abs() < 1e-6);
    assert!((font.advance(32.0, ' ') - 32.0 / 3.0).abs() < 1e-6);

    let mut fonts = FontStore::new();
    fonts.add("console", font);
    // First font added becomes the bound default.
    assert!(fonts.bound().is_some());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn store_blur_marks_without_breaking_geometry() {
    let path = std::env::temp_dir().join("duskengine_blur_integration.tga");
    // Flat grey 16x16 so the blur is a no-op on values.
    let bgra: Vec<u8> = std::iter::repeat([90u8, 90, 90, 255])
        .take(16 * 16)
        .flatten()
        .collect();
    write_tga(&path, 16, 16, &bgra);

    let mut textures = TextureStore::new();
    textures
        .load_tga("grey", path.to_str().unwrap(), FilterMode::Linear)
        .unwrap();
    textures.blur("grey", 2).unwrap();

    assert_eq!(textures.size("grey"), Some((16, 16)));
    let data = textures.data("grey").unwrap();
    assert_eq!(data.len(), 16 * 16 * 4);
    assert_eq!(&data[0..3], &[90, 90, 90]);

    assert!(textures.remove("grey"));
    assert!(!textures.contains("grey"));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn non_pow2_files_are_refused_by_the_store() {
    let path = std::env::temp_dir().join("duskengine_npot_integration.tga");
    let bgra: Vec<u8> = std::iter::repeat([0u8, 0, 0, 255]).take(20 * 16).flatten().collect();
    write_tga(&path, 20, 16, &bgra);

    let mut textures = TextureStore::new();
    assert!(
        textures
            .load_tga("bad", path.to_str().unwrap(), FilterMode::Nearest)
            .is_err()
    );
    assert!(textures.is_empty());

    let _ = std::fs::remove_file(&path);
}
