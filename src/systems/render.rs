use bevy_ecs::prelude::*;
use raylib::prelude::*;

use crate::components::screentext::ScreenText;
use crate::resources::camera::CameraRes;
use crate::resources::fontstore::{self, Font, FontStore, GLYPH_HEIGHT};
use crate::resources::particles::{DstBlend, ParticleSim, SrcBlend};
use crate::resources::texturestore::{FilterMode, PixelFormat, TextureStore};

/// One dirty texture is uploaded per frame, then the particle pool is drawn
/// as camera-facing billboards inside a 3D scope and screen texts are drawn
/// on top with their bitmap fonts.
pub fn render_system(world: &mut World) {
    let Some(mut rl) = world.remove_non_send_resource::<RaylibHandle>() else {
        return;
    };
    let Some(thread) = world.remove_non_send_resource::<RaylibThread>() else {
        world.insert_non_send_resource(rl);
        return;
    };

    {
        let mut textures = world.non_send_resource_mut::<TextureStore>();
        textures.upload_next(&mut rl, &thread);
    }

    // Collect text items up front; drawing below holds shared borrows of the
    // stores and the query needs the world to itself.
    let texts: Vec<ScreenText> = {
        let mut q = world.query::<&ScreenText>();
        q.iter(world).cloned().collect()
    };

    let camera = world.resource::<CameraRes>().0;
    let mut d = rl.begin_drawing(&thread);
    d.clear_background(Color::BLACK);

    let sim = world.resource::<ParticleSim>();
    let textures = world.non_send_resource::<TextureStore>();
    {
        let mut d3 = d.begin_mode3D(camera);
        for idx in sim.draw_order(camera.position) {
            let particle = &sim.particles()[idx];
            let Some(frame) = particle.frame() else {
                continue;
            };
            let Some(tex) = textures.gpu(frame) else {
                continue;
            };
            let mode = blend_mode_for(particle.params.src_blend, particle.params.dst_blend);
            let size = particle.size();
            let src = Rectangle {
                x: 0.0,
                y: 0.0,
                width: tex.width as f32,
                height: tex.height as f32,
            };
            let mut db = d3.begin_blend_mode(mode);
            db.draw_billboard_pro(
                camera,
                **tex,
                src,
                particle.params.position,
                Vector3::up(),
                Vector2::new(size, size),
                Vector2::new(size * 0.5, size * 0.5),
                particle.params.angle,
                color_from_vec4(particle.color()),
            );
        }
    }

    let fonts = world.resource::<FontStore>();
    for item in &texts {
        let font = match &item.font_id {
            Some(id) => fonts.get(id),
            None => fonts.bound(),
        };
        if let Some(font) = font {
            draw_string(
                &mut d,
                font,
                textures,
                &item.text,
                item.pos,
                item.size,
                item.color,
            );
        }
    }

    drop(d);
    world.insert_non_send_resource(rl);
    world.insert_non_send_resource(thread);
}

/// Draw one string with a bitmap font. Newlines reset to the left edge one
/// line down; escape characters retint the remaining glyphs.
pub fn draw_string(
    d: &mut impl RaylibDraw,
    font: &Font,
    textures: &TextureStore,
    text: &str,
    origin: Vector2,
    size: f32,
    color: Color,
) {
    let Some(atlas) = textures.gpu(&font.texture_id) else {
        return;
    };
    let scale = size / GLYPH_HEIGHT as f32;
    let mut tint = color;
    let mut x = origin.x;
    let mut y = origin.y;
    for ch in text.chars() {
        if ch == '\n' {
            x = origin.x;
            y += size;
            continue;
        }
        if let Some(escape) = fontstore::escape_color(ch) {
            tint = escape;
            continue;
        }
        if let Some(glyph) = font.glyph(ch) {
            let src = Rectangle {
                x: glyph.x as f32,
                y: glyph.y as f32,
                width: glyph.width as f32,
                height: glyph.height as f32,
            };
            let dest = Rectangle {
                x,
                y,
                width: glyph.width as f32 * scale,
                height: size,
            };
            d.draw_texture_pro(atlas, src, dest, Vector2::zero(), 0.0, tint);
        }
        x += font.advance(size, ch);
    }
}

/// Grab the current framebuffer into the texture store under `id`, scaled
/// down to power-of-two dimensions so the atlas rules keep holding.
pub fn capture_screen(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    textures: &mut TextureStore,
    id: &str,
) -> Result<(), String> {
    let mut image = rl.load_image_from_screen(thread);
    let width = floor_pow2(image.width as u32);
    let height = floor_pow2(image.height as u32);
    image.resize(width as i32, height as i32);

    let colors = image.get_image_data();
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for c in colors.iter() {
        data.extend_from_slice(&[c.r, c.g, c.b, c.a]);
    }
    textures.replace_from_buffer(
        id,
        &data,
        width,
        height,
        PixelFormat::Rgba,
        FilterMode::Bilinear,
    )
}

/// Largest power of two at or below `n`, clamped to the 16..=512 atlas range.
fn floor_pow2(n: u32) -> u32 {
    let n = n.clamp(16, 512);
    1 << (31 - n.leading_zeros())
}

/// Closest raylib blend mode for a source/destination factor pair.
///
/// Raylib exposes fixed pipelines rather than free factor pairs, so the
/// common combinations map directly and everything else falls back to
/// standard alpha blending.
pub fn blend_mode_for(src: SrcBlend, dst: DstBlend) -> BlendMode {
    match (src, dst) {
        (SrcBlend::SrcAlpha, DstBlend::One) | (SrcBlend::One, DstBlend::One) => {
            BlendMode::BLEND_ADDITIVE
        }
        (SrcBlend::DstColor, DstBlend::Zero) | (SrcBlend::Zero, DstBlend::SrcColor) => {
            BlendMode::BLEND_MULTIPLIED
        }
        _ => BlendMode::BLEND_ALPHA,
    }
}

/// Vector4 colour in [0, 1] per channel to raylib's byte colour.
pub fn color_from_vec4(v: Vector4) -> Color {
    Color::new(
        (v.x.clamp(0.0, 1.0) * 255.0) as u8,
        (v.y.clamp(0.0, 1.0) * 255.0) as u8,
        (v.z.clamp(0.0, 1.0) * 255.0) as u8,
        (v.w.clamp(0.0, 1.0) * 255.0) as u8,
    )
}
