//! Text rendering for watermarks.
//!
//! Text is drawn straight onto an RGBA overlay. A scalable font is used when
//! one could be loaded, with DejaVu Sans Mono compiled in as the last scalable
//! choice. The built-in bitmap font only takes over if that fails to parse.

use ab_glyph::{Font, FontVec, GlyphId, PxScale, PxScaleFont, ScaleFont};
use image::{Rgba, RgbaImage};
use std::path::Path;

use super::bitmap_font;
use crate::constants::SYSTEM_FONT_CANDIDATES;

const EMBEDDED_FONT: &[u8] = include_bytes!("fonts/DejaVuSansMono.ttf");

pub enum WatermarkFont {
    Scalable(FontVec),
    Bitmap,
}

impl std::fmt::Debug for WatermarkFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatermarkFont::Scalable(_) => f.write_str("WatermarkFont::Scalable"),
            WatermarkFont::Bitmap => f.write_str("WatermarkFont::Bitmap"),
        }
    }
}

impl WatermarkFont {
    /// Load the configured font, then the first usable system font, then the
    /// embedded font, then the bitmap font.
    pub fn load(configured: Option<&str>) -> Self {
        if let Some(path) = configured {
            match Self::from_file(Path::new(path)) {
                Some(font) => {
                    tracing::info!("Watermark font loaded from {}", path);
                    return font;
                }
                None => tracing::warn!("Watermark font {} could not be loaded", path),
            }
        }

        for candidate in SYSTEM_FONT_CANDIDATES {
            if let Some(font) = Self::from_file(Path::new(candidate)) {
                tracing::info!("Watermark font loaded from {}", candidate);
                return font;
            }
        }

        if let Some(font) = Self::embedded() {
            tracing::info!("Watermark font: embedded DejaVu Sans Mono");
            return font;
        }

        tracing::warn!("No scalable font available, falling back to built-in bitmap font");
        WatermarkFont::Bitmap
    }

    pub fn embedded() -> Option<Self> {
        FontVec::try_from_vec(EMBEDDED_FONT.to_vec())
            .ok()
            .map(WatermarkFont::Scalable)
    }

    pub fn from_file(path: &Path) -> Option<Self> {
        let data = std::fs::read(path).ok()?;
        FontVec::try_from_vec(data)
            .ok()
            .map(WatermarkFont::Scalable)
    }

    /// Bounding box (width, height) of `text` at `font_size` pixels.
    ///
    /// The bitmap font ignores `font_size`.
    pub fn measure(&self, text: &str, font_size: f32) -> (u32, u32) {
        match self {
            WatermarkFont::Scalable(font) => {
                let scaled = font.as_scaled(PxScale::from(font_size));
                let width = layout_width(&scaled, text);
                (width.ceil().max(0.0) as u32, scaled.height().ceil() as u32)
            }
            WatermarkFont::Bitmap => bitmap_font::measure(text),
        }
    }

    /// Draw `text` with its bounding box's top-left corner at `origin`.
    ///
    /// Each pixel's alpha is `coverage * color.alpha`. Pixels outside the
    /// canvas are dropped.
    pub fn draw(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        font_size: f32,
        origin: (i32, i32),
        color: Rgba<u8>,
    ) {
        match self {
            WatermarkFont::Scalable(font) => draw_scalable(font, canvas, text, font_size, origin, color),
            WatermarkFont::Bitmap => {
                bitmap_font::for_each_pixel(text, |x, y| {
                    put_clipped(canvas, origin.0 + x, origin.1 + y, color, 1.0);
                });
            }
        }
    }
}

fn layout_width(scaled: &PxScaleFont<&FontVec>, text: &str) -> f32 {
    let mut width = 0.0f32;
    let mut prev: Option<GlyphId> = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }

    width
}

fn draw_scalable(
    font: &FontVec,
    canvas: &mut RgbaImage,
    text: &str,
    font_size: f32,
    origin: (i32, i32),
    color: Rgba<u8>,
) {
    let scale = PxScale::from(font_size);
    let scaled = font.as_scaled(scale);
    let baseline_y = origin.1 as f32 + scaled.ascent();

    let mut cursor_x = origin.0 as f32;
    let mut prev: Option<GlyphId> = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            cursor_x += scaled.kern(prev, id);
        }

        let glyph = id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = bounds.min.x as i32 + px as i32;
                let y = bounds.min.y as i32 + py as i32;
                put_clipped(canvas, x, y, color, coverage);
            });
        }

        cursor_x += scaled.h_advance(id);
        prev = Some(id);
    }
}

fn put_clipped(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32 {
        return;
    }

    let alpha = (coverage.clamp(0.0, 1.0) * color[3] as f32).round() as u8;
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    // Overlapping glyph edges keep the stronger coverage.
    if alpha > pixel[3] {
        *pixel = Rgba([color[0], color[1], color[2], alpha]);
    }
}
