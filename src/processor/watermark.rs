//! Watermark stamping.
//!
//! `Watermarker::stamp` decodes an uploaded image, renders the watermark text
//! centered on a transparent overlay, composites it onto the image and
//! re-encodes the result as an opaque JPEG. The input bytes are never
//! modified.

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, Rgba, RgbaImage};
use thiserror::Error;

use super::text_renderer::WatermarkFont;
use crate::config::WatermarkConfig;

#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error("image could not be decoded: {0}")]
    Decode(String),

    #[error("image could not be encoded: {0}")]
    Encode(String),
}

#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    /// Font size is `image width / font_divisor`.
    pub font_divisor: u32,
    /// Text alpha out of 255.
    pub opacity: u8,
    pub jpeg_quality: u8,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self::from(&WatermarkConfig::default())
    }
}

impl From<&WatermarkConfig> for WatermarkOptions {
    fn from(config: &WatermarkConfig) -> Self {
        Self {
            font_divisor: config.font_divisor.max(1),
            opacity: config.opacity,
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
        }
    }
}

#[derive(Debug)]
pub struct Watermarker {
    font: WatermarkFont,
    options: WatermarkOptions,
}

impl Watermarker {
    pub fn new(font: WatermarkFont, options: WatermarkOptions) -> Self {
        Self { font, options }
    }

    pub fn from_config(config: &WatermarkConfig) -> Self {
        let font = WatermarkFont::load(config.font_path.as_deref());
        Self::new(font, WatermarkOptions::from(config))
    }

    /// Font size used for an image of the given width.
    pub fn font_size_for(&self, image_width: u32) -> f32 {
        (image_width / self.options.font_divisor).max(1) as f32
    }

    /// Stamp `text` onto the image in `image_bytes` and return JPEG bytes.
    pub fn stamp(&self, image_bytes: &[u8], text: &str) -> Result<Vec<u8>, WatermarkError> {
        if image_bytes.is_empty() {
            return Err(WatermarkError::Decode("empty input".to_string()));
        }

        let decoded =
            image::load_from_memory(image_bytes).map_err(|e| WatermarkError::Decode(e.to_string()))?;
        let mut base = decoded.to_rgba8();

        if !text.is_empty() {
            let overlay = self.render_overlay(base.width(), base.height(), text);
            imageops::overlay(&mut base, &overlay, 0, 0);
        }

        let flattened = DynamicImage::ImageRgba8(base).to_rgb8();

        let mut output = Vec::new();
        {
            let mut encoder =
                JpegEncoder::new_with_quality(&mut output, self.options.jpeg_quality);
            encoder
                .encode_image(&flattened)
                .map_err(|e| WatermarkError::Encode(e.to_string()))?;
        }

        Ok(output)
    }

    fn render_overlay(&self, width: u32, height: u32, text: &str) -> RgbaImage {
        let mut overlay = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 0]));

        let font_size = self.font_size_for(width);
        let (text_w, text_h) = self.font.measure(text, font_size);
        let origin = (
            (width as i64 - text_w as i64) / 2,
            (height as i64 - text_h as i64) / 2,
        );

        self.font.draw(
            &mut overlay,
            text,
            font_size,
            (origin.0 as i32, origin.1 as i32),
            Rgba([255, 255, 255, self.options.opacity]),
        );

        overlay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_jpeg, sample_png_with_alpha};

    fn bitmap_watermarker() -> Watermarker {
        Watermarker::new(WatermarkFont::Bitmap, WatermarkOptions::default())
    }

    #[test]
    fn test_stamp_preserves_dimensions() {
        let wm = bitmap_watermarker();
        let input = sample_jpeg(320, 200);

        let output = wm.stamp(&input, "NACHO LINGUA").unwrap();
        let decoded = image::load_from_memory(&output).unwrap();

        assert_eq!(decoded.width(), 320);
        assert_eq!(decoded.height(), 200);
    }

    #[test]
    fn test_stamp_outputs_jpeg() {
        let wm = bitmap_watermarker();
        let output = wm.stamp(&sample_png_with_alpha(64, 64), "X").unwrap();

        assert_eq!(
            image::guess_format(&output).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_stamp_does_not_mutate_input() {
        let wm = bitmap_watermarker();
        let input = sample_jpeg(120, 80);
        let copy = input.clone();

        wm.stamp(&input, "PORTFOLIO").unwrap();
        assert_eq!(input, copy);
    }

    #[test]
    fn test_stamp_tiny_image_with_overflowing_text() {
        let wm = bitmap_watermarker();
        let input = sample_jpeg(6, 4);

        let output = wm.stamp(&input, "A VERY LONG WATERMARK TEXT").unwrap();
        let decoded = image::load_from_memory(&output).unwrap();

        assert_eq!((decoded.width(), decoded.height()), (6, 4));
    }

    #[test]
    fn test_stamp_brightens_center() {
        let wm = Watermarker::new(
            WatermarkFont::Bitmap,
            WatermarkOptions {
                opacity: 255,
                ..WatermarkOptions::default()
            },
        );
        let black = {
            let img = image::RgbImage::from_pixel(200, 100, image::Rgb([0, 0, 0]));
            let mut buf = std::io::Cursor::new(Vec::new());
            img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
            buf.into_inner()
        };

        let output = wm.stamp(&black, "HHHH").unwrap();
        let decoded = image::load_from_memory(&output).unwrap().to_rgb8();

        let (w, h) = crate::processor::bitmap_font::measure("HHHH");
        let x0 = (200 - w) / 2;
        let y0 = (100 - h) / 2;
        let brightest_center = (x0..x0 + w)
            .flat_map(|x| (y0..y0 + h).map(move |y| (x, y)))
            .map(|(x, y)| decoded.get_pixel(x, y)[0])
            .max()
            .unwrap();
        let corner = decoded.get_pixel(0, 0)[0];

        assert!(brightest_center > 200);
        assert!(corner < 30);
    }

    #[test]
    fn test_scalable_stamp_centers_text() {
        let font = WatermarkFont::embedded().unwrap();
        let wm = Watermarker::new(
            font,
            WatermarkOptions {
                opacity: 255,
                ..WatermarkOptions::default()
            },
        );
        let black = {
            let img = image::RgbImage::from_pixel(240, 120, image::Rgb([0, 0, 0]));
            let mut buf = std::io::Cursor::new(Vec::new());
            img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
            buf.into_inner()
        };

        let output = wm.stamp(&black, "HHHH").unwrap();
        let decoded = image::load_from_memory(&output).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (240, 120));

        let lit: Vec<(u32, u32)> = decoded
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] > 128)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!lit.is_empty());

        let n = lit.len() as f64;
        let cx = lit.iter().map(|(x, _)| *x as f64).sum::<f64>() / n;
        let cy = lit.iter().map(|(_, y)| *y as f64).sum::<f64>() / n;
        assert!((cx - 120.0).abs() < 12.0, "centroid x {}", cx);
        assert!((cy - 60.0).abs() < 12.0, "centroid y {}", cy);

        for (x, y) in [(0, 0), (239, 0), (0, 119), (239, 119)] {
            assert!(decoded.get_pixel(x, y)[0] < 30);
        }
    }

    #[test]
    fn test_empty_input_is_decode_error() {
        let wm = bitmap_watermarker();
        assert!(matches!(wm.stamp(&[], "X"), Err(WatermarkError::Decode(_))));
    }

    #[test]
    fn test_garbage_input_is_decode_error() {
        let wm = bitmap_watermarker();
        let result = wm.stamp(b"definitely not an image", "X");
        assert!(matches!(result, Err(WatermarkError::Decode(_))));
    }

    #[test]
    fn test_font_size_scales_with_width() {
        let wm = bitmap_watermarker();
        assert_eq!(wm.font_size_for(1200), 100.0);
        assert_eq!(wm.font_size_for(5), 1.0);
    }

    #[test]
    fn test_empty_text_still_reencodes() {
        let wm = bitmap_watermarker();
        let output = wm.stamp(&sample_jpeg(10, 10), "").unwrap();
        assert!(image::load_from_memory(&output).is_ok());
    }

    #[test]
    fn test_options_from_config_clamps() {
        let config = WatermarkConfig {
            font_divisor: 0,
            jpeg_quality: 0,
            ..WatermarkConfig::default()
        };
        let options = WatermarkOptions::from(&config);

        assert_eq!(options.font_divisor, 1);
        assert_eq!(options.jpeg_quality, 1);
        assert_eq!(options.opacity, 100);
    }
}
