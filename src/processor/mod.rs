pub mod bitmap_font;
pub mod text_renderer;
pub mod watermark;

pub use text_renderer::WatermarkFont;
pub use watermark::{WatermarkError, WatermarkOptions, Watermarker};
