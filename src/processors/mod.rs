// vimage/src/processors/mod.rs
mod batch;
mod circle;
mod compressor;
mod crop;
mod loader;
mod mosaic;
mod noise;
mod overlay;
mod resize;
mod rotate;
mod rounded;
mod shapes;
pub mod text;
mod watermark;

pub use batch::{calculate_overall_savings, BatchProcessor};
pub use circle::CircleMaskProcessor;
pub use compressor::Encoder;
pub use crop::{CropProcessor, SquareProcessor};
pub use loader::Decoder;
pub use mosaic::{blurred_region, tile_jitter, tile_size, Direction, MosaicProcessor};
pub use noise::NoiseProcessor;
pub use overlay::{apply_opacity, OverlayProcessor, Placement};
pub use resize::ResizeProcessor;
pub use rotate::RotateProcessor;
pub use rounded::{corner_falloff, RoundedCornerProcessor, ANTIALIAS_BAND};
pub use shapes::{DrawCircleProcessor, DrawRectProcessor};
pub use text::{wrap_text, Align, TextMeasure, TextProcessor, WrapMode};
pub use watermark::WatermarkProcessor;

pub mod prelude {
    pub use super::{
        BatchProcessor, CircleMaskProcessor, CropProcessor, Decoder, DrawCircleProcessor,
        DrawRectProcessor, Encoder, MosaicProcessor, NoiseProcessor, OverlayProcessor,
        ResizeProcessor, RotateProcessor, RoundedCornerProcessor, SquareProcessor, TextProcessor,
        WatermarkProcessor,
    };
}
