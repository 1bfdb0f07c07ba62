// vimage/src/lib.rs
//! Composable image transforms.
//!
//! A [`Pipeline`] chains two kinds of step: [`BufferProcessor`]s that map one
//! pixel buffer to another, and [`ContextProcessor`]s that draw into a shared
//! [`DrawingContext`]. Consecutive context steps share one context, which is
//! flattened back into a buffer before the next buffer step.

pub mod cli;
pub mod context;
pub mod core;
pub mod font;
pub mod generate;
pub mod processors;
pub mod utils;

pub use crate::context::DrawingContext;
pub use crate::core::{
    run_in_context, process_bytes, validate_options, Anchor, BufferProcessor, ContextProcessor,
    PixelBuffer, Pipeline, PipelineStats, Position, ProcessError, ProcessOptions, ProcessingStats,
    Region, ResizeAlgorithm, ResizeMode, Result, Step,
};
pub use crate::font::{FileFontProvider, FontCache, FontFace, FontProvider};
pub use crate::processors::{BatchProcessor, Decoder, Encoder};

pub mod prelude {
    pub use crate::core::{
        Anchor, BufferProcessor, ContextProcessor, PixelBuffer, Pipeline, Position, Region,
        ResizeAlgorithm, ResizeMode,
    };
    pub use crate::processors::prelude::*;
    pub use crate::{DrawingContext, FontFace};
}
