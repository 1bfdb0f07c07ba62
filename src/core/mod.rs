// vimage/src/core/mod.rs
pub mod geometry;
pub mod pipeline;

use thiserror::Error;

pub use geometry::{Anchor, CropOrigin, Position, Region, ResizeMode};
pub use pipeline::{
    process_bytes, run_in_context, BufferProcessor, ContextProcessor, Pipeline, PipelineStats, Step,
};

/// The pixel grid every processor consumes and produces.
pub type PixelBuffer = image::RgbaImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeAlgorithm {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
    Lanczos3,
}

/// Options applied around a pipeline run: decode limits and encoder settings.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub quality: u8,
    pub optimize_png: bool,
    pub max_dimensions: Option<(u32, u32)>,
}

#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub processed_count: usize,
    pub total_size_before: u64,
    pub total_size_after: u64,
    pub errors: Vec<(String, String)>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            quality: 90,
            optimize_png: false,
            max_dimensions: Some((100_000, 100_000)),
        }
    }
}

impl ProcessOptions {
    pub fn validate(&self) -> Result<()> {
        if self.quality == 0 || self.quality > 100 {
            return Err(ProcessError::InvalidParameter(
                "Quality must be between 1 and 100".to_string(),
            ));
        }

        if let Some((width, height)) = self.max_dimensions {
            if width == 0 || height == 0 {
                return Err(ProcessError::InvalidParameter(
                    "Maximum dimensions must be positive".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Geometry mismatch: {0}")]
    GeometryMismatch(String),

    #[error("Step {index} ({step}) failed: {source}")]
    ChainFailure {
        index: usize,
        step: &'static str,
        #[source]
        source: Box<ProcessError>,
    },

    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Security error: {0}")]
    SecurityError(String),

    #[error("Memory limit exceeded: {0}")]
    MemoryLimitExceeded(String),
}

impl ProcessError {
    /// Unwraps any `ChainFailure` layers down to the error that started it.
    pub fn root_cause(&self) -> &ProcessError {
        match self {
            ProcessError::ChainFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProcessError>;

pub fn validate_options(options: &ProcessOptions) -> Result<()> {
    options.validate()
}

pub(crate) fn ensure_non_empty(image: &PixelBuffer, operation: &str) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ProcessError::InvalidParameter(format!(
            "{} requires a non-empty image, got {}x{}",
            operation,
            image.width(),
            image.height()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        assert!(ProcessOptions::default().validate().is_ok());
    }

    #[test]
    fn quality_out_of_range_is_rejected() {
        let options = ProcessOptions {
            quality: 0,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ProcessError::InvalidParameter(_))
        ));
    }

    #[test]
    fn root_cause_unwraps_nested_chain_failures() {
        let inner = ProcessError::GeometryMismatch("not square".to_string());
        let err = ProcessError::ChainFailure {
            index: 1,
            step: "outer",
            source: Box::new(ProcessError::ChainFailure {
                index: 0,
                step: "inner",
                source: Box::new(inner),
            }),
        };
        assert!(matches!(err.root_cause(), ProcessError::GeometryMismatch(_)));
    }
}
