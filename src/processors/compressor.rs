// vimage/src/processors/compressor.rs
use crate::core::{PixelBuffer, ProcessError, ProcessOptions, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use oxipng::{optimize_from_memory, Options};
use std::io::Cursor;
use std::path::Path;

/// Encodes buffers back into bytes, in the format they were decoded from
/// where the codec supports it.
#[derive(Debug, Clone)]
pub struct Encoder {
    quality: u8,
    optimize_png: bool,
}

impl Encoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            optimize_png: false,
        }
    }

    pub fn from_options(options: &ProcessOptions) -> Self {
        Self::new(options.quality).with_png_optimization(options.optimize_png)
    }

    pub fn with_png_optimization(mut self, optimize: bool) -> Self {
        self.optimize_png = optimize;
        self
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn encode(&self, image: &PixelBuffer, format: ImageFormat) -> Result<Vec<u8>> {
        log::debug!(
            "Encoding {}x{} image as {:?}, quality: {}",
            image.width(),
            image.height(),
            format,
            self.quality
        );

        match format {
            ImageFormat::Jpeg => self.encode_jpeg(image),
            ImageFormat::Png => self.encode_png(image),
            other if other.writing_enabled() => {
                let mut buffer = Cursor::new(Vec::new());
                image.write_to(&mut buffer, other)?;
                Ok(buffer.into_inner())
            }
            other => {
                log::warn!("No encoder for {:?}, writing PNG instead", other);
                self.encode_png(image)
            }
        }
    }

    fn encode_jpeg(&self, image: &PixelBuffer) -> Result<Vec<u8>> {
        // JPEG has no alpha channel.
        let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
        let mut buffer = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, self.quality))?;
        Ok(buffer)
    }

    fn encode_png(&self, image: &PixelBuffer) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png)?;

        if self.optimize_png {
            return optimize_from_memory(&buffer.into_inner(), &Options::default()).map_err(|e| {
                ProcessError::UnsupportedFormat(format!("PNG optimization failed: {}", e))
            });
        }
        Ok(buffer.into_inner())
    }

    /// Writes `image` to `path`, picking the format from the extension.
    /// Returns the written size in bytes.
    pub fn save(&self, image: &PixelBuffer, path: &Path) -> Result<u64> {
        let format = detect_format(path)?;
        let data = self.encode(image, format)?;
        std::fs::write(path, &data)?;
        log::info!("Saved image: {} ({} bytes)", path.display(), data.len());
        Ok(data.len() as u64)
    }

    pub fn calculate_savings(&self, original_size: u64, compressed_size: u64) -> f64 {
        if original_size == 0 {
            return 0.0;
        }

        let savings = (original_size as f64 - compressed_size as f64) / original_size as f64 * 100.0;
        savings.max(0.0)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::from_options(&ProcessOptions::default())
    }
}

fn detect_format(path: &Path) -> Result<ImageFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| {
            ProcessError::UnsupportedFormat(format!("No file extension: {}", path.display()))
        })?;

    ImageFormat::from_extension(extension)
        .filter(|format| format.writing_enabled())
        .ok_or_else(|| ProcessError::UnsupportedFormat(format!("Cannot write .{} files", extension)))
}
