// vimage/src/processors/loader.rs
use crate::core::{PixelBuffer, ProcessError, Result};
use crate::utils::image_format_to_string;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Decoder {
    max_dimensions: Option<(u32, u32)>,
}

impl Decoder {
    pub fn new(max_dimensions: Option<(u32, u32)>) -> Self {
        Self { max_dimensions }
    }

    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_dimensions = Some((width, height));
        self
    }

    pub fn decode(&self, data: &[u8]) -> Result<(PixelBuffer, ImageFormat)> {
        if data.is_empty() {
            return Err(ProcessError::DecodeFailure("Input is empty".to_string()));
        }

        let format = image::guess_format(data)
            .map_err(|e| ProcessError::DecodeFailure(format!("Unrecognized image data: {}", e)))?;

        // Header-only read so oversized images fail before allocation.
        let (width, height) = ImageReader::with_format(Cursor::new(data), format)
            .into_dimensions()
            .map_err(|e| ProcessError::DecodeFailure(format!("Failed to read image header: {}", e)))?;
        self.check_dimensions(width, height)?;

        let image = ImageReader::with_format(Cursor::new(data), format)
            .decode()
            .map_err(|e| ProcessError::DecodeFailure(format!("Failed to decode image: {}", e)))?
            .into_rgba8();

        log::debug!(
            "Decoded {} image: {}x{} pixels",
            image_format_to_string(format),
            width,
            height
        );
        Ok((image, format))
    }

    pub fn load(&self, path: &Path) -> Result<(PixelBuffer, ImageFormat)> {
        log::debug!("Loading image from: {}", path.display());
        self.validate_path(path)?;

        let data = std::fs::read(path)?;
        let (image, format) = self.decode(&data)?;
        log::info!(
            "Loaded image: {} ({}x{}, {})",
            path.display(),
            image.width(),
            image.height(),
            image_format_to_string(format)
        );
        Ok((image, format))
    }

    fn check_dimensions(&self, width: u32, height: u32) -> Result<()> {
        if let Some((max_w, max_h)) = self.max_dimensions {
            if width > max_w || height > max_h {
                return Err(ProcessError::MemoryLimitExceeded(format!(
                    "Image dimensions {}x{} exceed maximum {}x{}",
                    width, height, max_w, max_h
                )));
            }
        }
        Ok(())
    }

    fn validate_path(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(ProcessError::InvalidParameter(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        if path.metadata()?.len() == 0 {
            return Err(ProcessError::DecodeFailure(format!(
                "File is empty: {}",
                path.display()
            )));
        }

        Ok(())
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(Some((100_000, 100_000)))
    }
}
