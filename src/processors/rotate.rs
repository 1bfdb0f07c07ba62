// vimage/src/processors/rotate.rs
use crate::context::DrawingContext;
use crate::core::{ensure_non_empty, BufferProcessor, PixelBuffer, ProcessError, Result};
use image::Rgba;

/// Rotates clockwise about the image center.
#[derive(Debug, Clone)]
pub struct RotateProcessor {
    degrees: f64,
    background: Rgba<u8>,
    keep_size: bool,
}

impl RotateProcessor {
    pub fn new(degrees: f64) -> Result<Self> {
        if !degrees.is_finite() {
            return Err(ProcessError::InvalidParameter(format!(
                "Rotation angle must be finite, got {}",
                degrees
            )));
        }
        Ok(Self {
            degrees,
            background: Rgba([0, 0, 0, 0]),
            keep_size: false,
        })
    }

    /// Fill for the area the rotated image does not cover.
    pub fn with_background(mut self, background: Rgba<u8>) -> Self {
        self.background = background;
        self
    }

    /// Keep the source dimensions instead of growing to fit the rotation.
    pub fn with_keep_size(mut self, keep_size: bool) -> Self {
        self.keep_size = keep_size;
        self
    }

    pub fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        if self.keep_size {
            return (width, height);
        }
        let angle = self.degrees.to_radians();
        let (sin, cos) = (angle.sin().abs(), angle.cos().abs());
        let (w, h) = (width as f64, height as f64);
        // Trim float noise so quarter turns swap sides exactly.
        let fit = |v: f64| ((v - 1e-9).ceil().max(1.0)) as u32;
        (fit(w * cos + h * sin), fit(w * sin + h * cos))
    }
}

impl BufferProcessor for RotateProcessor {
    fn name(&self) -> &'static str {
        "rotate"
    }

    fn process(&self, image: PixelBuffer) -> Result<PixelBuffer> {
        ensure_non_empty(&image, "Rotate")?;
        let (width, height) = self.output_size(image.width(), image.height());
        log::debug!(
            "Rotating {}x{} by {} degrees into {}x{}",
            image.width(),
            image.height(),
            self.degrees,
            width,
            height
        );

        let mut ctx = DrawingContext::new(width, height);
        ctx.set_color(self.background);
        ctx.clear();

        ctx.push();
        ctx.translate(width as f64 / 2.0, height as f64 / 2.0);
        ctx.rotate(self.degrees.to_radians());
        ctx.translate(-(image.width() as f64) / 2.0, -(image.height() as f64) / 2.0);
        ctx.draw_image(&image, 0.0, 0.0);
        ctx.pop();

        Ok(ctx.into_image())
    }
}
