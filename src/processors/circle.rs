// vimage/src/processors/circle.rs
use crate::core::{ensure_non_empty, BufferProcessor, PixelBuffer, ProcessError, Result};
use image::Rgba;

/// Keeps the inscribed circle of a square image and makes everything outside
/// it fully transparent. The edge is hard, with no anti-aliasing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircleMaskProcessor;

impl CircleMaskProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl BufferProcessor for CircleMaskProcessor {
    fn name(&self) -> &'static str {
        "circle"
    }

    fn process(&self, mut image: PixelBuffer) -> Result<PixelBuffer> {
        ensure_non_empty(&image, "Circle mask")?;
        let (width, height) = image.dimensions();
        if width != height {
            return Err(ProcessError::GeometryMismatch(format!(
                "Circle mask input must be square, got {}x{}",
                width, height
            )));
        }

        let radius = width as f64 / 2.0;
        let center = radius;
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let dx = x as f64 - center;
            let dy = y as f64 - center;
            if (dx * dx + dy * dy).sqrt() > radius {
                *pixel = Rgba([0, 0, 0, 0]);
            }
        }

        log::debug!("Applied circle mask with radius {}", radius);
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_kept_corners_cleared() {
        for size in [2, 9, 64] {
            let image = PixelBuffer::from_pixel(size, size, Rgba([10, 20, 30, 255]));
            let out = CircleMaskProcessor::new().process(image).unwrap();
            assert_eq!(out.get_pixel(size / 2, size / 2)[3], 255);
            assert_eq!(out.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
        }
    }

    #[test]
    fn edge_midpoints_stay_inside() {
        let image = PixelBuffer::from_pixel(10, 10, Rgba([1, 1, 1, 255]));
        let out = CircleMaskProcessor::new().process(image).unwrap();
        assert_eq!(out.get_pixel(5, 0)[3], 255);
        assert_eq!(out.get_pixel(0, 5)[3], 255);
        assert_eq!(out.get_pixel(9, 9)[3], 0);
    }

    #[test]
    fn non_square_input_is_a_geometry_mismatch() {
        let err = CircleMaskProcessor::new()
            .process(PixelBuffer::new(10, 11))
            .unwrap_err();
        assert!(matches!(err, ProcessError::GeometryMismatch(_)));
        assert!(err.to_string().contains("must be square"));
    }
}
