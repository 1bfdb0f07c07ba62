// vimage/src/processors/crop.rs
use crate::core::geometry::{crop_region, square_region, CropOrigin};
use crate::core::{ensure_non_empty, BufferProcessor, PixelBuffer, Position, ProcessError, Result};
use image::imageops;
use log::debug;

#[derive(Debug, Clone)]
pub struct CropProcessor {
    width: u32,
    height: u32,
    origin: CropOrigin,
}

impl CropProcessor {
    pub fn new(width: u32, height: u32, position: Position) -> Result<Self> {
        Self::with_origin(width, height, CropOrigin::Position(position))
    }

    pub fn at(width: u32, height: u32, x: i64, y: i64) -> Result<Self> {
        Self::with_origin(width, height, CropOrigin::Offset { x, y })
    }

    pub fn with_origin(width: u32, height: u32, origin: CropOrigin) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ProcessError::InvalidParameter(format!(
                "Invalid crop size: {}x{}",
                width, height
            )));
        }
        Ok(Self {
            width,
            height,
            origin,
        })
    }
}

impl BufferProcessor for CropProcessor {
    fn name(&self) -> &'static str {
        "crop"
    }

    fn process(&self, image: PixelBuffer) -> Result<PixelBuffer> {
        ensure_non_empty(&image, "Crop")?;
        let (x, y) = crop_region(image.dimensions(), self.width, self.height, self.origin)?;
        debug!(
            "Cropping {}x{} at ({},{}) from {}x{}",
            self.width,
            self.height,
            x,
            y,
            image.width(),
            image.height()
        );
        Ok(imageops::crop_imm(&image, x, y, self.width, self.height).to_image())
    }
}

/// Crops to the largest square, anchored along the longer axis.
#[derive(Debug, Clone, Default)]
pub struct SquareProcessor {
    position: Position,
}

impl SquareProcessor {
    pub fn new(position: Position) -> Self {
        Self { position }
    }
}

impl BufferProcessor for SquareProcessor {
    fn name(&self) -> &'static str {
        "square"
    }

    fn process(&self, image: PixelBuffer) -> Result<PixelBuffer> {
        ensure_non_empty(&image, "Square crop")?;
        if image.width() == image.height() {
            return Ok(image);
        }

        let (x, y, size) = square_region(image.width(), image.height(), self.position);
        debug!(
            "Square crop {}x{} -> {} at ({},{})",
            image.width(),
            image.height(),
            size,
            x,
            y
        );
        Ok(imageops::crop_imm(&image, x, y, size, size).to_image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Each pixel encodes its own coordinates in R and G.
    fn coordinate_image(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn crop_output_has_requested_size() {
        for (w, h) in [(1, 1), (10, 30), (40, 20), (40, 30)] {
            for position in [
                Position::Center,
                Position::Top,
                Position::Bottom,
                Position::Left,
                Position::Right,
            ] {
                let out = CropProcessor::new(w, h, position)
                    .unwrap()
                    .process(coordinate_image(40, 30))
                    .unwrap();
                assert_eq!(out.dimensions(), (w, h));
            }
        }
    }

    #[test]
    fn crop_at_offset_reads_the_right_pixels() {
        let out = CropProcessor::at(5, 5, 10, 20)
            .unwrap()
            .process(coordinate_image(40, 30))
            .unwrap();
        assert_eq!(out.get_pixel(0, 0), &Rgba([10, 20, 0, 255]));
    }

    #[test]
    fn crop_rejects_bad_requests() {
        assert!(matches!(
            CropProcessor::new(0, 5, Position::Center),
            Err(ProcessError::InvalidParameter(_))
        ));
        let err = CropProcessor::new(50, 5, Position::Center)
            .unwrap()
            .process(coordinate_image(40, 30))
            .unwrap_err();
        assert!(matches!(err, ProcessError::GeometryMismatch(_)));
    }

    #[test]
    fn crop_at_huge_offset_is_a_geometry_error() {
        let err = CropProcessor::at(5, 5, i64::MAX, 0)
            .unwrap()
            .process(coordinate_image(40, 30))
            .unwrap_err();
        assert!(matches!(err, ProcessError::GeometryMismatch(_)));
    }

    #[test]
    fn square_output_uses_shorter_edge() {
        for (w, h) in [(40, 30), (30, 40), (1, 7), (9, 9)] {
            let out = SquareProcessor::new(Position::Center)
                .process(coordinate_image(w, h))
                .unwrap();
            assert_eq!(out.width(), out.height());
            assert_eq!(out.width(), w.min(h));
        }
    }

    #[test]
    fn square_right_keeps_the_right_edge() {
        let out = SquareProcessor::new(Position::Right)
            .process(coordinate_image(40, 30))
            .unwrap();
        assert_eq!(out.get_pixel(0, 0), &Rgba([10, 0, 0, 255]));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(SquareProcessor::default()
            .process(PixelBuffer::new(0, 0))
            .is_err());
    }
}
