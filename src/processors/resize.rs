// vimage/src/processors/resize.rs
use crate::core::{ensure_non_empty, BufferProcessor, PixelBuffer, ProcessError, ResizeAlgorithm, ResizeMode, Result};
use image::imageops::{self, FilterType};

pub struct ResizeProcessor {
    mode: ResizeMode,
    algorithm: ResizeAlgorithm,
}

impl ResizeProcessor {
    pub fn new(mode: ResizeMode) -> Result<Self> {
        Self::with_algorithm(mode, ResizeAlgorithm::default())
    }

    pub fn with_algorithm(mode: ResizeMode, algorithm: ResizeAlgorithm) -> Result<Self> {
        match mode {
            ResizeMode::Ratio(ratio) if !ratio.is_finite() || ratio <= 0.0 => {
                return Err(ProcessError::InvalidParameter(format!(
                    "Resize ratio must be positive, got {}",
                    ratio
                )));
            }
            ResizeMode::Exact(0, _)
            | ResizeMode::Exact(_, 0)
            | ResizeMode::Width(0)
            | ResizeMode::Height(0)
            | ResizeMode::LongerEdge(0)
            | ResizeMode::ShorterEdge(0) => {
                return Err(ProcessError::InvalidParameter(format!(
                    "Resize target must be positive: {:?}",
                    mode
                )));
            }
            _ => {}
        }
        Ok(Self { mode, algorithm })
    }

    fn filter_type(&self) -> FilterType {
        match self.algorithm {
            ResizeAlgorithm::Nearest => FilterType::Nearest,
            ResizeAlgorithm::Bilinear => FilterType::Triangle,
            ResizeAlgorithm::Bicubic => FilterType::CatmullRom,
            ResizeAlgorithm::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl BufferProcessor for ResizeProcessor {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn process(&self, image: PixelBuffer) -> Result<PixelBuffer> {
        ensure_non_empty(&image, "Resize")?;
        let (width, height) = self.mode.target_size(image.width(), image.height())?;

        if width == image.width() && height == image.height() {
            log::debug!("Image dimensions unchanged, skipping resize");
            return Ok(image);
        }

        log::debug!(
            "Resizing image from {}x{} to {}x{} ({:?})",
            image.width(),
            image.height(),
            width,
            height,
            self.algorithm
        );
        Ok(imageops::resize(&image, width, height, self.filter_type()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn image(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_pixel(width, height, Rgba([30, 60, 90, 255]))
    }

    #[test]
    fn ratio_round_trip_stays_within_a_pixel() {
        for (w, h) in [(100, 60), (37, 91), (640, 480)] {
            for r in [0.3, 0.5, 0.77, 2.0] {
                let down = ResizeProcessor::new(ResizeMode::Ratio(r))
                    .unwrap()
                    .process(image(w, h))
                    .unwrap();
                let back = ResizeProcessor::new(ResizeMode::Ratio(1.0 / r))
                    .unwrap()
                    .process(down)
                    .unwrap();
                assert!((back.width() as i64 - w as i64).abs() <= 1, "{w}x{h} r={r}");
                assert!((back.height() as i64 - h as i64).abs() <= 1, "{w}x{h} r={r}");
            }
        }
    }

    #[test]
    fn every_algorithm_produces_target_size() {
        for algorithm in [
            ResizeAlgorithm::Nearest,
            ResizeAlgorithm::Bilinear,
            ResizeAlgorithm::Bicubic,
            ResizeAlgorithm::Lanczos3,
        ] {
            let out = ResizeProcessor::with_algorithm(ResizeMode::Exact(13, 7), algorithm)
                .unwrap()
                .process(image(40, 40))
                .unwrap();
            assert_eq!(out.dimensions(), (13, 7));
        }
    }

    #[test]
    fn fit_modes_preserve_aspect_ratio() {
        let out = ResizeProcessor::new(ResizeMode::LongerEdge(50))
            .unwrap()
            .process(image(200, 100))
            .unwrap();
        assert_eq!(out.dimensions(), (50, 25));

        let out = ResizeProcessor::new(ResizeMode::ShorterEdge(50))
            .unwrap()
            .process(image(200, 100))
            .unwrap();
        assert_eq!(out.dimensions(), (100, 50));
    }

    #[test]
    fn invalid_parameters_fail_at_construction() {
        assert!(ResizeProcessor::new(ResizeMode::Ratio(-1.0)).is_err());
        assert!(ResizeProcessor::new(ResizeMode::Exact(0, 10)).is_err());
        assert!(ResizeProcessor::new(ResizeMode::Width(0)).is_err());
    }

    #[test]
    fn unchanged_size_is_passed_through() {
        let input = image(10, 10);
        let out = ResizeProcessor::new(ResizeMode::Width(10))
            .unwrap()
            .process(input.clone())
            .unwrap();
        assert_eq!(out, input);
    }
}
