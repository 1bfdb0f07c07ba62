// vimage/src/processors/overlay.rs
use crate::context::DrawingContext;
use crate::core::geometry::anchor_point;
use crate::core::{Anchor, ContextProcessor, PixelBuffer, ProcessError, Result};
use image::imageops::{self, FilterType};

/// Where the overlay's top-left corner goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    At(i64, i64),
    Anchor(Anchor),
}

/// Scales every alpha by `opacity`, rounding down.
pub fn apply_opacity(image: &mut PixelBuffer, opacity: f64) {
    if opacity >= 1.0 {
        return;
    }
    for pixel in image.pixels_mut() {
        pixel.0[3] = (pixel.0[3] as f64 * opacity).floor() as u8;
    }
}

/// Composites another image on top, with optional scaling and opacity.
#[derive(Debug, Clone)]
pub struct OverlayProcessor {
    overlay: PixelBuffer,
    placement: Placement,
    opacity: f64,
    scale: f64,
}

impl OverlayProcessor {
    pub fn new(overlay: PixelBuffer, placement: Placement, opacity: f64, scale: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(ProcessError::InvalidParameter(format!(
                "Overlay opacity must be within [0, 1], got {}",
                opacity
            )));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ProcessError::InvalidParameter(format!(
                "Overlay scale must be positive, got {}",
                scale
            )));
        }
        Ok(Self {
            overlay,
            placement,
            opacity,
            scale,
        })
    }

    pub fn at(overlay: PixelBuffer, x: i64, y: i64) -> Self {
        Self {
            overlay,
            placement: Placement::At(x, y),
            opacity: 1.0,
            scale: 1.0,
        }
    }

    /// The overlay as it will be drawn: scaled, with opacity folded into alpha.
    pub fn prepared(&self) -> PixelBuffer {
        let mut overlay = if self.scale != 1.0 {
            let width = ((self.overlay.width() as f64 * self.scale) as u32).max(1);
            let height = ((self.overlay.height() as f64 * self.scale) as u32).max(1);
            imageops::resize(&self.overlay, width, height, FilterType::Triangle)
        } else {
            self.overlay.clone()
        };
        apply_opacity(&mut overlay, self.opacity);
        overlay
    }
}

impl ContextProcessor for OverlayProcessor {
    fn name(&self) -> &'static str {
        "overlay"
    }

    fn apply(&self, ctx: &mut DrawingContext) -> Result<()> {
        let overlay = self.prepared();
        let (x, y) = match self.placement {
            Placement::At(x, y) => (x as f64, y as f64),
            Placement::Anchor(anchor) => {
                let (x, y) = anchor_point(
                    anchor,
                    (ctx.width() as f64, ctx.height() as f64),
                    (overlay.width() as f64, overlay.height() as f64),
                    0.0,
                );
                (x.trunc(), y.trunc())
            }
        };

        log::debug!(
            "Overlay {}x{} at ({}, {}) with opacity {}",
            overlay.width(),
            overlay.height(),
            x,
            y,
            self.opacity
        );
        ctx.scoped(|ctx| ctx.draw_image(&overlay, x, y));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::run_in_context;
    use image::Rgba;

    #[test]
    fn half_opacity_halves_alpha() {
        let overlay = PixelBuffer::from_pixel(100, 100, Rgba([0, 200, 0, 255]));
        let processor = OverlayProcessor::new(overlay, Placement::At(0, 0), 0.5, 1.0).unwrap();
        let prepared = processor.prepared();
        assert!(prepared.pixels().all(|p| p[3] == 127));

        // Composited onto a transparent canvas the alpha survives within rounding.
        let out = run_in_context(PixelBuffer::new(100, 100), &[&processor]).unwrap();
        for pixel in out.pixels() {
            assert!((pixel[3] as i32 - 127).abs() <= 1);
        }
    }

    #[test]
    fn anchors_place_the_overlay() {
        let overlay = PixelBuffer::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let base = PixelBuffer::from_pixel(50, 30, Rgba([0, 0, 0, 255]));

        let processor = OverlayProcessor::new(overlay.clone(), Placement::Anchor(Anchor::BottomRight), 1.0, 1.0)
            .unwrap();
        let out = run_in_context(base.clone(), &[&processor]).unwrap();
        assert_eq!(out.get_pixel(49, 29), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(39, 19), &Rgba([0, 0, 0, 255]));

        let processor = OverlayProcessor::new(overlay, Placement::Anchor(Anchor::Center), 1.0, 1.0).unwrap();
        let out = run_in_context(base, &[&processor]).unwrap();
        assert_eq!(out.get_pixel(20, 10), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(19, 10), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn scale_resizes_before_drawing() {
        let overlay = PixelBuffer::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let processor = OverlayProcessor::new(overlay, Placement::At(0, 0), 1.0, 2.0).unwrap();
        assert_eq!(processor.prepared().dimensions(), (20, 20));
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        let overlay = PixelBuffer::new(1, 1);
        assert!(OverlayProcessor::new(overlay.clone(), Placement::At(0, 0), 1.5, 1.0).is_err());
        assert!(OverlayProcessor::new(overlay.clone(), Placement::At(0, 0), -0.1, 1.0).is_err());
        assert!(OverlayProcessor::new(overlay, Placement::At(0, 0), 0.5, 0.0).is_err());
    }

    #[test]
    fn overlay_partly_outside_is_clipped() {
        let overlay = PixelBuffer::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let base = PixelBuffer::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        let processor = OverlayProcessor::at(overlay, -5, 15);
        let out = run_in_context(base, &[&processor]).unwrap();
        assert_eq!(out.get_pixel(0, 19), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(5, 19), &Rgba([0, 0, 0, 255]));
    }
}
