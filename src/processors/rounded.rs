// vimage/src/processors/rounded.rs
use crate::core::{BufferProcessor, PixelBuffer, Result};
use image::Rgba;

/// Width of the linear alpha falloff outside each corner arc.
pub const ANTIALIAS_BAND: f64 = 1.5;

/// Rounds the four corners, fading alpha across a 1.5px band past the arc.
#[derive(Debug, Clone, Copy)]
pub struct RoundedCornerProcessor {
    radius: u32,
}

impl RoundedCornerProcessor {
    /// Radii larger than half the shorter side are clamped when processing.
    pub fn new(radius: u32) -> Self {
        Self { radius }
    }
}

/// Alpha multiplier for a pixel at `distance` from its corner's arc center.
pub fn corner_falloff(distance: f64, radius: f64) -> f64 {
    if distance <= radius {
        1.0
    } else if distance >= radius + ANTIALIAS_BAND {
        0.0
    } else {
        1.0 - (distance - radius) / ANTIALIAS_BAND
    }
}

impl BufferProcessor for RoundedCornerProcessor {
    fn name(&self) -> &'static str {
        "rounded_corner"
    }

    fn process(&self, mut image: PixelBuffer) -> Result<PixelBuffer> {
        let (width, height) = image.dimensions();
        let radius = self.radius.min(width / 2).min(height / 2);
        if radius == 0 {
            return Ok(image);
        }
        log::debug!("Rounding corners of {}x{} with radius {}", width, height, radius);

        let r = radius as i64;
        let (w, h) = (width as i64, height as i64);
        let left = r;
        let right = w - r - 1;
        let top = r;
        let bottom = h - r - 1;

        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let (x, y) = (x as i64, y as i64);
            let center_x = if x < r {
                left
            } else if x >= w - r {
                right
            } else {
                continue;
            };
            let center_y = if y < r {
                top
            } else if y >= h - r {
                bottom
            } else {
                continue;
            };

            let dx = (x - center_x) as f64;
            let dy = (y - center_y) as f64;
            let factor = corner_falloff((dx * dx + dy * dy).sqrt(), r as f64);
            if factor <= 0.0 {
                *pixel = Rgba([0, 0, 0, 0]);
            } else if factor < 1.0 {
                pixel.0[3] = (pixel.0[3] as f64 * factor) as u8;
            }
        }

        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_pixel(width, height, Rgba([200, 100, 50, 255]))
    }

    #[test]
    fn zero_radius_is_identity() {
        let image = opaque(30, 20);
        assert_eq!(RoundedCornerProcessor::new(0).process(image.clone()).unwrap(), image);
    }

    #[test]
    fn oversized_radius_is_clamped() {
        let out = RoundedCornerProcessor::new(1000).process(opaque(40, 20)).unwrap();
        assert_eq!(out.dimensions(), (40, 20));
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(20, 10)[3], 255);
    }

    #[test]
    fn corners_fade_and_middle_is_untouched() {
        let out = RoundedCornerProcessor::new(10).process(opaque(50, 50)).unwrap();
        for (x, y) in [(0, 0), (49, 0), (0, 49), (49, 49)] {
            assert_eq!(out.get_pixel(x, y), &Rgba([0, 0, 0, 0]));
        }
        assert_eq!(out.get_pixel(25, 0)[3], 255);
        assert_eq!(out.get_pixel(0, 25)[3], 255);
        assert_eq!(out.get_pixel(10, 10)[3], 255);

        // Distance sqrt(2) * 8 from the arc center sits inside the 1.5px band.
        let d = (2.0f64).sqrt() * 8.0;
        let expected = (255.0 * corner_falloff(d, 10.0)) as u8;
        assert_eq!(out.get_pixel(2, 2)[3], expected);
        assert!(expected > 0 && expected < 255);
    }

    #[test]
    fn falloff_is_linear_across_band() {
        assert_eq!(corner_falloff(5.0, 5.0), 1.0);
        assert_eq!(corner_falloff(6.5, 5.0), 0.0);
        assert!((corner_falloff(5.75, 5.0) - 0.5).abs() < 1e-12);
    }
}
