// vimage/src/processors/noise.rs
use crate::core::{BufferProcessor, PixelBuffer, Result};
use image::Rgba;
use imageproc::drawing::draw_line_segment_mut;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct NoiseProcessor {
    lines: usize,
    dots: usize,
    line_color: Rgba<u8>,
    dot_color: Rgba<u8>,
}

impl NoiseProcessor {
    pub fn new(lines: usize, dots: usize, line_color: Rgba<u8>, dot_color: Rgba<u8>) -> Self {
        Self {
            lines,
            dots,
            line_color,
            dot_color,
        }
    }

    pub fn process_with_rng<R: Rng + ?Sized>(&self, mut image: PixelBuffer, rng: &mut R) -> PixelBuffer {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return image;
        }

        for _ in 0..self.lines {
            let start = (rng.gen_range(0..width) as f32, rng.gen_range(0..height) as f32);
            let end = (rng.gen_range(0..width) as f32, rng.gen_range(0..height) as f32);
            draw_line_segment_mut(&mut image, start, end, self.line_color);
        }

        for _ in 0..self.dots {
            let x = rng.gen_range(0..width);
            let y = rng.gen_range(0..height);
            image.put_pixel(x, y, self.dot_color);
        }

        image
    }
}

impl BufferProcessor for NoiseProcessor {
    fn name(&self) -> &'static str {
        "noise"
    }

    fn process(&self, image: PixelBuffer) -> Result<PixelBuffer> {
        log::debug!("Adding {} noise lines and {} dots", self.lines, self.dots);
        Ok(self.process_with_rng(image, &mut rand::thread_rng()))
    }
}
