// vimage/src/generate/captcha.rs
use crate::context::DrawingContext;
use crate::core::{PixelBuffer, ProcessError, Result};
use crate::font::FontFace;
use crate::processors::Encoder;
use image::{ImageFormat, Rgba};
use rand::Rng;

#[derive(Debug, Clone)]
pub struct CaptchaConfig {
    pub width: u32,
    pub height: u32,
    pub background: Rgba<u8>,
    pub text_color: Rgba<u8>,
    pub noise_lines: usize,
    pub noise_dots: usize,
    /// Distance between consecutive glyph origins.
    pub char_spacing: u32,
    /// Nominal glyph width used to center the string.
    pub char_width: u32,
    /// Glyphs move up to this many pixels up or down.
    pub y_jitter: u32,
    /// Glyphs move up to this many pixels left or right.
    pub x_jitter: u32,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            width: 120,
            height: 40,
            background: Rgba([255, 255, 255, 255]),
            text_color: Rgba([0, 0, 0, 255]),
            noise_lines: 5,
            noise_dots: 50,
            char_spacing: 18,
            char_width: 16,
            y_jitter: 8,
            x_jitter: 6,
        }
    }
}

impl CaptchaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ProcessError::InvalidParameter(format!(
                "Captcha size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, range: u32) -> f64 {
    if range == 0 {
        return 0.0;
    }
    let range = range as i64;
    rng.gen_range(-range..range) as f64
}

fn light_color<R: Rng + ?Sized>(rng: &mut R, low: u8, high: u8) -> Rgba<u8> {
    Rgba([
        rng.gen_range(low..high),
        rng.gen_range(low..high),
        rng.gen_range(low..high),
        255,
    ])
}

/// Renders `text` as a captcha: noise lines under the glyphs, noise dots on top.
pub fn generate_captcha_with_rng<R: Rng + ?Sized>(
    text: &str,
    face: &FontFace,
    config: &CaptchaConfig,
    rng: &mut R,
) -> Result<PixelBuffer> {
    config.validate()?;
    let (width, height) = (config.width, config.height);

    let mut ctx = DrawingContext::new(width, height);
    ctx.set_color(config.background);
    ctx.clear();

    ctx.set_line_width(1.0);
    for _ in 0..config.noise_lines {
        let x1 = rng.gen_range(0..width) as f64;
        let y1 = rng.gen_range(0..height) as f64;
        let x2 = rng.gen_range(0..width) as f64;
        let y2 = rng.gen_range(0..height) as f64;
        ctx.set_color(light_color(rng, 100, 200));
        ctx.draw_line(x1, y1, x2, y2);
        ctx.stroke();
    }

    let glyphs = text.chars().count() as f64;
    let start_x = ((width as f64 - glyphs * config.char_width as f64) / 2.0).trunc();
    let baseline = (height / 2 + height / 8) as f64;

    ctx.set_font_face(face.clone());
    ctx.set_color(config.text_color);
    let mut glyph = [0u8; 4];
    for (i, c) in text.chars().enumerate() {
        let x = start_x + (i as u32 * config.char_spacing) as f64 + jitter(rng, config.x_jitter);
        let y = baseline + jitter(rng, config.y_jitter);
        ctx.draw_string(c.encode_utf8(&mut glyph), x, y)?;
    }

    for _ in 0..config.noise_dots {
        let x = rng.gen_range(0..width) as i32;
        let y = rng.gen_range(0..height) as i32;
        ctx.set_color(light_color(rng, 100, 250));
        ctx.set_pixel(x, y);
    }

    log::debug!("Generated {}x{} captcha for {} glyphs", width, height, glyphs);
    Ok(ctx.into_image())
}

pub fn generate_captcha(text: &str, face: &FontFace, config: &CaptchaConfig) -> Result<PixelBuffer> {
    generate_captcha_with_rng(text, face, config, &mut rand::thread_rng())
}

pub fn captcha_png(text: &str, face: &FontFace, config: &CaptchaConfig) -> Result<Vec<u8>> {
    let image = generate_captcha(text, face, config)?;
    Encoder::default().encode(&image, ImageFormat::Png)
}
