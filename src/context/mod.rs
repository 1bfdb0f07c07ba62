// vimage/src/context/mod.rs
//! Stateful vector drawing surface shared by context processors.
//!
//! Coordinates passed to path, image and text operations are in user space
//! and go through the current transform when they are added. The transform,
//! color, line width and font live in a state that [`DrawingContext::push`]
//! saves and [`DrawingContext::pop`] restores.

mod cpu;

use crate::core::{PixelBuffer, ProcessError, Result};
use crate::font::FontFace;
use image::{imageops, Pixel, Rgba};
use imageproc::geometric_transformations::{warp_into_with, Interpolation};
use kurbo::{Affine, BezPath, Circle, Line, Point, Rect, Shape};

const PATH_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone)]
struct DrawState {
    color: Rgba<u8>,
    line_width: f64,
    transform: Affine,
    font: Option<FontFace>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            color: Rgba([0, 0, 0, 255]),
            line_width: 1.0,
            transform: Affine::IDENTITY,
            font: None,
        }
    }
}

pub struct DrawingContext {
    canvas: PixelBuffer,
    state: DrawState,
    stack: Vec<DrawState>,
    path: BezPath,
    current: Option<Point>,
}

impl DrawingContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_image(PixelBuffer::new(width, height))
    }

    pub fn from_image(image: PixelBuffer) -> Self {
        Self {
            canvas: image,
            state: DrawState::default(),
            stack: Vec::new(),
            path: BezPath::new(),
            current: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn image(&self) -> &PixelBuffer {
        &self.canvas
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push(&mut self) {
        self.stack.push(self.state.clone());
    }

    /// # Panics
    ///
    /// Panics when there is no matching `push`.
    pub fn pop(&mut self) {
        self.state = self
            .stack
            .pop()
            .unwrap_or_else(|| panic!("DrawingContext::pop without a matching push"));
    }

    /// Runs `f` between a `push` and a `pop`, so the pop happens even when
    /// `f` returns an error.
    pub fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.push();
        let result = f(self);
        self.pop();
        result
    }

    pub fn set_color(&mut self, color: Rgba<u8>) {
        self.state.color = color;
    }

    pub fn color(&self) -> Rgba<u8> {
        self.state.color
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    pub fn set_font_face(&mut self, face: FontFace) {
        self.state.font = Some(face);
    }

    pub fn font_face(&self) -> Option<&FontFace> {
        self.state.font.as_ref()
    }

    pub fn transform(&self) -> Affine {
        self.state.transform
    }

    pub fn identity(&mut self) {
        self.state.transform = Affine::IDENTITY;
    }

    pub fn translate(&mut self, x: f64, y: f64) {
        self.state.transform = self.state.transform * Affine::translate((x, y));
    }

    /// Rotates user space by `angle` radians (clockwise on screen).
    pub fn rotate(&mut self, angle: f64) {
        self.state.transform = self.state.transform * Affine::rotate(angle);
    }

    pub fn rotate_about(&mut self, angle: f64, x: f64, y: f64) {
        self.state.transform = self.state.transform * Affine::rotate_about(angle, (x, y));
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.state.transform = self.state.transform * Affine::scale_non_uniform(sx, sy);
    }

    fn device(&self, x: f64, y: f64) -> Point {
        self.state.transform * Point::new(x, y)
    }

    pub fn new_path(&mut self) {
        self.path = BezPath::new();
        self.current = None;
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        let p = self.device(x, y);
        self.path.move_to(p);
        self.current = Some(p);
    }

    /// Starts a new subpath when there is no current point.
    pub fn line_to(&mut self, x: f64, y: f64) {
        if self.current.is_none() {
            return self.move_to(x, y);
        }
        let p = self.device(x, y);
        self.path.line_to(p);
        self.current = Some(p);
    }

    pub fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        if self.current.is_none() {
            self.move_to(cx, cy);
        }
        let (c, p) = (self.device(cx, cy), self.device(x, y));
        self.path.quad_to(c, p);
        self.current = Some(p);
    }

    pub fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        if self.current.is_none() {
            self.move_to(c1x, c1y);
        }
        let (c1, c2, p) = (self.device(c1x, c1y), self.device(c2x, c2y), self.device(x, y));
        self.path.curve_to(c1, c2, p);
        self.current = Some(p);
    }

    pub fn close_path(&mut self) {
        if self.current.is_some() {
            self.path.close_path();
            self.current = None;
        }
    }

    fn append_shape(&mut self, shape: &impl Shape) {
        let mut device = shape.to_path(PATH_TOLERANCE);
        device.apply_affine(self.state.transform);
        self.path.extend(device);
        self.current = None;
    }

    pub fn draw_rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.append_shape(&Rect::new(x, y, x + width, y + height));
    }

    pub fn draw_circle(&mut self, x: f64, y: f64, radius: f64) {
        self.append_shape(&Circle::new((x, y), radius));
    }

    pub fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let line = Line::new((x1, y1), (x2, y2));
        let mut device = line.to_path(PATH_TOLERANCE);
        device.apply_affine(self.state.transform);
        self.path.extend(device);
        self.current = Some(self.device(x2, y2));
    }

    pub fn fill(&mut self) {
        self.fill_preserve();
        self.new_path();
    }

    pub fn fill_preserve(&mut self) {
        cpu::fill_path(&mut self.canvas, &self.path, self.state.color);
    }

    pub fn stroke(&mut self) {
        self.stroke_preserve();
        self.new_path();
    }

    /// Strokes the current path with round caps and joins. The line width is
    /// scaled with the current transform.
    pub fn stroke_preserve(&mut self) {
        let scale = self.state.transform.determinant().abs().sqrt();
        let width = self.state.line_width * scale;
        if width <= 0.0 || self.path.is_empty() {
            return;
        }

        cpu::stroke_path(&mut self.canvas, &self.path, self.state.color, width);
    }

    /// Overwrites every pixel with the current color, without blending.
    pub fn clear(&mut self) {
        let color = self.state.color;
        self.canvas.pixels_mut().for_each(|p| *p = color);
    }

    /// Overwrites one device pixel with the current color. The transform is
    /// not applied; out-of-bounds coordinates are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height() {
            self.canvas.put_pixel(x as u32, y as u32, self.state.color);
        }
    }

    pub fn draw_image(&mut self, image: &PixelBuffer, x: f64, y: f64) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }

        let transform = self.state.transform * Affine::translate((x, y));
        let [a, b, c, d, e, f] = transform.as_coeffs();
        if a == 1.0 && b == 0.0 && c == 0.0 && d == 1.0 && e.fract() == 0.0 && f.fract() == 0.0 {
            self.blit(image, e as i64, f as i64);
        } else {
            self.warp_blit(image, transform);
        }
    }

    /// Like [`draw_image`](Self::draw_image), with `(ax, ay)` in `[0, 1]`
    /// choosing which point of the image lands on `(x, y)`.
    pub fn draw_image_anchored(&mut self, image: &PixelBuffer, x: f64, y: f64, ax: f64, ay: f64) {
        let x = x - ax * image.width() as f64;
        let y = y - ay * image.height() as f64;
        self.draw_image(image, x, y);
    }

    fn blit(&mut self, image: &PixelBuffer, dx: i64, dy: i64) {
        let (cw, ch) = (self.canvas.width() as i64, self.canvas.height() as i64);
        for (sx, sy, pixel) in image.enumerate_pixels() {
            let (tx, ty) = (dx + sx as i64, dy + sy as i64);
            if tx < 0 || ty < 0 || tx >= cw || ty >= ch {
                continue;
            }
            self.canvas.get_pixel_mut(tx as u32, ty as u32).blend(pixel);
        }
    }

    fn warp_blit(&mut self, image: &PixelBuffer, transform: Affine) {
        if transform.determinant().abs() < f64::EPSILON {
            return;
        }

        let source = Rect::new(0.0, 0.0, image.width() as f64, image.height() as f64);
        let bounds = transform.transform_rect_bbox(source);
        let x0 = bounds.x0.floor().max(0.0);
        let y0 = bounds.y0.floor().max(0.0);
        let x1 = bounds.x1.ceil().min(self.canvas.width() as f64);
        let y1 = bounds.y1.ceil().min(self.canvas.height() as f64);
        if x1 <= x0 || y1 <= y0 {
            return;
        }

        // A transparent 1px border lets bilinear sampling fade the edges
        // instead of dropping the outermost rows and columns.
        let mut padded = PixelBuffer::new(image.width() + 2, image.height() + 2);
        imageops::replace(&mut padded, image, 1, 1);

        // Quarter turns map pixel centers onto pixel centers.
        let [a, b, c, d, _, _] = transform.as_coeffs();
        let axis_aligned = (b.abs() < 1e-12 && c.abs() < 1e-12) || (a.abs() < 1e-12 && d.abs() < 1e-12);
        let interpolation = if axis_aligned {
            Interpolation::Nearest
        } else {
            Interpolation::Bilinear
        };

        let inverse = transform.inverse();
        let mut layer = PixelBuffer::new((x1 - x0) as u32, (y1 - y0) as u32);
        warp_into_with(
            &padded,
            |x, y| {
                let p = inverse * Point::new(x as f64 + x0 + 0.5, y as f64 + y0 + 0.5);
                ((p.x + 0.5) as f32, (p.y + 0.5) as f32)
            },
            interpolation,
            Rgba([0, 0, 0, 0]),
            &mut layer,
        );
        self.blit(&layer, x0 as i64, y0 as i64);
    }

    fn require_font(&self) -> Result<&FontFace> {
        self.state
            .font
            .as_ref()
            .ok_or_else(|| ProcessError::Font("No font face set on the drawing context".to_string()))
    }

    pub fn measure_string(&self, text: &str) -> Result<(f64, f64)> {
        let face = self.require_font()?;
        Ok((face.text_width(text), face.line_height()))
    }

    pub fn draw_string(&mut self, text: &str, x: f64, y: f64) -> Result<()> {
        let mut outline = self.require_font()?.text_path(text, x, y);
        outline.apply_affine(self.state.transform);
        cpu::fill_path(&mut self.canvas, &outline, self.state.color);
        Ok(())
    }

    /// Draws `text` so that the point `(ax, ay)` of its box, relative to its
    /// width and ascent, lands on `(x, y)`. `(0.5, 0.5)` centers the text.
    pub fn draw_string_anchored(&mut self, text: &str, x: f64, y: f64, ax: f64, ay: f64) -> Result<()> {
        let face = self.require_font()?;
        let width = face.text_width(text);
        let ascent = face.ascent();
        self.draw_string(text, x - ax * width, y + ay * ascent)
    }

    /// Finalizes the surface into a buffer.
    ///
    /// # Panics
    ///
    /// Panics when pushed state has not been popped.
    pub fn into_image(self) -> PixelBuffer {
        assert!(
            self.stack.is_empty(),
            "DrawingContext finalized with {} unpopped state(s)",
            self.stack.len()
        );
        self.canvas
    }
}

impl std::fmt::Debug for DrawingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingContext")
            .field("width", &self.canvas.width())
            .field("height", &self.canvas.height())
            .field("depth", &self.stack.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::test_support::test_face;
    use std::f64::consts::FRAC_PI_2;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn fill_rectangle_respects_translation() {
        let mut ctx = DrawingContext::new(10, 10);
        ctx.set_color(RED);
        ctx.translate(2.0, 3.0);
        ctx.draw_rectangle(0.0, 0.0, 2.0, 2.0);
        ctx.fill();
        let out = ctx.into_image();

        assert_eq!(out.get_pixel(2, 3), &RED);
        assert_eq!(out.get_pixel(3, 4), &RED);
        assert_eq!(out.get_pixel(1, 3)[3], 0);
        assert_eq!(out.get_pixel(4, 3)[3], 0);
    }

    #[test]
    fn pop_restores_transform_and_color() {
        let mut ctx = DrawingContext::new(4, 4);
        ctx.push();
        ctx.translate(5.0, 5.0);
        ctx.set_color(RED);
        ctx.pop();

        assert_eq!(ctx.transform(), Affine::IDENTITY);
        assert_eq!(ctx.color(), Rgba([0, 0, 0, 255]));
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn scoped_pops_on_error() {
        let mut ctx = DrawingContext::new(4, 4);
        let result: Result<()> = ctx.scoped(|ctx| {
            ctx.rotate(1.0);
            Err(ProcessError::InvalidParameter("boom".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(ctx.depth(), 0);
        assert_eq!(ctx.transform(), Affine::IDENTITY);
    }

    #[test]
    #[should_panic(expected = "without a matching push")]
    fn pop_without_push_panics() {
        let mut ctx = DrawingContext::new(1, 1);
        ctx.pop();
    }

    #[test]
    #[should_panic(expected = "unpopped")]
    fn finalizing_with_pushed_state_panics() {
        let mut ctx = DrawingContext::new(1, 1);
        ctx.push();
        let _ = ctx.into_image();
    }

    #[test]
    fn stroke_draws_outline_only() {
        let mut ctx = DrawingContext::new(20, 20);
        ctx.set_color(RED);
        ctx.set_line_width(2.0);
        ctx.draw_rectangle(4.0, 4.0, 12.0, 12.0);
        ctx.stroke();
        let out = ctx.into_image();

        assert_eq!(out.get_pixel(4, 10)[3], 255);
        assert_eq!(out.get_pixel(10, 10)[3], 0);
    }

    #[test]
    fn line_to_without_current_point_starts_subpath() {
        let mut ctx = DrawingContext::new(10, 10);
        ctx.set_color(RED);
        ctx.line_to(0.0, 0.0);
        ctx.line_to(10.0, 0.0);
        ctx.line_to(10.0, 10.0);
        ctx.line_to(0.0, 10.0);
        ctx.close_path();
        ctx.fill();
        assert_eq!(ctx.into_image().get_pixel(5, 5), &RED);
    }

    #[test]
    fn clear_overwrites_without_blending() {
        let mut ctx = DrawingContext::from_image(PixelBuffer::from_pixel(2, 2, RED));
        ctx.set_color(Rgba([0, 0, 0, 0]));
        ctx.clear();
        assert!(ctx.into_image().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn draw_image_blits_at_integer_offsets() {
        let mut ctx = DrawingContext::new(6, 6);
        let stamp = PixelBuffer::from_pixel(2, 2, RED);
        ctx.draw_image(&stamp, 4.0, 5.0);
        let out = ctx.into_image();

        assert_eq!(out.get_pixel(4, 5), &RED);
        assert_eq!(out.get_pixel(5, 5), &RED);
        assert_eq!(out.get_pixel(3, 5)[3], 0);
        assert_eq!(out.get_pixel(4, 4)[3], 0);
    }

    #[test]
    fn draw_image_follows_rotation() {
        let mut ctx = DrawingContext::new(20, 20);
        let stamp = PixelBuffer::from_pixel(8, 4, RED);
        // Quarter turn about the canvas center turns the wide stamp tall.
        ctx.rotate_about(FRAC_PI_2, 10.0, 10.0);
        ctx.draw_image_anchored(&stamp, 10.0, 10.0, 0.5, 0.5);
        let out = ctx.into_image();

        assert!(out.get_pixel(10, 10)[3] > 250);
        assert!(out.get_pixel(10, 7)[3] > 250);
        assert_eq!(out.get_pixel(7, 10)[3], 0);
    }

    #[test]
    fn text_requires_a_font() {
        let mut ctx = DrawingContext::new(10, 10);
        assert!(matches!(ctx.measure_string("a"), Err(ProcessError::Font(_))));
        assert!(ctx.draw_string("a", 0.0, 5.0).is_err());
    }

    #[test]
    fn draw_string_paints_above_baseline() {
        let face = test_face(24.0);
        let mut ctx = DrawingContext::new(60, 40);
        ctx.set_font_face(face);
        ctx.set_color(RED);
        ctx.draw_string("HH", 5.0, 30.0).unwrap();
        let out = ctx.into_image();

        let painted_above = (0..30).any(|y| (0..60).any(|x| out.get_pixel(x, y)[3] > 0));
        let painted_below = (32..40).any(|y| (0..60).any(|x| out.get_pixel(x, y)[3] > 0));
        assert!(painted_above);
        assert!(!painted_below);
    }
}
