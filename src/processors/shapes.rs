// vimage/src/processors/shapes.rs
use crate::context::DrawingContext;
use crate::core::{ContextProcessor, ProcessError, Result};
use image::Rgba;

fn check_line_width(width: f64) -> Result<f64> {
    if !width.is_finite() || width <= 0.0 {
        return Err(ProcessError::InvalidParameter(format!(
            "Line width must be positive, got {}",
            width
        )));
    }
    Ok(width)
}

/// A filled disc or a circle outline.
#[derive(Debug, Clone)]
pub struct DrawCircleProcessor {
    x: f64,
    y: f64,
    radius: f64,
    color: Rgba<u8>,
    fill: bool,
    line_width: f64,
}

impl DrawCircleProcessor {
    pub fn new(x: f64, y: f64, radius: f64, color: Rgba<u8>, fill: bool) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ProcessError::InvalidParameter(format!(
                "Circle radius must be positive, got {}",
                radius
            )));
        }
        Ok(Self {
            x,
            y,
            radius,
            color,
            fill,
            line_width: 1.0,
        })
    }

    pub fn with_line_width(mut self, width: f64) -> Result<Self> {
        self.line_width = check_line_width(width)?;
        Ok(self)
    }
}

impl ContextProcessor for DrawCircleProcessor {
    fn name(&self) -> &'static str {
        "draw_circle"
    }

    fn apply(&self, ctx: &mut DrawingContext) -> Result<()> {
        ctx.scoped(|ctx| {
            ctx.set_color(self.color);
            ctx.set_line_width(self.line_width);
            ctx.draw_circle(self.x, self.y, self.radius);
            if self.fill {
                ctx.fill();
            } else {
                ctx.stroke();
            }
        });
        Ok(())
    }
}

/// A rectangle outline, optionally filled. With a separate fill color the
/// border is stroked on top of the fill.
#[derive(Debug, Clone)]
pub struct DrawRectProcessor {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    color: Rgba<u8>,
    fill: bool,
    fill_color: Option<Rgba<u8>>,
    line_width: f64,
}

impl DrawRectProcessor {
    pub fn new(x: f64, y: f64, width: f64, height: f64, color: Rgba<u8>, fill: bool) -> Result<Self> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(ProcessError::InvalidParameter(format!(
                "Rectangle size must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
            color,
            fill,
            fill_color: None,
            line_width: 1.0,
        })
    }

    /// Fill with `fill_color` and stroke the border in the rectangle color.
    pub fn with_fill_color(mut self, fill_color: Rgba<u8>) -> Self {
        self.fill = true;
        self.fill_color = Some(fill_color);
        self
    }

    pub fn with_line_width(mut self, width: f64) -> Result<Self> {
        self.line_width = check_line_width(width)?;
        Ok(self)
    }
}

impl ContextProcessor for DrawRectProcessor {
    fn name(&self) -> &'static str {
        "draw_rect"
    }

    fn apply(&self, ctx: &mut DrawingContext) -> Result<()> {
        ctx.scoped(|ctx| {
            ctx.set_line_width(self.line_width);
            ctx.draw_rectangle(self.x, self.y, self.width, self.height);
            match (self.fill, self.fill_color) {
                (true, Some(fill_color)) => {
                    ctx.set_color(fill_color);
                    ctx.fill_preserve();
                    ctx.set_color(self.color);
                    ctx.stroke();
                }
                (true, None) => {
                    ctx.set_color(self.color);
                    ctx.fill();
                }
                (false, _) => {
                    ctx.set_color(self.color);
                    ctx.stroke();
                }
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::run_in_context;
    use crate::core::PixelBuffer;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn canvas() -> PixelBuffer {
        PixelBuffer::from_pixel(40, 40, WHITE)
    }

    #[test]
    fn filled_circle_covers_its_center() {
        let circle = DrawCircleProcessor::new(20.0, 20.0, 10.0, RED, true).unwrap();
        let out = run_in_context(canvas(), &[&circle]).unwrap();
        assert_eq!(out.get_pixel(20, 20), &RED);
        assert_eq!(out.get_pixel(1, 1), &WHITE);
    }

    #[test]
    fn stroked_circle_leaves_center() {
        let circle = DrawCircleProcessor::new(20.0, 20.0, 10.0, RED, false)
            .unwrap()
            .with_line_width(2.0)
            .unwrap();
        let out = run_in_context(canvas(), &[&circle]).unwrap();
        assert_eq!(out.get_pixel(20, 20), &WHITE);
        assert!(out.get_pixel(30, 20)[1] < 64);
    }

    #[test]
    fn rect_with_fill_color_has_border_and_body() {
        let rect = DrawRectProcessor::new(10.0, 10.0, 20.0, 20.0, BLUE, false)
            .unwrap()
            .with_fill_color(RED)
            .with_line_width(2.0)
            .unwrap();
        let out = run_in_context(canvas(), &[&rect]).unwrap();
        assert_eq!(out.get_pixel(20, 20), &RED);
        assert_eq!(out.get_pixel(10, 20), &BLUE);
        assert_eq!(out.get_pixel(5, 5), &WHITE);
    }

    #[test]
    fn invalid_shapes_are_rejected() {
        assert!(DrawCircleProcessor::new(0.0, 0.0, 0.0, RED, true).is_err());
        assert!(DrawRectProcessor::new(0.0, 0.0, -1.0, 5.0, RED, true).is_err());
        assert!(DrawRectProcessor::new(0.0, 0.0, 1.0, 5.0, RED, true)
            .unwrap()
            .with_line_width(0.0)
            .is_err());
    }
}
