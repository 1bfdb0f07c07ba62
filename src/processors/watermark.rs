// vimage/src/processors/watermark.rs
use crate::context::DrawingContext;
use crate::core::geometry::anchor_point;
use crate::core::{Anchor, ContextProcessor, ProcessError, Result};
use crate::font::FontFace;
use image::Rgba;

const MARGIN: f64 = 10.0;

/// Semi-transparent text stamped at one of the nine anchors.
#[derive(Debug, Clone)]
pub struct WatermarkProcessor {
    text: String,
    face: FontFace,
    color: Rgba<u8>,
    opacity: f64,
    anchor: Anchor,
    rotation: f64,
}

impl WatermarkProcessor {
    pub fn new(text: impl Into<String>, face: FontFace) -> Self {
        Self {
            text: text.into(),
            face,
            color: Rgba([255, 255, 255, 255]),
            opacity: 0.5,
            anchor: Anchor::BottomRight,
            rotation: 0.0,
        }
    }

    pub fn with_color(mut self, color: Rgba<u8>) -> Self {
        self.color = color;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(ProcessError::InvalidParameter(format!(
                "Watermark opacity must be within [0, 1], got {}",
                opacity
            )));
        }
        self.opacity = opacity;
        Ok(self)
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Clockwise rotation in degrees about the text center.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// The drawing color with opacity folded into alpha.
    pub fn effective_color(&self) -> Rgba<u8> {
        let [r, g, b, a] = self.color.0;
        Rgba([r, g, b, (a as f64 * self.opacity) as u8])
    }
}

impl ContextProcessor for WatermarkProcessor {
    fn name(&self) -> &'static str {
        "watermark"
    }

    fn apply(&self, ctx: &mut DrawingContext) -> Result<()> {
        let width = self.face.text_width(&self.text);
        let height = self.face.line_height();
        let (left, top) = anchor_point(
            self.anchor,
            (ctx.width() as f64, ctx.height() as f64),
            (width, height),
            MARGIN,
        );
        let baseline = top + self.face.ascent();

        ctx.scoped(|ctx| {
            ctx.set_font_face(self.face.clone());
            ctx.set_color(self.effective_color());
            if self.rotation != 0.0 {
                ctx.rotate_about(self.rotation.to_radians(), left + width / 2.0, top + height / 2.0);
            }
            ctx.draw_string(&self.text, left, baseline)
        })
    }
}
