// vimage/src/processors/text.rs
//! Text layout: line wrapping and the text drawing processor.

use crate::context::DrawingContext;
use crate::core::{ContextProcessor, ProcessError, Result};
use crate::font::FontFace;
use image::Rgba;

pub trait TextMeasure {
    fn text_width(&self, text: &str) -> f64;
}

impl TextMeasure for FontFace {
    fn text_width(&self, text: &str) -> f64 {
        FontFace::text_width(self, text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Break between whitespace-separated words.
    #[default]
    Word,
    /// Break between any two characters, for scripts without word spaces.
    Char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Splits `text` into lines no wider than `max_width`.
///
/// Explicit newlines always break. A single word (or character) wider than
/// `max_width` is kept whole on its own line.
pub fn wrap_text<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &str,
    max_width: f64,
    mode: WrapMode,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        match mode {
            WrapMode::Word => wrap_words(measure, paragraph, max_width, &mut lines),
            WrapMode::Char => wrap_chars(measure, paragraph, max_width, &mut lines),
        }
    }
    lines
}

fn wrap_words<M: TextMeasure + ?Sized>(measure: &M, paragraph: &str, max_width: f64, lines: &mut Vec<String>) {
    let mut current = String::new();
    for word in paragraph.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{} {}", current, word);
        if measure.text_width(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
}

fn wrap_chars<M: TextMeasure + ?Sized>(measure: &M, paragraph: &str, max_width: f64, lines: &mut Vec<String>) {
    let mut current = String::new();
    for c in paragraph.chars() {
        current.push(c);
        if current.chars().count() > 1 && measure.text_width(&current) > max_width {
            current.pop();
            lines.push(std::mem::replace(&mut current, c.to_string()));
        }
    }
    lines.push(current);
}

/// Draws text with its first baseline at `(x, y)`.
#[derive(Debug, Clone)]
pub struct TextProcessor {
    text: String,
    face: FontFace,
    x: f64,
    y: f64,
    color: Rgba<u8>,
    rotation: f64,
    max_width: Option<f64>,
    wrap: WrapMode,
    line_spacing: f64,
    align: Align,
}

impl TextProcessor {
    pub fn new(text: impl Into<String>, face: FontFace, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            face,
            x,
            y,
            color: Rgba([0, 0, 0, 255]),
            rotation: 0.0,
            max_width: None,
            wrap: WrapMode::Word,
            line_spacing: 1.0,
            align: Align::Left,
        }
    }

    pub fn with_color(mut self, color: Rgba<u8>) -> Self {
        self.color = color;
        self
    }

    /// Clockwise rotation in degrees about `(x, y)`.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_wrap(mut self, max_width: f64, mode: WrapMode) -> Result<Self> {
        if !max_width.is_finite() || max_width <= 0.0 {
            return Err(ProcessError::InvalidParameter(format!(
                "Wrap width must be positive, got {}",
                max_width
            )));
        }
        self.max_width = Some(max_width);
        self.wrap = mode;
        Ok(self)
    }

    /// Multiplier on the font's line height.
    pub fn with_line_spacing(mut self, spacing: f64) -> Result<Self> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(ProcessError::InvalidParameter(format!(
                "Line spacing must be positive, got {}",
                spacing
            )));
        }
        self.line_spacing = spacing;
        Ok(self)
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn lines(&self) -> Vec<String> {
        match self.max_width {
            Some(max_width) => wrap_text(&self.face, &self.text, max_width, self.wrap),
            None => self.text.split('\n').map(str::to_string).collect(),
        }
    }
}

impl ContextProcessor for TextProcessor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn apply(&self, ctx: &mut DrawingContext) -> Result<()> {
        let lines = self.lines();
        let widths: Vec<f64> = lines.iter().map(|line| self.face.text_width(line)).collect();
        let block_width = self
            .max_width
            .unwrap_or_else(|| widths.iter().copied().fold(0.0, f64::max));
        let line_height = self.face.line_height() * self.line_spacing;

        ctx.scoped(|ctx| {
            ctx.set_font_face(self.face.clone());
            ctx.set_color(self.color);
            if self.rotation != 0.0 {
                ctx.rotate_about(self.rotation.to_radians(), self.x, self.y);
            }

            for (i, (line, width)) in lines.iter().zip(&widths).enumerate() {
                let offset = match self.align {
                    Align::Left => 0.0,
                    Align::Center => (block_width - width) / 2.0,
                    Align::Right => block_width - width,
                };
                ctx.draw_string(line, self.x + offset, self.y + i as f64 * line_height)?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::run_in_context;
    use crate::core::PixelBuffer;
    use crate::font::test_support::test_face;

    /// Every character is 10 units wide.
    struct Monospace;

    impl TextMeasure for Monospace {
        fn text_width(&self, text: &str) -> f64 {
            text.chars().count() as f64 * 10.0
        }
    }

    #[test]
    fn word_wrap_breaks_between_words() {
        let lines = wrap_text(&Monospace, "the quick brown fox", 100.0, WrapMode::Word);
        assert_eq!(lines, vec!["the quick", "brown fox"]);
    }

    #[test]
    fn long_words_overflow_on_their_own_line() {
        let lines = wrap_text(&Monospace, "a extraordinarily b", 50.0, WrapMode::Word);
        assert_eq!(lines, vec!["a", "extraordinarily", "b"]);
    }

    #[test]
    fn char_wrap_is_evaluated_per_character() {
        let lines = wrap_text(&Monospace, "天地玄黄宇宙洪荒", 30.0, WrapMode::Char);
        assert_eq!(lines, vec!["天地玄", "黄宇宙", "洪荒"]);
        for line in &lines {
            assert!(Monospace.text_width(line) <= 30.0);
        }
    }

    #[test]
    fn char_wrap_keeps_one_character_even_when_too_wide() {
        let lines = wrap_text(&Monospace, "ab", 5.0, WrapMode::Char);
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn explicit_newlines_always_break() {
        let lines = wrap_text(&Monospace, "one\n\ntwo", 1000.0, WrapMode::Word);
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn invalid_layout_parameters_are_rejected() {
        let face = test_face(16.0);
        let text = TextProcessor::new("x", face, 0.0, 0.0);
        assert!(text.clone().with_wrap(0.0, WrapMode::Word).is_err());
        assert!(text.with_line_spacing(-1.0).is_err());
    }

    #[test]
    fn wrapped_text_draws_multiple_lines() {
        let face = test_face(16.0);
        let processor = TextProcessor::new("HHHH HHHH", face.clone(), 5.0, 20.0)
            .with_color(Rgba([0, 0, 0, 255]))
            .with_wrap(face.text_width("HHHH") + 1.0, WrapMode::Word)
            .unwrap();
        assert_eq!(processor.lines().len(), 2);

        let out = run_in_context(PixelBuffer::from_pixel(120, 60, Rgba([255, 255, 255, 255])), &[&processor])
            .unwrap();
        let inked_rows: Vec<u32> = (0..60)
            .filter(|&y| (0..120).any(|x| out.get_pixel(x, y)[0] < 128))
            .collect();
        assert!(inked_rows.iter().any(|&y| y < 20));
        assert!(inked_rows.iter().any(|&y| y > 25));
    }
}
