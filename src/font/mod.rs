// vimage/src/font/mod.rs
//! Font faces for text drawing, plus a process-wide get-or-load cache.

use crate::core::{ProcessError, Result};
use ab_glyph::{Font, FontArc, OutlineCurve, PxScale, ScaleFont};
use kurbo::{BezPath, Point};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A parsed font at a fixed pixel size (pixels per em).
#[derive(Clone)]
pub struct FontFace {
    font: FontArc,
    size: f32,
    scale: PxScale,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace").field("size", &self.size).finish()
    }
}

impl FontFace {
    pub fn new(font: FontArc, size: f32) -> Result<Self> {
        if !size.is_finite() || size <= 0.0 {
            return Err(ProcessError::InvalidParameter(format!(
                "Font size must be positive, got {}",
                size
            )));
        }

        // PxScale is relative to ascent-descent, not to the em square.
        let scale = match font.units_per_em() {
            Some(units_per_em) => PxScale::from(size * font.height_unscaled() / units_per_em),
            None => PxScale::from(size),
        };

        Ok(Self { font, size, scale })
    }

    pub fn from_bytes(data: Vec<u8>, size: f32) -> Result<Self> {
        let font = FontArc::try_from_vec(data)
            .map_err(|e| ProcessError::Font(format!("Invalid font data: {}", e)))?;
        Self::new(font, size)
    }

    pub fn from_file<P: AsRef<Path>>(path: P, size: f32) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            ProcessError::Font(format!("Failed to read font {}: {}", path.display(), e))
        })?;
        Self::from_bytes(data, size)
    }

    pub fn with_size(&self, size: f32) -> Result<Self> {
        Self::new(self.font.clone(), size)
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    pub fn ascent(&self) -> f64 {
        self.font.as_scaled(self.scale).ascent() as f64
    }

    /// Negative, as in the font tables.
    pub fn descent(&self) -> f64 {
        self.font.as_scaled(self.scale).descent() as f64
    }

    pub fn line_height(&self) -> f64 {
        let scaled = self.font.as_scaled(self.scale);
        (scaled.ascent() - scaled.descent()) as f64
    }

    /// Advance width of `text` on a single line, kerning included.
    pub fn text_width(&self, text: &str) -> f64 {
        let scaled = self.font.as_scaled(self.scale);
        let mut width = 0.0f32;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width as f64
    }

    /// Glyph outlines of `text` with its baseline starting at `(x, y)`, in a
    /// y-down coordinate space.
    pub fn text_path(&self, text: &str, x: f64, y: f64) -> BezPath {
        let scaled = self.font.as_scaled(self.scale);
        let h_scale = scaled.h_scale_factor() as f64;
        let v_scale = scaled.v_scale_factor() as f64;
        let mut path = BezPath::new();
        let mut pen_x = x;
        let mut previous = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                pen_x += scaled.kern(prev, id) as f64;
            }

            if let Some(outline) = self.font.outline(id) {
                let to_point =
                    |p: ab_glyph::Point| Point::new(pen_x + p.x as f64 * h_scale, y - p.y as f64 * v_scale);
                let mut last: Option<ab_glyph::Point> = None;

                for curve in &outline.curves {
                    let (first, end) = match curve {
                        OutlineCurve::Line(a, b) => (*a, *b),
                        OutlineCurve::Quad(a, _, b) => (*a, *b),
                        OutlineCurve::Cubic(a, _, _, b) => (*a, *b),
                    };
                    let continues = last.is_some_and(|l| l.x == first.x && l.y == first.y);
                    if !continues {
                        if last.is_some() {
                            path.close_path();
                        }
                        path.move_to(to_point(first));
                    }
                    match curve {
                        OutlineCurve::Line(_, b) => path.line_to(to_point(*b)),
                        OutlineCurve::Quad(_, c, b) => path.quad_to(to_point(*c), to_point(*b)),
                        OutlineCurve::Cubic(_, c1, c2, b) => {
                            path.curve_to(to_point(*c1), to_point(*c2), to_point(*b))
                        }
                    }
                    last = Some(end);
                }
                if last.is_some() {
                    path.close_path();
                }
            }

            pen_x += scaled.h_advance(id) as f64;
            previous = Some(id);
        }

        path
    }
}

pub trait FontProvider: Send + Sync {
    type Face: Clone + Send + Sync;

    fn load(&self) -> Result<Self::Face>;
}

#[derive(Debug, Clone)]
pub struct FileFontProvider {
    path: PathBuf,
}

impl FileFontProvider {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl FontProvider for FileFontProvider {
    type Face = FontArc;

    fn load(&self) -> Result<FontArc> {
        let data = std::fs::read(&self.path).map_err(|e| {
            ProcessError::Font(format!("Failed to read font {}: {}", self.path.display(), e))
        })?;
        let font = FontArc::try_from_vec(data)
            .map_err(|e| ProcessError::Font(format!("Invalid font data: {}", e)))?;
        info!("Loaded font {}", self.path.display());
        Ok(font)
    }
}

/// Lazily loaded, shared font resource.
///
/// The lock is held across the provider call, so concurrent first callers
/// wait for one load instead of racing. A failed load leaves the cache empty.
pub struct FontCache<P: FontProvider> {
    provider: P,
    slot: Mutex<Option<P::Face>>,
}

impl<P: FontProvider> FontCache<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            slot: Mutex::new(None),
        }
    }

    pub fn get_or_load(&self) -> Result<P::Face> {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(face) = slot.as_ref() {
            return Ok(face.clone());
        }

        debug!("Font cache miss, loading");
        let face = self.provider.load()?;
        *slot = Some(face.clone());
        Ok(face)
    }

    pub fn is_loaded(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }
}

impl FontCache<FileFontProvider> {
    pub fn face(&self, size: f32) -> Result<FontFace> {
        FontFace::new(self.get_or_load()?, size)
    }
}
