// vimage/src/core/geometry.rs
//! Pure placement and sizing math shared by the crop, resize, mosaic, overlay
//! and watermark processors. Nothing here touches pixels.

use super::{ProcessError, Result};
use std::fmt;
use std::str::FromStr;

/// Where a smaller rectangle sits inside a larger one.
///
/// `Top` and `Bottom` only pin the vertical axis and `Left` and `Right` only
/// pin the horizontal one; the free axis is always centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
}

impl FromStr for Position {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "center" => Ok(Position::Center),
            "top" => Ok(Position::Top),
            "bottom" => Ok(Position::Bottom),
            "left" => Ok(Position::Left),
            "right" => Ok(Position::Right),
            other => Err(ProcessError::InvalidParameter(format!(
                "Unknown position '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    LeftCenter,
    #[default]
    Center,
    RightCenter,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl FromStr for Anchor {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "top-left" => Ok(Anchor::TopLeft),
            "top-center" => Ok(Anchor::TopCenter),
            "top-right" => Ok(Anchor::TopRight),
            "left-center" => Ok(Anchor::LeftCenter),
            "center" => Ok(Anchor::Center),
            "right-center" => Ok(Anchor::RightCenter),
            "bottom-left" => Ok(Anchor::BottomLeft),
            "bottom-center" => Ok(Anchor::BottomCenter),
            "bottom-right" => Ok(Anchor::BottomRight),
            other => Err(ProcessError::InvalidParameter(format!(
                "Unknown anchor '{}'",
                other
            ))),
        }
    }
}

/// Axis-aligned rectangle `[from_x, to_x) x [from_y, to_y)`.
///
/// Coordinates may be negative or inverted until [`Region::clamp_to`] is
/// applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub from_x: i32,
    pub from_y: i32,
    pub to_x: i32,
    pub to_y: i32,
}

impl Region {
    pub fn new(from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> Self {
        Self {
            from_x,
            from_y,
            to_x,
            to_y,
        }
    }

    pub fn width(&self) -> i32 {
        self.to_x - self.from_x
    }

    pub fn height(&self) -> i32 {
        self.to_y - self.from_y
    }

    /// Clips the region to a `width x height` buffer. Returns `None` when
    /// nothing is left, including when the region was inverted.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Region> {
        let clamped = Region {
            from_x: self.from_x.max(0),
            from_y: self.from_y.max(0),
            to_x: self.to_x.min(width.min(i32::MAX as u32) as i32),
            to_y: self.to_y.min(height.min(i32::MAX as u32) as i32),
        };

        if clamped.from_x >= clamped.to_x || clamped.from_y >= clamped.to_y {
            None
        } else {
            Some(clamped)
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.from_x, self.from_y, self.to_x, self.to_y
        )
    }
}

impl FromStr for Region {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<i32> = s
            .split(',')
            .map(|part| part.trim().parse::<i32>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| ProcessError::InvalidParameter(format!("Invalid region '{}': {}", s, e)))?;

        match parts.as_slice() {
            [from_x, from_y, to_x, to_y] => Ok(Region::new(*from_x, *from_y, *to_x, *to_y)),
            _ => Err(ProcessError::InvalidParameter(format!(
                "Region '{}' must have four comma-separated values",
                s
            ))),
        }
    }
}

/// Top-left offset of an `inner` rectangle placed inside `outer` at `position`.
///
/// Callers guarantee `inner <= outer` on both axes.
pub fn anchor_offset(position: Position, outer: (u32, u32), inner: (u32, u32)) -> (u32, u32) {
    let (outer_w, outer_h) = outer;
    let (inner_w, inner_h) = inner;
    let center_x = (outer_w - inner_w) / 2;
    let center_y = (outer_h - inner_h) / 2;

    match position {
        Position::Center => (center_x, center_y),
        Position::Top => (center_x, 0),
        Position::Bottom => (center_x, outer_h - inner_h),
        Position::Left => (0, center_y),
        Position::Right => (outer_w - inner_w, center_y),
    }
}

/// The largest centered-or-anchored square inside a `width x height` buffer,
/// returned as `(x, y, size)`.
pub fn square_region(width: u32, height: u32, position: Position) -> (u32, u32, u32) {
    let size = width.min(height);
    let (x, y) = anchor_offset(position, (width, height), (size, size));
    (x, y, size)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropOrigin {
    Position(Position),
    /// Explicit top-left corner; must keep the whole crop inside the source.
    Offset { x: i64, y: i64 },
}

impl Default for CropOrigin {
    fn default() -> Self {
        CropOrigin::Position(Position::Center)
    }
}

/// Resolves the top-left corner of a `width x height` crop of a `source`
/// sized buffer.
pub fn crop_region(
    source: (u32, u32),
    width: u32,
    height: u32,
    origin: CropOrigin,
) -> Result<(u32, u32)> {
    let (source_w, source_h) = source;

    if width == 0 || height == 0 {
        return Err(ProcessError::InvalidParameter(format!(
            "Invalid crop size: {}x{}",
            width, height
        )));
    }

    if width > source_w || height > source_h {
        return Err(ProcessError::GeometryMismatch(format!(
            "Crop size {}x{} exceeds source size {}x{}",
            width, height, source_w, source_h
        )));
    }

    match origin {
        CropOrigin::Position(position) => Ok(anchor_offset(
            position,
            (source_w, source_h),
            (width, height),
        )),
        CropOrigin::Offset { x, y } => {
            if x < 0
                || y < 0
                || x > source_w as i64 - width as i64
                || y > source_h as i64 - height as i64
            {
                return Err(ProcessError::GeometryMismatch(format!(
                    "Crop region at ({},{}) sized {}x{} does not fit source {}x{}",
                    x, y, width, height, source_w, source_h
                )));
            }
            Ok((x as u32, y as u32))
        }
    }
}

/// Top-left point for an `inner` box placed at `anchor` inside `outer`,
/// keeping `margin` pixels away from the pinned edges.
pub fn anchor_point(anchor: Anchor, outer: (f64, f64), inner: (f64, f64), margin: f64) -> (f64, f64) {
    let (outer_w, outer_h) = outer;
    let (inner_w, inner_h) = inner;
    let left = margin;
    let right = outer_w - inner_w - margin;
    let top = margin;
    let bottom = outer_h - inner_h - margin;
    let center_x = outer_w / 2.0 - inner_w / 2.0;
    let center_y = outer_h / 2.0 - inner_h / 2.0;

    match anchor {
        Anchor::TopLeft => (left, top),
        Anchor::TopCenter => (center_x, top),
        Anchor::TopRight => (right, top),
        Anchor::LeftCenter => (left, center_y),
        Anchor::Center => (center_x, center_y),
        Anchor::RightCenter => (right, center_y),
        Anchor::BottomLeft => (left, bottom),
        Anchor::BottomCenter => (center_x, bottom),
        Anchor::BottomRight => (right, bottom),
    }
}

/// Strategy for deriving resize targets from the source dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeMode {
    Exact(u32, u32),
    Ratio(f64),
    Width(u32),
    Height(u32),
    /// The longer source edge becomes `size`.
    LongerEdge(u32),
    /// The shorter source edge becomes `size`.
    ShorterEdge(u32),
}

impl ResizeMode {
    pub fn target_size(&self, orig_width: u32, orig_height: u32) -> Result<(u32, u32)> {
        if orig_width == 0 || orig_height == 0 {
            return Err(ProcessError::InvalidParameter(format!(
                "Cannot resize an empty {}x{} image",
                orig_width, orig_height
            )));
        }

        let (w, h) = (orig_width as f64, orig_height as f64);
        let scaled = |ratio: f64| ((w * ratio).round(), (h * ratio).round());

        let (target_w, target_h) = match *self {
            ResizeMode::Exact(width, height) => (width as f64, height as f64),
            ResizeMode::Ratio(ratio) => {
                if !ratio.is_finite() || ratio <= 0.0 {
                    return Err(ProcessError::InvalidParameter(format!(
                        "Resize ratio must be positive, got {}",
                        ratio
                    )));
                }
                scaled(ratio)
            }
            ResizeMode::Width(width) => (width as f64, (h * (width as f64 / w)).round()),
            ResizeMode::Height(height) => ((w * (height as f64 / h)).round(), height as f64),
            ResizeMode::LongerEdge(size) => {
                if orig_width >= orig_height {
                    scaled(size as f64 / w)
                } else {
                    scaled(size as f64 / h)
                }
            }
            ResizeMode::ShorterEdge(size) => {
                if orig_width <= orig_height {
                    scaled(size as f64 / w)
                } else {
                    scaled(size as f64 / h)
                }
            }
        };

        if target_w < 1.0 || target_h < 1.0 || target_w > u32::MAX as f64 || target_h > u32::MAX as f64 {
            return Err(ProcessError::InvalidParameter(format!(
                "Invalid resize size: {}x{}",
                target_w, target_h
            )));
        }

        Ok((target_w as u32, target_h as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_region_uses_shorter_edge() {
        assert_eq!(square_region(200, 100, Position::Center), (50, 0, 100));
        assert_eq!(square_region(100, 300, Position::Center), (0, 100, 100));
        assert_eq!(square_region(100, 100, Position::Bottom), (0, 0, 100));
    }

    #[test]
    fn square_region_anchors_along_longer_axis() {
        assert_eq!(square_region(200, 100, Position::Left), (0, 0, 100));
        assert_eq!(square_region(200, 100, Position::Right), (100, 0, 100));
        assert_eq!(square_region(100, 300, Position::Top), (0, 0, 100));
        assert_eq!(square_region(100, 300, Position::Bottom), (0, 200, 100));
        // Top on a landscape source has nothing to pin, so it centers.
        assert_eq!(square_region(200, 100, Position::Top), (50, 0, 100));
    }

    #[test]
    fn center_offset_floors_odd_differences() {
        assert_eq!(anchor_offset(Position::Center, (101, 51), (50, 50)), (25, 0));
    }

    #[test]
    fn crop_rejects_oversized_and_zero_requests() {
        assert!(matches!(
            crop_region((100, 100), 101, 10, CropOrigin::default()),
            Err(ProcessError::GeometryMismatch(_))
        ));
        assert!(matches!(
            crop_region((100, 100), 0, 10, CropOrigin::default()),
            Err(ProcessError::InvalidParameter(_))
        ));
    }

    #[test]
    fn crop_offset_must_fit() {
        assert_eq!(
            crop_region((100, 80), 50, 40, CropOrigin::Offset { x: 50, y: 40 }).unwrap(),
            (50, 40)
        );
        assert!(matches!(
            crop_region((100, 80), 50, 40, CropOrigin::Offset { x: 51, y: 0 }),
            Err(ProcessError::GeometryMismatch(_))
        ));
        assert!(matches!(
            crop_region((100, 80), 50, 40, CropOrigin::Offset { x: -1, y: 0 }),
            Err(ProcessError::GeometryMismatch(_))
        ));
    }

    #[test]
    fn crop_offset_near_integer_limits_is_rejected() {
        for (x, y) in [(i64::MAX, 0), (0, i64::MAX), (i64::MAX - 10, i64::MAX - 10)] {
            assert!(matches!(
                crop_region((100, 80), 50, 40, CropOrigin::Offset { x, y }),
                Err(ProcessError::GeometryMismatch(_))
            ));
        }
    }

    #[test]
    fn region_clamping_drops_empty_and_inverted() {
        let region = Region::new(-10, -5, 50, 500);
        assert_eq!(region.clamp_to(100, 100), Some(Region::new(0, 0, 50, 100)));
        assert_eq!(Region::new(80, 20, 20, 80).clamp_to(100, 100), None);
        assert_eq!(Region::new(120, 0, 150, 10).clamp_to(100, 100), None);
    }

    #[test]
    fn region_parses_from_csv() {
        let region: Region = "20, 20,80,80".parse().unwrap();
        assert_eq!(region, Region::new(20, 20, 80, 80));
        assert!("1,2,3".parse::<Region>().is_err());
        assert!("a,b,c,d".parse::<Region>().is_err());
    }

    #[test]
    fn resize_modes_preserve_aspect_ratio() {
        assert_eq!(ResizeMode::Exact(30, 70).target_size(100, 50).unwrap(), (30, 70));
        assert_eq!(ResizeMode::Ratio(0.5).target_size(100, 50).unwrap(), (50, 25));
        assert_eq!(ResizeMode::Width(50).target_size(100, 60).unwrap(), (50, 30));
        assert_eq!(ResizeMode::Height(30).target_size(100, 60).unwrap(), (50, 30));
        assert_eq!(ResizeMode::LongerEdge(50).target_size(100, 60).unwrap(), (50, 30));
        assert_eq!(ResizeMode::LongerEdge(50).target_size(60, 100).unwrap(), (30, 50));
        assert_eq!(ResizeMode::ShorterEdge(30).target_size(100, 60).unwrap(), (50, 30));
        assert_eq!(ResizeMode::ShorterEdge(30).target_size(60, 100).unwrap(), (30, 50));
    }

    #[test]
    fn resize_rejects_degenerate_targets() {
        assert!(ResizeMode::Ratio(0.0).target_size(100, 100).is_err());
        assert!(ResizeMode::Ratio(f64::NAN).target_size(100, 100).is_err());
        assert!(ResizeMode::Exact(0, 10).target_size(100, 100).is_err());
        assert!(ResizeMode::Ratio(0.001).target_size(100, 100).is_err());
    }

    #[test]
    fn anchor_point_respects_margin() {
        let outer = (200.0, 100.0);
        let inner = (50.0, 20.0);
        assert_eq!(anchor_point(Anchor::TopLeft, outer, inner, 10.0), (10.0, 10.0));
        assert_eq!(anchor_point(Anchor::BottomRight, outer, inner, 10.0), (140.0, 70.0));
        assert_eq!(anchor_point(Anchor::Center, outer, inner, 10.0), (75.0, 40.0));
    }

    #[test]
    fn positions_parse_case_insensitively() {
        assert_eq!("TOP".parse::<Position>().unwrap(), Position::Top);
        assert!("middle".parse::<Position>().is_err());
        assert_eq!("bottom-right".parse::<Anchor>().unwrap(), Anchor::BottomRight);
    }
}
