// vimage/src/context/cpu.rs
//! Path painting through `vello_cpu`. Paths arrive in device space; each one
//! is rendered over its clipped bounding box, in tiles no larger than
//! `TILE`, and the premultiplied result is blended onto the straight-alpha
//! canvas.

use crate::core::PixelBuffer;
use image::{Pixel, Rgba};
use kurbo::{BezPath, PathEl, Shape};
use vello_cpu::kurbo as cpu_kurbo;

const TILE: u32 = 1024;

pub(crate) fn fill_path(canvas: &mut PixelBuffer, path: &BezPath, color: Rgba<u8>) {
    paint(canvas, path, color, None);
}

/// Strokes `path` with round caps and joins, `width` in device pixels.
pub(crate) fn stroke_path(canvas: &mut PixelBuffer, path: &BezPath, color: Rgba<u8>, width: f64) {
    let style = cpu_kurbo::Stroke::new(width)
        .with_caps(cpu_kurbo::Cap::Round)
        .with_join(cpu_kurbo::Join::Round);
    paint(canvas, path, color, Some(style));
}

fn paint(canvas: &mut PixelBuffer, path: &BezPath, color: Rgba<u8>, stroke: Option<cpu_kurbo::Stroke>) {
    if path.is_empty() || color[3] == 0 {
        return;
    }

    let margin = stroke.as_ref().map_or(0.0, |s| s.width / 2.0) + 1.0;
    let bounds = path.bounding_box().inflate(margin, margin);
    let x0 = bounds.x0.floor().max(0.0) as u32;
    let y0 = bounds.y0.floor().max(0.0) as u32;
    let x1 = bounds.x1.ceil().min(canvas.width() as f64).max(0.0) as u32;
    let y1 = bounds.y1.ceil().min(canvas.height() as f64).max(0.0) as u32;
    if x1 <= x0 || y1 <= y0 {
        return;
    }

    let cpu_path = bezpath_to_cpu(path);
    let cpu_color = vello_cpu::peniko::Color::from_rgba8(color[0], color[1], color[2], color[3]);

    for ty in (y0..y1).step_by(TILE as usize) {
        for tx in (x0..x1).step_by(TILE as usize) {
            let tw = TILE.min(x1 - tx) as u16;
            let th = TILE.min(y1 - ty) as u16;

            let mut ctx = vello_cpu::RenderContext::new(tw, th);
            ctx.set_transform(cpu_kurbo::Affine::translate((-(tx as f64), -(ty as f64))));
            ctx.set_paint(cpu_color);
            match &stroke {
                Some(style) => {
                    ctx.set_stroke(style.clone());
                    ctx.stroke_path(&cpu_path);
                }
                None => ctx.fill_path(&cpu_path),
            }
            ctx.flush();

            let mut layer = vello_cpu::Pixmap::new(tw, th);
            ctx.render_to_pixmap(&mut layer);
            blend_layer(canvas, &layer, tx, ty);
        }
    }
}

fn blend_layer(canvas: &mut PixelBuffer, layer: &vello_cpu::Pixmap, x0: u32, y0: u32) {
    let width = u32::from(layer.width());
    for (i, px) in layer.data_as_u8_slice().chunks_exact(4).enumerate() {
        if px[3] == 0 {
            continue;
        }
        let (x, y) = (x0 + i as u32 % width, y0 + i as u32 / width);
        canvas.get_pixel_mut(x, y).blend(&unpremultiply(px));
    }
}

fn unpremultiply(px: &[u8]) -> Rgba<u8> {
    let a = u32::from(px[3]);
    let straight = |c: u8| ((u32::from(c) * 255 + a / 2) / a).min(255) as u8;
    Rgba([straight(px[0]), straight(px[1]), straight(px[2]), px[3]])
}

fn point_to_cpu(p: kurbo::Point) -> cpu_kurbo::Point {
    cpu_kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> cpu_kurbo::BezPath {
    let mut out = cpu_kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3))
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
