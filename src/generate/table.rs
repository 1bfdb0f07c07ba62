// vimage/src/generate/table.rs
use crate::context::DrawingContext;
use crate::core::{PixelBuffer, ProcessError, Result};
use crate::font::FontFace;
use image::Rgba;

const DEFAULT_COLUMN_WIDTH: f64 = 120.0;
const HEADER_COLUMN_WIDTH: f64 = 150.0;
const HEADER_ROW_HEIGHT: f64 = 50.0;
const ROW_HEIGHT: f64 = 40.0;

const HEADER_BACKGROUND: Rgba<u8> = Rgba([50, 100, 200, 255]);
const HEADER_TEXT: Rgba<u8> = Rgba([255, 255, 255, 255]);
const STRIPE: Rgba<u8> = Rgba([240, 245, 255, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const BORDER: Rgba<u8> = Rgba([200, 200, 200, 255]);

fn check_records(headers: &[String], records: &[Vec<String>], kind: &str) -> Result<()> {
    if headers.is_empty() {
        return Err(ProcessError::InvalidParameter("Headers cannot be empty".to_string()));
    }
    for (i, record) in records.iter().enumerate() {
        if record.len() != headers.len() {
            return Err(ProcessError::InvalidParameter(format!(
                "{} {} has {} cells, expected {}",
                kind,
                i,
                record.len(),
                headers.len()
            )));
        }
    }
    Ok(())
}

fn canvas(width: f64, height: f64, face: &FontFace) -> DrawingContext {
    let mut ctx = DrawingContext::new(width as u32, height as u32);
    ctx.set_color(WHITE);
    ctx.clear();
    ctx.set_font_face(face.clone());
    ctx
}

fn fill_rect(ctx: &mut DrawingContext, color: Rgba<u8>, x: f64, y: f64, width: f64, height: f64) {
    ctx.set_color(color);
    ctx.draw_rectangle(x, y, width, height);
    ctx.fill();
}

fn stroke_line(ctx: &mut DrawingContext, x1: f64, y1: f64, x2: f64, y2: f64) {
    ctx.draw_line(x1, y1, x2, y2);
    ctx.stroke();
}

fn outer_border(ctx: &mut DrawingContext, width: f64, height: f64) {
    ctx.set_color(BORDER);
    ctx.set_line_width(2.0);
    ctx.draw_rectangle(0.0, 0.0, width, height);
    ctx.stroke();
}

/// A table with the headers as its leftmost column and one column per record.
pub fn column_table(face: &FontFace, headers: &[String], data: &[Vec<String>]) -> Result<PixelBuffer> {
    check_records(headers, data, "Column")?;

    let width = HEADER_COLUMN_WIDTH + data.len() as f64 * DEFAULT_COLUMN_WIDTH;
    let height = headers.len() as f64 * ROW_HEIGHT;
    let mut ctx = canvas(width, height, face);

    fill_rect(&mut ctx, HEADER_BACKGROUND, 0.0, 0.0, HEADER_COLUMN_WIDTH, height);
    ctx.set_color(HEADER_TEXT);
    for (i, header) in headers.iter().enumerate() {
        let y = i as f64 * ROW_HEIGHT + ROW_HEIGHT / 2.0;
        ctx.draw_string_anchored(header, HEADER_COLUMN_WIDTH / 2.0, y, 0.5, 0.5)?;
    }

    for (col, record) in data.iter().enumerate() {
        let x = HEADER_COLUMN_WIDTH + col as f64 * DEFAULT_COLUMN_WIDTH;
        let background = if col % 2 == 0 { STRIPE } else { WHITE };
        fill_rect(&mut ctx, background, x, 0.0, DEFAULT_COLUMN_WIDTH, height);

        ctx.set_color(BLACK);
        for (row, cell) in record.iter().enumerate() {
            let y = row as f64 * ROW_HEIGHT + ROW_HEIGHT / 2.0;
            ctx.draw_string_anchored(cell, x + DEFAULT_COLUMN_WIDTH / 2.0, y, 0.5, 0.5)?;
        }
    }

    ctx.set_color(BORDER);
    ctx.set_line_width(1.0);
    for i in 1..headers.len() {
        let y = i as f64 * ROW_HEIGHT;
        stroke_line(&mut ctx, 0.0, y, width, y);
    }
    stroke_line(&mut ctx, HEADER_COLUMN_WIDTH, 0.0, HEADER_COLUMN_WIDTH, height);
    for i in 1..data.len() {
        let x = HEADER_COLUMN_WIDTH + i as f64 * DEFAULT_COLUMN_WIDTH;
        stroke_line(&mut ctx, x, 0.0, x, height);
    }
    outer_border(&mut ctx, width, height);

    log::debug!("Rendered column table {}x{}", width, height);
    Ok(ctx.into_image())
}

/// A conventional table: a header row followed by one row per record.
///
/// `widths`, when given, must have one entry per header.
pub fn row_table(
    face: &FontFace,
    headers: &[String],
    rows: &[Vec<String>],
    widths: Option<&[f64]>,
) -> Result<PixelBuffer> {
    check_records(headers, rows, "Row")?;

    let widths: Vec<f64> = match widths {
        Some(widths) if widths.len() != headers.len() => {
            return Err(ProcessError::InvalidParameter(format!(
                "Got {} column widths for {} headers",
                widths.len(),
                headers.len()
            )));
        }
        Some(widths) => {
            if let Some(bad) = widths.iter().find(|w| !w.is_finite() || **w <= 0.0) {
                return Err(ProcessError::InvalidParameter(format!(
                    "Column width must be positive, got {}",
                    bad
                )));
            }
            widths.to_vec()
        }
        None => vec![DEFAULT_COLUMN_WIDTH; headers.len()],
    };

    let width: f64 = widths.iter().sum();
    let height = HEADER_ROW_HEIGHT + rows.len() as f64 * ROW_HEIGHT;
    let mut ctx = canvas(width, height, face);

    fill_rect(&mut ctx, HEADER_BACKGROUND, 0.0, 0.0, width, HEADER_ROW_HEIGHT);
    ctx.set_color(HEADER_TEXT);
    let mut x = 0.0;
    for (header, column_width) in headers.iter().zip(&widths) {
        ctx.draw_string_anchored(header, x + column_width / 2.0, HEADER_ROW_HEIGHT / 2.0, 0.5, 0.5)?;
        x += column_width;
    }

    ctx.set_line_width(1.0);
    for (i, row) in rows.iter().enumerate() {
        let y = HEADER_ROW_HEIGHT + i as f64 * ROW_HEIGHT;
        let background = if i % 2 == 0 { STRIPE } else { WHITE };
        fill_rect(&mut ctx, background, 0.0, y, width, ROW_HEIGHT);

        ctx.set_color(BLACK);
        let mut x = 0.0;
        for (cell, column_width) in row.iter().zip(&widths) {
            ctx.draw_string_anchored(cell, x + column_width / 2.0, y + ROW_HEIGHT / 2.0, 0.5, 0.5)?;
            x += column_width;
        }

        ctx.set_color(BORDER);
        stroke_line(&mut ctx, 0.0, y, width, y);
    }

    ctx.set_color(BORDER);
    let mut x = 0.0;
    for column_width in &widths[..widths.len() - 1] {
        x += column_width;
        stroke_line(&mut ctx, x, HEADER_ROW_HEIGHT, x, height);
    }
    outer_border(&mut ctx, width, height);

    log::debug!("Rendered row table {}x{}", width, height);
    Ok(ctx.into_image())
}
