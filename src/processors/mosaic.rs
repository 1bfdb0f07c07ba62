// vimage/src/processors/mosaic.rs
use crate::core::{BufferProcessor, PixelBuffer, ProcessError, Region, Result};
use image::Rgba;
use log::{debug, warn};

const MIN_TILE: i32 = 10;
const TILES_PER_AXIS: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Left,
    Right,
    Top,
    Bottom,
    #[default]
    Full,
}

impl Direction {
    /// Unrecognized names mean the whole region.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "left" => Direction::Left,
            "right" => Direction::Right,
            "top" => Direction::Top,
            "bottom" => Direction::Bottom,
            _ => Direction::Full,
        }
    }
}

/// The part of a clamped region that actually gets pixelated.
pub fn blurred_region(region: Region, percent: f32, direction: Direction) -> Region {
    let Region {
        from_x,
        from_y,
        to_x,
        to_y,
    } = region;
    let partial_width = (region.width() as f32 * percent) as i32;
    let partial_height = (region.height() as f32 * percent) as i32;

    match direction {
        Direction::Left => Region::new(from_x, from_y, from_x + partial_width, to_y),
        Direction::Right => Region::new(to_x - partial_width, from_y, to_x, to_y),
        Direction::Top => Region::new(from_x, from_y, to_x, from_y + partial_height),
        Direction::Bottom => Region::new(from_x, to_y - partial_height, to_x, to_y),
        Direction::Full => region,
    }
}

/// Tile edge for a blurred region: at least 10px, growing so that neither
/// axis has more than about ten tiles.
pub fn tile_size(region: Region) -> i32 {
    MIN_TILE
        .max(region.width() / TILES_PER_AXIS)
        .max(region.height() / TILES_PER_AXIS)
}

/// Per-channel color offsets in `[-10, 10]` for the tile whose top-left
/// corner is `(x, y)`. Same coordinates always give the same offsets.
pub fn tile_jitter(x: i32, y: i32) -> [i16; 3] {
    let seed = (x as i64 * 1_103_515_245 + y as i64 * 69_069) & 0x7fff_ffff;
    let offset = |shift: u32| ((seed >> shift) % 21 - 10) as i16;
    [offset(0), offset(8), offset(16)]
}

/// Pixelates regions of the image. Each tile becomes its mean color shifted
/// by a small deterministic per-tile jitter; alpha is the plain mean.
#[derive(Debug, Clone)]
pub struct MosaicProcessor {
    regions: Vec<Region>,
    percent: f32,
    direction: Direction,
}

impl MosaicProcessor {
    pub fn new(regions: Vec<Region>, percent: f32, direction: Direction) -> Result<Self> {
        if !(0.0..=1.0).contains(&percent) {
            return Err(ProcessError::InvalidParameter(format!(
                "Mosaic percent must be within [0, 1], got {}",
                percent
            )));
        }
        Ok(Self {
            regions,
            percent,
            direction,
        })
    }

    pub fn full(regions: Vec<Region>) -> Self {
        Self {
            regions,
            percent: 1.0,
            direction: Direction::Full,
        }
    }

    fn pixelate(&self, source: &PixelBuffer, target: &mut PixelBuffer, area: Region) {
        let tile = tile_size(area);
        debug!("Mosaic {} with {}px tiles", area, tile);

        for y in (area.from_y..area.to_y).step_by(tile as usize) {
            for x in (area.from_x..area.to_x).step_by(tile as usize) {
                let end_x = (x + tile).min(area.to_x);
                let end_y = (y + tile).min(area.to_y);

                let mut totals = [0u64; 4];
                let mut count = 0u64;
                for by in y..end_y {
                    for bx in x..end_x {
                        let pixel = source.get_pixel(bx as u32, by as u32);
                        for (total, &channel) in totals.iter_mut().zip(pixel.0.iter()) {
                            *total += channel as u64 * 257;
                        }
                        count += 1;
                    }
                }
                if count == 0 {
                    continue;
                }

                // 16-bit mean, reduced back to 8 bits
                let mean = totals.map(|t| (t / count / 256) as i16);
                let jitter = tile_jitter(x, y);
                let color = Rgba([
                    (mean[0] + jitter[0]).clamp(0, 255) as u8,
                    (mean[1] + jitter[1]).clamp(0, 255) as u8,
                    (mean[2] + jitter[2]).clamp(0, 255) as u8,
                    mean[3] as u8,
                ]);

                for by in y..end_y {
                    for bx in x..end_x {
                        target.put_pixel(bx as u32, by as u32, color);
                    }
                }
            }
        }
    }
}

impl BufferProcessor for MosaicProcessor {
    fn name(&self) -> &'static str {
        "mosaic"
    }

    fn process(&self, image: PixelBuffer) -> Result<PixelBuffer> {
        let mut output = image.clone();

        for region in &self.regions {
            let Some(clamped) = region.clamp_to(image.width(), image.height()) else {
                warn!(
                    "Skipping mosaic region {} outside {}x{} image",
                    region,
                    image.width(),
                    image.height()
                );
                continue;
            };

            let area = blurred_region(clamped, self.percent, self.direction);
            if area.width() <= 0 || area.height() <= 0 {
                continue;
            }
            self.pixelate(&image, &mut output, area);
        }

        Ok(output)
    }
}
