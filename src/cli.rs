// vimage/src/cli.rs
use crate::core::{Anchor, Position, ProcessError, ProcessOptions, Region, ResizeAlgorithm, ResizeMode, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vimage", version, about = "Crop, resize, mask, mosaic and annotate images")]
pub struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Input and output shared by the single-image commands.
#[derive(Args, Debug, Clone)]
pub struct IoArgs {
    /// Source image.
    pub input: PathBuf,

    /// Output path; defaults to a timestamped name next to the input.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JPEG quality (1-100).
    #[arg(short, long, default_value_t = 90)]
    pub quality: u8,

    /// Run PNG output through oxipng.
    #[arg(long)]
    pub optimize_png: bool,
}

impl IoArgs {
    pub fn options(&self) -> ProcessOptions {
        ProcessOptions {
            quality: self.quality,
            optimize_png: self.optimize_png,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cut a width x height rectangle out of the image.
    Crop {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Anchor along each axis: center, top, bottom, left or right.
        #[arg(long, default_value = "center")]
        position: Position,
        /// Explicit left edge; requires --y.
        #[arg(long, requires = "y")]
        x: Option<i64>,
        /// Explicit top edge; requires --x.
        #[arg(long, requires = "x")]
        y: Option<i64>,
    },

    /// Crop to the largest centered (or anchored) square.
    Square {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, default_value = "center")]
        position: Position,
    },

    /// Scale the image.
    Resize {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, value_enum, default_value_t = Fit::Exact)]
        fit: Fit,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// Scale factor for --fit ratio.
        #[arg(long)]
        ratio: Option<f64>,
        /// Edge length for --fit longer-edge / shorter-edge.
        #[arg(long)]
        size: Option<u32>,
        #[arg(long, value_enum, default_value_t = Algorithm::Bilinear)]
        algorithm: Algorithm,
    },

    /// Pixelate one or more regions.
    Mosaic {
        #[command(flatten)]
        io: IoArgs,
        /// Region as from_x,from_y,to_x,to_y; may be repeated.
        #[arg(long = "region", required = true)]
        regions: Vec<Region>,
        /// Share of each region to pixelate (0-1).
        #[arg(long, default_value_t = 1.0)]
        percent: f32,
        /// Edge the pixelation grows from: left, right, top, bottom or full.
        #[arg(long, default_value = "full")]
        direction: String,
    },

    /// Cut a square image to a circle.
    Circle {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Round the corners.
    Round {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long)]
        radius: u32,
    },

    /// Rotate clockwise about the center.
    Rotate {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, allow_hyphen_values = true)]
        degrees: f64,
        /// Fill for uncovered corners, as #rrggbb[aa].
        #[arg(long)]
        background: Option<String>,
        /// Keep the original canvas size.
        #[arg(long)]
        keep_size: bool,
    },

    /// Stamp a text watermark.
    Watermark {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long)]
        text: String,
        /// TrueType/OpenType font file.
        #[arg(long)]
        font: PathBuf,
        #[arg(long, default_value_t = 24.0)]
        size: f32,
        #[arg(long, default_value = "#ffffff")]
        color: String,
        #[arg(long, default_value_t = 0.5)]
        opacity: f64,
        #[arg(long, default_value = "bottom-right")]
        anchor: Anchor,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        rotation: f64,
    },

    /// Render a captcha PNG.
    Captcha {
        text: String,
        #[arg(long)]
        font: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 24.0)]
        size: f32,
        #[arg(long, default_value_t = 120)]
        width: u32,
        #[arg(long, default_value_t = 40)]
        height: u32,
    },

    /// Apply square / resize / mask steps to every image in a directory.
    Batch {
        input: PathBuf,
        output: PathBuf,
        /// Crop each image to a square first.
        #[arg(long)]
        square: bool,
        /// Scale so the longer edge has this length.
        #[arg(long)]
        max_edge: Option<u32>,
        /// Round corners with this radius.
        #[arg(long, conflicts_with = "circle")]
        round: Option<u32>,
        /// Cut to a circle (implies --square).
        #[arg(long)]
        circle: bool,
        #[arg(long, value_enum, default_value_t = Algorithm::Bilinear)]
        algorithm: Algorithm,
        #[arg(short, long, default_value_t = 90)]
        quality: u8,
        /// Worker threads; 0 uses all cores.
        #[arg(short = 'j', long, default_value_t = 0)]
        threads: usize,
        #[arg(short, long)]
        recursive: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Algorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<Algorithm> for ResizeAlgorithm {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Nearest => ResizeAlgorithm::Nearest,
            Algorithm::Bilinear => ResizeAlgorithm::Bilinear,
            Algorithm::Bicubic => ResizeAlgorithm::Bicubic,
            Algorithm::Lanczos3 => ResizeAlgorithm::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Fit {
    Exact,
    Ratio,
    Width,
    Height,
    LongerEdge,
    ShorterEdge,
}

impl Fit {
    /// Combines the fit with whichever size flags it needs.
    pub fn resize_mode(
        self,
        width: Option<u32>,
        height: Option<u32>,
        ratio: Option<f64>,
        size: Option<u32>,
    ) -> Result<ResizeMode> {
        let missing = |flag: &str| {
            ProcessError::InvalidParameter(format!("--fit {:?} requires {}", self, flag))
        };

        Ok(match self {
            Fit::Exact => ResizeMode::Exact(
                width.ok_or_else(|| missing("--width"))?,
                height.ok_or_else(|| missing("--height"))?,
            ),
            Fit::Ratio => ResizeMode::Ratio(ratio.ok_or_else(|| missing("--ratio"))?),
            Fit::Width => ResizeMode::Width(width.ok_or_else(|| missing("--width"))?),
            Fit::Height => ResizeMode::Height(height.ok_or_else(|| missing("--height"))?),
            Fit::LongerEdge => ResizeMode::LongerEdge(size.ok_or_else(|| missing("--size"))?),
            Fit::ShorterEdge => ResizeMode::ShorterEdge(size.ok_or_else(|| missing("--size"))?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_mosaic_regions() {
        let cli = Cli::try_parse_from([
            "vimage", "mosaic", "in.png", "--region", "0,0,10,10", "--region", "20,20,40,40",
            "--percent", "0.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Mosaic { regions, percent, .. } => {
                assert_eq!(regions.len(), 2);
                assert_eq!(regions[1], Region::new(20, 20, 40, 40));
                assert_eq!(percent, 0.5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn negative_rotation_is_accepted() {
        let cli = Cli::try_parse_from(["vimage", "rotate", "in.png", "--degrees", "-30"]).unwrap();
        assert!(matches!(cli.command, Commands::Rotate { degrees, .. } if degrees == -30.0));
    }

    #[test]
    fn bad_position_is_rejected() {
        assert!(Cli::try_parse_from(["vimage", "square", "in.png", "--position", "middle"]).is_err());
    }

    #[test]
    fn fit_requires_its_size_flag() {
        assert_eq!(
            Fit::LongerEdge.resize_mode(None, None, None, Some(64)).unwrap(),
            ResizeMode::LongerEdge(64)
        );
        assert!(Fit::Exact.resize_mode(Some(10), None, None, None).is_err());
    }
}
