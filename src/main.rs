// vimage/src/main.rs
use anyhow::Context as _;
use clap::Parser;
use log::LevelFilter;
use std::path::Path;
use std::sync::Arc;
use vimage::cli::{Cli, Commands, IoArgs};
use vimage::core::geometry::CropOrigin;
use vimage::core::{Pipeline, ProcessOptions, ResizeMode};
use vimage::font::FontFace;
use vimage::generate::{captcha_png, CaptchaConfig};
use vimage::processors::prelude::*;
use vimage::processors::Direction;
use vimage::utils::{format_file_size, generate_output_path, parse_hex_color};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    match cli.command {
        Commands::Crop {
            io,
            width,
            height,
            position,
            x,
            y,
        } => {
            let origin = match (x, y) {
                (Some(x), Some(y)) => CropOrigin::Offset { x, y },
                _ => CropOrigin::Position(position),
            };
            let pipeline = Pipeline::new().buffer(CropProcessor::with_origin(width, height, origin)?);
            run_single(&io, &pipeline, "crop")
        }
        Commands::Square { io, position } => {
            run_single(&io, &Pipeline::new().buffer(SquareProcessor::new(position)), "square")
        }
        Commands::Resize {
            io,
            fit,
            width,
            height,
            ratio,
            size,
            algorithm,
        } => {
            let mode = fit.resize_mode(width, height, ratio, size)?;
            let resize = ResizeProcessor::with_algorithm(mode, algorithm.into())?;
            run_single(&io, &Pipeline::new().buffer(resize), "resized")
        }
        Commands::Mosaic {
            io,
            regions,
            percent,
            direction,
        } => {
            let mosaic = MosaicProcessor::new(regions, percent, Direction::parse(&direction))?;
            run_single(&io, &Pipeline::new().buffer(mosaic), "mosaic")
        }
        Commands::Circle { io } => {
            run_single(&io, &Pipeline::new().buffer(CircleMaskProcessor::new()), "circle")
        }
        Commands::Round { io, radius } => {
            run_single(&io, &Pipeline::new().buffer(RoundedCornerProcessor::new(radius)), "round")
        }
        Commands::Rotate {
            io,
            degrees,
            background,
            keep_size,
        } => {
            let mut rotate = RotateProcessor::new(degrees)?.with_keep_size(keep_size);
            if let Some(background) = background {
                rotate = rotate.with_background(parse_hex_color(&background)?);
            }
            run_single(&io, &Pipeline::new().buffer(rotate), "rotated")
        }
        Commands::Watermark {
            io,
            text,
            font,
            size,
            color,
            opacity,
            anchor,
            rotation,
        } => {
            let face = FontFace::from_file(&font, size)?;
            let watermark = WatermarkProcessor::new(text, face)
                .with_color(parse_hex_color(&color)?)
                .with_opacity(opacity)?
                .with_anchor(anchor)
                .with_rotation(rotation);
            run_single(&io, &Pipeline::new().context(watermark), "watermarked")
        }
        Commands::Captcha {
            text,
            font,
            output,
            size,
            width,
            height,
        } => {
            let face = FontFace::from_file(&font, size)?;
            let config = CaptchaConfig {
                width,
                height,
                ..Default::default()
            };
            let png = captcha_png(&text, &face, &config)?;
            std::fs::write(&output, &png)
                .with_context(|| format!("write captcha '{}'", output.display()))?;
            println!("Captcha saved to: {} ({})", output.display(), format_file_size(png.len() as u64));
            Ok(())
        }
        Commands::Batch {
            input,
            output,
            square,
            max_edge,
            round,
            circle,
            algorithm,
            quality,
            threads,
            recursive,
        } => {
            let mut pipeline = Pipeline::new();
            if square || circle {
                pipeline = pipeline.buffer(SquareProcessor::default());
            }
            if let Some(edge) = max_edge {
                pipeline = pipeline.buffer(ResizeProcessor::with_algorithm(
                    ResizeMode::LongerEdge(edge),
                    algorithm.into(),
                )?);
            }
            if circle {
                pipeline = pipeline.buffer(CircleMaskProcessor::new());
            }
            if let Some(radius) = round {
                pipeline = pipeline.buffer(RoundedCornerProcessor::new(radius));
            }
            if pipeline.is_empty() {
                anyhow::bail!("batch needs at least one of --square, --max-edge, --round, --circle");
            }

            let options = ProcessOptions {
                quality,
                ..Default::default()
            };
            let batch = BatchProcessor::new(Arc::new(pipeline), options, threads)?;
            let stats = batch.process_directory(&input, &output, recursive)?;

            println!(
                "Batch processing complete. Processed {} images to: {} ({} -> {})",
                stats.processed_count,
                output.display(),
                format_file_size(stats.total_size_before),
                format_file_size(stats.total_size_after)
            );
            for (path, error) in &stats.errors {
                eprintln!("  failed: {}: {}", path, error);
            }
            Ok(())
        }
    }
}

/// Loads `io.input`, runs `pipeline` and writes the result in the format
/// implied by the output extension.
fn run_single(io: &IoArgs, pipeline: &Pipeline, suffix: &str) -> anyhow::Result<()> {
    let options = io.options();
    options.validate()?;

    let decoder = Decoder::new(options.max_dimensions);
    let (image, _) = decoder
        .load(&io.input)
        .with_context(|| format!("load '{}'", io.input.display()))?;
    let image = pipeline.run(image)?;

    let output_path = generate_output_path(&io.input, io.output.as_deref(), suffix);
    ensure_parent(&output_path)?;
    let written = Encoder::from_options(&options)
        .save(&image, &output_path)
        .with_context(|| format!("save '{}'", output_path.display()))?;

    println!(
        "Saved {}x{} image to: {} ({})",
        image.width(),
        image.height(),
        output_path.display(),
        format_file_size(written)
    );
    Ok(())
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
