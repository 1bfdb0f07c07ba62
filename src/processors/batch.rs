// vimage/src/processors/batch.rs
use crate::core::pipeline::process_bytes;
use crate::core::{Pipeline, ProcessError, ProcessOptions, ProcessingStats, Result};
use crate::utils::is_supported_format;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Runs one shared pipeline over every image in a directory.
///
/// Each file is decoded, processed and encoded independently, so one bad
/// file only shows up in [`ProcessingStats::errors`].
pub struct BatchProcessor {
    pipeline: Arc<Pipeline>,
    options: ProcessOptions,
    thread_pool: Option<rayon::ThreadPool>,
    show_progress: bool,
}

impl BatchProcessor {
    /// `max_threads == 0` uses the global rayon pool.
    pub fn new(pipeline: Arc<Pipeline>, options: ProcessOptions, max_threads: usize) -> Result<Self> {
        options.validate()?;

        let thread_pool = if max_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(max_threads)
                .build()
                .map_err(|e| {
                    ProcessError::InvalidParameter(format!("Failed to create thread pool: {}", e))
                })?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            pipeline,
            options,
            thread_pool,
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        recursive: bool,
    ) -> Result<ProcessingStats> {
        self.validate_paths(input_dir, output_dir)?;

        let image_paths = self.collect_image_paths(input_dir, recursive);
        if image_paths.is_empty() {
            log::warn!("No image files found in {}", input_dir.display());
            return Ok(ProcessingStats::default());
        }

        log::info!(
            "Processing {} images from {} through {} steps",
            image_paths.len(),
            input_dir.display(),
            self.pipeline.len()
        );

        std::fs::create_dir_all(output_dir)?;
        let pb = self.create_progress_bar(image_paths.len());

        let run = || -> Vec<(PathBuf, Result<(u64, u64)>)> {
            image_paths
                .par_iter()
                .progress_with(pb.clone())
                .map(|input_path| {
                    let result = self.process_file(input_path, input_dir, output_dir);
                    (input_path.clone(), result)
                })
                .collect()
        };
        let results = match &self.thread_pool {
            Some(pool) => pool.install(run),
            None => run(),
        };

        let mut stats = ProcessingStats::default();
        for (path, result) in results {
            match result {
                Ok((before, after)) => {
                    stats.processed_count += 1;
                    stats.total_size_before += before;
                    stats.total_size_after += after;
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    stats.errors.push((path.display().to_string(), e.to_string()));
                }
            }
        }

        pb.finish_with_message(format!(
            "Processed {} images ({:.1}% size reduction)",
            stats.processed_count,
            calculate_overall_savings(&stats)
        ));

        Ok(stats)
    }

    /// Output keeps the path relative to `input_dir`, so recursive runs
    /// cannot collide on equal file names.
    fn process_file(&self, input_path: &Path, input_dir: &Path, output_dir: &Path) -> Result<(u64, u64)> {
        let relative = input_path.strip_prefix(input_dir).map_err(|_| {
            ProcessError::InvalidParameter(format!("Invalid file name: {}", input_path.display()))
        })?;
        let output_path = output_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let input = std::fs::read(input_path)?;
        let output = process_bytes(&input, &self.pipeline, &self.options)?;
        std::fs::write(&output_path, &output)?;

        log::debug!(
            "{} -> {} ({} -> {} bytes)",
            input_path.display(),
            output_path.display(),
            input.len(),
            output.len()
        );
        Ok((input.len() as u64, output.len() as u64))
    }

    fn collect_image_paths(&self, input_dir: &Path, recursive: bool) -> Vec<PathBuf> {
        let walker = if recursive {
            WalkDir::new(input_dir)
        } else {
            WalkDir::new(input_dir).max_depth(1)
        };

        let mut paths: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| is_supported_format(entry.path()))
            .map(|entry| entry.into_path())
            .collect();
        paths.sort();
        paths
    }

    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb
    }

    pub fn validate_paths(&self, input_dir: &Path, output_dir: &Path) -> Result<()> {
        if input_dir.to_string_lossy().contains("..") {
            return Err(ProcessError::SecurityError(
                "Path traversal detected in input path".to_string(),
            ));
        }

        if output_dir.to_string_lossy().contains("..") {
            return Err(ProcessError::SecurityError(
                "Path traversal detected in output path".to_string(),
            ));
        }

        if !input_dir.is_dir() {
            return Err(ProcessError::InvalidParameter(format!(
                "Input directory does not exist: {}",
                input_dir.display()
            )));
        }

        if output_dir.exists() && !output_dir.is_dir() {
            return Err(ProcessError::InvalidParameter(format!(
                "Output path exists but is not a directory: {}",
                output_dir.display()
            )));
        }

        if input_dir == output_dir {
            return Err(ProcessError::InvalidParameter(
                "Input and output directories cannot be the same".to_string(),
            ));
        }

        Ok(())
    }
}

pub fn calculate_overall_savings(stats: &ProcessingStats) -> f64 {
    if stats.total_size_before == 0 {
        return 0.0;
    }

    let savings = (stats.total_size_before as f64 - stats.total_size_after as f64)
        / stats.total_size_before as f64
        * 100.0;
    savings.clamp(0.0, 100.0)
}
