// vimage/src/core/pipeline.rs
use super::{PixelBuffer, ProcessError, ProcessOptions, Result};
use crate::context::DrawingContext;
use crate::processors::{Decoder, Encoder};
use log::{debug, info};

/// A transform that consumes a buffer and hands back a new (or the same) one.
pub trait BufferProcessor: Send + Sync {
    fn name(&self) -> &'static str;
    fn process(&self, image: PixelBuffer) -> Result<PixelBuffer>;
}

/// A transform that draws into the shared [`DrawingContext`].
///
/// Implementations must leave the drawing-state stack as they found it.
pub trait ContextProcessor: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, ctx: &mut DrawingContext) -> Result<()>;
}

/// One pipeline entry, tagged with the execution model it needs.
pub enum Step {
    Buffer(Box<dyn BufferProcessor>),
    Context(Box<dyn ContextProcessor>),
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Buffer(processor) => processor.name(),
            Step::Context(processor) => processor.name(),
        }
    }

    pub fn is_context(&self) -> bool {
        matches!(self, Step::Context(_))
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Buffer(p) => write!(f, "Buffer({})", p.name()),
            Step::Context(p) => write!(f, "Context({})", p.name()),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub steps_run: usize,
    pub contexts_opened: usize,
    pub contexts_finalized: usize,
}

enum Stage {
    Buffer(PixelBuffer),
    Context(DrawingContext),
}

/// Ordered chain of processors. Consecutive context steps share one
/// [`DrawingContext`]; a buffer step flattens any open context first.
#[derive(Debug, Default)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn buffer<P: BufferProcessor + 'static>(mut self, processor: P) -> Self {
        self.steps.push(Step::Buffer(Box::new(processor)));
        self
    }

    pub fn context<P: ContextProcessor + 'static>(mut self, processor: P) -> Self {
        self.steps.push(Step::Context(Box::new(processor)));
        self
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn run(&self, image: PixelBuffer) -> Result<PixelBuffer> {
        self.run_with_stats(image).map(|(image, _)| image)
    }

    pub fn run_with_stats(&self, image: PixelBuffer) -> Result<(PixelBuffer, PipelineStats)> {
        let mut stats = PipelineStats::default();
        let mut stage = Stage::Buffer(image);

        for (index, step) in self.steps.iter().enumerate() {
            debug!("Running step {} ({})", index, step.name());
            let wrap = |source: ProcessError| ProcessError::ChainFailure {
                index,
                step: step.name(),
                source: Box::new(source),
            };

            stage = match (stage, step) {
                (Stage::Buffer(image), Step::Buffer(processor)) => {
                    Stage::Buffer(processor.process(image).map_err(wrap)?)
                }
                (Stage::Context(ctx), Step::Buffer(processor)) => {
                    let image = ctx.into_image();
                    stats.contexts_finalized += 1;
                    Stage::Buffer(processor.process(image).map_err(wrap)?)
                }
                (Stage::Buffer(image), Step::Context(processor)) => {
                    let mut ctx = DrawingContext::from_image(image);
                    stats.contexts_opened += 1;
                    processor.apply(&mut ctx).map_err(wrap)?;
                    Stage::Context(ctx)
                }
                (Stage::Context(mut ctx), Step::Context(processor)) => {
                    processor.apply(&mut ctx).map_err(wrap)?;
                    Stage::Context(ctx)
                }
            };
            stats.steps_run += 1;
        }

        let image = match stage {
            Stage::Buffer(image) => image,
            Stage::Context(ctx) => {
                stats.contexts_finalized += 1;
                ctx.into_image()
            }
        };

        debug!(
            "Pipeline finished: {} steps, {} contexts",
            stats.steps_run, stats.contexts_finalized
        );
        Ok((image, stats))
    }
}

/// Runs context processors against a fresh context seeded with `image`.
pub fn run_in_context(image: PixelBuffer, processors: &[&dyn ContextProcessor]) -> Result<PixelBuffer> {
    let mut ctx = DrawingContext::from_image(image);
    for (index, processor) in processors.iter().enumerate() {
        processor
            .apply(&mut ctx)
            .map_err(|source| ProcessError::ChainFailure {
                index,
                step: processor.name(),
                source: Box::new(source),
            })?;
    }
    Ok(ctx.into_image())
}

/// Decodes `bytes`, runs `pipeline` and re-encodes in the source format.
pub fn process_bytes(bytes: &[u8], pipeline: &Pipeline, options: &ProcessOptions) -> Result<Vec<u8>> {
    options.validate()?;

    let decoder = Decoder::new(options.max_dimensions);
    let (image, format) = decoder.decode(bytes)?;
    let image = pipeline.run(image)?;

    let encoder = Encoder::from_options(options);
    let output = encoder.encode(&image, format)?;
    info!(
        "Processed {} bytes into {} bytes ({} steps)",
        bytes.len(),
        output.len(),
        pipeline.len()
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Invert;

    impl BufferProcessor for Invert {
        fn name(&self) -> &'static str {
            "invert"
        }

        fn process(&self, mut image: PixelBuffer) -> Result<PixelBuffer> {
            for pixel in image.pixels_mut() {
                pixel.0[0] = 255 - pixel.0[0];
            }
            Ok(image)
        }
    }

    /// Writes a marker pixel and records how many pushes it saw outstanding.
    struct Mark {
        x: u32,
        value: u8,
        depth_seen: Arc<AtomicUsize>,
    }

    impl ContextProcessor for Mark {
        fn name(&self) -> &'static str {
            "mark"
        }

        fn apply(&self, ctx: &mut DrawingContext) -> Result<()> {
            self.depth_seen.fetch_add(ctx.depth(), Ordering::SeqCst);
            ctx.push();
            ctx.translate(100.0, 100.0);
            ctx.set_color(Rgba([self.value, 0, 0, 255]));
            ctx.set_pixel(self.x as i32, 0);
            ctx.pop();
            Ok(())
        }
    }

    struct Fails;

    impl BufferProcessor for Fails {
        fn name(&self) -> &'static str {
            "fails"
        }

        fn process(&self, _image: PixelBuffer) -> Result<PixelBuffer> {
            Err(ProcessError::GeometryMismatch("not square".to_string()))
        }
    }

    fn mark(x: u32, value: u8, depth: &Arc<AtomicUsize>) -> Mark {
        Mark {
            x,
            value,
            depth_seen: Arc::clone(depth),
        }
    }

    #[test]
    fn mixed_chain_finalizes_context_twice() {
        let depth = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .context(mark(0, 10, &depth))
            .context(mark(1, 20, &depth))
            .buffer(Invert)
            .context(mark(2, 30, &depth));

        let image = PixelBuffer::from_pixel(4, 1, Rgba([0, 0, 0, 255]));
        let (out, stats) = pipeline.run_with_stats(image).unwrap();

        assert_eq!(stats.steps_run, 4);
        assert_eq!(stats.contexts_opened, 2);
        assert_eq!(stats.contexts_finalized, 2);
        // The first two marks were inverted by the buffer step, the last was not.
        assert_eq!(out.get_pixel(0, 0)[0], 245);
        assert_eq!(out.get_pixel(1, 0)[0], 235);
        assert_eq!(out.get_pixel(2, 0)[0], 30);
        assert_eq!(out.get_pixel(3, 0)[0], 255);
        // No step ever saw another step's pushed state.
        assert_eq!(depth.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn buffer_only_chain_never_opens_a_context() {
        let pipeline = Pipeline::new().buffer(Invert).buffer(Invert);
        let image = PixelBuffer::from_pixel(2, 2, Rgba([7, 0, 0, 255]));
        let (out, stats) = pipeline.run_with_stats(image.clone()).unwrap();
        assert_eq!(out, image);
        assert_eq!(stats.contexts_opened, 0);
        assert_eq!(stats.contexts_finalized, 0);
    }

    #[test]
    fn failing_step_reports_its_index() {
        let pipeline = Pipeline::new().buffer(Invert).buffer(Fails);
        let err = pipeline
            .run(PixelBuffer::new(2, 2))
            .unwrap_err();

        match &err {
            ProcessError::ChainFailure { index, step, .. } => {
                assert_eq!(*index, 1);
                assert_eq!(*step, "fails");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(err.root_cause(), ProcessError::GeometryMismatch(_)));
    }

    #[test]
    fn empty_pipeline_returns_input() {
        let image = PixelBuffer::from_pixel(3, 3, Rgba([1, 2, 3, 4]));
        assert_eq!(Pipeline::new().run(image.clone()).unwrap(), image);
    }

    #[test]
    fn run_in_context_applies_in_order() {
        let depth = Arc::new(AtomicUsize::new(0));
        let first = mark(0, 50, &depth);
        let second = mark(0, 60, &depth);
        let out = run_in_context(PixelBuffer::new(1, 1), &[&first, &second]).unwrap();
        assert_eq!(out.get_pixel(0, 0)[0], 60);
    }
}
