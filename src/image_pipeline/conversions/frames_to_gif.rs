use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::image_pipeline::{
    animation::{AnimationWriter, StandardGifWriter},
    common::error::{ConversionError, Result},
    composite,
    config::ConversionConfig,
    conversions::progress::ProgressReporter,
    conversions::timing::{PipelineTimings, Stage, Timer},
    loader::{FrameLoader, ImageCrateLoader, discover_frames},
    quantize::{self, IndexedFrame},
    resize,
    sequence::{FrameAssembler, FrameSequence},
};

/// Where the frames of a run come from
#[derive(Debug, Clone)]
pub enum FrameSource {
    /// Every supported file directly inside a folder
    Folder(PathBuf),
    /// An explicit list of frame files
    Files(Vec<PathBuf>),
}

impl FrameSource {
    pub fn resolve(&self) -> Result<Vec<PathBuf>> {
        match self {
            FrameSource::Folder(dir) => discover_frames(dir),
            FrameSource::Files(paths) => Ok(paths.clone()),
        }
    }
}

/// Shared flag checked before each frame is processed
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ConversionError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
    pub bytes_written: u64,
    pub timings: PipelineTimings,
}

struct CountingWriter<W: Write> {
    inner: W,
    count: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.count += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

pub struct FramesToGifPipeline<L: FrameLoader, W: AnimationWriter> {
    loader: L,
    writer: W,
    config: ConversionConfig,
}

impl FramesToGifPipeline<ImageCrateLoader, StandardGifWriter> {
    pub fn new(config: ConversionConfig) -> Result<Self> {
        Self::with_custom(ImageCrateLoader, StandardGifWriter, config)
    }
}

impl<L: FrameLoader + Sync, W: AnimationWriter + Sync> FramesToGifPipeline<L, W> {
    pub fn with_custom(loader: L, writer: W, config: ConversionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            loader,
            writer,
            config,
        })
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ConversionConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Load, resize, premultiply and quantize one frame file.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn process_frame(&self, path: &Path) -> Result<IndexedFrame> {
        let raster = {
            let _span = tracing::info_span!("load_frame").entered();
            self.loader.load(path)?
        };

        let raster = {
            let _span = tracing::info_span!("resize",
                width = raster.width(),
                height = raster.height()
            ).entered();
            resize::resize(raster, self.config.resize_factor)?
        };

        let raster = {
            let _span = tracing::info_span!("premultiply").entered();
            composite::premultiply(raster)
        };

        let _span = tracing::info_span!("quantize", colors = self.config.color_count).entered();
        quantize::quantize(&raster, self.config.color_count, self.config.dither)
    }

    /// Processes every path and returns the frames in sorted source order.
    pub fn build_sequence(
        &self,
        paths: &[PathBuf],
        progress: &ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<FrameSequence> {
        let total = paths.len();
        let process = |path: &PathBuf| -> Result<(PathBuf, IndexedFrame)> {
            cancel.check()?;
            let frame = self.process_frame(path).inspect_err(|e| {
                warn!("Frame {} failed: {}", path.display(), e);
            })?;
            progress.frame_processed(path, total);
            Ok((path.clone(), frame))
        };

        let processed = if self.config.parallel {
            paths.par_iter().map(&process).collect::<Result<Vec<_>>>()?
        } else {
            paths.iter().map(&process).collect::<Result<Vec<_>>>()?
        };

        let _span = tracing::info_span!("assemble", frames = processed.len()).entered();
        let mut assembler = FrameAssembler::with_capacity(processed.len());
        assembler.extend(processed);
        assembler.finish()
    }

    /// Encodes the frames at `paths` into `output`.
    pub fn convert_to_writer(
        &self,
        paths: &[PathBuf],
        output: &mut dyn Write,
        progress: &ProgressReporter,
    ) -> Result<ConversionSummary> {
        let result = self.encode_into(paths, output, progress, &CancelToken::new());
        Self::report_outcome(result, progress)
    }

    pub fn convert_files<P: AsRef<Path>>(
        &self,
        paths: &[PathBuf],
        output_path: P,
        progress: &ProgressReporter,
    ) -> Result<ConversionSummary> {
        self.run(
            &FrameSource::Files(paths.to_vec()),
            output_path.as_ref(),
            progress,
            &CancelToken::new(),
        )
    }

    pub fn convert_folder<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_dir: P,
        output_path: Q,
        progress: &ProgressReporter,
    ) -> Result<ConversionSummary> {
        self.run(
            &FrameSource::Folder(input_dir.as_ref().to_path_buf()),
            output_path.as_ref(),
            progress,
            &CancelToken::new(),
        )
    }

    /// Full run from a frame source to an output file.
    ///
    /// The output is written to a temporary file next to the destination and
    /// renamed into place only when encoding succeeded. Exactly one terminal
    /// progress event is emitted.
    #[instrument(skip(self, source, output_path, progress, cancel), fields(output = %output_path.display()))]
    pub fn run(
        &self,
        source: &FrameSource,
        output_path: &Path,
        progress: &ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<ConversionSummary> {
        let result = self.run_to_file(source, output_path, progress, cancel);
        Self::report_outcome(result, progress)
    }

    fn report_outcome(
        result: Result<ConversionSummary>,
        progress: &ProgressReporter,
    ) -> Result<ConversionSummary> {
        match &result {
            Ok(summary) => {
                summary.timings.log_summary();
                progress.completed(format!(
                    "Wrote {} frames ({}x{}, {} bytes)",
                    summary.frame_count, summary.width, summary.height, summary.bytes_written
                ));
            }
            Err(e) => {
                warn!("Conversion failed: {}", e);
                progress.failed(e);
            }
        }
        result
    }

    fn run_to_file(
        &self,
        source: &FrameSource,
        output_path: &Path,
        progress: &ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<ConversionSummary> {
        let mut timings = PipelineTimings::new();
        let discover = Timer::start(Stage::Discover);
        let paths = {
            let _span = tracing::info_span!("discover_frames").entered();
            source.resolve()?
        };
        timings.record(discover);

        info!(
            frames = paths.len(),
            output = %output_path.display(),
            "Converting frame sequence"
        );

        let parent = match output_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        // Staged only once every frame is in, so earlier failures leave no file behind
        let mut staged: Option<tempfile::NamedTempFile> = None;
        let mut summary = self.encode_with(&paths, progress, cancel, timings, |sequence, timings| {
            let temp = tempfile::Builder::new()
                .prefix(".alphagif-")
                .suffix(".tmp")
                .tempfile_in(parent)
                .map_err(|e| {
                    ConversionError::EncodeError(format!("{}: {}", parent.display(), e))
                })?;
            let temp = staged.insert(temp);

            let timer = Timer::start(Stage::Encode);
            let mut counting = CountingWriter {
                inner: std::io::BufWriter::new(temp.as_file_mut()),
                count: 0,
            };
            self.writer.write_animation(sequence, &mut counting, &self.config)?;
            counting
                .flush()
                .map_err(|e| ConversionError::EncodeError(e.to_string()))?;
            timings.record(timer);
            Ok(counting.count)
        })?;

        let temp = staged.ok_or_else(|| {
            ConversionError::EncodeError("animation was not staged".to_string())
        })?;

        let persist = Timer::start(Stage::WriteOutput);
        {
            let _span = tracing::info_span!("write_output").entered();
            temp.persist(output_path).map_err(|e| {
                ConversionError::EncodeError(format!("{}: {}", output_path.display(), e.error))
            })?;
        }
        summary.timings.record(persist);

        info!(
            frames = summary.frame_count,
            bytes = summary.bytes_written,
            "Animation written to {}",
            output_path.display()
        );
        Ok(summary)
    }

    fn encode_into(
        &self,
        paths: &[PathBuf],
        output: &mut dyn Write,
        progress: &ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<ConversionSummary> {
        self.encode_with(paths, progress, cancel, PipelineTimings::new(), |sequence, timings| {
            let timer = Timer::start(Stage::Encode);
            let mut counting = CountingWriter {
                inner: &mut *output,
                count: 0,
            };
            self.writer.write_animation(sequence, &mut counting, &self.config)?;
            timings.record(timer);
            Ok(counting.count)
        })
    }

    /// Shared middle of every run: process, assemble, then hand the
    /// sequence to `write`, which returns the number of bytes produced.
    fn encode_with<F>(
        &self,
        paths: &[PathBuf],
        progress: &ProgressReporter,
        cancel: &CancelToken,
        mut timings: PipelineTimings,
        write: F,
    ) -> Result<ConversionSummary>
    where
        F: FnOnce(&FrameSequence, &mut PipelineTimings) -> Result<u64>,
    {
        progress.started(paths.len());

        let timer = Timer::start(Stage::ProcessFrames);
        let sequence = {
            let _span = tracing::info_span!("process_frames", count = paths.len()).entered();
            self.build_sequence(paths, progress, cancel)?
        };
        timings.record(timer);

        cancel.check()?;
        progress.encoding(sequence.len());

        let bytes_written = {
            let _span = tracing::info_span!("encode_animation", frames = sequence.len()).entered();
            write(&sequence, &mut timings)?
        };

        let (width, height) = sequence.dimensions();
        Ok(ConversionSummary {
            frame_count: sequence.len(),
            width,
            height,
            bytes_written,
            timings,
        })
    }
}
