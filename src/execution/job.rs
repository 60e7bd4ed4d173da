//! End-to-end operations on video files: mask a whole video, or preview the
//! pipeline on a single frame.

use crate::core::config::FilterConfig;
use crate::core::error::{HsvMaskResult, VideoError};
use crate::execution::export::{ExportLoop, ExportOptions, ExportReport};
use crate::execution::paths::{base_name, resolve_output_path, source_extension};
use crate::filters::pipeline::{apply_mask, FramePipeline};
use crate::video::codec::{resolve_codec, CodecDecision, CodecProbe};
use crate::video::ffmpeg::{FfmpegCodecProbe, FfmpegSink, FfmpegSource, FfmpegTools};
use crate::video::FrameSource;
use std::path::{Path, PathBuf};

/// Masking of one video file.
#[derive(Debug, Clone)]
pub struct MaskJob {
    /// Video to mask.
    pub input: PathBuf,
    /// Folder for the result. `None` writes next to the input.
    pub output_dir: Option<PathBuf>,
    /// Filter parameters.
    pub config: FilterConfig,
    /// Export loop options.
    pub options: ExportOptions,
}

/// What a finished [`MaskJob`] produced.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Path of the masked video.
    pub output: PathBuf,
    /// Codec the video was written with.
    pub codec: CodecDecision,
    /// Export loop report.
    pub report: ExportReport,
}

impl MaskJob {
    /// Create a job writing next to `input` with default options.
    pub fn new(input: impl Into<PathBuf>, config: FilterConfig) -> Self {
        Self {
            input: input.into(),
            output_dir: None,
            config,
            options: ExportOptions::default(),
        }
    }

    /// Write the result into `dir`, created if missing.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set export options.
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Open the input, pick the output codec, and mask every frame.
    ///
    /// A short read is not an error; check [`ExportReport::is_complete`].
    pub fn run(&self, tools: &FfmpegTools) -> HsvMaskResult<JobOutcome> {
        let mut source = FfmpegSource::open(tools, &self.input)?;
        let info = source.info().clone();

        let available = FfmpegCodecProbe::new(tools.clone()).available_codecs();
        let codec = resolve_codec(
            info.codec.as_ref(),
            &source_extension(&self.input),
            &available,
        );
        let output_dir = self.output_dir.as_deref();
        let output = resolve_output_path(&self.input, output_dir, &codec.extension)?;

        let mut sink =
            FfmpegSink::create(tools, &output, &codec.codec, info.fps, info.resolution())?;
        let report = ExportLoop::with_options(self.config, self.options.clone())
            .run(&mut source, &mut sink)?;

        Ok(JobOutcome {
            output,
            codec,
            report,
        })
    }
}

/// Files written by [`write_preview`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFiles {
    /// The binary mask.
    pub mask: PathBuf,
    /// The frame with the mask applied.
    pub masked: PathBuf,
    /// The frame after blur and CLAHE.
    pub processed: PathBuf,
    /// The parameter dump.
    pub parameters: PathBuf,
}

/// Run the pipeline on frame `index` of `source` and write the mask, the
/// masked frame and the processed frame as PNGs named after `input` into
/// `dir`, followed by the parameters used.
pub fn write_preview(
    source: &mut dyn FrameSource,
    index: u64,
    config: &FilterConfig,
    input: &Path,
    dir: &Path,
) -> HsvMaskResult<PreviewFiles> {
    let mut frame = None;
    for _ in 0..=index {
        frame = source.read_frame()?;
        if frame.is_none() {
            break;
        }
    }
    let frame = frame.ok_or(VideoError::MissingFrame { index })?;

    let output = FramePipeline::new(*config).run(&frame);
    let masked = apply_mask(&frame, &output.mask);

    std::fs::create_dir_all(dir)?;
    let name = base_name(input);
    let files = PreviewFiles {
        mask: dir.join(format!("{}_mask.png", name)),
        masked: dir.join(format!("{}_masked.png", name)),
        processed: dir.join(format!("{}_processed.png", name)),
        parameters: config.save_to_dir(dir)?,
    };

    output.mask.save(&files.mask)?;
    masked.save(&files.masked)?;
    output.processed.save(&files.processed)?;
    log::info!("Wrote preview images to {}", dir.display());

    Ok(files)
}
