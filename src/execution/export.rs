//! The export loop: mask every frame of a source into a sink.

use crate::core::config::FilterConfig;
use crate::core::error::VideoError;
use crate::core::types::Frame;
use crate::execution::progress::{ExportStatus, ProgressCallback, ProgressTracker, ProgressUpdate};
use crate::filters::pipeline::FramePipeline;
use crate::video::{FrameSink, FrameSource};
use rayon::prelude::*;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Export options.
#[derive(Clone)]
pub struct ExportOptions {
    /// Frames masked in parallel per batch. 1 runs strictly sequentially.
    pub batch_size: usize,
    /// Progress callback.
    pub progress_callback: Option<Arc<ProgressCallback>>,
    /// Set to stop issuing reads; frames already read are still written.
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl std::fmt::Debug for ExportOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportOptions")
            .field("batch_size", &self.batch_size)
            .field("progress_callback", &self.progress_callback.as_ref().map(|_| "<callback>"))
            .field("cancel_flag", &self.cancel_flag)
            .finish()
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            batch_size: 1,
            progress_callback: None,
            cancel_flag: None,
        }
    }
}

impl ExportOptions {
    /// Create a new options builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask up to `size` frames in parallel.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Share a cancellation flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }
}

/// Outcome of an export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    /// Final state. `Running` only when the run was cancelled.
    pub status: ExportStatus,
    /// Frames masked and written.
    pub frames: u64,
    /// Frame count the source advertised.
    pub total_hint: u64,
    /// Wall time in milliseconds.
    pub duration_ms: u64,
}

impl ExportReport {
    /// Whether the run ended at the advertised frame count.
    pub fn is_complete(&self) -> bool {
        self.status == ExportStatus::FinishedOk
    }
}

/// Drives a [`FramePipeline`] over every frame of a source.
#[derive(Debug, Clone)]
pub struct ExportLoop {
    pipeline: FramePipeline,
    options: ExportOptions,
}

impl ExportLoop {
    /// Create a sequential export loop for `config`.
    pub fn new(config: FilterConfig) -> Self {
        Self::with_options(config, ExportOptions::default())
    }

    /// Create an export loop with explicit options.
    pub fn with_options(config: FilterConfig, options: ExportOptions) -> Self {
        Self {
            pipeline: FramePipeline::new(config),
            options,
        }
    }

    /// Mask every frame of `source` into `sink`.
    ///
    /// The sink is finished on every exit path. Read and write failures are
    /// returned after it has been released; frames already written stay
    /// written.
    pub fn run(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
    ) -> Result<ExportReport, VideoError> {
        let total_hint = source.info().total_frames;
        let mut tracker = ProgressTracker::new(total_hint);
        if let Some(callback) = &self.options.progress_callback {
            tracker = tracker.with_callback(callback.clone());
        }
        if let Some(flag) = &self.options.cancel_flag {
            tracker = tracker.with_cancel_flag(flag.clone());
        }

        log::info!("Starting to process and mask video frames...");
        tracker.start();

        let result = if self.options.batch_size > 1 {
            self.run_batched(source, sink, &mut tracker)
        } else {
            self.run_sequential(source, sink, &mut tracker)
        };
        let finished = sink.finish();

        let status = match result {
            Ok(status) => status,
            Err(e) => {
                // A dead encoder shows up as a broken pipe on write; its own
                // report comes from closing the sink.
                if let Err(close) = &finished {
                    log::error!("Closing the sink also failed: {}", close);
                }
                return Err(e);
            }
        };
        finished?;

        let report = ExportReport {
            status,
            frames: tracker.progress().frames,
            total_hint,
            duration_ms: tracker.elapsed_ms(),
        };

        match report.status {
            ExportStatus::FinishedOk => {
                log::info!("Video processing finished, masked a total of {} frames.", report.frames)
            }
            ExportStatus::FinishedShortRead { frames } => log::error!(
                "Frame processing error on frame number {} (expected {} frames).",
                frames,
                total_hint
            ),
            ExportStatus::Running => {
                log::warn!("Export cancelled after {} frames.", report.frames)
            }
        }
        Ok(report)
    }

    fn run_sequential(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        tracker: &mut ProgressTracker,
    ) -> Result<ExportStatus, VideoError> {
        loop {
            if tracker.is_cancelled() {
                tracker.report_cancelled();
                return Ok(ExportStatus::Running);
            }
            match source.read_frame()? {
                Some(frame) => {
                    let masked = self.pipeline.mask_frame(&frame);
                    sink.write_frame(&masked)?;
                    tracker.frame_completed();
                }
                None => return Ok(tracker.finish()),
            }
        }
    }

    fn run_batched(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        tracker: &mut ProgressTracker,
    ) -> Result<ExportStatus, VideoError> {
        let batch_size = self.options.batch_size;
        loop {
            let mut batch: Vec<Frame> = Vec::with_capacity(batch_size);
            let mut exhausted = false;
            let mut read_error = None;
            while batch.len() < batch_size && !tracker.is_cancelled() {
                match source.read_frame() {
                    Ok(Some(frame)) => batch.push(frame),
                    Ok(None) => {
                        exhausted = true;
                        break;
                    }
                    Err(e) => {
                        read_error = Some(e);
                        break;
                    }
                }
            }

            // Output order follows input order.
            let masked: Vec<Frame> = batch
                .par_iter()
                .map(|frame| self.pipeline.mask_frame(frame))
                .collect();
            for frame in &masked {
                sink.write_frame(frame)?;
                tracker.frame_completed();
            }

            // Frames read before the failure are written first.
            if let Some(e) = read_error {
                return Err(e);
            }
            if exhausted {
                return Ok(tracker.finish());
            }
            if tracker.is_cancelled() {
                tracker.report_cancelled();
                return Ok(ExportStatus::Running);
            }
        }
    }
}
