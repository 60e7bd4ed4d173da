//! Progress tracking for export runs.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Where an export run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportStatus {
    /// Frames are still being read.
    Running,
    /// The source ran out exactly at the advertised frame count.
    FinishedOk,
    /// The source ran out at a different count than advertised.
    FinishedShortRead {
        /// Number of frames masked before the source ran out.
        frames: u64,
    },
}

impl ExportStatus {
    /// Whether the run has ended, successfully or not.
    pub fn is_finished(&self) -> bool {
        !matches!(self, ExportStatus::Running)
    }
}

/// Frame counter and completion state of one export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportProgress {
    /// Frames masked and written so far.
    pub frames: u64,
    /// Frame count advertised by the source. Advisory.
    pub total_hint: u64,
    /// Current state.
    pub status: ExportStatus,
}

impl ExportProgress {
    /// Start a run expecting `total_hint` frames.
    pub fn new(total_hint: u64) -> Self {
        Self {
            frames: 0,
            total_hint,
            status: ExportStatus::Running,
        }
    }

    /// Record one more completed frame.
    pub fn advance(&mut self) {
        debug_assert!(!self.status.is_finished(), "advance after finish");
        self.frames += 1;
    }

    /// Completion percentage rounded to one decimal place.
    ///
    /// An unknown total (0) reports 100.
    pub fn percent(&self) -> f64 {
        if self.total_hint == 0 {
            return 100.0;
        }
        let raw = self.frames as f64 / self.total_hint as f64 * 100.0;
        (raw * 10.0).round() / 10.0
    }

    /// Close the run once the source has no more frames.
    pub fn finish(&mut self) -> ExportStatus {
        self.status = if self.frames == self.total_hint {
            ExportStatus::FinishedOk
        } else {
            ExportStatus::FinishedShortRead {
                frames: self.frames,
            }
        };
        self.status
    }
}

/// A progress update event.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// The run has started.
    Started {
        total_hint: u64,
    },
    /// A frame has been masked and written.
    FrameMasked {
        frames: u64,
        percent: f64,
        estimated_remaining_ms: Option<u64>,
    },
    /// The source was exhausted at the advertised frame count.
    Completed {
        frames: u64,
        total_duration_ms: u64,
    },
    /// The source was exhausted at a different frame count.
    ShortRead {
        frames: u64,
        expected: u64,
    },
    /// The run was cancelled before the source was exhausted.
    Cancelled {
        frames: u64,
    },
}

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Tracks export progress and allows cancellation.
pub struct ProgressTracker {
    /// Counter and status.
    progress: ExportProgress,
    /// Whether the run should stop issuing reads.
    cancelled: Arc<AtomicBool>,
    /// Start time.
    start_time: Option<Instant>,
    /// Progress callback.
    callback: Option<Arc<ProgressCallback>>,
    /// Sum of timed frame durations, in milliseconds.
    timed_ms: u64,
    /// Number of frames in `timed_ms`.
    timed_frames: u64,
    /// Time the previous frame completed.
    last_tick: Option<Instant>,
}

impl ProgressTracker {
    /// Create a tracker for a run expecting `total_hint` frames.
    pub fn new(total_hint: u64) -> Self {
        Self {
            progress: ExportProgress::new(total_hint),
            cancelled: Arc::new(AtomicBool::new(false)),
            start_time: None,
            callback: None,
            timed_ms: 0,
            timed_frames: 0,
            last_tick: None,
        }
    }

    /// Set a callback for progress updates.
    pub fn with_callback(mut self, callback: Arc<ProgressCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Share a cancellation flag with the caller.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = flag;
        self
    }

    /// Start tracking.
    pub fn start(&mut self) {
        let now = Instant::now();
        self.start_time = Some(now);
        self.last_tick = Some(now);
        self.send_update(ProgressUpdate::Started {
            total_hint: self.progress.total_hint,
        });
    }

    /// Report that one more frame has been written.
    pub fn frame_completed(&mut self) {
        self.progress.advance();

        let now = Instant::now();
        if let Some(last) = self.last_tick.replace(now) {
            self.timed_ms += now.duration_since(last).as_millis() as u64;
            self.timed_frames += 1;
        }

        let percent = self.progress.percent();
        log::debug!("Masked {} frames. Progress: {}%.", self.progress.frames, percent);
        self.send_update(ProgressUpdate::FrameMasked {
            frames: self.progress.frames,
            percent,
            estimated_remaining_ms: self.estimated_remaining_ms(),
        });
    }

    /// Close the run after the source is exhausted.
    pub fn finish(&mut self) -> ExportStatus {
        let status = self.progress.finish();
        match status {
            ExportStatus::FinishedOk => self.send_update(ProgressUpdate::Completed {
                frames: self.progress.frames,
                total_duration_ms: self.elapsed_ms(),
            }),
            ExportStatus::FinishedShortRead { frames } => {
                self.send_update(ProgressUpdate::ShortRead {
                    frames,
                    expected: self.progress.total_hint,
                })
            }
            ExportStatus::Running => {}
        }
        status
    }

    /// Check if the run should stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Report that the run stopped on cancellation.
    pub fn report_cancelled(&self) {
        self.send_update(ProgressUpdate::Cancelled {
            frames: self.progress.frames,
        });
    }

    /// Current counter and status.
    pub fn progress(&self) -> &ExportProgress {
        &self.progress
    }

    /// Milliseconds since [`start`](Self::start).
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    /// Estimate remaining time in milliseconds.
    pub fn estimated_remaining_ms(&self) -> Option<u64> {
        if self.timed_frames == 0 {
            return None;
        }

        let avg_time = self.timed_ms / self.timed_frames;
        let remaining = self.progress.total_hint.saturating_sub(self.progress.frames);

        Some(avg_time * remaining)
    }

    fn send_update(&self, update: ProgressUpdate) {
        if let Some(ref callback) = self.callback {
            callback(update);
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(0)
    }
}
