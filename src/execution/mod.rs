//! Export module.
//!
//! This module drives the per-frame pipeline over whole videos.

pub mod export;
pub mod job;
pub mod paths;
pub mod progress;

pub use export::{ExportLoop, ExportOptions, ExportReport};
pub use job::{write_preview, JobOutcome, MaskJob, PreviewFiles};
pub use paths::resolve_output_path;
pub use progress::{ExportProgress, ExportStatus, ProgressTracker, ProgressUpdate};
