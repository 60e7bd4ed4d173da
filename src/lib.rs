//! # hsvmask - HSV colour-range video masking
//!
//! hsvmask keeps the parts of each video frame whose colour falls inside an
//! HSV range and blacks out everything else. The mask is cleaned up with
//! contour-area filtering and morphological closing before it is applied.
//!
//! ## Features
//!
//! - **Per-frame pipeline**: Gaussian blur, CLAHE, channel shifts, range threshold,
//!   small-object and small-hole removal, closing
//! - **Persisted parameters**: 15 integer parameters read from and written to JSON
//! - **Codec fallback**: keeps the source codec when it can be written, else `mp4v`
//! - **Batched export**: optionally masks several frames in parallel, written in order
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hsvmask::prelude::*;
//! use std::path::Path;
//!
//! let config = FilterConfig::load(Path::new("hsv_parameters_from_GUI.json"))?;
//!
//! let outcome = MaskJob::new("clip.mp4", config)
//!     .with_options(ExportOptions::new().with_batch_size(4))
//!     .run(&FfmpegTools::default())?;
//! assert!(outcome.report.is_complete());
//! println!("wrote {}", outcome.output.display());
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Frame types, the parameter record and error handling
//! - [`filters`]: Image operations and the per-frame pipeline
//! - [`video`]: Frame source/sink seams, codec resolution and the ffmpeg backend
//! - [`execution`]: The export loop, progress tracking and output paths

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod execution;
pub mod filters;
pub mod video;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use hsvmask::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{CodecId, Frame, Mask, VideoInfo, MASK_OFF, MASK_ON};

    // Parameters
    pub use crate::core::config::FilterConfig;

    // Errors
    pub use crate::core::error::{
        ConfigError, FieldViolation, HsvMaskError, HsvMaskResult, VideoError, VideoResult,
        Violation,
    };

    // Filters
    pub use crate::filters::pipeline::{apply_mask, FrameOutput, FramePipeline};

    // Video
    pub use crate::video::codec::{
        resolve_codec, CodecDecision, CodecProbe, StaticCodecProbe, DEFAULT_CODEC,
        DEFAULT_EXTENSION,
    };
    pub use crate::video::ffmpeg::{FfmpegCodecProbe, FfmpegSink, FfmpegSource, FfmpegTools};
    pub use crate::video::memory::{MemorySink, MemorySource};
    pub use crate::video::{FrameSink, FrameSource};

    // Execution
    pub use crate::execution::export::{ExportLoop, ExportOptions, ExportReport};
    pub use crate::execution::job::{write_preview, JobOutcome, MaskJob, PreviewFiles};
    pub use crate::execution::paths::resolve_output_path;
    pub use crate::execution::progress::{
        ExportProgress, ExportStatus, ProgressCallback, ProgressTracker, ProgressUpdate,
    };
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "hsvmask");
    }

    #[test]
    fn test_end_to_end_in_memory() {
        let info = VideoInfo {
            width: 16,
            height: 16,
            fps: 30.0,
            total_frames: 3,
            codec: Some(CodecId::new("XVID")),
        };
        let frames: Vec<Frame> = (0..3)
            .map(|_| RgbImage::from_pixel(16, 16, Rgb([10, 200, 30])))
            .collect();
        let mut source = MemorySource::new(info.clone(), frames.clone());
        let mut sink = MemorySink::new();

        let probe = StaticCodecProbe::new(["XVID", "mp4v"]);
        let decision = resolve_codec(info.codec.as_ref(), "avi", &probe.available_codecs());
        assert_eq!(decision.codec.as_str(), "XVID");
        assert!(!decision.fallback);

        // Full range keeps every pixel.
        let report = ExportLoop::new(FilterConfig::default())
            .run(&mut source, &mut sink)
            .unwrap();
        assert!(report.is_complete());
        assert_eq!(sink.frames(), frames.as_slice());
    }
}
