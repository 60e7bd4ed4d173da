//! Video input and output seams.
//!
//! The masking loop only needs decoded frames in and frames out. Decoding,
//! encoding and containers belong to whatever implements [`FrameSource`] and
//! [`FrameSink`]; the crate ships an `ffmpeg`-process backend in [`ffmpeg`]
//! and in-memory implementations in [`memory`].

pub mod codec;
pub mod ffmpeg;
pub mod memory;

use crate::core::error::VideoResult;
use crate::core::types::{Frame, VideoInfo};

pub use codec::{resolve_codec, CodecDecision, CodecProbe, DEFAULT_CODEC, DEFAULT_EXTENSION};

/// A stream of decoded frames.
pub trait FrameSource {
    /// Stream properties, queried once at open.
    fn info(&self) -> &VideoInfo;

    /// Read the next frame. `Ok(None)` means no more frames are available.
    fn read_frame(&mut self) -> VideoResult<Option<Frame>>;
}

/// A destination for frames, opened with a codec, frame rate and resolution.
pub trait FrameSink {
    /// Append one frame.
    fn write_frame(&mut self, frame: &Frame) -> VideoResult<()>;

    /// Flush and release the sink. Calling it again is a no-op.
    fn finish(&mut self) -> VideoResult<()>;
}
