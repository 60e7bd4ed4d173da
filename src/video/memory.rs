//! In-memory frame sources and sinks.

use crate::core::error::VideoResult;
use crate::core::types::{Frame, VideoInfo};
use crate::video::{FrameSink, FrameSource};
use std::collections::VecDeque;

/// A source yielding frames from memory.
///
/// The reported total is independent of the frames held, which makes it
/// possible to model containers whose frame count is wrong.
#[derive(Debug, Clone)]
pub struct MemorySource {
    info: VideoInfo,
    frames: VecDeque<Frame>,
}

impl MemorySource {
    /// Create a source over `frames` reporting `info`.
    pub fn new(info: VideoInfo, frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            info,
            frames: frames.into_iter().collect(),
        }
    }

    /// Frames not yet read.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for MemorySource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read_frame(&mut self) -> VideoResult<Option<Frame>> {
        Ok(self.frames.pop_front())
    }
}

/// A sink collecting frames in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    frames: Vec<Frame>,
    finished: bool,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames written so far, in write order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Whether [`FrameSink::finish`] has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &Frame) -> VideoResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> VideoResult<()> {
        self.finished = true;
        Ok(())
    }
}
