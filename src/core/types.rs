//! Core value types that flow through the masking pipeline.
//!
//! Frames and masks are plain `image` buffers so that every stage can lean on
//! `imageproc` directly:
//! - A frame is a dense 3-channel 8-bit grid ([`Frame`])
//! - A mask is a single-channel grid holding only 0 or 255 ([`Mask`])

use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One decoded video frame, 3 channels of 8-bit samples.
pub type Frame = RgbImage;

/// Binary mask. Every sample is either [`MASK_OFF`] or [`MASK_ON`].
pub type Mask = GrayImage;

/// Mask value for excluded pixels.
pub const MASK_OFF: u8 = 0;

/// Mask value for included pixels.
pub const MASK_ON: u8 = 255;

/// A four-character video codec code (e.g. `mp4v`, `XVID`).
///
/// Fourccs are case sensitive: `H264` and `h264` name different encoders in
/// most backends, so comparisons are exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodecId(String);

impl CodecId {
    /// Create a codec id from its textual fourcc.
    pub fn new(fourcc: impl Into<String>) -> Self {
        Self(fourcc.into())
    }

    /// Decode a little-endian packed fourcc, as stored in container headers.
    ///
    /// Returns `None` for a zero tag or for bytes that are not printable ASCII.
    pub fn from_packed(tag: u32) -> Option<Self> {
        if tag == 0 {
            return None;
        }
        let bytes = tag.to_le_bytes();
        if !bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            return None;
        }
        let text: String = bytes.iter().map(|&b| b as char).collect();
        Some(Self(text.trim_end().to_string()))
    }

    /// The fourcc as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CodecId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Stream properties queried once when a video source is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frames per second
    pub fps: f64,
    /// Frame count reported by the container. Advisory only: container
    /// metadata can be wrong.
    pub total_frames: u64,
    /// Native codec of the stream, if the container exposes one.
    pub codec: Option<CodecId>,
}

impl VideoInfo {
    /// Frame dimensions as `(width, height)`.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_from_packed() {
        let tag = u32::from_le_bytes(*b"mp4v");
        assert_eq!(CodecId::from_packed(tag), Some(CodecId::new("mp4v")));
        assert_eq!(CodecId::from_packed(0), None);
        assert_eq!(CodecId::from_packed(0x0000_0001), None);
    }

    #[test]
    fn test_codec_display_is_case_preserving() {
        let codec = CodecId::from("XVID");
        assert_eq!(codec.to_string(), "XVID");
        assert_ne!(CodecId::from("h264"), CodecId::from("H264"));
    }
}
