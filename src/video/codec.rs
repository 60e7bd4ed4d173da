//! Output codec selection.
//!
//! The masked video reuses the source codec and container extension when the
//! runtime can actually open a writer with that codec. Otherwise it falls
//! back to `mp4v` in an `.mp4` container.

use crate::core::types::CodecId;
use serde::{Deserialize, Serialize};

/// Codec used when the source codec cannot be written.
pub const DEFAULT_CODEC: &str = "mp4v";

/// Container extension paired with [`DEFAULT_CODEC`].
pub const DEFAULT_EXTENSION: &str = "mp4";

/// Fourccs checked for writer support at startup.
pub const CANDIDATE_CODECS: [&str; 13] = [
    "DIVX", "XVID", "MJPG", "X264", "WMV1", "WMV2", "FMP4", "mp4v", "avc1", "I420", "IYUV",
    "mpg1", "H264",
];

/// Reports whether a writer can be opened for a codec.
///
/// Implementations decide by trying, not by name: a codec is available only
/// if the runtime can actually instantiate a writer with it.
pub trait CodecProbe {
    /// Whether a writer can be opened with `codec`.
    fn can_write(&self, codec: &CodecId) -> bool;

    /// The subset of [`CANDIDATE_CODECS`] this runtime can write.
    fn available_codecs(&self) -> Vec<CodecId> {
        let available: Vec<CodecId> = CANDIDATE_CODECS
            .iter()
            .map(|&fourcc| CodecId::new(fourcc))
            .filter(|codec| self.can_write(codec))
            .collect();
        log::debug!(
            "Writable codecs: {}",
            available.iter().map(CodecId::as_str).collect::<Vec<_>>().join(", ")
        );
        available
    }
}

/// A probe answering from a fixed list, for tests and offline use.
#[derive(Debug, Clone, Default)]
pub struct StaticCodecProbe {
    codecs: Vec<CodecId>,
}

impl StaticCodecProbe {
    /// Create a probe that accepts exactly `codecs`.
    pub fn new<I, C>(codecs: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CodecId>,
    {
        Self {
            codecs: codecs.into_iter().map(Into::into).collect(),
        }
    }
}

impl CodecProbe for StaticCodecProbe {
    fn can_write(&self, codec: &CodecId) -> bool {
        self.codecs.contains(codec)
    }
}

/// Resolved output codec and container extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecDecision {
    /// Codec to open the writer with.
    pub codec: CodecId,
    /// Output file extension, without the dot.
    pub extension: String,
    /// Whether the default codec replaced the source codec.
    pub fallback: bool,
}

/// Choose the output codec for a source.
///
/// `source_extension` is the input file's extension, reused together with
/// the source codec. A missing source codec always falls back.
pub fn resolve_codec(
    source: Option<&CodecId>,
    source_extension: &str,
    available: &[CodecId],
) -> CodecDecision {
    match source {
        Some(codec) if available.contains(codec) => CodecDecision {
            codec: codec.clone(),
            extension: source_extension.to_string(),
            fallback: false,
        },
        _ => {
            log::warn!(
                "Input video codec {} is not available. Default codec '{}' (.{}) will be used instead.",
                source.map(CodecId::as_str).unwrap_or("<unknown>"),
                DEFAULT_CODEC,
                DEFAULT_EXTENSION
            );
            CodecDecision {
                codec: CodecId::new(DEFAULT_CODEC),
                extension: DEFAULT_EXTENSION.to_string(),
                fallback: true,
            }
        }
    }
}
