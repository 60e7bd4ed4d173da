//! Error types for hsvmask.
//!
//! Uses thiserror for structured errors with context. Only conditions that
//! stop a run live here:
//! - An unreadable or out-of-range parameter file
//! - A video source that cannot be opened, or a sink that cannot be written
//!
//! Per-frame image operations are total and never produce errors. A short
//! read is a reported outcome of the export loop, not an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for hsvmask.
///
/// This enum encompasses all error categories and enables automatic
/// conversion between specific error types.
#[derive(Error, Debug)]
pub enum HsvMaskError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Video error: {0}")]
    Video(#[from] VideoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// What is wrong with one field of a parameter record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    /// The field is absent.
    Missing,
    /// The field holds something other than an integer.
    NotInteger(String),
    /// The field is an integer outside its bounds.
    OutOfRange(i64),
}

/// A single invalid field in a parameter record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Serialized field name (e.g. `hMin`).
    pub field: String,
    /// The problem found.
    pub problem: Violation,
    /// Inclusive lower bound.
    pub min: i64,
    /// Inclusive upper bound.
    pub max: i64,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            Violation::Missing => write!(
                f,
                "'{}' is missing (expected an integer in [{}, {}])",
                self.field, self.min, self.max
            ),
            Violation::NotInteger(found) => write!(
                f,
                "'{}' = {} is not an integer in [{}, {}]",
                self.field, found, self.min, self.max
            ),
            Violation::OutOfRange(value) => write!(
                f,
                "'{}' = {} is outside [{}, {}]",
                self.field, value, self.min, self.max
            ),
        }
    }
}

/// Errors from loading or validating filter parameters.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No filter parameter file was provided")]
    Missing,

    #[error("Parameter file {} could not be accessed: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parameter file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Parameter file must contain a JSON object")]
    NotAnObject,

    #[error("Invalid filter parameters ({} violation(s)): {}", .0.len(), join_violations(.0))]
    Invalid(Vec<FieldViolation>),
}

/// Errors from opening, reading or writing video streams.
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Video source {} is unavailable: {reason}", .path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("Failed to probe {}: {reason}", .path.display())]
    Probe { path: PathBuf, reason: String },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Frame read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("Frame write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("Frame is {got_width}x{got_height}, sink expects {width}x{height}")]
    FrameSize {
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },

    #[error("Source has no frame {index}")]
    MissingFrame { index: u64 },

    #[error("Encoder exited with {status}: {stderr}")]
    Encoder { status: String, stderr: String },
}

// ============================================================================
// Error Utilities
// ============================================================================

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConfigError {
    /// Field-level violations, empty for non-validation failures.
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            ConfigError::Invalid(violations) => violations,
            _ => &[],
        }
    }

    /// Get suggestion for fixing this error.
    pub fn suggested_fix(&self) -> Option<String> {
        match self {
            ConfigError::Missing => Some(
                "Pass a parameter file with --params, or run `preview` to write one".to_string(),
            ),
            ConfigError::Io { path, .. } => {
                Some(format!("Check that the file '{}' exists", path.display()))
            }
            _ => None,
        }
    }
}

/// Result type alias for hsvmask operations.
pub type HsvMaskResult<T> = Result<T, HsvMaskError>;

/// Result type alias for video operations.
pub type VideoResult<T> = Result<T, VideoError>;
