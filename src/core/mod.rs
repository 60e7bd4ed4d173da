//! Core types for the hsvmask pipeline.
//!
//! This module contains the foundational types shared by every stage:
//! - Frame, mask and stream description types
//! - The filter parameter record and its persistence
//! - Error types

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::FilterConfig;
pub use error::{ConfigError, FieldViolation, HsvMaskError, Violation, VideoError};
pub use types::{CodecId, Frame, Mask, VideoInfo, MASK_OFF, MASK_ON};
