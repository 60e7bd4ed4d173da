//! Filter module.
//!
//! Contains the individual image operations and the per-frame pipeline that
//! chains them.

pub mod blur;
pub mod color;
pub mod contour;
pub mod equalize;
pub mod kernel;
pub mod morphology;
pub mod pipeline;
pub mod preprocess;
pub mod shift;
pub mod threshold;

pub use pipeline::{apply_mask, FrameOutput, FramePipeline};
