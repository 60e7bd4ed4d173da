//! Morphological closing of masks.

use crate::core::types::Mask;
use crate::filters::kernel::kernel_radius;
use imageproc::distance_transform::Norm;
use imageproc::morphology::close;

/// Close `mask` (dilate, then erode) with the square element for `level`.
///
/// Level 0 returns an unchanged copy. A square of side `2r + 1` is the ball
/// of radius `r` under the chessboard norm.
pub fn close_mask(mask: &Mask, level: u8) -> Mask {
    match kernel_radius(level) {
        Some(radius) => close(mask, Norm::LInf, radius.min(u32::from(u8::MAX)) as u8),
        None => mask.clone(),
    }
}
