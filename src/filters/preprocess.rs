//! Frame conditioning ahead of colour thresholding.

use crate::core::types::Frame;
use crate::filters::blur::gaussian_blur;
use crate::filters::equalize::clahe;

/// Apply the optional blur, then the optional CLAHE, to a frame.
///
/// The order is fixed. The output always has the input's dimensions.
pub fn preprocess(frame: &Frame, blur_level: u8, clahe_enabled: bool) -> Frame {
    let blurred = if blur_level > 0 {
        gaussian_blur(frame, blur_level)
    } else {
        frame.clone()
    };

    if clahe_enabled {
        clahe(&blurred)
    } else {
        blurred
    }
}
