//! The per-frame masking pipeline.
//!
//! ```text
//! frame ─► preprocess ─► colour range mask ─► contour filter ─► close ─► mask
//!              │
//!              └─► processed frame (diagnostic output)
//! ```

use crate::core::config::FilterConfig;
use crate::core::types::{Frame, Mask};
use crate::filters::contour::filter_contours;
use crate::filters::morphology::close_mask;
use crate::filters::preprocess::preprocess;
use crate::filters::threshold::color_range_mask;
use image::Rgb;

/// Result of running the pipeline on one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    /// Final binary mask.
    pub mask: Mask,
    /// The frame after blur and CLAHE, before thresholding.
    pub processed: Frame,
}

/// Stateless composition of every masking stage for one configuration.
///
/// Identical `(frame, config)` input always yields identical output, so a
/// pipeline can be shared freely across threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePipeline {
    config: FilterConfig,
}

impl FramePipeline {
    /// Create a pipeline for `config`.
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// The configuration this pipeline applies.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Compute the mask for one frame.
    pub fn run(&self, frame: &Frame) -> FrameOutput {
        let config = &self.config;
        let processed = preprocess(frame, config.blur, config.clahe_enabled());
        let raw = color_range_mask(&processed, config);
        let filtered = filter_contours(&raw, config.object, config.hole);
        let mask = close_mask(&filtered, config.close);
        FrameOutput { mask, processed }
    }

    /// Compute the mask and apply it to the original frame.
    pub fn mask_frame(&self, frame: &Frame) -> Frame {
        let output = self.run(frame);
        apply_mask(frame, &output.mask)
    }
}

/// Per-pixel bitwise AND of `frame` with `mask` replicated over the channels.
///
/// # Panics
///
/// Panics if the dimensions differ.
pub fn apply_mask(frame: &Frame, mask: &Mask) -> Frame {
    assert_eq!(
        frame.dimensions(),
        mask.dimensions(),
        "mask and frame dimensions differ"
    );
    Frame::from_fn(frame.width(), frame.height(), |x, y| {
        let m = mask.get_pixel(x, y)[0];
        let Rgb([r, g, b]) = *frame.get_pixel(x, y);
        Rgb([r & m, g & m, b & m])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MASK_OFF, MASK_ON};
    use crate::filters::color::rgb_to_hsv;
    use image::RgbImage;

    const BLUE: [u8; 3] = [20, 40, 230];
    const GREY: [u8; 3] = [90, 90, 90];

    fn blue_range() -> FilterConfig {
        let [h, _, _] = rgb_to_hsv(BLUE[0], BLUE[1], BLUE[2]);
        FilterConfig {
            h_min: h - 5,
            h_max: h + 5,
            s_min: 100,
            ..FilterConfig::default()
        }
    }

    fn square_on_background(side: u32) -> RgbImage {
        let mut frame = RgbImage::from_pixel(40, 40, Rgb(GREY));
        for y in 10..10 + side {
            for x in 12..12 + side {
                frame.put_pixel(x, y, Rgb(BLUE));
            }
        }
        frame
    }

    fn all(mask: &Mask, value: u8) -> bool {
        mask.pixels().all(|p| p[0] == value)
    }

    #[test]
    fn test_uniform_in_range_frame_is_fully_included() {
        let frame = RgbImage::from_pixel(32, 24, Rgb(BLUE));
        let output = FramePipeline::new(blue_range()).run(&frame);
        assert!(all(&output.mask, MASK_ON));
        assert_eq!(output.processed, frame);
    }

    #[test]
    fn test_small_square_removed_by_object_filter() {
        let frame = square_on_background(10);

        let removed = FramePipeline::new(FilterConfig {
            object: 150,
            ..blue_range()
        })
        .run(&frame);
        assert!(all(&removed.mask, MASK_OFF));

        let kept = FramePipeline::new(FilterConfig {
            object: 50,
            ..blue_range()
        })
        .run(&frame);
        let on = kept.mask.pixels().filter(|p| p[0] == MASK_ON).count();
        assert_eq!(on, 100);
        assert_eq!(kept.mask.get_pixel(12, 10)[0], MASK_ON);
    }

    #[test]
    fn test_degenerate_range_gives_empty_mask() {
        let frame = square_on_background(10);
        let config = FilterConfig {
            h_min: 170,
            h_max: 10,
            ..FilterConfig::default()
        };
        assert!(all(&FramePipeline::new(config).run(&frame).mask, MASK_OFF));
    }

    #[test]
    fn test_deterministic() {
        let frame = RgbImage::from_fn(48, 32, |x, y| {
            Rgb([(x * 5) as u8, (y * 7) as u8, ((x + y) * 3) as u8])
        });
        let config = FilterConfig {
            clahe: 1,
            blur: 2,
            close: 1,
            object: 20,
            hole: 10,
            ..blue_range()
        };
        let pipeline = FramePipeline::new(config);
        let first = pipeline.run(&frame);
        for _ in 0..3 {
            assert_eq!(pipeline.run(&frame), first);
        }
    }

    #[test]
    fn test_processed_frame_reflects_preprocessing() {
        let frame = square_on_background(10);
        let config = FilterConfig {
            blur: 2,
            ..blue_range()
        };
        let output = FramePipeline::new(config).run(&frame);
        assert_eq!(output.processed, preprocess(&frame, 2, false));
        assert_ne!(output.processed, frame);
    }

    #[test]
    fn test_apply_mask_zeroes_excluded_pixels() {
        let frame = square_on_background(4);
        let masked = FramePipeline::new(blue_range()).mask_frame(&frame);
        assert_eq!(*masked.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*masked.get_pixel(13, 11), Rgb(BLUE));
    }
}
