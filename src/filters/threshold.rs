//! HSV range thresholding.

use crate::core::config::FilterConfig;
use crate::core::types::{Frame, Mask, MASK_OFF, MASK_ON};
use crate::filters::color::hsv_planes;
use crate::filters::shift::shift_plane;
use image::Luma;

/// Build the binary mask of pixels whose shifted HSV lies inside the
/// configured range, bounds inclusive.
///
/// Saturation is shifted by `+s_add` then `-s_sub`. Value is shifted by
/// `+v_add` then `-s_sub`: the value channel reuses the saturation subtract
/// amount and `v_sub` is not applied.
pub fn color_range_mask(frame: &Frame, config: &FilterConfig) -> Mask {
    let [h, mut s, mut v] = hsv_planes(frame);

    shift_plane(&mut s, i32::from(config.s_add));
    shift_plane(&mut s, -i32::from(config.s_sub));
    shift_plane(&mut v, i32::from(config.v_add));
    shift_plane(&mut v, -i32::from(config.s_sub));

    let lower = [config.h_min, config.s_min, config.v_min];
    let upper = [config.h_max, config.s_max, config.v_max];

    Mask::from_fn(frame.width(), frame.height(), |x, y| {
        let hsv = [h.get_pixel(x, y)[0], s.get_pixel(x, y)[0], v.get_pixel(x, y)[0]];
        let inside = (0..3).all(|c| lower[c] <= hsv[c] && hsv[c] <= upper[c]);
        Luma([if inside { MASK_ON } else { MASK_OFF }])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::color::rgb_to_hsv;
    use image::{Rgb, RgbImage};

    fn uniform(rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(8, 6, Rgb(rgb))
    }

    fn all(mask: &Mask, value: u8) -> bool {
        mask.pixels().all(|p| p[0] == value)
    }

    #[test]
    fn test_default_range_includes_everything() {
        let mask = color_range_mask(&uniform([12, 200, 77]), &FilterConfig::default());
        assert!(all(&mask, MASK_ON));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let [h, s, v] = rgb_to_hsv(30, 160, 220);
        let config = FilterConfig {
            h_min: h,
            h_max: h,
            s_min: s,
            s_max: s,
            v_min: v,
            v_max: v,
            ..FilterConfig::default()
        };
        assert!(all(&color_range_mask(&uniform([30, 160, 220]), &config), MASK_ON));
    }

    #[test]
    fn test_degenerate_range_is_empty() {
        let frame = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 128]));
        for config in [
            FilterConfig {
                h_min: 100,
                h_max: 50,
                ..FilterConfig::default()
            },
            FilterConfig {
                s_min: 200,
                s_max: 10,
                ..FilterConfig::default()
            },
            FilterConfig {
                v_min: 1,
                v_max: 0,
                ..FilterConfig::default()
            },
        ] {
            assert!(all(&color_range_mask(&frame, &config), MASK_OFF));
        }
    }

    #[test]
    fn test_saturation_shift_moves_pixels_into_range() {
        // Pure grey has saturation 0
        let frame = uniform([120, 120, 120]);
        let config = FilterConfig {
            s_min: 50,
            ..FilterConfig::default()
        };
        assert!(all(&color_range_mask(&frame, &config), MASK_OFF));

        let shifted = FilterConfig {
            s_add: 60,
            ..config
        };
        assert!(all(&color_range_mask(&frame, &shifted), MASK_ON));
    }

    #[test]
    fn test_value_subtract_uses_saturation_amount() {
        let frame = uniform([100, 100, 100]);
        let config = FilterConfig {
            v_min: 90,
            ..FilterConfig::default()
        };
        assert!(all(&color_range_mask(&frame, &config), MASK_ON));

        // v_sub alone has no effect
        let v_sub_only = FilterConfig {
            v_sub: 50,
            ..config
        };
        assert!(all(&color_range_mask(&frame, &v_sub_only), MASK_ON));

        // s_sub pulls value below the lower bound
        let s_sub = FilterConfig {
            s_sub: 50,
            ..config
        };
        assert!(all(&color_range_mask(&frame, &s_sub), MASK_OFF));
    }
}
