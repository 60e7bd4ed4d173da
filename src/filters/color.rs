//! RGB to 8-bit HSV conversion.
//!
//! Hue is halved to fit a byte (`[0, 180)`), saturation and value span
//! `[0, 255]`. The arithmetic is fixed point with 12 fractional bits and
//! rounding reciprocal tables, which is the convention colour thresholds in
//! parameter files were tuned against.

use crate::core::types::Frame;
use image::GrayImage;

const HSV_SHIFT: u32 = 12;
const HALF: i32 = 1 << (HSV_SHIFT - 1);

/// Hue range of the 8-bit representation.
pub const HUE_RANGE: i32 = 180;

/// Precomputed reciprocals for one conversion run.
struct DivTables {
    /// `round((255 << 12) / v)` for saturation
    sdiv: [i32; 256],
    /// `round((180 << 12) / (6 * diff))` for hue
    hdiv: [i32; 256],
}

impl DivTables {
    fn new() -> Self {
        let mut sdiv = [0; 256];
        let mut hdiv = [0; 256];
        for i in 1..256usize {
            sdiv[i] = ((255i64 << HSV_SHIFT) as f64 / i as f64).round() as i32;
            let hue_scale = (i64::from(HUE_RANGE) << HSV_SHIFT) as f64;
            hdiv[i] = (hue_scale / (6.0 * i as f64)).round() as i32;
        }
        Self { sdiv, hdiv }
    }

    fn convert(&self, r: u8, g: u8, b: u8) -> [u8; 3] {
        let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
        let v = r.max(g).max(b);
        let diff = v - r.min(g).min(b);

        let s = (diff * self.sdiv[v as usize] + HALF) >> HSV_SHIFT;

        let h = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        let mut h = (h * self.hdiv[diff as usize] + HALF) >> HSV_SHIFT;
        if h < 0 {
            h += HUE_RANGE;
        }

        [h as u8, s as u8, v as u8]
    }
}

/// Convert a single RGB pixel to `[h, s, v]`.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    DivTables::new().convert(r, g, b)
}

/// Convert a frame to three HSV planes `[h, s, v]`.
pub fn hsv_planes(frame: &Frame) -> [GrayImage; 3] {
    let tables = DivTables::new();
    let (width, height) = frame.dimensions();
    let mut h = GrayImage::new(width, height);
    let mut s = GrayImage::new(width, height);
    let mut v = GrayImage::new(width, height);

    for (x, y, pixel) in frame.enumerate_pixels() {
        let [ph, ps, pv] = tables.convert(pixel[0], pixel[1], pixel[2]);
        h.put_pixel(x, y, image::Luma([ph]));
        s.put_pixel(x, y, image::Luma([ps]));
        v.put_pixel(x, y, image::Luma([pv]));
    }

    [h, s, v]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_primaries() {
        assert_eq!(rgb_to_hsv(255, 0, 0), [0, 255, 255]);
        assert_eq!(rgb_to_hsv(0, 255, 0), [60, 255, 255]);
        assert_eq!(rgb_to_hsv(0, 0, 255), [120, 255, 255]);
    }

    #[test]
    fn test_greys_have_no_hue_or_saturation() {
        assert_eq!(rgb_to_hsv(0, 0, 0), [0, 0, 0]);
        assert_eq!(rgb_to_hsv(128, 128, 128), [0, 0, 128]);
        assert_eq!(rgb_to_hsv(255, 255, 255), [0, 0, 255]);
    }

    #[test]
    fn test_secondaries_and_wraparound() {
        assert_eq!(rgb_to_hsv(255, 255, 0), [30, 255, 255]);
        assert_eq!(rgb_to_hsv(0, 255, 255), [90, 255, 255]);
        assert_eq!(rgb_to_hsv(255, 0, 255), [150, 255, 255]);
        // Slightly blue red wraps to the top of the hue range
        let [h, _, _] = rgb_to_hsv(255, 0, 10);
        assert!(h > 170 && h < 180, "hue {}", h);
    }

    #[test]
    fn test_hue_always_below_range() {
        for r in (0..=255u16).step_by(17) {
            for g in (0..=255u16).step_by(17) {
                for b in (0..=255u16).step_by(17) {
                    let [h, _, _] = rgb_to_hsv(r as u8, g as u8, b as u8);
                    assert!(i32::from(h) < HUE_RANGE);
                }
            }
        }
    }

    #[test]
    fn test_planes_match_pixels() {
        let mut frame = RgbImage::new(2, 1);
        frame.put_pixel(0, 0, Rgb([0, 0, 255]));
        frame.put_pixel(1, 0, Rgb([10, 200, 30]));

        let [h, s, v] = hsv_planes(&frame);
        assert_eq!(h.get_pixel(0, 0)[0], 120);
        let expected = rgb_to_hsv(10, 200, 30);
        assert_eq!([h.get_pixel(1, 0)[0], s.get_pixel(1, 0)[0], v.get_pixel(1, 0)[0]], expected);
    }
}
