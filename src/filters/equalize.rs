//! Contrast-limited adaptive histogram equalization (CLAHE).
//!
//! The plane is split into a grid of tiles. Each tile gets its own clipped
//! histogram and equalization lookup table, and every pixel is mapped by
//! bilinear interpolation between the tables of the four nearest tile
//! centres so that tile seams do not show.

use crate::core::types::Frame;
use crate::filters::kernel::reflect_101;
use image::{GrayImage, Luma, Rgb};
use rayon::prelude::*;

/// Default clip limit, relative to a uniform histogram.
pub const DEFAULT_CLIP_LIMIT: f32 = 2.0;

/// Default tile grid, `(columns, rows)`.
pub const DEFAULT_TILE_GRID: (u32, u32) = (8, 8);

/// CLAHE parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clahe {
    /// Histogram bins are clipped at `clip_limit * tile_area / 256`.
    pub clip_limit: f32,
    /// Tile grid as `(columns, rows)`.
    pub tile_grid: (u32, u32),
}

impl Default for Clahe {
    fn default() -> Self {
        Self {
            clip_limit: DEFAULT_CLIP_LIMIT,
            tile_grid: DEFAULT_TILE_GRID,
        }
    }
}

impl Clahe {
    /// Equalize a single plane.
    ///
    /// When the plane does not divide evenly into the grid, the histograms
    /// are taken from a copy extended to the right and bottom by mirroring.
    /// The extension is one tile column/row count wide on an axis that
    /// already divides evenly.
    pub fn apply(&self, plane: &GrayImage) -> GrayImage {
        let (width, height) = plane.dimensions();
        if width == 0 || height == 0 {
            return plane.clone();
        }

        let cols = self.tile_grid.0.max(1);
        let rows = self.tile_grid.1.max(1);
        let (lut_w, lut_h) = if width % cols == 0 && height % rows == 0 {
            (width, height)
        } else {
            (width + cols - width % cols, height + rows - height % rows)
        };
        let tile_w = lut_w / cols;
        let tile_h = lut_h / rows;

        let luts: Vec<[u8; 256]> = (0..rows * cols)
            .into_par_iter()
            .map(|index| {
                let (tx, ty) = (index % cols, index / cols);
                self.tile_lut(plane, tx * tile_w, ty * tile_h, tile_w, tile_h)
            })
            .collect();

        let lut = |tx: u32, ty: u32| &luts[(ty * cols + tx) as usize];
        let columns: Vec<(u32, u32, f32)> =
            (0..width).map(|x| neighbours(x, tile_w, cols)).collect();

        GrayImage::from_fn(width, height, |x, y| {
            let (tx0, tx1, fx) = columns[x as usize];
            let (ty0, ty1, fy) = neighbours(y, tile_h, rows);
            let value = plane.get_pixel(x, y)[0] as usize;

            let top = lut(tx0, ty0)[value] as f32 * (1.0 - fx) + lut(tx1, ty0)[value] as f32 * fx;
            let bottom =
                lut(tx0, ty1)[value] as f32 * (1.0 - fx) + lut(tx1, ty1)[value] as f32 * fx;
            let mapped = top * (1.0 - fy) + bottom * fy;
            Luma([saturate(mapped)])
        })
    }

    /// Equalize each channel of a frame independently, keeping channel order.
    pub fn apply_frame(&self, frame: &Frame) -> Frame {
        let planes: Vec<GrayImage> = (0..3usize)
            .into_par_iter()
            .map(|channel| {
                let plane = GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
                    Luma([frame.get_pixel(x, y)[channel]])
                });
                self.apply(&plane)
            })
            .collect();

        Frame::from_fn(frame.width(), frame.height(), |x, y| {
            Rgb([
                planes[0].get_pixel(x, y)[0],
                planes[1].get_pixel(x, y)[0],
                planes[2].get_pixel(x, y)[0],
            ])
        })
    }

    /// Lookup table of the tile at `(x0, y0)`, sampling past the plane edge
    /// by mirroring.
    fn tile_lut(
        &self,
        plane: &GrayImage,
        x0: u32,
        y0: u32,
        tile_w: u32,
        tile_h: u32,
    ) -> [u8; 256] {
        let (width, height) = plane.dimensions();
        let mut hist = [0u32; 256];
        for y in y0..y0 + tile_h {
            let sy = reflect_101(i64::from(y), height);
            for x in x0..x0 + tile_w {
                let sx = reflect_101(i64::from(x), width);
                hist[plane.get_pixel(sx, sy)[0] as usize] += 1;
            }
        }

        let area = tile_w * tile_h;
        if self.clip_limit > 0.0 {
            let clip = ((f64::from(self.clip_limit) * f64::from(area) / 256.0) as u32).max(1);
            clip_histogram(&mut hist, clip);
        }

        let scale = 255.0 / area as f32;
        let mut lut = [0u8; 256];
        let mut cumulative = 0u32;
        for (bin, count) in hist.iter().enumerate() {
            cumulative += count;
            lut[bin] = saturate(cumulative as f32 * scale);
        }
        lut
    }
}

/// Round half to even and clamp into `u8`.
fn saturate(value: f32) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Clip every bin at `clip` and spread the excess back over all bins.
fn clip_histogram(hist: &mut [u32; 256], clip: u32) {
    let mut excess = 0u32;
    for count in hist.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }

    let per_bin = excess / 256;
    let residual = (excess % 256) as usize;
    for count in hist.iter_mut() {
        *count += per_bin;
    }
    if residual > 0 {
        let step = (256 / residual).max(1);
        for bin in (0..256).step_by(step).take(residual) {
            hist[bin] += 1;
        }
    }
}

/// Neighbouring tile indices along one axis and the interpolation weight of
/// the second one. Tile `i` is centred at `(i + 0.5) * tile`.
fn neighbours(pos: u32, tile: u32, count: u32) -> (u32, u32, f32) {
    let t = pos as f32 * (1.0 / tile as f32) - 0.5;
    let lower = t.floor();
    let weight = t - lower;
    let last = count as i64 - 1;
    let t0 = (lower as i64).clamp(0, last) as u32;
    let t1 = (lower as i64 + 1).clamp(0, last) as u32;
    (t0, t1, weight)
}

/// Equalize a frame with the default clip limit and tile grid.
pub fn clahe(frame: &Frame) -> Frame {
    Clahe::default().apply_frame(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_preserves_dimensions() {
        let frame = RgbImage::from_fn(37, 21, |x, y| Rgb([(x * 5) as u8, (y * 9) as u8, 7]));
        let result = clahe(&frame);
        assert_eq!(result.dimensions(), (37, 21));
    }

    #[test]
    fn test_stretches_low_contrast_plane() {
        let plane = GrayImage::from_fn(64, 64, |x, _| Luma([100 + (x % 8) as u8]));
        let result = Clahe::default().apply(&plane);

        let (lo, hi) = result
            .pixels()
            .fold((255u8, 0u8), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
        assert!(hi - lo > 7, "range {}..{}", lo, hi);
    }

    #[test]
    fn test_monotonic_within_a_tile() {
        let plane = GrayImage::from_fn(16, 16, |x, y| Luma([(x + y * 16) as u8]));
        let clahe = Clahe {
            clip_limit: 0.0,
            tile_grid: (1, 1),
        };
        let result = clahe.apply(&plane);
        let values: Vec<u8> = result.pixels().map(|p| p[0]).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*values.last().unwrap(), 255);
    }

    #[test]
    fn test_channels_are_independent() {
        let frame = RgbImage::from_fn(16, 16, |x, _| Rgb([(x * 16) as u8, 50, 200]));
        let result = clahe(&frame);

        let red_only = RgbImage::from_fn(16, 16, |x, _| Rgb([(x * 16) as u8, 0, 0]));
        let red_result = clahe(&red_only);
        for (a, b) in result.pixels().zip(red_result.pixels()) {
            assert_eq!(a[0], b[0]);
        }
    }

    #[test]
    fn test_clip_preserves_total() {
        let mut hist = [0u32; 256];
        hist[10] = 1000;
        hist[20] = 3;
        clip_histogram(&mut hist, 40);
        assert_eq!(hist.iter().sum::<u32>(), 1003);
        assert!(hist[10] < 1000);
    }

    #[test]
    fn test_uniform_plane_stays_uniform() {
        // 20x12 does not divide into 8x8 tiles, so the mirrored extension is used.
        let plane = GrayImage::from_pixel(20, 12, Luma([100]));
        let result = Clahe::default().apply(&plane);
        let first = result.get_pixel(0, 0)[0];
        assert!(result.pixels().all(|p| p[0] == first));
    }

    #[test]
    fn test_interpolation_weights() {
        // Tiles 4 wide: pixel 2 sits exactly on the first tile centre.
        assert_eq!(neighbours(2, 4, 3), (0, 1, 0.0));
        assert_eq!(neighbours(4, 4, 3), (0, 1, 0.5));
        // Before the first centre and past the last one the edge tile is used.
        assert_eq!(neighbours(0, 4, 3).0, 0);
        assert_eq!(neighbours(11, 4, 3), (2, 2, 0.25));
    }

    #[test]
    fn test_saturate_rounds_half_to_even() {
        assert_eq!(saturate(2.5), 2);
        assert_eq!(saturate(3.5), 4);
        assert_eq!(saturate(-1.0), 0);
        assert_eq!(saturate(300.0), 255);
    }

    #[test]
    fn test_deterministic() {
        let frame = RgbImage::from_fn(40, 30, |x, y| Rgb([(x ^ y) as u8, (x * y) as u8, x as u8]));
        assert_eq!(clahe(&frame), clahe(&frame));
    }
}
