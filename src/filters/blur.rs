//! Gaussian blur with a fixed odd kernel size.
//!
//! Borders are mirrored without repeating the edge pixel, and the frame is
//! convolved in `f32` and rounded once, so flat regions come out unchanged.

use crate::core::types::Frame;
use crate::filters::kernel::{kernel_size, reflect_101};
use image::{Rgb, Rgb32FImage};

/// Precomputed kernels for the smallest sizes, indexed by `size / 2 - 1`.
const SMALL_KERNELS: [&[f32]; 3] = [
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
];

/// Standard deviation implied by a kernel size when none is given.
pub fn sigma_for_size(size: u32) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian kernel of `size` taps.
///
/// Sizes 3, 5 and 7 use fixed binomial-like tables; larger sizes are sampled
/// from a Gaussian with [`sigma_for_size`].
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    if size % 2 == 1 && (3..=7).contains(&size) {
        return SMALL_KERNELS[(size / 2 - 1) as usize].to_vec();
    }

    let sigma = sigma_for_size(size);
    let center = (size / 2) as f32;
    let scale = -0.5 / (sigma * sigma);

    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let x = i as f32 - center;
            (scale * x * x).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for tap in &mut kernel {
        *tap /= sum;
    }
    kernel
}

/// Blur `frame` with the square kernel for strength `level`.
///
/// Level 0 returns an unchanged copy.
pub fn gaussian_blur(frame: &Frame, level: u8) -> Frame {
    let Some(size) = kernel_size(level) else {
        return frame.clone();
    };
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return frame.clone();
    }

    let kernel = gaussian_kernel(size);
    let radius = size / 2;
    let pad = i64::from(radius);

    let padded = Rgb32FImage::from_fn(width + 2 * radius, height + 2 * radius, |x, y| {
        let sx = reflect_101(i64::from(x) - pad, width);
        let sy = reflect_101(i64::from(y) - pad, height);
        let Rgb([r, g, b]) = *frame.get_pixel(sx, sy);
        Rgb([f32::from(r), f32::from(g), f32::from(b)])
    });
    let blurred = imageproc::filter::separable_filter(&padded, &kernel, &kernel);

    Frame::from_fn(width, height, |x, y| {
        let Rgb(channels) = *blurred.get_pixel(x + radius, y + radius);
        Rgb(channels.map(round_sample))
    })
}

fn round_sample(value: f32) -> u8 {
    (value + 0.5).clamp(0.0, 255.0) as u8
}
