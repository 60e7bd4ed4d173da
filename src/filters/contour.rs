//! Removal of small regions and small holes by contour area.
//!
//! Both passes work the same way: every connected region of the mask whose
//! outer border encloses less than the threshold area is painted to zero,
//! border and interior. The hole pass runs on the inverted mask, so gaps
//! inside included regions are treated as objects of their own and filled
//! once the mask is inverted back.
//!
//! Hole borders are never painted. Their points belong to the surrounding
//! region, so painting one erases a ring of that region and widens the hole,
//! and a second run would widen it again.

use crate::core::types::{Mask, MASK_OFF};
use image::imageops::invert;
use image::Luma;
use imageproc::contours::{find_contours, BorderType};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

/// Area enclosed by a closed polygon, by the shoelace formula.
///
/// Points are pixel centres, so a filled `n x n` square has area
/// `(n - 1)^2`. Degenerate borders (a single pixel or a line) have area 0.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    (twice as f64 / 2.0).abs()
}

/// Paint a border polygon and its interior with `value`.
fn fill_contour(mask: &mut Mask, points: &[Point<i32>], value: u8) {
    let (width, height) = mask.dimensions();
    for p in points {
        if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
            mask.put_pixel(p.x as u32, p.y as u32, Luma([value]));
        }
    }

    let mut polygon = points;
    while polygon.len() > 1 && polygon[0] == polygon[polygon.len() - 1] {
        polygon = &polygon[..polygon.len() - 1];
    }
    if polygon.len() >= 3 {
        draw_polygon_mut(mask, polygon, Luma([value]));
    }
}

/// Zero out every region of `mask` whose border area is below `threshold`.
fn remove_small_regions(mask: &mut Mask, threshold: u32) {
    if threshold == 0 {
        return;
    }
    let limit = f64::from(threshold);
    let small: Vec<Vec<Point<i32>>> = find_contours::<i32>(mask)
        .into_iter()
        .filter(|contour| matches!(contour.border_type, BorderType::Outer))
        .filter(|contour| contour_area(&contour.points) < limit)
        .map(|contour| contour.points)
        .collect();

    for points in &small {
        fill_contour(mask, points, MASK_OFF);
    }
}

/// Remove objects smaller than `object` and fill holes smaller than `hole`.
///
/// Returns a new mask; the input is left untouched.
pub fn filter_contours(mask: &Mask, object: u32, hole: u32) -> Mask {
    let mut filtered = mask.clone();
    remove_small_regions(&mut filtered, object);

    if hole > 0 {
        invert(&mut filtered);
        remove_small_regions(&mut filtered, hole);
        invert(&mut filtered);
    }
    filtered
}
