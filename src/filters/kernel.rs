//! Quantization of strength levels into odd kernel sizes.

/// Highest strength level. Larger levels are clamped.
pub const MAX_LEVEL: u8 = 20;

/// Map a strength level to an odd kernel side length.
///
/// Level 0 disables the operation and yields `None`. Level `n >= 1` maps to
/// `3 + 2 * (n - 1)`: 1 → 3, 2 → 5, ... 20 → 41.
pub fn kernel_size(level: u8) -> Option<u32> {
    if level == 0 {
        return None;
    }
    let level = u32::from(level.min(MAX_LEVEL));
    Some(3 + 2 * (level - 1))
}

/// Radius of the square kernel for `level`, i.e. `(size - 1) / 2`.
///
/// Equal to the level itself for every enabled level.
pub fn kernel_radius(level: u8) -> Option<u32> {
    kernel_size(level).map(|size| (size - 1) / 2)
}

/// Map a possibly out-of-range index into `0..len` by mirroring about the
/// edge pixels without repeating them (`dcb|abcd|cba`).
///
/// `len` must be at least 1.
pub fn reflect_101(pos: i64, len: u32) -> u32 {
    let len = i64::from(len);
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let folded = pos.rem_euclid(period);
    (if folded < len { folded } else { period - folded }) as u32
}
