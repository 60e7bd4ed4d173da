//! Saturating additive shift of a single 8-bit channel.

use image::GrayImage;

/// Shift every sample of `channel` by `amount`, clamping into `[0, 255]`.
///
/// A positive amount saturates every sample at or above `255 - amount` to
/// 255. A negative amount floors every sample at or below `|amount|` to 0.
/// Each sample is classified from its own pre-shift value, so the result is
/// independent of iteration order.
///
/// The shift is not invertible near the clamps: once a sample saturates or
/// floors, shifting back does not restore it.
pub fn shift_channel(channel: &mut [u8], amount: i32) {
    let amount = amount.clamp(-255, 255);
    if amount > 0 {
        let amount = amount as u8;
        let limit = 255 - amount;
        for sample in channel.iter_mut() {
            *sample = if *sample >= limit { 255 } else { *sample + amount };
        }
    } else if amount < 0 {
        let amount = (-amount) as u8;
        for sample in channel.iter_mut() {
            *sample = if *sample <= amount { 0 } else { *sample - amount };
        }
    }
}

/// Shift a single-channel plane in place.
pub fn shift_plane(plane: &mut GrayImage, amount: i32) {
    shift_channel(plane, amount);
}
