//! Bit range helpers.
//!
//! Every field is a contiguous range `[offset, offset + width)` of a 32-bit
//! word. These helpers build masks for such ranges and move values in and out
//! of them. Callers are expected to have validated `offset + width <= 32`.

/// Returns the mask covering `width` bits starting at `offset`.
///
/// A zero width yields an empty mask.
#[inline]
pub const fn mask(offset: u8, width: u8) -> u32 {
    if width == 0 {
        0
    } else if width >= 32 {
        u32::MAX << offset
    } else {
        ((1u32 << width) - 1) << offset
    }
}

/// Returns the value of the bit range, shifted down to bit 0.
#[inline]
pub const fn extract(word: u32, offset: u8, width: u8) -> u32 {
    (word & mask(offset, width)) >> offset
}

/// Returns `word` with the bit range replaced by the low bits of `value`.
///
/// Bits of `value` that do not fit in `width` are discarded.
#[inline]
pub const fn insert(word: u32, offset: u8, width: u8, value: u32) -> u32 {
    let m = mask(offset, width);
    (word & !m) | ((value << offset) & m)
}

/// Returns `value` truncated to `width` bits.
#[inline]
pub const fn truncate(value: u32, width: u8) -> u32 {
    value & mask(0, width)
}
