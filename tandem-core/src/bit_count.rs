//! Bit reductions folded by the drain workers.
//!
//! The two ends deliberately measure different things:
//!
//! ```text
//!   value = 0b0000_..._1011  (11)
//!                      ▲
//!                 highest set bit (3)
//!
//!   significant_zero_count: zeros in [0, 3)  ──► 1
//!   one_count:              ones in [0, 32)  ──► 3
//! ```

/// Counts the zero bits below the most significant set bit.
///
/// An all-zero word counts as a single significant zero rather than 32.
///
#[inline]
pub fn significant_zero_count(value: i32) -> u32 {
    let bits = value as u32;
    if bits == 0 {
        return 1;
    }

    let significant_width = u32::BITS - bits.leading_zeros();
    significant_width - bits.count_ones()
}

/// Counts the bits set to one across the full 32-bit width.
///
#[inline]
pub fn one_count(value: i32) -> u32 {
    value.count_ones()
}
