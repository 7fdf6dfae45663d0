//! Arithmetic helpers. Every result is the stored low byte plus the carry,
//! where carry means the unreduced result exceeded 255.

/// `a + b + carry_in`.
#[must_use]
pub fn add(a: u8, b: u8, carry_in: bool) -> (u8, bool) {
    reduce(u32::from(a) + u32::from(b) + u32::from(carry_in))
}

/// `a + !b + 1 + carry_in`: two's-complement subtraction where the carry is
/// set when no borrow occurred.
#[must_use]
pub fn subtract(a: u8, b: u8, carry_in: bool) -> (u8, bool) {
    reduce(u32::from(a) + u32::from(!b) + 1 + u32::from(carry_in))
}

/// `a << (1 + extra)` on a 32-bit lane; the shift count wraps at 32.
#[must_use]
pub fn shift_left(a: u8, extra: u32) -> (u8, bool) {
    reduce(u32::from(a).wrapping_shl(1 + extra))
}

/// `a >> (1 + extra)` on a 32-bit lane; the shift count wraps at 32, so an
/// `extra` of 128 shifts by one.
#[must_use]
pub fn shift_right(a: u8, extra: u32) -> (u8, bool) {
    reduce(u32::from(a).wrapping_shr(1 + extra))
}

/// Odd parity of `a`, folded with `carry_in`.
#[must_use]
pub fn parity(a: u8, carry_in: bool) -> bool {
    (a.count_ones() + u32::from(carry_in)) % 2 == 1
}

#[allow(clippy::cast_possible_truncation)]
const fn reduce(result: u32) -> (u8, bool) {
    ((result & 0xFF) as u8, result > 0xFF)
}

#[cfg(test)]
mod tests {
    use super::{add, parity, shift_left, shift_right, subtract};
    use proptest::prelude::*;

    #[test]
    fn add_reports_carry_past_255() {
        assert_eq!(add(200, 100, false), (44, true));
        assert_eq!(add(10, 20, false), (30, false));
        assert_eq!(add(255, 0, true), (0, true));
    }

    #[test]
    fn subtract_carry_means_no_borrow() {
        assert_eq!(subtract(5, 3, false), (2, true));
        assert_eq!(subtract(3, 5, false), (254, false));
        assert_eq!(subtract(0, 0, false), (0, true));
        assert_eq!(subtract(5, 3, true), (3, true));
    }

    #[test]
    fn shifts_use_extended_counts() {
        assert_eq!(shift_left(0x81, 0), (0x02, true));
        assert_eq!(shift_left(0x41, 1), (0x04, true));
        assert_eq!(shift_left(0x01, 1), (0x04, false));
        assert_eq!(shift_right(0x81, 0), (0x40, false));
        assert_eq!(shift_right(0x81, 128), (0x40, false));
    }

    #[test]
    fn parity_counts_set_bits() {
        assert!(!parity(0b0000_0000, false));
        assert!(parity(0b0000_0001, false));
        assert!(!parity(0b0000_0001, true));
        assert!(!parity(0b1111_1111, false));
    }

    proptest! {
        #[test]
        fn add_matches_wide_arithmetic(a: u8, b: u8, c: bool) {
            let wide = u16::from(a) + u16::from(b) + u16::from(c);
            let (value, carry) = add(a, b, c);
            prop_assert_eq!(u16::from(value), wide % 256);
            prop_assert_eq!(carry, wide > 255);
        }

        #[test]
        fn subtract_without_carry_in_is_wrapping_sub(a: u8, b: u8) {
            let (value, carry) = subtract(a, b, false);
            prop_assert_eq!(value, a.wrapping_sub(b));
            prop_assert_eq!(carry, a >= b);
        }

        #[test]
        fn shift_right_never_carries(a: u8, c: bool) {
            let (value, carry) = shift_right(a, 128 * u32::from(c));
            prop_assert_eq!(value, a >> 1);
            prop_assert!(!carry);
        }
    }
}
