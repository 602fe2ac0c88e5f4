//! Overflow- and precision-aware routines on raw scaled values.
//!
//! Every function works on the internal `i64` representation (the decimal
//! value times 1000) and reports failure as a [`DecimalError`]. [`Decimal3`]
//! folds these errors into its sentinel; the `try_*` methods pass them on.
//!
//! An operand equal to [`ERROR_VALUE`] is never computed on: every binary
//! routine returns [`DecimalError::Errored`] for it. No routine returns
//! `Ok(ERROR_VALUE)`.
//!
//! [`Decimal3`]: crate::Decimal3

use crate::params::{
    ERROR_VALUE, LONG_MAX, LONG_MIN, MAX_ACCURATE_SCALED_F64, MAX_EDGE_FRACTION,
    MAX_ROUNDABLE_ACCURATE_SCALED_F64, MAX_SAFE_INTEGER_F64, MAX_VALUE, MAX_VALUE_F64, SCALE,
};
use crate::{DecimalError, Result};

#[inline(always)]
const fn ensure_valid(a: i64, b: i64) -> Result<()> {
    if a == ERROR_VALUE || b == ERROR_VALUE {
        Err(DecimalError::Errored)
    } else {
        Ok(())
    }
}

/// Collapses a value carrying four fractional digits to three, rounding half
/// up on the fourth digit. `value` must be non-negative.
#[inline(always)]
const fn round_fourth_digit(value: i64) -> i64 {
    if value % 10 >= 5 {
        value / 10 + 1
    } else {
        value / 10
    }
}

// ============================================================================
// Addition / Subtraction
// ============================================================================

/// Adds two scaled values.
///
/// Operands of differing sign can never overflow. Two non-negative operands
/// overflow when `b` exceeds the headroom left below `i64::MAX`; two negative
/// operands overflow when the sum would reach the sentinel or beyond.
pub const fn add(a: i64, b: i64) -> Result<i64> {
    if let Err(e) = ensure_valid(a, b) {
        return Err(e);
    }

    let a_positive = a >= 0;
    let b_positive = b >= 0;

    if a_positive != b_positive {
        Ok(a + b)
    } else if a_positive {
        if LONG_MAX - a < b {
            Err(DecimalError::Overflow)
        } else {
            Ok(a + b)
        }
    } else if b < LONG_MIN - a {
        Err(DecimalError::Overflow)
    } else {
        Ok(a + b)
    }
}

/// Subtracts `b` from `a`.
///
/// Operands of the same sign can never overflow.
pub const fn subtract(a: i64, b: i64) -> Result<i64> {
    if let Err(e) = ensure_valid(a, b) {
        return Err(e);
    }

    let a_positive = a >= 0;
    let b_positive = b >= 0;

    if a_positive == b_positive {
        Ok(a - b)
    } else if a_positive {
        // a >= 0, b < 0; b != i64::MIN so -b is safe
        if LONG_MAX - a < -b {
            Err(DecimalError::Overflow)
        } else {
            Ok(a - b)
        }
    } else {
        // a < 0, b >= 0
        if a < LONG_MIN + b {
            Err(DecimalError::Overflow)
        } else {
            Ok(a - b)
        }
    }
}

// ============================================================================
// Multiplication
// ============================================================================

/// Multiplies two scaled values and rescales the product by 1000.
///
/// The raw product must fit in `i64`. Rescaling rounds half away from zero on
/// the discarded thousandths.
pub const fn multiply(a: i64, b: i64) -> Result<i64> {
    if let Err(e) = ensure_valid(a, b) {
        return Err(e);
    }

    let product = match a.checked_mul(b) {
        Some(p) => p,
        None => return Err(DecimalError::Overflow),
    };

    let quotient = product / SCALE;
    let remainder = product % SCALE;

    if remainder >= SCALE / 2 {
        Ok(quotient + 1)
    } else if remainder <= -(SCALE / 2) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

/// Multiplies a scaled value by a floating-point factor.
///
/// The result is truncated. A product whose magnitude exceeds `2^53 - 1` is
/// rejected because its integer part can no longer be trusted.
pub fn multiply_f64(a: i64, b: f64) -> Result<i64> {
    if a == ERROR_VALUE {
        return Err(DecimalError::Errored);
    }
    if !b.is_finite() {
        return Err(DecimalError::NotFinite);
    }

    let product = a as f64 * b;
    let magnitude = if product < 0.0 { -product } else { product };

    if magnitude > LONG_MAX as f64 {
        return Err(DecimalError::Overflow);
    }
    if magnitude > MAX_SAFE_INTEGER_F64 {
        return Err(DecimalError::PrecisionLoss);
    }

    Ok(product as i64)
}

// ============================================================================
// Division
// ============================================================================

/// Divides a scaled value by a floating-point divisor.
///
/// A non-finite divisor is reported as [`DecimalError::InvalidDivisor`]
/// before anything else, including an errored `a`. A quotient whose magnitude
/// exceeds [`MAX_ACCURATE_SCALED_F64`] is rejected.
pub fn divide_f64(a: i64, b: f64) -> Result<i64> {
    if !b.is_finite() {
        return Err(DecimalError::InvalidDivisor);
    }
    if a == ERROR_VALUE {
        return Err(DecimalError::Errored);
    }
    if b == 0.0 {
        return Err(DecimalError::DivisionByZero);
    }

    let quotient = a as f64 / b;
    if !quotient.is_finite() {
        return Err(DecimalError::Overflow);
    }

    let magnitude = if quotient < 0.0 { -quotient } else { quotient };

    // integer part inaccurate
    if magnitude > MAX_SAFE_INTEGER_F64 {
        return Err(DecimalError::PrecisionLoss);
    }
    // fractional part inaccurate
    if magnitude > MAX_ACCURATE_SCALED_F64 {
        return Err(DecimalError::PrecisionLoss);
    }

    Ok(quotient as i64)
}

// ============================================================================
// Construction
// ============================================================================

/// Scales a plain integer. `|x|` must not exceed [`MAX_VALUE`].
pub const fn i64_to_internal(x: i64) -> Result<i64> {
    if x < -MAX_VALUE || x > MAX_VALUE {
        return Err(DecimalError::Overflow);
    }
    Ok(x * SCALE)
}

/// Converts a floating-point number to a scaled value.
///
/// The magnitude selects one of four strategies, checked in order:
///
/// 1. above [`MAX_VALUE_F64`]: overflow
/// 2. up to [`MAX_ROUNDABLE_ACCURATE_SCALED_F64`]: scale by 10000 and round
///    half up on the fourth fractional digit
/// 3. up to [`MAX_ACCURATE_SCALED_F64`]: scale by 1000 and truncate
/// 4. beyond that: accept precision loss, scaling by the largest power of ten
///    whose product stays within `2^53 - 1`, then padding with zeros
pub fn f64_to_internal(x: f64) -> Result<i64> {
    if !x.is_finite() {
        return Err(DecimalError::NotFinite);
    }

    let magnitude = if x < 0.0 { -x } else { x };

    if magnitude > MAX_VALUE_F64 {
        return Err(DecimalError::Overflow);
    }

    if magnitude <= MAX_ROUNDABLE_ACCURATE_SCALED_F64 {
        let rounded = round_fourth_digit((magnitude * 10_000.0) as i64);
        return Ok(if x >= 0.0 { rounded } else { -rounded });
    }

    if magnitude <= MAX_ACCURATE_SCALED_F64 {
        return Ok((x * 1000.0) as i64);
    }

    if magnitude > MAX_SAFE_INTEGER_F64 / 10.0 {
        Ok(x as i64 * SCALE)
    } else if magnitude > MAX_SAFE_INTEGER_F64 / 100.0 {
        Ok((x * 10.0) as i64 * 100)
    } else {
        Ok((x * 100.0) as i64 * 10)
    }
}

#[inline(always)]
const fn is_c_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r')
}

/// Scans the leading integer of `bytes` the way C's `strtoll` does: leading
/// whitespace, an optional sign, then decimal digits.
///
/// Returns `(magnitude, negative, end)`. When no digit is found the result is
/// `(0, false, 0)`, i.e. nothing was consumed.
fn scan_integer(bytes: &[u8]) -> Result<(i64, bool, usize)> {
    let mut pos = 0;
    while pos < bytes.len() && is_c_space(bytes[pos]) {
        pos += 1;
    }

    let negative = match bytes.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let digits_start = pos;
    let mut magnitude = 0i64;
    while let Some(&byte) = bytes.get(pos) {
        let digit = byte.wrapping_sub(b'0');
        if digit > 9 {
            break;
        }
        magnitude = magnitude * 10 + digit as i64;
        if magnitude > MAX_VALUE {
            return Err(DecimalError::Overflow);
        }
        pos += 1;
    }

    if pos == digits_start {
        return Ok((0, false, 0));
    }

    Ok((magnitude, negative, pos))
}

/// Parses decimal text to a scaled value.
///
/// - `""` is zero.
/// - The integer part is read with numeric-prefix rules: the first non-digit
///   ends it, and text with no leading number reads as `0`.
/// - A `.` directly after the integer part introduces up to four fractional
///   digits (missing ones count as `0`, any further digits are ignored). The
///   fourth digit rounds the third half up.
/// - At an integer part of exactly `±MAX_VALUE` the rounded fraction may not
///   exceed `.807`.
pub fn text_to_internal(text: &str) -> Result<i64> {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return Ok(0);
    }

    let (integer, negative, next) = scan_integer(bytes)?;

    if bytes.get(next) != Some(&b'.') {
        let scaled = integer * SCALE;
        return Ok(if negative { -scaled } else { scaled });
    }

    let mut fraction = 0i64;
    let mut taken = 0;
    for &byte in &bytes[next + 1..] {
        if taken == 4 || !byte.is_ascii_digit() {
            break;
        }
        fraction = fraction * 10 + (byte - b'0') as i64;
        taken += 1;
    }
    while taken < 4 {
        fraction *= 10;
        taken += 1;
    }
    let fraction = round_fourth_digit(fraction);

    if integer == MAX_VALUE && fraction > MAX_EDGE_FRACTION {
        return Err(DecimalError::Overflow);
    }

    let scaled = integer * SCALE + fraction;
    // sign comes from the text, so a "-0" integer part stays negative
    Ok(if negative { -scaled } else { scaled })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_mixed_signs_never_overflow() {
        assert_eq!(add(LONG_MAX, -1), Ok(LONG_MAX - 1));
        assert_eq!(add(LONG_MIN, LONG_MAX), Ok(0));
        assert_eq!(add(-5, 3), Ok(-2));
    }

    #[test]
    fn test_add_positive_overflow() {
        assert_eq!(add(LONG_MAX, 0), Ok(LONG_MAX));
        assert_eq!(add(LONG_MAX, 1), Err(DecimalError::Overflow));
        assert_eq!(add(LONG_MAX - 10, 10), Ok(LONG_MAX));
        assert_eq!(add(LONG_MAX - 10, 11), Err(DecimalError::Overflow));
    }

    #[test]
    fn test_add_negative_cannot_reach_sentinel() {
        assert_eq!(add(LONG_MIN + 1, -1), Ok(LONG_MIN));
        assert_eq!(add(LONG_MIN, -1), Err(DecimalError::Overflow));
        assert_eq!(add(-LONG_MAX, -LONG_MAX), Err(DecimalError::Overflow));
    }

    #[test]
    fn test_subtract_overflow() {
        assert_eq!(subtract(LONG_MAX, -1), Err(DecimalError::Overflow));
        assert_eq!(subtract(LONG_MAX - 1, -1), Ok(LONG_MAX));
        assert_eq!(subtract(LONG_MIN, 1), Err(DecimalError::Overflow));
        assert_eq!(subtract(LONG_MIN + 1, 1), Ok(LONG_MIN));
        assert_eq!(subtract(-1, LONG_MAX - 1), Ok(LONG_MIN));
        assert_eq!(subtract(-1, LONG_MAX), Err(DecimalError::Overflow));
    }

    #[test]
    fn test_subtract_same_sign() {
        assert_eq!(subtract(-1111, -2222), Ok(1111));
        assert_eq!(subtract(0, LONG_MAX), Ok(LONG_MIN));
        assert_eq!(subtract(-1, LONG_MIN), Ok(LONG_MAX - 1));
    }

    #[test]
    fn test_sentinel_operands_short_circuit() {
        assert_eq!(add(ERROR_VALUE, 1), Err(DecimalError::Errored));
        assert_eq!(add(1, ERROR_VALUE), Err(DecimalError::Errored));
        assert_eq!(subtract(ERROR_VALUE, -1), Err(DecimalError::Errored));
        assert_eq!(multiply(ERROR_VALUE, 0), Err(DecimalError::Errored));
        assert_eq!(multiply_f64(ERROR_VALUE, 0.0), Err(DecimalError::Errored));
        assert_eq!(divide_f64(ERROR_VALUE, 1.0), Err(DecimalError::Errored));
    }

    #[test]
    fn test_multiply_rounding() {
        assert_eq!(multiply(1111, 2222), Ok(2469)); // 2.468642
        assert_eq!(multiply(-1111, 2222), Ok(-2469));
        assert_eq!(multiply(1500, 1001), Ok(1502)); // 1.5015
        assert_eq!(multiply(1001, 1499), Ok(1500)); // 1.500499
        assert_eq!(multiply(-1500, 1001), Ok(-1502));
        assert_eq!(multiply(0, LONG_MAX), Ok(0));
    }

    #[test]
    fn test_multiply_overflow() {
        assert_eq!(multiply(LONG_MAX, 2), Err(DecimalError::Overflow));
        assert_eq!(multiply(-LONG_MAX, 2), Err(DecimalError::Overflow));
        assert_eq!(multiply(3_037_000_500, 3_037_000_500), Err(DecimalError::Overflow));
    }

    #[test]
    fn test_multiply_f64() {
        assert_eq!(multiply_f64(1000, 2.5), Ok(2500));
        assert_eq!(multiply_f64(1000, -2.5), Ok(-2500));
        assert_eq!(multiply_f64(1000, f64::NAN), Err(DecimalError::NotFinite));
        assert_eq!(multiply_f64(1000, f64::INFINITY), Err(DecimalError::NotFinite));
        assert_eq!(multiply_f64(1000, 1e300), Err(DecimalError::Overflow));
        assert_eq!(multiply_f64(1000, -1e300), Err(DecimalError::Overflow));
        assert_eq!(multiply_f64(1000, 1e13), Err(DecimalError::PrecisionLoss));
    }

    #[test]
    fn test_divide_f64() {
        assert_eq!(divide_f64(3000, 2.0), Ok(1500));
        assert_eq!(divide_f64(1000, 3.0), Ok(333));
        assert_eq!(divide_f64(-1000, 3.0), Ok(-333));
        assert_eq!(divide_f64(1000, 0.0), Err(DecimalError::DivisionByZero));
        assert_eq!(divide_f64(0, 0.0), Err(DecimalError::DivisionByZero));
        assert_eq!(divide_f64(1000, 1e-310), Err(DecimalError::Overflow));
        assert_eq!(divide_f64(1_000_000_000_000_000, 1.0), Err(DecimalError::PrecisionLoss));
    }

    #[test]
    fn test_divide_non_finite_divisor_wins() {
        assert_eq!(divide_f64(1000, f64::NAN), Err(DecimalError::InvalidDivisor));
        assert_eq!(divide_f64(1000, f64::NEG_INFINITY), Err(DecimalError::InvalidDivisor));
        assert_eq!(divide_f64(ERROR_VALUE, f64::INFINITY), Err(DecimalError::InvalidDivisor));
    }

    #[test]
    fn test_i64_to_internal() {
        assert_eq!(i64_to_internal(MAX_VALUE), Ok(MAX_VALUE * 1000));
        assert_eq!(i64_to_internal(-MAX_VALUE), Ok(-MAX_VALUE * 1000));
        assert_eq!(i64_to_internal(MAX_VALUE + 1), Err(DecimalError::Overflow));
        assert_eq!(i64_to_internal(i64::MIN), Err(DecimalError::Overflow));
    }

    #[test]
    fn test_f64_tier_round_half_up() {
        assert_eq!(f64_to_internal(0.1110), Ok(111));
        assert_eq!(f64_to_internal(0.1115), Ok(112));
        assert_eq!(f64_to_internal(-0.1115), Ok(-112));
        assert_eq!(f64_to_internal(1.23456), Ok(1235));
        assert_eq!(f64_to_internal(-0.0), Ok(0));
    }

    #[test]
    fn test_f64_tier_boundaries() {
        assert_eq!(f64_to_internal(MAX_VALUE_F64 * 2.0), Err(DecimalError::Overflow));
        assert_eq!(
            f64_to_internal(MAX_SAFE_INTEGER_F64),
            Ok(crate::params::MAX_SAFE_INTEGER * 1000)
        );
        assert_eq!(
            f64_to_internal(MAX_SAFE_INTEGER_F64 / 10.0),
            Ok(crate::params::MAX_SAFE_INTEGER * 100)
        );
        assert_eq!(
            f64_to_internal(MAX_SAFE_INTEGER_F64 / 100.0),
            Ok(crate::params::MAX_SAFE_INTEGER * 10)
        );
    }

    #[test]
    fn test_f64_tier_rounds_below_roundable_bound() {
        assert_eq!(f64_to_internal(800_000_000_000.0006), Ok(800_000_000_000_001));
        assert_eq!(f64_to_internal(-800_000_000_000.0006), Ok(-800_000_000_000_001));
    }

    #[test]
    fn test_f64_tier_truncates_above_roundable_bound() {
        assert_eq!(f64_to_internal(1_000_000_000_000.0009), Ok(1_000_000_000_000_000));
        assert_eq!(f64_to_internal(-1_000_000_000_000.0009), Ok(-1_000_000_000_000_000));
    }

    #[test]
    fn test_f64_tier_lossy_bands() {
        // above MAX_ACCURATE_SCALED_F64, up to MAX_SAFE_INTEGER_F64 / 100
        assert_eq!(f64_to_internal(10_000_000_000_000.125), Ok(10_000_000_000_000_120));
        // between MAX_SAFE_INTEGER_F64 / 100 and / 10
        assert_eq!(f64_to_internal(100_000_000_000_000.25), Ok(100_000_000_000_000_200));
        assert_eq!(f64_to_internal(-100_000_000_000_000.25), Ok(-100_000_000_000_000_200));
        // above MAX_SAFE_INTEGER_F64 / 10
        assert_eq!(
            f64_to_internal(1_000_000_000_000_000.5),
            Ok(1_000_000_000_000_000_000)
        );
    }

    #[test]
    fn test_scan_integer_prefix_rules() {
        assert_eq!(scan_integer(b"  -42x"), Ok((42, true, 5)));
        assert_eq!(scan_integer(b"+7"), Ok((7, false, 2)));
        assert_eq!(scan_integer(b"abc"), Ok((0, false, 0)));
        assert_eq!(scan_integer(b"-.5"), Ok((0, false, 0)));
        assert_eq!(scan_integer(b"99999999999999999999"), Err(DecimalError::Overflow));
    }

    #[test]
    fn test_text_fraction_digits() {
        assert_eq!(text_to_internal("123.456"), Ok(123_456));
        assert_eq!(text_to_internal("123.456789"), Ok(123_457));
        assert_eq!(text_to_internal("1.5"), Ok(1500));
        assert_eq!(text_to_internal("1."), Ok(1000));
        assert_eq!(text_to_internal("1.9999"), Ok(2000));
        assert_eq!(text_to_internal("1.0004"), Ok(1000));
        assert_eq!(text_to_internal("1.0005"), Ok(1001));
        assert_eq!(text_to_internal("2.12x9"), Ok(2120));
    }

    #[test]
    fn test_text_prefix_and_sign() {
        assert_eq!(text_to_internal(""), Ok(0));
        assert_eq!(text_to_internal("abc"), Ok(0));
        assert_eq!(text_to_internal("12abc"), Ok(12_000));
        assert_eq!(text_to_internal(".5"), Ok(500));
        assert_eq!(text_to_internal("-.5"), Ok(0));
        assert_eq!(text_to_internal("-0.5"), Ok(-500));
        assert_eq!(text_to_internal(" \t-3.25"), Ok(-3250));
    }

    #[test]
    fn test_text_boundary() {
        assert_eq!(text_to_internal("9223372036854775.807"), Ok(LONG_MAX));
        assert_eq!(text_to_internal("9223372036854775.8074"), Ok(LONG_MAX));
        assert_eq!(text_to_internal("9223372036854775.8075"), Err(DecimalError::Overflow));
        assert_eq!(text_to_internal("-9223372036854775.807"), Ok(LONG_MIN));
        assert_eq!(text_to_internal("-9223372036854775.808"), Err(DecimalError::Overflow));
        assert_eq!(text_to_internal("9223372036854776"), Err(DecimalError::Overflow));
    }
}
