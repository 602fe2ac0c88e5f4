//! Scale and range boundaries shared by every construction and arithmetic path.
//!
//! The integer bounds come from the `i64` domain; the floating-point tiers
//! come from the 53-bit mantissa of `f64` (`2^53 - 1` is the largest integer
//! an `f64` holds exactly).

/// The scale factor: 10^3
pub const SCALE: i64 = 1000;

/// The number of decimal places
pub const DECIMALS: u8 = 3;

/// Largest raw value that can be stored.
pub const LONG_MAX: i64 = i64::MAX;

/// Smallest raw value that can be stored. One above `i64::MIN`, which is
/// reserved for [`ERROR_VALUE`].
pub const LONG_MIN: i64 = i64::MIN + 1;

/// Error sentinel.
pub const ERROR_VALUE: i64 = i64::MIN;

/// Largest plain integer that can be scaled without overflowing.
pub const MAX_VALUE: i64 = i64::MAX / SCALE;

/// Largest magnitude accepted from an `f64`.
pub const MAX_VALUE_F64: f64 = (MAX_VALUE - 1) as f64;

/// `2^53 - 1`
pub const MAX_SAFE_INTEGER_F64: f64 = 9_007_199_254_740_991.0;

/// `2^53 - 1` as an integer.
pub const MAX_SAFE_INTEGER: i64 = MAX_SAFE_INTEGER_F64 as i64;

/// Largest `f64` magnitude that still scales by 1000 without mantissa loss.
pub const MAX_ACCURATE_SCALED_F64: f64 = MAX_SAFE_INTEGER_F64 / 1000.0;

/// Largest `f64` magnitude that can be scaled by 10000 and rounded on the
/// fourth fractional digit.
pub const MAX_ROUNDABLE_ACCURATE_SCALED_F64: f64 = MAX_SAFE_INTEGER_F64 / 10_000.0;

/// Largest raw value whose `to_f64` keeps all three fractional digits.
pub const MAX_ACCURATE_SCALED: i64 = MAX_SAFE_INTEGER / SCALE;

/// Largest fractional contribution (in thousandths) that still fits when the
/// integer part is exactly `±MAX_VALUE`.
pub(crate) const MAX_EDGE_FRACTION: i64 = LONG_MAX - MAX_VALUE * SCALE;
