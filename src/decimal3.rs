use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};

use crate::{DecimalError, params, raw};

/// Fixed-point decimal with 3 decimal places of precision.
///
/// Range: ±9,223,372,036,854,775.807
/// Precision: 0.001
///
/// The raw value `i64::MIN` is the error sentinel. Every arithmetic
/// operation returns the sentinel when either operand already carries it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Decimal3 {
    value: i64,
}

// ============================================================================
// Constants
// ============================================================================

impl Decimal3 {
    /// The scale factor: 10^3
    pub const SCALE: i64 = params::SCALE;

    /// The number of decimal places
    pub const DECIMALS: u8 = params::DECIMALS;

    /// Raw value of the error sentinel
    pub const ERROR_VALUE: i64 = params::ERROR_VALUE;

    /// The error sentinel
    pub const ERROR: Self = Self {
        value: Self::ERROR_VALUE,
    };

    /// Maximum value: 9,223,372,036,854,775.807
    pub const MAX: Self = Self {
        value: params::LONG_MAX,
    };

    /// Minimum value: -9,223,372,036,854,775.807
    pub const MIN: Self = Self {
        value: params::LONG_MIN,
    };

    /// Zero
    pub const ZERO: Self = Self { value: 0 };

    /// One (1.000)
    pub const ONE: Self = Self { value: Self::SCALE };
}

impl Default for Decimal3 {
    fn default() -> Self {
        Self::ZERO
    }
}

// ============================================================================
// Raw Access and Error State
// ============================================================================

impl Decimal3 {
    /// Wraps an already-scaled value without any validation.
    #[inline(always)]
    pub const fn from_internal(value: i64) -> Self {
        Self { value }
    }

    /// Returns the internal value (scaled by 10^3).
    #[inline(always)]
    pub const fn to_internal(self) -> i64 {
        self.value
    }

    /// Returns `true` if this value is the error sentinel.
    #[inline(always)]
    pub const fn is_error(self) -> bool {
        self.value == Self::ERROR_VALUE
    }

    /// Moves the sentinel into the `Err` channel.
    #[inline(always)]
    pub const fn into_result(self) -> crate::Result<Self> {
        if self.is_error() {
            Err(DecimalError::Errored)
        } else {
            Ok(self)
        }
    }

    /// Folds a raw result into a value, logging the transition to the
    /// sentinel. Propagating an operand that was already errored is not
    /// logged again.
    #[inline]
    fn settle(op: &'static str, result: crate::Result<i64>) -> Self {
        match result {
            Ok(value) => Self { value },
            Err(DecimalError::Errored) => Self::ERROR,
            Err(error) => {
                tracing::trace!(op, %error, "decimal3 operation produced the error sentinel");
                Self::ERROR
            }
        }
    }

    #[inline(always)]
    fn lift(result: crate::Result<i64>) -> crate::Result<Self> {
        result.map(|value| Self { value })
    }
}

// ============================================================================
// Integer Conversions
// ============================================================================

impl Decimal3 {
    /// Creates a Decimal3 from an i32 integer (always succeeds).
    #[inline(always)]
    pub const fn from_i32(value: i32) -> Self {
        Self {
            value: value as i64 * Self::SCALE,
        }
    }

    /// Creates a Decimal3 from a u32 integer (always succeeds).
    #[inline(always)]
    pub const fn from_u32(value: u32) -> Self {
        Self {
            value: value as i64 * Self::SCALE,
        }
    }

    /// Creates a Decimal3 from an i64 integer.
    ///
    /// Returns the sentinel if `|value|` exceeds [`params::MAX_VALUE`].
    #[inline]
    pub fn from_i64(value: i64) -> Self {
        Self::settle("from_i64", raw::i64_to_internal(value))
    }

    /// Creates a Decimal3 from an i64, returning an error on overflow.
    #[inline(always)]
    pub const fn try_from_i64(value: i64) -> crate::Result<Self> {
        match raw::i64_to_internal(value) {
            Ok(value) => Ok(Self { value }),
            Err(e) => Err(e),
        }
    }

    /// Converts to i64, truncating any fractional part.
    #[inline(always)]
    pub const fn to_i64(self) -> i64 {
        self.value / Self::SCALE
    }

    /// Truncates, then wraps into `i32`.
    #[inline(always)]
    pub const fn to_i32(self) -> i32 {
        self.to_i64() as i32
    }

    /// Truncates, then wraps into `i16`.
    #[inline(always)]
    pub const fn to_i16(self) -> i16 {
        self.to_i64() as i16
    }

    /// Truncates, then wraps into `u8`.
    #[inline(always)]
    pub const fn to_u8(self) -> u8 {
        self.to_i64() as u8
    }

    /// Truncates, then wraps into `i8`.
    #[inline(always)]
    pub const fn to_i8(self) -> i8 {
        self.to_i64() as i8
    }
}

// ============================================================================
// Float Conversions
// ============================================================================

impl Decimal3 {
    /// Creates a Decimal3 from an f64.
    ///
    /// Returns the sentinel for NaN, infinities and magnitudes above
    /// [`params::MAX_VALUE_F64`]. Magnitudes above
    /// [`params::MAX_ACCURATE_SCALED_F64`] are accepted with reduced
    /// fractional precision; see [`raw::f64_to_internal`].
    #[inline]
    pub fn from_f64(value: f64) -> Self {
        Self::settle("from_f64", raw::f64_to_internal(value))
    }

    /// Creates a Decimal3 from an f64, returning an error if invalid.
    #[inline]
    pub fn try_from_f64(value: f64) -> crate::Result<Self> {
        Self::lift(raw::f64_to_internal(value))
    }

    /// Converts to f64.
    ///
    /// Note: values above [`params::MAX_ACCURATE_SCALED`] may not keep all
    /// three fractional digits, and values above [`params::MAX_SAFE_INTEGER`]
    /// may lose integer digits as well. The sentinel is not checked.
    #[inline(always)]
    pub fn to_f64(self) -> f64 {
        self.value as f64 / Self::SCALE as f64
    }
}

// ============================================================================
// Text Conversions
// ============================================================================

impl Decimal3 {
    /// Parses decimal text with numeric-prefix rules.
    ///
    /// `""` yields zero; text that does not start with a number reads as zero;
    /// an integer part beyond `±MAX_VALUE` yields the sentinel. More than three
    /// fractional digits are rounded half up on the fourth.
    ///
    /// For strict parsing use [`str::parse`].
    #[inline]
    pub fn from_text(text: &str) -> Self {
        Self::settle("from_text", raw::text_to_internal(text))
    }

    /// Like [`Decimal3::from_text`], but absent text yields the sentinel.
    #[inline]
    pub fn from_opt_str(text: Option<&str>) -> Self {
        match text {
            Some(text) => Self::from_text(text),
            None => Self::ERROR,
        }
    }

    /// Like [`Decimal3::from_text`], returning the reason on failure.
    #[inline]
    pub fn try_from_text(text: &str) -> crate::Result<Self> {
        Self::lift(raw::text_to_internal(text))
    }

    /// Like [`Decimal3::from_opt_str`], returning the reason on failure.
    /// Absent text is `DecimalError::MissingInput`.
    #[inline]
    pub fn try_from_opt_str(text: Option<&str>) -> crate::Result<Self> {
        match text {
            Some(text) => Self::try_from_text(text),
            None => Err(DecimalError::MissingInput),
        }
    }
}

impl FromStr for Decimal3 {
    type Err = DecimalError;

    /// Accepts `[+-]digits[.digits]` or `.digits`, ignoring surrounding
    /// whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bytes = s.as_bytes();

        let unsigned = match bytes.first() {
            Some(b'-') | Some(b'+') => &bytes[1..],
            Some(_) => bytes,
            None => return Err(DecimalError::InvalidFormat),
        };

        let (integer, fraction) = match unsigned.iter().position(|&b| b == b'.') {
            Some(dp) => (&unsigned[..dp], Some(&unsigned[dp + 1..])),
            None => (unsigned, None),
        };

        let all_digits = |part: &[u8]| part.iter().all(u8::is_ascii_digit);

        let valid = match fraction {
            Some(fraction) => {
                all_digits(integer)
                    && all_digits(fraction)
                    && !fraction.is_empty()
                    && (!integer.is_empty() || unsigned.len() == bytes.len())
            }
            None => !integer.is_empty() && all_digits(integer),
        };

        if !valid {
            return Err(DecimalError::InvalidFormat);
        }

        Self::try_from_text(s)
    }
}

// ============================================================================
// Safe Arithmetic
// ============================================================================

impl Decimal3 {
    /// Addition. Returns the sentinel on overflow.
    #[inline]
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn safe_add(self, rhs: Self) -> Self {
        Self::settle("add", raw::add(self.value, rhs.value))
    }

    /// Subtraction. Returns the sentinel on overflow.
    #[inline]
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn safe_sub(self, rhs: Self) -> Self {
        Self::settle("sub", raw::subtract(self.value, rhs.value))
    }

    /// Multiplication rounded half up to 3 decimals. Returns the sentinel on
    /// overflow.
    #[inline]
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn safe_mul(self, rhs: Self) -> Self {
        Self::settle("mul", raw::multiply(self.value, rhs.value))
    }

    /// Multiplication by a float, truncated. Returns the sentinel for a
    /// non-finite factor or when the product exceeds `2^53 - 1` raw units.
    #[inline]
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn mul_f64(self, rhs: f64) -> Self {
        Self::settle("mul_f64", raw::multiply_f64(self.value, rhs))
    }

    /// Division by a float, truncated.
    ///
    /// # Errors
    /// Returns `DecimalError::InvalidDivisor` if `rhs` is NaN or infinite.
    /// Every other failure (zero divisor, imprecise quotient, errored `self`)
    /// is returned as `Ok` holding the sentinel.
    #[inline]
    pub fn div_f64(self, rhs: f64) -> crate::Result<Self> {
        match raw::divide_f64(self.value, rhs) {
            Err(DecimalError::InvalidDivisor) => Err(DecimalError::InvalidDivisor),
            result => Ok(Self::settle("div_f64", result)),
        }
    }

    /// Checked addition. Returns an error if overflow occurred.
    #[inline]
    pub const fn try_add(self, rhs: Self) -> crate::Result<Self> {
        match raw::add(self.value, rhs.value) {
            Ok(value) => Ok(Self { value }),
            Err(e) => Err(e),
        }
    }

    /// Checked subtraction. Returns an error if overflow occurred.
    #[inline]
    pub const fn try_sub(self, rhs: Self) -> crate::Result<Self> {
        match raw::subtract(self.value, rhs.value) {
            Ok(value) => Ok(Self { value }),
            Err(e) => Err(e),
        }
    }

    /// Checked multiplication. Returns an error if overflow occurred.
    #[inline]
    pub const fn try_mul(self, rhs: Self) -> crate::Result<Self> {
        match raw::multiply(self.value, rhs.value) {
            Ok(value) => Ok(Self { value }),
            Err(e) => Err(e),
        }
    }

    #[inline]
    pub fn try_mul_f64(self, rhs: f64) -> crate::Result<Self> {
        Self::lift(raw::multiply_f64(self.value, rhs))
    }

    #[inline]
    pub fn try_div_f64(self, rhs: f64) -> crate::Result<Self> {
        Self::lift(raw::divide_f64(self.value, rhs))
    }

    #[inline]
    pub fn try_add_f64(self, rhs: f64) -> crate::Result<Self> {
        self.try_add(Self::try_from_f64(rhs)?)
    }

    #[inline]
    pub fn try_sub_f64(self, rhs: f64) -> crate::Result<Self> {
        self.try_sub(Self::try_from_f64(rhs)?)
    }
}

// ============================================================================
// Sign and Magnitude
// ============================================================================

impl Decimal3 {
    /// Absolute value. The sentinel stays the sentinel.
    #[inline(always)]
    pub const fn abs(self) -> Self {
        if self.is_error() {
            Self::ERROR
        } else {
            Self {
                value: self.value.abs(),
            }
        }
    }

    #[inline(always)]
    pub const fn is_zero(self) -> bool {
        self.value == 0
    }

    /// Returns `false` for the sentinel.
    #[inline(always)]
    pub const fn is_positive(self) -> bool {
        self.value > 0
    }

    /// Returns `false` for the sentinel.
    #[inline(always)]
    pub const fn is_negative(self) -> bool {
        self.value < 0 && !self.is_error()
    }
}

// ============================================================================
// Byte Conversions
// ============================================================================

impl Decimal3 {
    /// Size of the byte representation.
    pub const BYTES: usize = core::mem::size_of::<i64>();

    #[inline(always)]
    pub const fn from_le_bytes(bytes: [u8; Decimal3::BYTES]) -> Self {
        Self {
            value: i64::from_le_bytes(bytes),
        }
    }

    #[inline(always)]
    pub const fn from_be_bytes(bytes: [u8; Decimal3::BYTES]) -> Self {
        Self {
            value: i64::from_be_bytes(bytes),
        }
    }

    #[inline(always)]
    pub const fn to_le_bytes(self) -> [u8; Decimal3::BYTES] {
        self.value.to_le_bytes()
    }

    #[inline(always)]
    pub const fn to_be_bytes(self) -> [u8; Decimal3::BYTES] {
        self.value.to_be_bytes()
    }
}

// ============================================================================
// Operator Overloading
// ============================================================================

impl Add for Decimal3 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        self.safe_add(rhs)
    }
}

impl Sub for Decimal3 {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self::Output {
        self.safe_sub(rhs)
    }
}

impl Mul for Decimal3 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self::Output {
        self.safe_mul(rhs)
    }
}

impl Add<f64> for Decimal3 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: f64) -> Self::Output {
        self.safe_add(Self::from_f64(rhs))
    }
}

impl Sub<f64> for Decimal3 {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: f64) -> Self::Output {
        self.safe_sub(Self::from_f64(rhs))
    }
}

impl Mul<f64> for Decimal3 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: f64) -> Self::Output {
        self.mul_f64(rhs)
    }
}

impl Div<f64> for Decimal3 {
    type Output = Self;

    /// # Panics
    /// Panics if `rhs` is NaN or infinite. Use [`Decimal3::div_f64`] to get
    /// this as an error instead.
    #[inline(always)]
    fn div(self, rhs: f64) -> Self::Output {
        match self.div_f64(rhs) {
            Ok(result) => result,
            Err(_) => panic!("divisor is not finite"),
        }
    }
}

impl Neg for Decimal3 {
    type Output = Self;

    /// The sentinel stays the sentinel.
    #[inline(always)]
    fn neg(self) -> Self::Output {
        if self.is_error() {
            Self::ERROR
        } else {
            Self { value: -self.value }
        }
    }
}

impl AddAssign for Decimal3 {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Decimal3 {
    #[inline(always)]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for Decimal3 {
    #[inline(always)]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl AddAssign<f64> for Decimal3 {
    #[inline(always)]
    fn add_assign(&mut self, rhs: f64) {
        *self = *self + rhs;
    }
}

impl SubAssign<f64> for Decimal3 {
    #[inline(always)]
    fn sub_assign(&mut self, rhs: f64) {
        *self = *self - rhs;
    }
}

impl MulAssign<f64> for Decimal3 {
    #[inline(always)]
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

impl DivAssign<f64> for Decimal3 {
    #[inline(always)]
    fn div_assign(&mut self, rhs: f64) {
        *self = *self / rhs;
    }
}

// ============================================================================
// Standard Library Trait Implementations
// ============================================================================

impl TryFrom<i64> for Decimal3 {
    type Error = DecimalError;

    #[inline(always)]
    fn try_from(value: i64) -> crate::Result<Self> {
        Self::try_from_i64(value)
    }
}

impl TryFrom<f64> for Decimal3 {
    type Error = DecimalError;

    #[inline(always)]
    fn try_from(value: f64) -> crate::Result<Self> {
        Self::try_from_f64(value)
    }
}

impl From<i32> for Decimal3 {
    #[inline(always)]
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

impl From<u32> for Decimal3 {
    #[inline(always)]
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

impl From<i16> for Decimal3 {
    #[inline(always)]
    fn from(value: i16) -> Self {
        Self::from_i32(value as i32)
    }
}

impl From<u16> for Decimal3 {
    #[inline(always)]
    fn from(value: u16) -> Self {
        Self::from_u32(value as u32)
    }
}

impl From<i8> for Decimal3 {
    #[inline(always)]
    fn from(value: i8) -> Self {
        Self::from_i32(value as i32)
    }
}

impl From<u8> for Decimal3 {
    #[inline(always)]
    fn from(value: u8) -> Self {
        Self::from_u32(value as u32)
    }
}

impl fmt::Display for Decimal3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_error() {
            return f.write_str("NaN");
        }

        if let Some(precision) = f.precision() {
            return self.fmt_with_precision(f, precision);
        }

        let sign = if self.value < 0 { "-" } else { "" };
        let abs_value = self.value.unsigned_abs();
        let integer_part = abs_value / Self::SCALE as u64;
        let mut fractional_part = abs_value % Self::SCALE as u64;

        if fractional_part == 0 {
            return write!(f, "{}{}", sign, integer_part);
        }

        // Strip trailing zeros
        let mut width = Self::DECIMALS as usize;
        while fractional_part % 10 == 0 {
            fractional_part /= 10;
            width -= 1;
        }

        write!(
            f,
            "{}{}.{:0width$}",
            sign,
            integer_part,
            fractional_part,
            width = width
        )
    }
}

impl Decimal3 {
    fn fmt_with_precision(&self, f: &mut fmt::Formatter<'_>, precision: usize) -> fmt::Result {
        let abs_value = self.value.unsigned_abs();

        if precision >= Self::DECIMALS as usize {
            let sign = if self.value < 0 { "-" } else { "" };
            write!(
                f,
                "{}{}.{:03}",
                sign,
                abs_value / Self::SCALE as u64,
                abs_value % Self::SCALE as u64
            )?;
            for _ in Self::DECIMALS as usize..precision {
                f.write_str("0")?;
            }
            return Ok(());
        }

        // Round half up to the requested precision
        let divisor = 10u64.pow(Self::DECIMALS as u32 - precision as u32);
        let mut scaled = abs_value / divisor;
        if abs_value % divisor >= divisor / 2 {
            scaled += 1;
        }

        let sign = if self.value < 0 && scaled != 0 { "-" } else { "" };
        let precision_scale = 10u64.pow(precision as u32);
        write!(f, "{}{}", sign, scaled / precision_scale)?;
        if precision > 0 {
            write!(
                f,
                ".{:0width$}",
                scaled % precision_scale,
                width = precision
            )?;
        }
        Ok(())
    }
}

impl fmt::Debug for Decimal3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            // {:#?} shows raw internals
            f.debug_struct("Decimal3")
                .field("value", &self.value)
                .finish()
        } else {
            write!(f, "Decimal3({})", self)
        }
    }
}

// ============================================================================
// Iterator Trait Implementations
// ============================================================================

impl Sum for Decimal3 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Decimal3> for Decimal3 {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + *x)
    }
}

// ============================================================================
// Serde Support
// ============================================================================

#[cfg(feature = "serde")]
impl Serialize for Decimal3 {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            if self.is_error() {
                return Err(ser::Error::custom(DecimalError::Errored));
            }
            serializer.collect_str(self)
        } else {
            // Carries the sentinel bit pattern as is
            self.value.serialize(serializer)
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Decimal3 {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = alloc::string::String::deserialize(deserializer)?;
            Self::from_str(&s).map_err(de::Error::custom)
        } else {
            let value = i64::deserialize(deserializer)?;
            Ok(Self { value })
        }
    }
}




#[cfg(test)]
mod sentinel_tests {
    use super::*;

    #[test]
    fn test_sentinel_propagates_through_operators() {
        let e = Decimal3::ERROR;
        let x = Decimal3::from_i32(5);

        assert!((e + x).is_error());
        assert!((x + e).is_error());
        assert!((e - x).is_error());
        assert!((x - e).is_error());
        assert!((e * x).is_error());
        assert!((e * Decimal3::ZERO).is_error());
        assert!((e + 1.0).is_error());
        assert!((e - (-1.0)).is_error());
        assert!((e * 0.0).is_error());
        assert!((e / 1.0).is_error());
    }

    #[test]
    fn test_sentinel_mixed_signs_not_computed() {
        // i64::MIN + 1000 would otherwise be a valid negative number
        let result = Decimal3::ERROR + Decimal3::ONE;
        assert_eq!(result.to_internal(), Decimal3::ERROR_VALUE);
    }

    #[test]
    fn test_try_variants_report_errored() {
        assert_eq!(Decimal3::ERROR.try_add(Decimal3::ONE), Err(DecimalError::Errored));
        assert_eq!(Decimal3::ONE.try_mul(Decimal3::ERROR), Err(DecimalError::Errored));
        assert_eq!(Decimal3::ERROR.try_div_f64(2.0), Err(DecimalError::Errored));
        assert_eq!(Decimal3::ERROR.div_f64(2.0), Ok(Decimal3::ERROR));
    }

    #[test]
    fn test_compound_assignment_keeps_sentinel() {
        let mut a = Decimal3::from_i64(i64::MAX);
        a += Decimal3::ONE;
        a -= Decimal3::ONE;
        a *= 0.0;
        assert!(a.is_error());
    }
}
