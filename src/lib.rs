//! Fixed-point decimal with three fractional digits
//!
//! [`Decimal3`] stores a value multiplied by 1000 in a single `i64`:
//!
//! - Range: ±9,223,372,036,854,775.807
//! - Precision: 0.001
//! - Error state: the bit pattern `i64::MIN` is reserved as an in-band
//!   sentinel ([`Decimal3::ERROR_VALUE`])
//!
//! ## Two ways to handle failure
//!
//! The sentinel layer never fails. Constructors (`from_*`), operators and the
//! `safe_*` methods fold overflow, non-finite input and precision loss into
//! the error sentinel, which then propagates through every later operation.
//! Check [`Decimal3::is_error`] once at the end of a computation.
//!
//! The result layer (`try_*`, [`TryFrom`], [`FromStr`](core::str::FromStr))
//! performs the same arithmetic but reports the reason as a [`DecimalError`].
//!
//! Scalar division is the one place where these meet: a non-finite divisor is
//! a contract violation rather than a numeric condition, so
//! [`Decimal3::div_f64`] reports it as [`DecimalError::InvalidDivisor`] and the
//! `/` operator panics on it.
//!
//! ## Example
//!
//! ```rust
//! use decimal3::Decimal3;
//!
//! let price = Decimal3::from_text("1.111");
//! let qty = Decimal3::from_f64(2.222);
//! let total = price * qty; // 2.468642 rounds to 2.469
//! assert_eq!(total.to_internal(), 2469);
//!
//! let broken = Decimal3::from_f64(f64::NAN) + price;
//! assert!(broken.is_error());
//! ```

#![no_std]
#![cfg_attr(test, allow(unused_imports))]

#[cfg(test)]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc;

mod decimal3;
pub mod params;
pub mod raw;

pub use decimal3::Decimal3;

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecimalError {
    #[error("overflow: value too large to represent")]
    Overflow,

    #[error("value is NaN or infinite")]
    NotFinite,

    #[error("precision loss would occur")]
    PrecisionLoss,

    #[error("division by zero")]
    DivisionByZero,

    #[error("divisor is not finite")]
    InvalidDivisor,

    #[error("invalid string format")]
    InvalidFormat,

    #[error("no input text")]
    MissingInput,

    #[error("operand is already in the error state")]
    Errored,
}

pub type Result<T> = core::result::Result<T, DecimalError>;
