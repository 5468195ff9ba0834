//! Common Types Module
//!
//! Shared types used across the codebase to avoid circular dependencies.

use alloy_primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

pub use alloy_primitives::{Address, B256};

/// Number of decimal places carried by a [`Wad`].
pub const WAD_DECIMALS: u32 = 18;

const WAD_ONE_RAW: u64 = 1_000_000_000_000_000_000;

/// 18-decimal fixed-point token quantity.
///
/// The raw integer is the on-chain representation (`1.0` is `10^18`).
/// Equality and ordering compare raw integers, so two prices computed at
/// the same scale are equal iff their raw values are equal.
///
/// Multiplication and division floor toward zero, matching the integer
/// arithmetic the market contracts use.
///
/// # Example
///
/// ```
/// use otc_market::types::Wad;
///
/// let price = Wad::from_number(6) / Wad::from_number(3);
/// assert_eq!(price, Wad::from_number(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Wad(U256);

impl Wad {
    pub const ZERO: Wad = Wad(U256::ZERO);
    pub const MAX: Wad = Wad(U256::MAX);

    /// Wrap a raw on-chain value.
    #[must_use]
    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// Whole-number quantity (`from_number(2)` is `2.0`).
    #[must_use]
    pub fn from_number(value: u64) -> Self {
        Self(U256::from(value) * Self::one_raw())
    }

    /// Convert a decimal quantity, truncating digits beyond 18 decimals.
    ///
    /// Returns `None` for negative values.
    #[must_use]
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return None;
        }
        let mantissa = U256::from(value.mantissa().unsigned_abs());
        let scale = value.scale();
        let raw = if scale <= WAD_DECIMALS {
            mantissa.checked_mul(pow10(WAD_DECIMALS - scale))?
        } else {
            mantissa / pow10(scale - WAD_DECIMALS)
        };
        Some(Self(raw))
    }

    /// Convert to a `Decimal`.
    ///
    /// Returns `None` if the value does not fit the 96-bit decimal mantissa.
    #[must_use]
    pub fn to_decimal(&self) -> Option<Decimal> {
        let raw = u128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(i128::try_from(raw).ok()?, WAD_DECIMALS).ok()
    }

    /// The raw on-chain integer.
    #[must_use]
    pub const fn raw(&self) -> U256 {
        self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Fixed-point division, `None` on division by zero or overflow.
    #[must_use]
    pub fn checked_div(self, rhs: Wad) -> Option<Wad> {
        if rhs.0.is_zero() {
            return None;
        }
        Some(Wad(self.0.checked_mul(Self::one_raw())? / rhs.0))
    }

    /// Fixed-point multiplication, `None` on overflow.
    #[must_use]
    pub fn checked_mul(self, rhs: Wad) -> Option<Wad> {
        Some(Wad(self.0.checked_mul(rhs.0)? / Self::one_raw()))
    }

    #[must_use]
    pub fn checked_sub(self, rhs: Wad) -> Option<Wad> {
        self.0.checked_sub(rhs.0).map(Wad)
    }

    #[must_use]
    pub fn saturating_sub(self, rhs: Wad) -> Wad {
        Wad(self.0.saturating_sub(rhs.0))
    }

    fn one_raw() -> U256 {
        U256::from(WAD_ONE_RAW)
    }
}

fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// Floors like `checked_div`; saturates to [`Wad::MAX`] when the dividend
/// overflows and panics on division by zero, as integer division does.
impl std::ops::Div for Wad {
    type Output = Wad;

    fn div(self, rhs: Wad) -> Wad {
        assert!(!rhs.is_zero(), "attempt to divide Wad by zero");
        self.checked_div(rhs).unwrap_or(Wad::MAX)
    }
}

impl Mul for Wad {
    type Output = Wad;

    fn mul(self, rhs: Wad) -> Wad {
        self.checked_mul(rhs).unwrap_or(Wad::MAX)
    }
}

impl Add for Wad {
    type Output = Wad;

    fn add(self, rhs: Wad) -> Wad {
        Wad(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Wad {
    type Output = Wad;

    fn sub(self, rhs: Wad) -> Wad {
        self.saturating_sub(rhs)
    }
}

impl From<U256> for Wad {
    fn from(raw: U256) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for Wad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let one = Self::one_raw();
        let whole = self.0 / one;
        // Remainder is below 10^18 and fits the low limb.
        let fraction = (self.0 % one).as_limbs()[0];
        write!(f, "{}.{:018}", whole, fraction)
    }
}

/// Errors parsing a decimal string into a [`Wad`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseWadError {
    #[error("invalid decimal '{0}'")]
    Invalid(String),

    #[error("negative or out-of-range amount '{0}'")]
    OutOfRange(String),
}

impl FromStr for Wad {
    type Err = ParseWadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| ParseWadError::Invalid(s.to_string()))?;
        Wad::from_decimal(value).ok_or_else(|| ParseWadError::OutOfRange(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_number_scales_by_wad() {
        assert_eq!(Wad::from_number(1).raw(), U256::from(WAD_ONE_RAW));
        assert_eq!(Wad::from_number(0), Wad::ZERO);
    }

    #[test]
    fn test_division_floors() {
        // 1 / 3 = 0.333333333333333333 (floored)
        let third = Wad::from_number(1) / Wad::from_number(3);
        assert_eq!(third.raw(), U256::from(333_333_333_333_333_333u64));
        assert_eq!(third.to_string(), "0.333333333333333333");
    }

    #[test]
    fn test_checked_div_by_zero() {
        assert_eq!(Wad::from_number(1).checked_div(Wad::ZERO), None);
    }

    #[test]
    fn test_decimal_round_trip() {
        let wad = Wad::from_decimal(dec!(1.5)).unwrap();
        assert_eq!(wad.to_string(), "1.500000000000000000");
        assert_eq!(wad.to_decimal(), Some(dec!(1.500000000000000000)));
        assert_eq!(Wad::from_decimal(dec!(-1)), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("2".parse::<Wad>().unwrap(), Wad::from_number(2));
        assert_eq!("0.5".parse::<Wad>().unwrap(), Wad::from_number(1) / Wad::from_number(2));
        assert!("abc".parse::<Wad>().is_err());
        assert!(matches!("-3".parse::<Wad>(), Err(ParseWadError::OutOfRange(_))));
    }

    #[test]
    fn test_multiplication() {
        let a = Wad::from_decimal(dec!(2.5)).unwrap();
        let b = Wad::from_number(4);
        assert_eq!(a * b, Wad::from_number(10));
    }
}
