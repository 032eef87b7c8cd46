use deps::bigdecimal::{num_bigint::BigInt, BigDecimal, ToPrimitive as _};
use serde::{Deserialize, Serialize};
use std::{fmt, str};
use thiserror::Error;

/// number of decimals of a [`Fixed64`]
pub const FIXED64_DECIMALS: u8 = 8;

const ONE: i64 = 100_000_000;

/// fixed point value with 8 decimals
///
/// every asset amount on chain is a [`Fixed64`]. The inner value counts
/// units of `10^-8` (the `sela` for the native asset).
#[derive(
    Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fixed64(i64);

impl Fixed64 {
    /// the largest value a [`Fixed64`] can be
    pub const MAX: Self = Self::new(i64::MAX);

    pub const ZERO: Self = Self::new(0);

    /// wrap the given amount of `10^-8` units
    #[inline(always)]
    pub const fn new(units: i64) -> Self {
        Self(units)
    }

    /// build a value from a whole number of coins
    #[inline]
    pub fn from_coins(coins: i64) -> Option<Self> {
        coins.checked_mul(ONE).map(Self)
    }

    #[inline(always)]
    pub const fn units(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Try to add the right hand side (`rhs`) value.
    ///
    /// If the addition will overflow, the function will returns `None`.
    #[must_use = "The function does not modify the state, the new value is returned"]
    #[inline]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Try to subtract the right hand side (`rhs`) value.
    ///
    /// If the subtraction will overflow, the function will returns `None`.
    #[must_use = "The function does not modify the state, the new value is returned"]
    #[inline]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// sum all the values, `None` on overflow
    pub fn checked_sum<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        values
            .into_iter()
            .try_fold(Self::ZERO, |acc, value| acc.checked_add(value))
    }

    /// check the value can be expressed with only `precision` decimals,
    /// i.e. it is a multiple of `10^(8 - precision)` units.
    ///
    /// ```
    /// use ela_core::Fixed64;
    ///
    /// assert!(Fixed64::new(1_000).is_multiple_of_precision(5));
    /// assert!(!Fixed64::new(1_001).is_multiple_of_precision(5));
    /// assert!(!Fixed64::new(1).is_multiple_of_precision(9));
    /// ```
    pub fn is_multiple_of_precision(self, precision: u8) -> bool {
        if precision > FIXED64_DECIMALS {
            return false;
        }
        let multiplier = 10i64.pow(u32::from(FIXED64_DECIMALS - precision));
        self.0 % multiplier == 0
    }
}

impl fmt::Display for Fixed64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = BigDecimal::new(BigInt::from(self.0), i64::from(FIXED64_DECIMALS));
        value.fmt(f)
    }
}

#[derive(Debug, Error)]
pub enum Fixed64FromStrError {
    #[error("Failed to parse big decimal: {0}")]
    InvalidDecimal(#[from] deps::bigdecimal::ParseBigDecimalError),

    #[error("Too many decimals: {current} is greater than {max}")]
    InvalidDecimalPoint { max: i64, current: i64 },

    #[error("Value does not fit in a fixed point of 64 bits")]
    Overflow,
}

impl str::FromStr for Fixed64 {
    type Err = Fixed64FromStrError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: BigDecimal = s.parse()?;
        let (_, current) = value.clone().into_bigint_and_exponent();
        let max = i64::from(FIXED64_DECIMALS);
        if current > max {
            return Err(Fixed64FromStrError::InvalidDecimalPoint { max, current });
        }
        (value * BigDecimal::from(ONE))
            .to_i64()
            .map(Self)
            .ok_or(Fixed64FromStrError::Overflow)
    }
}

impl From<i64> for Fixed64 {
    fn from(units: i64) -> Self {
        Self(units)
    }
}

impl From<Fixed64> for i64 {
    fn from(Fixed64(units): Fixed64) -> Self {
        units
    }
}
