//! Token amount type.
//!
//! Amounts are fixed-point integers (u128) in the smallest denomination so
//! that fee arithmetic is exact. The smallest unit is 1 wei.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Wei per whole token (10^18).
pub const TOKEN_UNIT: u128 = 1_000_000_000_000_000_000;

/// Wei per gwei (10^9), the unit fees are usually quoted in.
pub const GWEI: u128 = 1_000_000_000;

/// An amount of the native token in wei.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wei(u128);

impl Wei {
    pub const ZERO: Self = Self(0);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub const fn from_gwei(gwei: u64) -> Self {
        Self(gwei as u128 * GWEI)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Price per gas multiplied by an amount of gas.
    pub fn checked_mul_gas(self, gas: u64) -> Option<Self> {
        self.0.checked_mul(gas as u128).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

impl Add for Wei {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Wei {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wei", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gwei_conversion() {
        assert_eq!(Wei::from_gwei(3).raw(), 3 * GWEI);
    }

    #[test]
    fn mul_gas_overflow_is_none() {
        assert_eq!(Wei::new(u128::MAX).checked_mul_gas(2), None);
        assert_eq!(Wei::new(10).checked_mul_gas(21_000), Some(Wei::new(210_000)));
    }

    #[test]
    fn checked_sub_underflow_is_none() {
        assert_eq!(Wei::new(1).checked_sub(Wei::new(2)), None);
        assert_eq!(Wei::new(5).saturating_sub(Wei::new(9)), Wei::ZERO);
    }
}
