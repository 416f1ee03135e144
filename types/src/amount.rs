//! Token amount type for fee accounting.
//!
//! Amounts are fixed-point integers (u128) to avoid floating-point errors.
//! The smallest unit is 1 raw; higher denominations are a display concern.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A fee-token amount, stored as raw units (u128) for precision.
///
/// Used both for fee quotes and for the caller-supplied budget that decides
/// whether a request escalates to the oracle path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
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

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl Add for TokenAmount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for TokenAmount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_sub_underflow_is_none() {
        let small = TokenAmount::new(10);
        let big = TokenAmount::new(100);
        assert_eq!(small.checked_sub(big), None);
        assert_eq!(big.checked_sub(small), Some(TokenAmount::new(90)));
    }

    #[test]
    fn saturating_sub_clamps_to_zero() {
        let small = TokenAmount::new(10);
        let big = TokenAmount::new(100);
        assert_eq!(small.saturating_sub(big), TokenAmount::ZERO);
    }

    #[test]
    fn ordering_follows_raw_value() {
        assert!(TokenAmount::new(1) < TokenAmount::new(2));
        assert!(TokenAmount::ZERO.is_zero());
    }
}
