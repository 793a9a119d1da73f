//! Monetary amount type.
//!
//! Amounts are represented as fixed-point integers (u64) to avoid floating-point
//! errors. The smallest unit is one hundredth of the display currency (one cent).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A monetary amount — task rewards, balances, commissions, withdrawals.
///
/// Internally stored as raw hundredths (cents) for precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u64);

/// Raw units per whole display unit.
const SCALE: u64 = 100;

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Convert from whole display units (e.g. `1.25` → 125 raw).
    ///
    /// Returns `None` for negative, non-finite, or out-of-range values.
    /// Rounds to the nearest cent.
    pub fn from_major(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let raw = (value * SCALE as f64).round();
        if raw > u64::MAX as f64 {
            return None;
        }
        Some(Self(raw as u64))
    }

    /// Convert to whole display units for JSON responses.
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Addition clamping at the representable maximum.
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// A proportional share expressed in basis points (500 = 5%), rounded down.
    pub fn commission(self, rate_bps: u32) -> Self {
        Self((self.0 as u128 * rate_bps as u128 / 10_000) as u64)
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / SCALE, self.0 % SCALE)
    }
}
