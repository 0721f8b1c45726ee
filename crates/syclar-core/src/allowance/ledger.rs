//! Allowance and goodwill counters.
//!
//! Allowance is held as an exact fixed-point count of 1/10000 units so that
//! repeated earn/spend at the configured rates never drifts below a cost it
//! should still cover.

use std::fmt;
use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Non-negative spendable currency earned from focused work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Allowance(u64);

impl Allowance {
    /// Units per 1.0 of allowance.
    pub const SCALE: u64 = 10_000;
    pub const ZERO: Allowance = Allowance(0);

    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    pub const fn units(self) -> u64 {
        self.0
    }

    /// Convert from a decimal amount; negative or non-finite input is zero.
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Self::ZERO;
        }
        Self((value * Self::SCALE as f64).round() as u64)
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Subtract, clamping at zero.
    pub fn saturating_sub(self, other: Allowance) -> Allowance {
        Allowance(self.0.saturating_sub(other.0))
    }

    pub fn checked_sub(self, other: Allowance) -> Option<Allowance> {
        self.0.checked_sub(other.0).map(Allowance)
    }
}

impl Add for Allowance {
    type Output = Allowance;

    fn add(self, rhs: Allowance) -> Allowance {
        Allowance(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Allowance {
    fn add_assign(&mut self, rhs: Allowance) {
        *self = *self + rhs;
    }
}

impl Mul<u64> for Allowance {
    type Output = Allowance;

    fn mul(self, rhs: u64) -> Allowance {
        Allowance(self.0.saturating_mul(rhs))
    }
}

impl fmt::Display for Allowance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_f64())
    }
}

impl Serialize for Allowance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Allowance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Ok(Allowance::from_f64(value))
    }
}

/// The two accrual counters that sit next to the rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    #[serde(default)]
    pub allowance: Allowance,
    /// Accrual only; never spent.
    #[serde(default)]
    pub goodwill: u64,
}

impl Wallet {
    pub fn earn(&mut self, allowance: Allowance, goodwill: u64) {
        self.allowance += allowance;
        self.goodwill = self.goodwill.saturating_add(goodwill);
    }

    /// Spend `cost` if the balance covers it. Returns whether it was spent.
    pub fn spend(&mut self, cost: Allowance) -> bool {
        match self.allowance.checked_sub(cost) {
            Some(rest) => {
                self.allowance = rest;
                true
            }
            None => false,
        }
    }

    pub fn covers(&self, cost: Allowance) -> bool {
        self.allowance >= cost
    }
}
