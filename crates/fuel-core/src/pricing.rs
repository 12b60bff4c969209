use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FuelError, Result};

/// Price per litre used when none is supplied.
pub const DEFAULT_PRICE_PER_LITRE: f64 = 0.70;

/// Projected cost of `litres` at `price_per_litre`.
///
/// Carried at full precision; round only for display.
pub fn cost(litres: f64, price_per_litre: f64) -> f64 {
    litres * price_per_litre
}

// ── FuelPrice ─────────────────────────────────────────────────────────────────

/// A validated, non-negative price per litre.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FuelPrice(f64);

impl FuelPrice {
    /// Validate `price_per_litre`; negative or non-finite values are rejected.
    pub fn new(price_per_litre: f64) -> Result<Self> {
        if price_per_litre.is_finite() && price_per_litre >= 0.0 {
            Ok(Self(price_per_litre))
        } else {
            Err(FuelError::InvalidPrice(price_per_litre.to_string()))
        }
    }

    /// A zero price means "not set" at the input boundary and becomes the
    /// default; the analytics accept zero as a real price.
    pub fn nonzero_or_default(self) -> Self {
        if self.0 == 0.0 {
            Self::default()
        } else {
            self
        }
    }

    pub fn per_litre(self) -> f64 {
        self.0
    }
}

impl Default for FuelPrice {
    fn default() -> Self {
        Self(DEFAULT_PRICE_PER_LITRE)
    }
}

impl TryFrom<f64> for FuelPrice {
    type Error = FuelError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<FuelPrice> for f64 {
    fn from(price: FuelPrice) -> Self {
        price.0
    }
}

impl FromStr for FuelPrice {
    type Err = FuelError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s
            .trim()
            .parse::<f64>()
            .map_err(|_| FuelError::InvalidPrice(s.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for FuelPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
