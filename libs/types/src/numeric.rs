//! Fixed-point decimal types for prices and amounts
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Prices are quantized to [`PRICE_DECIMAL_PLACES`] fractional digits,
//! half-away-from-zero, so that comparisons, index key encoding and the
//! crossing check all agree on a single canonical representation. Amounts are
//! integer-valued; any narrowing conversion from a decimal intermediate is
//! explicit and rounds down.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Fractional digits carried by every canonical price.
pub const PRICE_DECIMAL_PLACES: u32 = 18;

/// Smallest representable price increment (10⁻¹⁸).
pub fn price_increment() -> Decimal {
    Decimal::new(1, PRICE_DECIMAL_PLACES)
}

/// Price with fixed-point decimal representation
///
/// Convention used throughout the engine: `price = destination / source`,
/// units of destination per unit of source. A lower price means the seller
/// demands less in return. Must always be positive. Serialized as string to
/// prevent JSON number precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price, quantizing to the canonical scale
    ///
    /// # Panics
    /// Panics if the price is negative or zero
    pub fn new(value: Decimal) -> Self {
        Self::try_new(value).expect("Price must be positive")
    }

    /// Try to create a Price, returning None if invalid
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value.round_dp_with_strategy(
                PRICE_DECIMAL_PLACES,
                RoundingStrategy::MidpointAwayFromZero,
            )))
        } else {
            None
        }
    }

    /// Create from string
    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        let decimal = Decimal::from_str(s)?;
        Ok(Self::new(decimal))
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

// Custom serialization to preserve precision
impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Self::try_new(decimal).ok_or_else(|| serde::de::Error::custom("Price must be positive"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-negative integer amount of some denomination
///
/// Backed by a decimal so it composes with price arithmetic without lossy
/// conversions; constructors enforce integrality. Serialized as string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Create a new Amount from a Decimal
    ///
    /// # Panics
    /// Panics if the value is negative or not an integer
    pub fn new(value: Decimal) -> Self {
        Self::try_new(value).expect("Amount must be a non-negative integer")
    }

    /// Try to create an Amount, returning None if invalid
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO && value == value.trunc() {
            // Normalize so 5 and 5.00 share one representation
            Some(Self(value.normalize()))
        } else {
            None
        }
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Round a decimal intermediate down to a whole amount
    ///
    /// # Panics
    /// Panics if the value is negative
    pub fn from_dec_floor(value: Decimal) -> Self {
        assert!(value >= Decimal::ZERO, "Amount must be non-negative");
        Self(value.floor().normalize())
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(self.0 >= rhs.0, "Amount subtraction would result in negative");
        Self(self.0 - rhs.0)
    }
}

// Custom serialization to preserve precision
impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Self::try_new(decimal)
            .ok_or_else(|| serde::de::Error::custom("Amount must be a non-negative integer"))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_quantization() {
        // 1/3 carries more digits than the canonical scale
        let p = Price::new(Decimal::ONE / Decimal::from(3));
        assert_eq!(p.to_string(), "0.333333333333333333");
    }

    #[test]
    fn test_price_rounds_half_away_from_zero() {
        let p = Price::new(Decimal::from_str("0.1234567890123456785").unwrap());
        assert_eq!(p.to_string(), "0.123456789012345679");
    }

    #[test]
    #[should_panic(expected = "Price must be positive")]
    fn test_price_zero_panics() {
        Price::new(Decimal::ZERO);
    }

    #[test]
    fn test_price_serialization() {
        let p = Price::from_str("1.10").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"1.10\"");
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn test_amount_integrality() {
        assert!(Amount::try_new(Decimal::from_str("10.5").unwrap()).is_none());
        assert!(Amount::try_new(Decimal::from(-1)).is_none());
        assert_eq!(Amount::new(Decimal::from(10)), Amount::from_u64(10));
    }

    #[test]
    fn test_amount_normalized_equality() {
        let a = Amount::new(Decimal::from_str("5.00").unwrap());
        let b = Amount::from_u64(5);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "5");
    }

    #[test]
    fn test_amount_floor_conversion() {
        let a = Amount::from_dec_floor(Decimal::from_str("109.999999").unwrap());
        assert_eq!(a, Amount::from_u64(109));
    }

    #[test]
    fn test_amount_arithmetic() {
        let a = Amount::from_u64(100);
        let b = Amount::from_u64(40);
        assert_eq!(a - b, Amount::from_u64(60));
        assert_eq!(a + b, Amount::from_u64(140));
        assert_eq!(a.min(b), b);
    }

    #[test]
    #[should_panic(expected = "Amount subtraction would result in negative")]
    fn test_amount_underflow_panics() {
        let _ = Amount::from_u64(1) - Amount::from_u64(2);
    }

    #[test]
    fn test_price_increment_scale() {
        assert_eq!(price_increment().to_string(), "0.000000000000000001");
    }
}
