//! Denominations and coin values

use crate::numeric::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Asset denomination
///
/// Lowercase alphanumeric, first character alphabetic. The restricted
/// character set keeps denominations safe to embed in index keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Denom(String);

impl Denom {
    /// Create a new denomination
    ///
    /// # Panics
    /// Panics if the denomination is malformed
    pub fn new(denom: impl Into<String>) -> Self {
        Self::try_new(denom).expect("invalid denomination")
    }

    /// Try to create a denomination, returning None if invalid
    pub fn try_new(denom: impl Into<String>) -> Option<Self> {
        let s = denom.into();
        let mut chars = s.chars();
        let valid = match chars.next() {
            Some(first) => {
                first.is_ascii_lowercase()
                    && s.len() >= 2
                    && s.len() <= 16
                    && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            }
            None => false,
        };
        if valid {
            Some(Self(s))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Denom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A quantity of a single denomination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: Denom,
    pub amount: Amount,
}

impl Coin {
    pub fn new(denom: Denom, amount: Amount) -> Self {
        Self { denom, amount }
    }

    pub fn is_positive(&self) -> bool {
        !self.amount.is_zero()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}
