//! Identifier types for market entities
//!
//! Order ids are engine-assigned 64-bit sequence numbers. They double as the
//! time-priority tiebreak: a lower id rested earlier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an order
///
/// Assigned by the engine at admission from a persisted monotonic counter.
/// Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Big-endian encoding, used in index keys so that byte order equals
    /// numeric order.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account address
///
/// Opaque to the engine; used for balance lookups, settlement and
/// cancellation authorization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountAddr(String);

impl AccountAddr {
    /// Create a new address
    ///
    /// # Panics
    /// Panics if the address is empty or contains a key separator
    pub fn new(addr: impl Into<String>) -> Self {
        Self::try_new(addr).expect("invalid account address")
    }

    /// Try to create an address, returning None if invalid
    pub fn try_new(addr: impl Into<String>) -> Option<Self> {
        let s = addr.into();
        if s.is_empty() || s.contains('/') {
            None
        } else {
            Some(Self(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountAddr {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
