//! The order value object
//!
//! An order expresses intent to sell up to `source.amount` units of
//! `source.denom` for at least `destination.amount` units of
//! `destination.denom`. The implied limit price is `destination / source`
//! (destination units per source unit); a lower price is a better deal for
//! the counterparty.

use crate::coin::Coin;
use crate::errors::MarketError;
use crate::ids::{AccountAddr, OrderId};
use crate::numeric::{Amount, Price};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A limit order, either aggressive (being matched) or resting (in the book)
///
/// `source_remaining` is the amount still offered for sale. It usually equals
/// `source.amount - source_filled` but is capped downward when the owner's
/// spendable balance no longer covers the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: AccountAddr,
    pub client_order_id: String,
    pub source: Coin,
    pub destination: Coin,
    pub source_remaining: Amount,
    pub source_filled: Amount,
    pub destination_filled: Amount,
}

impl Order {
    /// Create a new unfilled order
    ///
    /// The id is a placeholder; the engine assigns the real id at admission.
    pub fn new(
        owner: AccountAddr,
        client_order_id: impl Into<String>,
        source: Coin,
        destination: Coin,
    ) -> Self {
        Self {
            id: OrderId::new(0),
            owner,
            client_order_id: client_order_id.into(),
            source_remaining: source.amount,
            source,
            destination,
            source_filled: Amount::zero(),
            destination_filled: Amount::zero(),
        }
    }

    /// Check structural validity of a submitted order
    pub fn validate(&self) -> Result<(), MarketError> {
        if !self.source.is_positive() {
            return Err(MarketError::InvalidOrder(format!(
                "source amount must be positive: {}",
                self.source
            )));
        }
        if !self.destination.is_positive() {
            return Err(MarketError::InvalidOrder(format!(
                "destination amount must be positive: {}",
                self.destination
            )));
        }
        if self.source.denom == self.destination.denom {
            return Err(MarketError::InvalidOrder(format!(
                "source and destination denominations must differ: {}",
                self.source.denom
            )));
        }
        if self.client_order_id.is_empty() {
            return Err(MarketError::InvalidOrder(
                "client order id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Limit price: destination units demanded per source unit sold
    ///
    /// # Panics
    /// Panics if the source amount is zero; callers validate first.
    pub fn price(&self) -> Price {
        Price::new(self.destination.amount.as_decimal() / self.source.amount.as_decimal())
    }

    /// Reciprocal limit price: source units sold per destination unit
    ///
    /// # Panics
    /// Panics if the destination amount is zero; callers validate first.
    pub fn inverted_price(&self) -> Price {
        Price::new(self.source.amount.as_decimal() / self.destination.amount.as_decimal())
    }

    /// An order is filled once it has nothing left to sell or has acquired
    /// its full destination amount.
    pub fn is_filled(&self) -> bool {
        self.source_remaining.is_zero() || self.destination_filled >= self.destination.amount
    }

    /// Check the order-level data invariants
    pub fn check_invariants(&self) -> bool {
        self.source_filled <= self.source.amount
            && self.destination_filled <= self.destination.amount
            && self.source_remaining <= self.source.amount - self.source_filled
            && self.source.denom != self.destination.denom
            && self.source.is_positive()
            && self.destination.is_positive()
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {} @ {} ({} remaining)",
            self.id,
            self.source,
            self.destination,
            self.price(),
            self.source_remaining
        )
    }
}
