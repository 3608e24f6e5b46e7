//! Events emitted by the engine
//!
//! Every event carries the order's identity and its fill amounts at emission
//! time. The stream is part of the deterministic output: replicas replaying
//! the same messages must produce byte-identical event sequences.

use serde::{Deserialize, Serialize};
use types::coin::Denom;
use types::ids::{AccountAddr, OrderId};
use types::numeric::Amount;
use types::order::Order;

/// Snapshot of an order attached to every event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderInfo {
    pub order_id: OrderId,
    pub owner: AccountAddr,
    pub client_order_id: String,
    pub source_denom: Denom,
    pub destination_denom: Denom,
    pub source_filled: Amount,
    pub destination_filled: Amount,
}

impl From<&Order> for OrderInfo {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            owner: order.owner.clone(),
            client_order_id: order.client_order_id.clone(),
            source_denom: order.source.denom.clone(),
            destination_denom: order.destination.denom.clone(),
            source_filled: order.source_filled,
            destination_filled: order.destination_filled,
        }
    }
}

/// Market event stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "order", rename_all = "snake_case")]
pub enum MarketEvent {
    /// Order admitted and assigned an id
    Accepted(OrderInfo),
    /// Order traded but retains open quantity
    PartiallyFilled(OrderInfo),
    /// Order completely filled and removed
    Filled(OrderInfo),
    /// Order cancelled by its owner
    Cancelled(OrderInfo),
    /// Order removed because its backing balance was spent elsewhere
    Expired(OrderInfo),
}

impl MarketEvent {
    pub fn accepted(order: &Order) -> Self {
        Self::Accepted(order.into())
    }

    pub fn partially_filled(order: &Order) -> Self {
        Self::PartiallyFilled(order.into())
    }

    pub fn filled(order: &Order) -> Self {
        Self::Filled(order.into())
    }

    pub fn cancelled(order: &Order) -> Self {
        Self::Cancelled(order.into())
    }

    pub fn expired(order: &Order) -> Self {
        Self::Expired(order.into())
    }

    pub fn order_info(&self) -> &OrderInfo {
        match self {
            Self::Accepted(info)
            | Self::PartiallyFilled(info)
            | Self::Filled(info)
            | Self::Cancelled(info)
            | Self::Expired(info) => info,
        }
    }
}
