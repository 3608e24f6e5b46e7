//! Error taxonomy for the market engine
//!
//! Every variant is a recoverable user error: the enclosing transaction
//! aborts with state unchanged. Invariant violations inside the matching
//! loop are not represented here; they are programmer faults and panic.

use thiserror::Error;

/// Errors returned by market operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("order price is invalid: {asset_source} -> {destination}")]
    InvalidPrice { asset_source: String, destination: String },

    #[error("account {0} does not exist")]
    UnknownAddress(String),

    #[error("account {owner} has insufficient balance to execute trade: {spendable} < {required}")]
    InsufficientBalance {
        owner: String,
        spendable: String,
        required: String,
    },

    #[error(
        "account {owner} has insufficient balance to back all orders in instrument {asset_source}/{destination}"
    )]
    InsufficientBalanceForInstrument {
        owner: String,
        asset_source: String,
        destination: String,
    },

    #[error("client order id is not unique among active orders: {0}")]
    NonUniqueClientOrderId(String),

    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    #[error("client order id not found: {0}")]
    ClientOrderIdNotFound(String),

    #[error("cannot change the instrument of an existing order")]
    OrderInstrumentChanged,

    #[error("original order has no source amount remaining to replace")]
    NoSourceRemaining,
}
