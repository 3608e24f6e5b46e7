//! External collaborator interfaces
//!
//! The engine never owns balances, supply, or the restricted-denom policy;
//! it reaches them through these traits. Implementations must be
//! deterministic: given the same call sequence they return the same answers
//! on every replica.

use thiserror::Error;
use types::coin::{Coin, Denom};
use types::ids::AccountAddr;
use types::numeric::Amount;

/// Read access to accounts and spendable balances
pub trait AccountBook {
    fn account_exists(&self, addr: &AccountAddr) -> bool;

    /// Balance of `denom` the account can spend at `at_time` (vesting-aware
    /// implementations may return less than the raw balance).
    fn spendable(&self, addr: &AccountAddr, denom: &Denom, at_time: i64) -> Amount;
}

/// Atomic multi-input multi-output transfer
pub trait Bank {
    /// Either every movement lands or none do. The engine treats a failure
    /// during settlement as a programmer fault and aborts the transaction.
    fn input_output_coins(
        &mut self,
        inputs: &[(AccountAddr, Coin)],
        outputs: &[(AccountAddr, Coin)],
    ) -> Result<(), BankError>;
}

/// Total supply per denomination
pub trait Supply {
    fn total_of(&self, denom: &Denom) -> Amount;
}

/// Source of the restricted-denomination policy
pub trait Authority {
    fn restricted_denoms(&self) -> RestrictedDenoms;
}

/// Transfer failures reported by a [`Bank`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BankError {
    #[error("account {address} has insufficient funds for {needed}")]
    InsufficientFunds { address: AccountAddr, needed: Coin },

    #[error("inputs and outputs do not balance")]
    InputOutputMismatch,
}

/// A denomination gated by an allow-list
///
/// Accounts outside the list may still trade the denomination aggressively;
/// they just cannot leave passive orders resting in the book.
#[derive(Debug, Clone, PartialEq)]
pub struct RestrictedDenom {
    pub denom: Denom,
    pub allowed: Vec<AccountAddr>,
}

impl RestrictedDenom {
    pub fn allows(&self, addr: &AccountAddr) -> bool {
        self.allowed.contains(addr)
    }
}

/// The full restricted-denomination configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestrictedDenoms(Vec<RestrictedDenom>);

impl RestrictedDenoms {
    pub fn new(denoms: Vec<RestrictedDenom>) -> Self {
        Self(denoms)
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn find(&self, denom: &Denom) -> Option<&RestrictedDenom> {
        self.0.iter().find(|r| &r.denom == denom)
    }
}
