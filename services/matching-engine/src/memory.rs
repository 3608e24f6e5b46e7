//! In-memory reference adapters
//!
//! A small ledger implementing [`AccountBook`], [`Bank`] and [`Supply`] over
//! shared state, plus a fixed [`Authority`]. Used by the test suite and by
//! simulation harnesses; all containers are ordered so behavior is
//! deterministic.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::adapters::{
    AccountBook, Authority, Bank, BankError, RestrictedDenoms, Supply,
};
use types::coin::{Coin, Denom};
use types::ids::AccountAddr;
use types::numeric::Amount;

/// Ledger of accounts and balances
#[derive(Debug, Default, Clone)]
pub struct MemLedger {
    accounts: BTreeSet<AccountAddr>,
    balances: BTreeMap<(AccountAddr, Denom), Amount>,
}

/// Shared handle letting one ledger serve as account book, bank and supply
pub type SharedLedger = Rc<RefCell<MemLedger>>;

impl MemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedLedger {
        Rc::new(RefCell::new(self))
    }

    /// Register an account and credit its initial funds
    pub fn open_account(&mut self, addr: AccountAddr, funds: Vec<Coin>) {
        self.accounts.insert(addr.clone());
        for coin in funds {
            self.credit(&addr, &coin);
        }
    }

    pub fn balance_of(&self, addr: &AccountAddr, denom: &Denom) -> Amount {
        self.balances
            .get(&(addr.clone(), denom.clone()))
            .copied()
            .unwrap_or_else(Amount::zero)
    }

    pub fn credit(&mut self, addr: &AccountAddr, coin: &Coin) {
        let balance = self.balance_of(addr, &coin.denom);
        self.balances
            .insert((addr.clone(), coin.denom.clone()), balance + coin.amount);
    }

    /// Remove funds, e.g. an external withdrawal
    ///
    /// # Panics
    /// Panics if the balance does not cover the coin
    pub fn debit(&mut self, addr: &AccountAddr, coin: &Coin) {
        let balance = self.balance_of(addr, &coin.denom);
        assert!(
            balance >= coin.amount,
            "debit of {} exceeds balance {} of {}",
            coin,
            balance,
            addr
        );
        self.balances
            .insert((addr.clone(), coin.denom.clone()), balance - coin.amount);
    }

    fn supply_of(&self, denom: &Denom) -> Amount {
        self.balances
            .iter()
            .filter(|((_, d), _)| d == denom)
            .fold(Amount::zero(), |acc, (_, amount)| acc + *amount)
    }
}

impl AccountBook for SharedLedger {
    fn account_exists(&self, addr: &AccountAddr) -> bool {
        self.borrow().accounts.contains(addr)
    }

    fn spendable(&self, addr: &AccountAddr, denom: &Denom, _at_time: i64) -> Amount {
        self.borrow().balance_of(addr, denom)
    }
}

impl Bank for SharedLedger {
    fn input_output_coins(
        &mut self,
        inputs: &[(AccountAddr, Coin)],
        outputs: &[(AccountAddr, Coin)],
    ) -> Result<(), BankError> {
        // Inputs and outputs must move the same value per denomination
        let mut net: BTreeMap<Denom, (Amount, Amount)> = BTreeMap::new();
        for (_, coin) in inputs {
            let entry = net.entry(coin.denom.clone()).or_insert((Amount::zero(), Amount::zero()));
            entry.0 = entry.0 + coin.amount;
        }
        for (_, coin) in outputs {
            let entry = net.entry(coin.denom.clone()).or_insert((Amount::zero(), Amount::zero()));
            entry.1 = entry.1 + coin.amount;
        }
        if net.values().any(|(taken, given)| taken != given) {
            return Err(BankError::InputOutputMismatch);
        }

        // Apply on a scratch copy so a failed transfer changes nothing
        let mut ledger = self.borrow_mut();
        let mut balances = ledger.balances.clone();
        for (addr, coin) in inputs {
            let key = (addr.clone(), coin.denom.clone());
            let balance = balances.get(&key).copied().unwrap_or_else(Amount::zero);
            if balance < coin.amount {
                return Err(BankError::InsufficientFunds {
                    address: addr.clone(),
                    needed: coin.clone(),
                });
            }
            balances.insert(key, balance - coin.amount);
        }
        for (addr, coin) in outputs {
            let key = (addr.clone(), coin.denom.clone());
            let balance = balances.get(&key).copied().unwrap_or_else(Amount::zero);
            balances.insert(key, balance + coin.amount);
        }

        ledger.balances = balances;
        Ok(())
    }
}

impl Supply for SharedLedger {
    fn total_of(&self, denom: &Denom) -> Amount {
        self.borrow().supply_of(denom)
    }
}

/// Authority with a fixed restricted-denom configuration
#[derive(Debug, Clone, Default)]
pub struct StaticAuthority {
    restricted: RestrictedDenoms,
}

impl StaticAuthority {
    pub fn new(restricted: RestrictedDenoms) -> Self {
        Self { restricted }
    }

    /// Authority restricting nothing
    pub fn open() -> Self {
        Self::default()
    }
}

impl Authority for StaticAuthority {
    fn restricted_denoms(&self) -> RestrictedDenoms {
        self.restricted.clone()
    }
}
