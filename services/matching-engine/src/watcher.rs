//! Balance watcher
//!
//! Resting orders promise only what their owner can still pay. Whenever an
//! account's balance changes, every resting order of that account gets its
//! `source_remaining` re-capped to the spendable balance; orders left with
//! nothing to sell are removed. The engine invokes the same reconciliation
//! synchronously after each settlement transfer, which is how external
//! withdrawals and mid-match spending transparently prune the book.

use tracing::debug;

use crate::adapters::{AccountBook, Authority, Bank, Supply};
use crate::book;
use crate::engine::{MarketEngine, TxContext};
use crate::events::MarketEvent;
use crate::store::{CacheStore, Store};
use types::ids::AccountAddr;
use types::order::Order;

impl<AB, BK, SP, AU> MarketEngine<AB, BK, SP, AU>
where
    AB: AccountBook,
    BK: Bank,
    SP: Supply,
    AU: Authority,
{
    /// Notification that `owner`'s balances changed outside the engine
    ///
    /// Removed orders are reported as `Expired`; mid-settlement
    /// reconciliation inside the matching loop stays silent because the loop
    /// emits the affected order's own fill events.
    pub fn account_changed<S: Store + ?Sized>(
        &mut self,
        store: &mut S,
        ctx: &TxContext,
        owner: &AccountAddr,
    ) -> Vec<MarketEvent> {
        self.ensure_initialized();
        let mut tx = CacheStore::new(store);
        let removed = self.reconcile_account(&mut tx, ctx, owner);
        tx.commit();
        removed.iter().map(MarketEvent::expired).collect()
    }

    /// Re-cap every resting order of `owner` against the spendable balance,
    /// removing those that can no longer deliver anything. Returns the
    /// removed orders.
    pub(crate) fn reconcile_account<S: Store + ?Sized>(
        &self,
        store: &mut S,
        ctx: &TxContext,
        owner: &AccountAddr,
    ) -> Vec<Order> {
        let mut removed = Vec::new();

        for mut order in book::orders_by_owner(store, owner) {
            let balance =
                self.accounts
                    .spendable(owner, &order.source.denom, ctx.block_time);

            let previous = order.source_remaining;
            order.source_remaining = (order.source.amount - order.source_filled).min(balance);

            if order.source_remaining.is_zero() {
                book::delete_order(store, &order);
                debug!(order = %order, "order no longer backed by balance");
                removed.push(order);
            } else if order.source_remaining != previous {
                book::set_order(store, &order);
            }
        }

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gas::GasMeter;
    use crate::memory::{MemLedger, SharedLedger, StaticAuthority};
    use crate::store::MemStore;
    use types::coin::{Coin, Denom};
    use types::numeric::Amount;
    use types::order::Order;

    type TestEngine = MarketEngine<SharedLedger, SharedLedger, SharedLedger, StaticAuthority>;

    fn coin(amount: u64, denom: &str) -> Coin {
        Coin::new(Denom::new(denom), Amount::from_u64(amount))
    }

    fn setup() -> (TestEngine, MemStore, SharedLedger) {
        let mut ledger = MemLedger::new();
        ledger.open_account(AccountAddr::new("alice"), vec![coin(100, "eur")]);
        ledger.open_account(AccountAddr::new("bob"), vec![coin(200, "usd")]);
        ledger.open_account(AccountAddr::new("carol"), vec![coin(100, "chf")]);
        let shared = ledger.shared();
        let engine = MarketEngine::new(
            shared.clone(),
            shared.clone(),
            shared.clone(),
            StaticAuthority::open(),
        );
        (engine, MemStore::new(), shared)
    }

    fn ctx() -> TxContext {
        TxContext::new(0, GasMeter::limited(1_000_000))
    }

    fn alice() -> AccountAddr {
        AccountAddr::new("alice")
    }

    #[test]
    fn test_partial_withdrawal_shrinks_order() {
        let (mut engine, mut store, ledger) = setup();
        engine
            .new_order(
                &mut store,
                &mut ctx(),
                Order::new(alice(), "a-1", coin(100, "eur"), coin(110, "usd")),
            )
            .unwrap();

        ledger.borrow_mut().debit(&alice(), &coin(60, "eur"));
        let events = engine.account_changed(&mut store, &ctx(), &alice());

        assert!(events.is_empty());
        let orders = engine.orders_by_owner(&store, &alice());
        assert_eq!(orders[0].source_remaining, Amount::from_u64(40));
    }

    #[test]
    fn test_full_withdrawal_removes_order() {
        let (mut engine, mut store, ledger) = setup();
        engine
            .new_order(
                &mut store,
                &mut ctx(),
                Order::new(alice(), "a-1", coin(100, "eur"), coin(110, "usd")),
            )
            .unwrap();

        ledger.borrow_mut().debit(&alice(), &coin(100, "eur"));
        let events = engine.account_changed(&mut store, &ctx(), &alice());

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], MarketEvent::Expired(_)));
        assert!(engine.orders_by_owner(&store, &alice()).is_empty());
        assert!(store.scan_prefix(b"I/").is_empty(), "instrument pruned");
    }

    #[test]
    fn test_sweep_handles_all_orders_in_one_pass() {
        let (mut engine, mut store, ledger) = setup();
        engine
            .new_order(
                &mut store,
                &mut ctx(),
                Order::new(alice(), "a-1", coin(60, "eur"), coin(66, "usd")),
            )
            .unwrap();
        engine
            .new_order(
                &mut store,
                &mut ctx(),
                Order::new(alice(), "a-2", coin(40, "eur"), coin(50, "chf")),
            )
            .unwrap();

        ledger.borrow_mut().debit(&alice(), &coin(100, "eur"));
        let events = engine.account_changed(&mut store, &ctx(), &alice());

        assert_eq!(events.len(), 2);
        assert!(engine.orders_by_owner(&store, &alice()).is_empty());
    }

    #[test]
    fn test_deposit_restores_nothing_by_itself() {
        // A balance increase never grows source_remaining past what the
        // order's own amounts allow.
        let (mut engine, mut store, ledger) = setup();
        engine
            .new_order(
                &mut store,
                &mut ctx(),
                Order::new(alice(), "a-1", coin(100, "eur"), coin(110, "usd")),
            )
            .unwrap();

        ledger.borrow_mut().credit(&alice(), &coin(500, "eur"));
        let events = engine.account_changed(&mut store, &ctx(), &alice());

        assert!(events.is_empty());
        let orders = engine.orders_by_owner(&store, &alice());
        assert_eq!(orders[0].source_remaining, Amount::from_u64(100));
    }
}
