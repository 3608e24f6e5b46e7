//! Matching engine core
//!
//! Entry points for the three market messages plus the owner query. Every
//! operation runs inside a write-buffering cache over the backing store:
//! recoverable errors discard the buffer and leave no trace, success commits
//! it. Matching is strictly turn-based and wall-clock independent; two
//! replicas fed the same messages produce identical state and events.
//!
//! Price convention, used consistently everywhere: `price = destination /
//! source`, the destination units an order demands per source unit it sells.
//! The planner's plan price is quoted in the aggressive order's own terms,
//! so the spread is crossed while `aggressive.price() <= plan.price`.

use tracing::debug;

use crate::adapters::{AccountBook, Authority, Bank, RestrictedDenoms, Supply};
use crate::book;
use crate::events::MarketEvent;
use crate::gas::{GasMeter, GAS_CANCEL_ORDER, GAS_CANCEL_REPLACE_ORDER, GAS_NEW_ORDER};
use crate::planner::{create_execution_plan, divided_by_price};
use crate::store::{CacheStore, Store};
use types::coin::Coin;
use types::errors::MarketError;
use types::ids::AccountAddr;
use types::numeric::Amount;
use types::order::Order;

/// Per-transaction context: deterministic block time and the gas meter
pub struct TxContext {
    pub block_time: i64,
    pub gas: GasMeter,
}

impl TxContext {
    pub fn new(block_time: i64, gas: GasMeter) -> Self {
        Self { block_time, gas }
    }
}

/// The market engine
///
/// Owns no balances and no clock; everything external arrives through the
/// adapter traits. All book state lives in the store passed per call.
pub struct MarketEngine<AB, BK, SP, AU> {
    pub(crate) accounts: AB,
    pub(crate) bank: BK,
    pub(crate) supply: SP,
    pub(crate) authority: AU,
    pub(crate) restricted: RestrictedDenoms,
    pub(crate) initialized: bool,
}

impl<AB, BK, SP, AU> MarketEngine<AB, BK, SP, AU>
where
    AB: AccountBook,
    BK: Bank,
    SP: Supply,
    AU: Authority,
{
    pub fn new(accounts: AB, bank: BK, supply: SP, authority: AU) -> Self {
        Self {
            accounts,
            bank,
            supply,
            authority,
            restricted: RestrictedDenoms::none(),
            initialized: false,
        }
    }

    /// Load the restricted-denom configuration on the first transaction
    /// after startup. Idempotent.
    pub(crate) fn ensure_initialized(&mut self) {
        if !self.initialized {
            self.restricted = self.authority.restricted_denoms();
            self.initialized = true;
            tracing::info!("market engine initialized from authority configuration");
        }
    }

    /// Submit an aggressive order
    ///
    /// Validates, matches against the book until the spread opens or the
    /// order fills, and rests any remainder. Returns the emitted events.
    pub fn new_order<S: Store + ?Sized>(
        &mut self,
        store: &mut S,
        ctx: &mut TxContext,
        order: Order,
    ) -> Result<Vec<MarketEvent>, MarketError> {
        let mut events = Vec::new();
        let mut tx = CacheStore::new(store);
        self.new_order_tx(&mut tx, ctx, order, &mut events)?;
        tx.commit();
        Ok(events)
    }

    /// Cancel a resting order by owner and client order id
    pub fn cancel_order<S: Store + ?Sized>(
        &mut self,
        store: &mut S,
        ctx: &mut TxContext,
        owner: &AccountAddr,
        client_order_id: &str,
    ) -> Result<Vec<MarketEvent>, MarketError> {
        let mut events = Vec::new();
        let mut tx = CacheStore::new(store);
        self.cancel_order_tx(&mut tx, ctx, owner, client_order_id, &mut events)?;
        tx.commit();
        Ok(events)
    }

    /// Atomically cancel an order and submit its replacement
    ///
    /// The replacement keeps the original's fill state and must trade the
    /// same instrument. Events of both sub-operations are aggregated.
    pub fn cancel_replace_order<S: Store + ?Sized>(
        &mut self,
        store: &mut S,
        ctx: &mut TxContext,
        mut new_order: Order,
        orig_client_order_id: &str,
    ) -> Result<Vec<MarketEvent>, MarketError> {
        let mut events = Vec::new();
        let mut tx = CacheStore::new(store);

        ctx.gas.consume(GAS_CANCEL_REPLACE_ORDER, "cancel_replace_order");
        ctx.gas.set_unbounded();
        self.ensure_initialized();

        let orig = book::get_order(&tx, &new_order.owner, orig_client_order_id)
            .ok_or_else(|| MarketError::ClientOrderIdNotFound(orig_client_order_id.to_string()))?;

        if orig.source.denom != new_order.source.denom
            || orig.destination.denom != new_order.destination.denom
        {
            return Err(MarketError::OrderInstrumentChanged);
        }

        // The original may already have traded everything the replacement
        // asks for on the source side.
        if orig.source_filled >= new_order.source.amount {
            return Err(MarketError::NoSourceRemaining);
        }

        self.cancel_order_tx(&mut tx, ctx, &new_order.owner, orig_client_order_id, &mut events)?;

        new_order.source_filled = orig.source_filled;
        new_order.source_remaining = new_order.source.amount - new_order.source_filled;
        new_order.destination_filled = orig.destination_filled;

        self.new_order_tx(&mut tx, ctx, new_order, &mut events)?;
        tx.commit();
        Ok(events)
    }

    /// Snapshot copies of an owner's resting orders
    pub fn orders_by_owner<S: Store + ?Sized>(
        &self,
        store: &S,
        owner: &AccountAddr,
    ) -> Vec<Order> {
        book::orders_by_owner(store, owner)
    }

    fn new_order_tx<S: Store + ?Sized>(
        &mut self,
        store: &mut S,
        ctx: &mut TxContext,
        mut order: Order,
        events: &mut Vec<MarketEvent>,
    ) -> Result<(), MarketError> {
        ctx.gas.consume(GAS_NEW_ORDER, "new_order");
        ctx.gas.set_unbounded();
        self.ensure_initialized();

        order.validate()?;

        if order.is_filled() {
            return Err(MarketError::InvalidPrice {
                asset_source: order.source.to_string(),
                destination: order.destination.to_string(),
            });
        }

        if !self.accounts.account_exists(&order.owner) {
            return Err(MarketError::UnknownAddress(order.owner.to_string()));
        }

        let spendable =
            self.accounts
                .spendable(&order.owner, &order.source.denom, ctx.block_time);
        if spendable < order.source.amount {
            return Err(MarketError::InsufficientBalance {
                owner: order.owner.to_string(),
                spendable: Coin::new(order.source.denom.clone(), spendable).to_string(),
                required: order.source.to_string(),
            });
        }

        let account_orders = book::orders_by_owner(store, &order.owner);

        // One balance must not back several resting orders in the same
        // instrument (phantom liquidity).
        let mut source_demand = account_orders
            .iter()
            .filter(|o| {
                o.source.denom == order.source.denom
                    && o.destination.denom == order.destination.denom
            })
            .fold(Amount::zero(), |acc, o| acc + o.source_remaining);
        source_demand = source_demand + order.source.amount;
        if spendable < source_demand {
            return Err(MarketError::InsufficientBalanceForInstrument {
                owner: order.owner.to_string(),
                asset_source: order.source.denom.to_string(),
                destination: order.destination.denom.to_string(),
            });
        }

        if account_orders
            .iter()
            .any(|o| o.client_order_id == order.client_order_id)
        {
            return Err(MarketError::NonUniqueClientOrderId(
                order.client_order_id.clone(),
            ));
        }

        // The destination asset must exist on chain before an instrument is
        // created for it.
        if self.supply.total_of(&order.destination.denom).is_zero() {
            return Err(MarketError::UnknownAsset(
                order.destination.denom.to_string(),
            ));
        }

        order.id = book::next_order_id(store);
        events.push(MarketEvent::accepted(&order));
        debug!(order = %order, "order admitted");

        self.run_matching_loop(store, ctx, &mut order, events);

        if !order.is_filled() {
            // A restricted denomination keeps non-allowed owners from
            // resting passive orders; their remainder is silently dropped.
            let mut add_to_book = true;
            if let Some(restricted) = self.restricted.find(&order.source.denom) {
                add_to_book = restricted.allows(&order.owner);
            }
            if add_to_book {
                if let Some(restricted) = self.restricted.find(&order.destination.denom) {
                    add_to_book = restricted.allows(&order.owner);
                }
            }

            if add_to_book {
                book::insert_order(store, &order);
                debug!(order = %order, "order rested");
            }
        }

        Ok(())
    }

    /// Sweep the book until the aggressive order fills, the spread opens, or
    /// only dust-sized steps remain.
    fn run_matching_loop<S: Store + ?Sized>(
        &mut self,
        store: &mut S,
        ctx: &TxContext,
        order: &mut Order,
        events: &mut Vec<MarketEvent>,
    ) {
        loop {
            // A fresh plan every round: settlement may have removed or
            // shrunk any passive order, so references are never carried
            // across a transfer.
            let plan =
                create_execution_plan(store, &order.destination.denom, &order.source.denom);
            if !plan.has_route() {
                break;
            }

            if order.price() > plan.price {
                // Spread not crossed; the aggressive order goes to the book.
                break;
            }

            // All step variables are named from the passive side's
            // perspective: its destination is what the aggressive pays.
            let mut step_destination = plan.destination_capacity();
            step_destination = step_destination.min(order.source_remaining.as_decimal());
            let destination_remaining =
                (order.destination.amount - order.destination_filled).as_decimal();
            step_destination =
                step_destination.min(plan.source_to_destination(destination_remaining));

            // Walk the route deepest hop first so each hop's input is the
            // next hop's output. Integer legs are fixed up front; a leg that
            // would settle zero units on either side ends the loop instead
            // of executing half a route.
            let mut legs: Vec<(Order, Amount, Amount)> = Vec::new();
            let mut leg_destination = step_destination;
            let mut degenerate = false;
            for passive in [plan.second_order, plan.first_order].into_iter().flatten() {
                let leg_source = divided_by_price(leg_destination, &passive);
                let destination_units = Amount::from_dec_floor(leg_destination);
                let source_units = Amount::from_dec_floor(leg_source);
                if destination_units.is_zero() || source_units.is_zero() {
                    degenerate = true;
                    break;
                }
                legs.push((passive, destination_units, source_units));
                leg_destination = leg_source;
            }
            if degenerate {
                break;
            }

            for (mut passive, destination_units, source_units) in legs {
                // Aggressive-side bookkeeping where the leg's denominations
                // line up with the aggressive order's.
                if passive.destination.denom == order.source.denom {
                    assert!(
                        order.source_remaining >= destination_units,
                        "aggressive order source remaining below zero: {order}"
                    );
                    order.source_remaining = order.source_remaining - destination_units;
                    order.source_filled = order.source_filled + destination_units;
                }
                if passive.source.denom == order.destination.denom {
                    order.destination_filled = order.destination_filled + source_units;
                    assert!(
                        order.destination_filled <= order.destination.amount,
                        "aggressive order destination filled above its limit: {order}"
                    );
                }

                assert!(
                    passive.source_remaining >= source_units,
                    "passive order source remaining below zero: {passive}"
                );
                passive.source_remaining = passive.source_remaining - source_units;
                passive.source_filled = passive.source_filled + source_units;
                passive.destination_filled = passive.destination_filled + destination_units;
                assert!(
                    passive.destination_filled <= passive.destination.amount,
                    "passive order destination filled above its limit: {passive}"
                );

                let aggressive_pays =
                    Coin::new(passive.destination.denom.clone(), destination_units);
                let passive_pays = Coin::new(passive.source.denom.clone(), source_units);
                debug!(
                    aggressive = %order.id,
                    passive = %passive.id,
                    %aggressive_pays,
                    %passive_pays,
                    "settling step"
                );
                self.settle_step(&order.owner, &passive.owner, &aggressive_pays, &passive_pays);

                // Balance watcher back-edge, debited account first. Runs on
                // the mid-transaction store and may shrink or remove any
                // resting order of either owner.
                self.reconcile_account(store, ctx, &order.owner);
                self.reconcile_account(store, ctx, &passive.owner);

                if passive.is_filled() {
                    events.push(MarketEvent::filled(&passive));
                    book::delete_order(store, &passive);
                } else {
                    events.push(MarketEvent::partially_filled(&passive));
                    book::set_order(store, &passive);
                }
            }

            if order.is_filled() {
                events.push(MarketEvent::filled(order));
                break;
            }
            events.push(MarketEvent::partially_filled(order));
        }
    }

    /// One atomic settlement between the aggressive and a passive owner
    fn settle_step(
        &mut self,
        aggressive: &AccountAddr,
        passive: &AccountAddr,
        aggressive_pays: &Coin,
        passive_pays: &Coin,
    ) {
        let inputs = [
            (aggressive.clone(), aggressive_pays.clone()),
            (passive.clone(), passive_pays.clone()),
        ];
        let outputs = [
            (aggressive.clone(), passive_pays.clone()),
            (passive.clone(), aggressive_pays.clone()),
        ];
        if let Err(err) = self.bank.input_output_coins(&inputs, &outputs) {
            // Balances were verified at admission and tracked by the
            // watcher ever since; a failing transfer means corrupted state.
            panic!("trade settlement failed: {err}");
        }
    }

    fn cancel_order_tx<S: Store + ?Sized>(
        &mut self,
        store: &mut S,
        ctx: &mut TxContext,
        owner: &AccountAddr,
        client_order_id: &str,
        events: &mut Vec<MarketEvent>,
    ) -> Result<(), MarketError> {
        ctx.gas.consume(GAS_CANCEL_ORDER, "cancel_order");
        ctx.gas.set_unbounded();
        self.ensure_initialized();

        let order = book::get_order(store, owner, client_order_id)
            .ok_or_else(|| MarketError::ClientOrderIdNotFound(client_order_id.to_string()))?;

        book::delete_order(store, &order);
        events.push(MarketEvent::cancelled(&order));
        debug!(order = %order, "order cancelled");
        Ok(())
    }
}
