//! Execution planner
//!
//! Finds the best route selling `source` into `destination`: either the
//! head order of the direct instrument, or a two-hop synthetic chain
//! `(source, X)` then `(X, destination)`. Longer routes are excluded.
//!
//! Plan prices follow the aggressive order's own convention (destination
//! units obtained per source unit given), so the crossing check compares
//! them directly against `Order::price()`. The candidate delivering the
//! most destination per source wins; a synthetic route must beat the direct
//! route by more than one price increment to be chosen over it. Stored plan
//! prices carry no epsilon.

use rust_decimal::Decimal;

use crate::book;
use crate::store::Store;
use types::coin::Denom;
use types::numeric::{price_increment, Price};
use types::order::Order;

/// The chosen route: one or two passive orders and the resulting price
///
/// Holds snapshot copies of the passive orders, never references into the
/// book. `price` is a sentinel when `first_order` is empty.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub price: Price,
    pub first_order: Option<Order>,
    pub second_order: Option<Order>,
}

/// `value * order.price()`, computed multiply-first on the order's original
/// amounts so whole-number flows stay exact.
pub(crate) fn times_price(value: Decimal, order: &Order) -> Decimal {
    value * order.destination.amount.as_decimal() / order.source.amount.as_decimal()
}

/// `value / order.price()`, computed multiply-first on the order's original
/// amounts so whole-number flows stay exact.
pub(crate) fn divided_by_price(value: Decimal, order: &Order) -> Decimal {
    value * order.source.amount.as_decimal() / order.destination.amount.as_decimal()
}

impl ExecutionPlan {
    fn empty() -> Self {
        Self {
            price: Price::new(Decimal::MAX),
            first_order: None,
            second_order: None,
        }
    }

    pub fn has_route(&self) -> bool {
        self.first_order.is_some()
    }

    /// How much of the plan's destination denomination the passive side can
    /// absorb, limited by each hop's remaining source amount.
    pub fn destination_capacity(&self) -> Decimal {
        let Some(first) = &self.first_order else {
            return Decimal::ZERO;
        };
        let mut capacity = times_price(first.source_remaining.as_decimal(), first);
        if let Some(second) = &self.second_order {
            capacity = capacity.min(second.source_remaining.as_decimal());
            capacity = times_price(capacity, second);
        }
        capacity
    }

    /// Convert a quantity of the plan's source denomination into destination
    /// units by walking it through each hop at that hop's price.
    pub fn source_to_destination(&self, quantity: Decimal) -> Decimal {
        let Some(first) = &self.first_order else {
            return Decimal::ZERO;
        };
        let mut value = times_price(quantity, first);
        if let Some(second) = &self.second_order {
            value = times_price(value, second);
        }
        value
    }
}

// The two displacement rules are exact complements, so the winner does not
// depend on instrument discovery order: a direct candidate prevails unless a
// synthetic delivers more than one price increment extra per source unit.
fn direct_displaces(candidate: Price, incumbent: &ExecutionPlan) -> bool {
    if !incumbent.has_route() {
        return true;
    }
    candidate.as_decimal() + price_increment() >= incumbent.price.as_decimal()
}

fn synthetic_displaces(candidate: Price, incumbent: &ExecutionPlan) -> bool {
    if !incumbent.has_route() {
        return true;
    }
    candidate.as_decimal() > incumbent.price.as_decimal() + price_increment()
}

/// Search every instrument selling `source` for the cheapest direct or
/// two-hop route into `destination`.
pub fn create_execution_plan<S: Store + ?Sized>(
    store: &S,
    source: &Denom,
    destination: &Denom,
) -> ExecutionPlan {
    let mut best = ExecutionPlan::empty();

    for (first_src, first_dst) in book::instruments_by_source(store, source) {
        let Some(first) = book::best_order(store, &first_src, &first_dst) else {
            continue;
        };

        if first_dst == *destination {
            let plan_price = first.inverted_price();
            if direct_displaces(plan_price, &best) {
                best = ExecutionPlan {
                    price: plan_price,
                    first_order: Some(first.clone()),
                    second_order: None,
                };
            }
        }

        // Chain through every instrument selling the first hop's
        // destination into the target denomination.
        for (_, second_dst) in book::instruments_by_source(store, &first_dst) {
            if second_dst != *destination {
                continue;
            }
            let Some(second) = book::best_order(store, &first_dst, &second_dst) else {
                continue;
            };

            let plan_price = Price::new(
                first.inverted_price().as_decimal() * second.inverted_price().as_decimal(),
            );
            if synthetic_displaces(plan_price, &best) {
                best = ExecutionPlan {
                    price: plan_price,
                    first_order: Some(first.clone()),
                    second_order: Some(second),
                };
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::insert_order;
    use crate::store::MemStore;
    use types::coin::Coin;
    use types::ids::{AccountAddr, OrderId};
    use types::numeric::Amount;

    fn coin(amount: u64, denom: &str) -> Coin {
        Coin::new(Denom::new(denom), Amount::from_u64(amount))
    }

    fn rest(store: &mut MemStore, id: u64, src: Coin, dst: Coin) {
        let mut order = Order::new(AccountAddr::new("maker"), format!("m-{id}"), src, dst);
        order.id = OrderId::new(id);
        insert_order(store, &order);
    }

    #[test]
    fn test_no_route() {
        let store = MemStore::new();
        let plan = create_execution_plan(&store, &Denom::new("eur"), &Denom::new("usd"));
        assert!(!plan.has_route());
        assert_eq!(plan.destination_capacity(), Decimal::ZERO);
    }

    #[test]
    fn test_direct_route() {
        let mut store = MemStore::new();
        rest(&mut store, 1, coin(100, "eur"), coin(110, "usd"));

        let plan = create_execution_plan(&store, &Denom::new("eur"), &Denom::new("usd"));
        assert!(plan.has_route());
        assert!(plan.second_order.is_none());
        assert_eq!(plan.price.to_string(), "0.909090909090909091");
        assert_eq!(plan.destination_capacity(), Decimal::from(110));
    }

    #[test]
    fn test_synthetic_route() {
        let mut store = MemStore::new();
        rest(&mut store, 1, coin(100, "eur"), coin(120, "usd"));
        rest(&mut store, 2, coin(120, "usd"), coin(150, "chf"));

        let plan = create_execution_plan(&store, &Denom::new("eur"), &Denom::new("chf"));
        assert!(plan.has_route());
        assert_eq!(plan.first_order.as_ref().unwrap().id, OrderId::new(1));
        assert_eq!(plan.second_order.as_ref().unwrap().id, OrderId::new(2));
        assert_eq!(plan.destination_capacity(), Decimal::from(150));
        assert_eq!(plan.source_to_destination(Decimal::from(100)), Decimal::from(150));
    }

    #[test]
    fn test_cheaper_synthetic_wins() {
        let mut store = MemStore::new();
        // Direct: 1.2 usd per eur demanded
        rest(&mut store, 1, coin(100, "eur"), coin(120, "usd"));
        // Synthetic via chf demands only 1.1 usd per eur
        rest(&mut store, 2, coin(100, "eur"), coin(100, "chf"));
        rest(&mut store, 3, coin(100, "chf"), coin(110, "usd"));

        let plan = create_execution_plan(&store, &Denom::new("eur"), &Denom::new("usd"));
        assert!(plan.second_order.is_some(), "synthetic route should win");
        assert_eq!(plan.first_order.as_ref().unwrap().id, OrderId::new(2));
    }

    #[test]
    fn test_tie_prefers_direct_route() {
        let mut store = MemStore::new();
        // Both routes demand exactly 1.1 usd per eur. The synthetic chain is
        // discovered first (chf sorts before usd) and must still lose.
        rest(&mut store, 1, coin(100, "eur"), coin(100, "chf"));
        rest(&mut store, 2, coin(100, "chf"), coin(110, "usd"));
        rest(&mut store, 3, coin(100, "eur"), coin(110, "usd"));

        let plan = create_execution_plan(&store, &Denom::new("eur"), &Denom::new("usd"));
        assert!(plan.second_order.is_none(), "direct route should win ties");
        assert_eq!(plan.first_order.as_ref().unwrap().id, OrderId::new(3));
    }

    #[test]
    fn test_one_increment_advantage_keeps_direct_route() {
        let mut store = MemStore::new();
        // The synthetic route delivers exactly one increment (10⁻¹⁸) more
        // destination per source than the direct route:
        // 0.909090909090909092 vs 0.909090909090909091. Prices are
        // quantized, so this is the smallest possible advantage.
        rest(&mut store, 1, coin(100, "eur"), coin(100, "chf"));
        rest(
            &mut store,
            2,
            coin(909_090_909_090_909_092, "chf"),
            coin(1_000_000_000_000_000_000, "usd"),
        );
        rest(&mut store, 3, coin(100, "eur"), coin(110, "usd"));

        let plan = create_execution_plan(&store, &Denom::new("eur"), &Denom::new("usd"));
        assert!(
            plan.second_order.is_none(),
            "a one-increment advantage must not displace the direct route"
        );
    }

    #[test]
    fn test_capacity_reflects_partial_fills() {
        let mut store = MemStore::new();
        let mut order = Order::new(
            AccountAddr::new("maker"),
            "m-1",
            coin(100, "eur"),
            coin(110, "usd"),
        );
        order.id = OrderId::new(1);
        order.source_remaining = Amount::from_u64(50);
        order.source_filled = Amount::from_u64(50);
        order.destination_filled = Amount::from_u64(55);
        insert_order(&mut store, &order);

        let plan = create_execution_plan(&store, &Denom::new("eur"), &Denom::new("usd"));
        assert_eq!(plan.destination_capacity(), Decimal::from(55));
    }
}
