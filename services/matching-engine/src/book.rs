//! Store-backed order book operations
//!
//! Orders live once, in the owner keyspace. The pricing index and the
//! instrument-existence set hold references only. A resting order appears in
//! all three keyspaces; [`delete_order`] removes it from all three within
//! the enclosing transaction and prunes the instrument marker when the last
//! order of an instrument leaves.

use crate::keys;
use crate::store::Store;
use types::coin::Denom;
use types::ids::{AccountAddr, OrderId};
use types::order::Order;

fn encode_order(order: &Order) -> Vec<u8> {
    bincode::serialize(order).expect("order serialization cannot fail")
}

fn decode_order(bytes: &[u8]) -> Order {
    bincode::deserialize(bytes).expect("stored order is corrupt")
}

/// Fetch one order by its owner and client order id
pub fn get_order<S: Store + ?Sized>(
    store: &S,
    owner: &AccountAddr,
    client_order_id: &str,
) -> Option<Order> {
    store
        .get(&keys::owner_key(owner, client_order_id))
        .map(|bytes| decode_order(&bytes))
}

/// Persist an order's mutable fill state
///
/// Price and id never change after admission, so the pricing index entry
/// written by [`insert_order`] stays valid.
pub fn set_order<S: Store + ?Sized>(store: &mut S, order: &Order) {
    store.set(
        keys::owner_key(&order.owner, &order.client_order_id),
        encode_order(order),
    );
}

/// Add a resting order to all three keyspaces
///
/// This is the only place an order enters the book.
pub fn insert_order<S: Store + ?Sized>(store: &mut S, order: &Order) {
    set_order(store, order);

    let owner_key = keys::owner_key(&order.owner, &order.client_order_id);
    store.set(
        keys::pricing_key(
            &order.source.denom,
            &order.destination.denom,
            order.price(),
            order.id,
        ),
        owner_key,
    );

    let instrument = keys::instrument_key(&order.source.denom, &order.destination.denom);
    if !store.has(&instrument) {
        store.set(instrument, Vec::new());
    }
}

/// Remove an order from all three keyspaces
///
/// Idempotent: removing an already-removed order is a no-op, which the
/// matching loop relies on when the balance watcher got there first.
pub fn delete_order<S: Store + ?Sized>(store: &mut S, order: &Order) {
    store.delete(&keys::owner_key(&order.owner, &order.client_order_id));
    store.delete(&keys::pricing_key(
        &order.source.denom,
        &order.destination.denom,
        order.price(),
        order.id,
    ));

    let pricing = keys::pricing_prefix(&order.source.denom, &order.destination.denom);
    if store.first_under_prefix(&pricing).is_none() {
        store.delete(&keys::instrument_key(
            &order.source.denom,
            &order.destination.denom,
        ));
    }
}

/// Snapshot copies of all resting orders of one owner, client order id order
pub fn orders_by_owner<S: Store + ?Sized>(store: &S, owner: &AccountAddr) -> Vec<Order> {
    store
        .scan_prefix(&keys::owner_prefix(owner))
        .into_iter()
        .map(|(_, bytes)| decode_order(&bytes))
        .collect()
}

/// Head of an instrument's book: lowest price, then lowest id
pub fn best_order<S: Store + ?Sized>(store: &S, src: &Denom, dst: &Denom) -> Option<Order> {
    let (_, owner_key) = store.first_under_prefix(&keys::pricing_prefix(src, dst))?;
    let bytes = store
        .get(&owner_key)
        .expect("pricing index references a missing order");
    Some(decode_order(&bytes))
}

/// All instruments selling `src`, destination denomination ascending
pub fn instruments_by_source<S: Store + ?Sized>(store: &S, src: &Denom) -> Vec<(Denom, Denom)> {
    store
        .scan_prefix(&keys::instrument_prefix_by_source(src))
        .into_iter()
        .filter_map(|(key, _)| keys::parse_instrument_key(&key))
        .collect()
}

/// Every instrument with at least one resting order
pub fn all_instruments<S: Store + ?Sized>(store: &S) -> Vec<(Denom, Denom)> {
    store
        .scan_prefix(b"I/")
        .into_iter()
        .filter_map(|(key, _)| keys::parse_instrument_key(&key))
        .collect()
}

/// Draw the next order id from the persisted counter
pub fn next_order_id<S: Store + ?Sized>(store: &mut S) -> OrderId {
    let current = store
        .get(keys::ORDER_ID_KEY)
        .map(|bytes| keys::decode_uvarint(&bytes).expect("stored order id counter is corrupt"))
        .unwrap_or(0);
    store.set(
        keys::ORDER_ID_KEY.to_vec(),
        keys::encode_uvarint(current + 1),
    );
    OrderId::new(current)
}
