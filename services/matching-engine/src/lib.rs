//! Matching engine for the multi-asset spot market
//!
//! A deterministic, store-backed limit-order engine. Orders sell a source
//! denomination into a destination denomination and rest in per-instrument
//! books ordered by price-time priority; the execution planner routes an
//! aggressive order through the cheapest direct or two-hop synthetic path;
//! settlement moves funds through an atomic multi-input multi-output bank
//! transfer.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced per instrument
//! - Deterministic matching (same messages → same state and events)
//! - Conservation: every settlement's inputs equal its outputs
//! - Fixed gas per operation, independent of orders swept
//!
//! Wall-clock time never enters matching; the only time the engine sees is
//! the block time handed in through [`TxContext`].

pub mod adapters;
pub mod book;
pub mod engine;
pub mod events;
pub mod gas;
pub mod keys;
pub mod memory;
pub mod planner;
pub mod store;
pub mod watcher;

pub use engine::{MarketEngine, TxContext};
pub use events::MarketEvent;
pub use store::{CacheStore, MemStore, Store};
