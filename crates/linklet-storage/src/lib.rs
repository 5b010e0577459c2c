//! Storage backends for the linklet URL shortener.
//!
//! Two implementations of the store contract from `linklet-core`:
//! a volatile in-memory store and a durable Postgres store. Both obey
//! the same dedup, soft-delete, and ownership semantics, so the gateway
//! stays backend-agnostic.

pub mod memory;
pub mod postgres;

pub use linklet_core::{AuthStore, BatchStore, Result, SaveOutcome, Store, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
