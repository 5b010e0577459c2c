//! Core types and traits for the linklet URL shortener.
//!
//! This crate defines the store contract that every storage backend
//! satisfies, along with the domain types and the error taxonomy shared
//! by the backends and the HTTP gateway.

pub mod error;
pub mod short_id;
pub mod store;
pub mod user_id;

pub use error::{Result, StoreError};
pub use short_id::ShortId;
pub use store::{AuthStore, BatchStore, SaveOutcome, Store};
pub use user_id::UserId;
