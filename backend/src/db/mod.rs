//! SQLite-backed record store.
//!
//! One table, `users`, keyed by an opaque text id. `favorites` is kept as a
//! JSON array column; timestamps are UTC and stored as text. Rows come back in
//! insertion order (`rowid`).

pub mod error;
pub mod models;
pub mod repo;

pub use error::StoreError;
