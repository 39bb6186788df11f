//! Append-only record store for sigrelay.
//!
//! Persists chat messages and trade signals and serves them back newest
//! first. `PgStore` talks to PostgreSQL through `sqlx`; `MemoryStore` keeps
//! rows in process for tests and local runs. Both sit behind the
//! `RecordStore` trait so every component takes a `DynRecordStore`.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::{PgStore, PgStoreConfig};
pub use store::{DynRecordStore, RecordStore};
