//! Persistence layer: store traits, in-memory and PostgreSQL backends, and
//! the character catalog.
//!
//! Jobs receive store handles through [`Stores`] rather than reaching for
//! process-wide singletons.

pub mod catalog;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use catalog::{CharacterCatalog, HEART_ON_OFF_RATIO};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::{AccountStore, GameStore, LockStore, SnapshotStore, Stores, WinLoss};
