//! Mises State Store
//!
//! - `KvStore`: byte-keyed backend contract (get/set/delete/scan/atomic batch)
//! - `MemoryStore` and `RocksStore` backends
//! - `CacheStore`: write-buffering overlay used as the unit of work for a
//!   state transition; commit as one batch or drop to roll back
//! - `SequencedStore<T>`: append-only table with a persisted id counter
//! - `KeyedStore<T>`: table keyed by an arbitrary string

pub mod cache;
pub mod error;
pub mod keyed;
pub mod kv;
pub mod memory;
pub mod rocks;
pub mod sequenced;

pub use cache::{atomically, CacheStore};
pub use error::StoreError;
pub use keyed::KeyedStore;
pub use kv::{key_successor, BatchOperation, KvStore, ScanResult};
pub use memory::MemoryStore;
pub use rocks::RocksStore;
pub use sequenced::{id_bytes, id_from_bytes, SequencedStore};
