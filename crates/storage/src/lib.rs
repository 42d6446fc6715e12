//! Persistent key-value capability.
//!
//! Values are strings keyed by strings. [`MemoryStore`] keeps them in
//! process; [`FileStore`] writes one file per key under a data directory.

pub mod error;
pub mod kv;

pub use error::StorageError;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
