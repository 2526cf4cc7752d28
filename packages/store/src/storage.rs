//! Key/value storage area backing the local collections.
//!
//! Modeled on a browser's `localStorage`: string keys, string values, synchronous
//! access. [`crate::MemoryStorage`] keeps everything in process memory and
//! [`crate::FileStorage`] persists one file per key.

use std::sync::Arc;

use crate::error::StoreError;

pub trait KeyValueStorage: Send + Sync + std::fmt::Debug {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

/// Storage shared by every collection and preference of one process.
pub type SharedStorage = Arc<dyn KeyValueStorage>;
