//! # Record stores
//!
//! [`RecordStore`] is the capability shared by every home a record can live in:
//! the local collections in this crate and the remote document collections in
//! `api`. It has the same four operations a dashboard needs, all async so a
//! caller cannot tell a local store from a remote one by its interface.
//!
//! [`Record`] ties a stored type to its draft (the record minus its id) and to
//! the ordering its listings use.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::models::RecordId;

/// Listing order requested from a store that supports server-side ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortOrder {
    pub field: &'static str,
    pub descending: bool,
}

impl SortOrder {
    pub fn descending(field: &'static str) -> Self {
        Self {
            field,
            descending: true,
        }
    }
}

/// A type that can be stored in a [`RecordStore`].
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The record without its id, as submitted for creation.
    type Draft: Clone + Serialize + Send + Sync;

    fn id(&self) -> &RecordId;

    fn from_draft(id: RecordId, draft: Self::Draft) -> Self;

    /// Ordering for remote listings. `None` means whatever the store returns.
    fn sort_order() -> Option<SortOrder> {
        None
    }

    /// Apply [`Record::sort_order`] in memory, for stores that cannot order.
    fn sort(_records: &mut [Self]) {}
}

/// Async CRUD over one collection of records.
pub trait RecordStore<T: Record>: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<T>, StoreError>> + Send;

    fn add(&self, draft: T::Draft) -> impl Future<Output = Result<T, StoreError>> + Send;

    fn update(&self, record: &T) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete(&self, id: &RecordId) -> impl Future<Output = Result<(), StoreError>> + Send;
}
