//! # Remote document store
//!
//! The primary home of projects and messages is a hosted document database. This
//! module defines the narrow [`DocumentClient`] interface the entity services need
//! from it and the adapters around that interface.
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`DocumentClient`] | List / create / patch / delete documents of a named collection. |
//! | [`RemoteCollection`] | Turns a `DocumentClient` collection into a [`store::RecordStore`] by converting between records and `id` + fields. |
//! | [`MemoryDocuments`] | In-process document store with failure injection, for tests and local development. |
//! | [`FirestoreClient`] | Cloud Firestore over its REST API (feature `remote`). |
//! | [`RemoteClient`] | Process-wide bundle of the Firestore handle and the Identity Toolkit provider (feature `remote`). |
//!
//! A document's key is the record id and its fields are every other record field;
//! failures come back as [`store::StoreError::Remote`] so the availability
//! classifier can inspect their codes.

mod collection;
mod memory;
pub mod value;

#[cfg(feature = "remote")]
mod client;
#[cfg(feature = "remote")]
mod firestore;

use std::future::Future;

use serde_json::{Map, Value};
use store::{SortOrder, StoreError};

pub use collection::RemoteCollection;
pub use memory::MemoryDocuments;

#[cfg(feature = "remote")]
pub use client::RemoteClient;
#[cfg(feature = "remote")]
pub use firestore::FirestoreClient;

/// Fields of a document, as plain JSON.
pub type Fields = Map<String, Value>;

/// A document read from the remote store.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// The document as a record-shaped JSON object: `id` plus every field.
    pub fn into_record_json(self) -> Value {
        let mut object = self.fields;
        object.insert("id".to_string(), Value::String(self.id));
        Value::Object(object)
    }
}

pub trait DocumentClient: Send + Sync {
    fn list_documents(
        &self,
        collection: &str,
        order: Option<SortOrder>,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    /// Create a document with a store-assigned key and return that key.
    fn create_document(
        &self,
        collection: &str,
        fields: Fields,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Overwrite the given fields of an existing document, leaving the others.
    fn patch_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete_document(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
