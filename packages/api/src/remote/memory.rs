use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use store::{RemoteFailure, SortOrder, StoreError};

use super::{Document, DocumentClient, Fields};

#[derive(Debug, Default)]
struct Inner {
    /// Documents per collection, in creation order.
    collections: HashMap<String, Vec<(String, Fields)>>,
    failure: Option<RemoteFailure>,
    calls: usize,
    next_id: u64,
}

/// In-process document store for tests and development.
///
/// [`fail_with`](MemoryDocuments::fail_with) makes every following call fail with
/// the given error, and [`calls`](MemoryDocuments::calls) counts attempted calls,
/// failed ones included.
#[derive(Clone, Debug, Default)]
pub struct MemoryDocuments {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail every following call with `failure`, or stop failing with `None`.
    pub fn fail_with(&self, failure: Option<RemoteFailure>) {
        self.lock().failure = failure;
    }

    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    pub fn insert(&self, collection: &str, id: &str, fields: Fields) {
        self.lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push((id.to_string(), fields));
    }

    pub fn document(&self, collection: &str, id: &str) -> Option<Fields> {
        self.lock()
            .collections
            .get(collection)?
            .iter()
            .find(|(doc_id, _)| doc_id == id)
            .map(|(_, fields)| fields.clone())
    }

    pub fn len(&self, collection: &str) -> usize {
        self.lock().collections.get(collection).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Count the call and return the injected failure, if any.
    fn begin(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        let mut inner = self.lock();
        inner.calls += 1;
        match &inner.failure {
            Some(failure) => Err(StoreError::Remote(failure.clone())),
            None => Ok(inner),
        }
    }
}

fn compare_fields(a: &Fields, b: &Fields, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

impl DocumentClient for MemoryDocuments {
    async fn list_documents(
        &self,
        collection: &str,
        order: Option<SortOrder>,
    ) -> Result<Vec<Document>, StoreError> {
        let inner = self.begin()?;
        let mut documents: Vec<Document> = inner
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = order {
            documents.sort_by(|a, b| {
                let ordering = compare_fields(&a.fields, &b.fields, order.field);
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
        Ok(documents)
    }

    async fn create_document(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let mut inner = self.begin()?;
        inner.next_id += 1;
        let id = format!("doc{:05}", inner.next_id);
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), fields));
        Ok(id)
    }

    async fn patch_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let mut inner = self.begin()?;
        let existing = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|(doc_id, _)| doc_id == id));
        match existing {
            Some((_, stored)) => {
                stored.extend(fields);
                Ok(())
            }
            None => Err(StoreError::Remote(RemoteFailure::new(
                "not-found",
                format!("No document to update: {collection}/{id}"),
            ))),
        }
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut inner = self.begin()?;
        if let Some(docs) = inner.collections.get_mut(collection) {
            docs.retain(|(doc_id, _)| doc_id != id);
        }
        Ok(())
    }
}
