//! Remote-first record access with a local fallback.

use std::fmt;

use store::{LocalCollection, Record, RecordId, RecordStore, StoreError};

use crate::events::{ChangeEvent, EventBus};
use crate::remote::{DocumentClient, Fields, RemoteCollection};

/// One entity's records, read and written through the remote collection first
/// and through the local collection whenever the remote one is unavailable.
///
/// | Operation | Remote fails as unavailable | Remote fails otherwise |
/// |-----------|-----------------------------|------------------------|
/// | [`list`](Self::list) | local records | logged, empty list |
/// | [`add`](Self::add) | local add | error returned |
/// | [`update`](Self::update) | local update | error returned |
/// | [`delete`](Self::delete) | local delete | logged, nothing deleted |
///
/// Records with a local id never reach the remote collection. Every successful
/// mutation publishes the collection's change event.
pub struct FallbackCollection<T, C> {
    remote: RemoteCollection<C>,
    local: LocalCollection<T>,
    events: EventBus,
    event: ChangeEvent,
}

impl<T, C> fmt::Debug for FallbackCollection<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackCollection")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

impl<T: Record, C: DocumentClient> FallbackCollection<T, C> {
    pub fn new(
        remote: RemoteCollection<C>,
        local: LocalCollection<T>,
        events: EventBus,
        event: ChangeEvent,
    ) -> Self {
        Self {
            remote,
            local,
            events,
            event,
        }
    }

    pub fn local(&self) -> &LocalCollection<T> {
        &self.local
    }

    pub fn remote(&self) -> &RemoteCollection<C> {
        &self.remote
    }

    pub(crate) fn publish(&self) {
        self.events.publish(self.event);
    }

    /// Every record. Never fails: problems are logged and read as "no records".
    pub async fn list(&self) -> Vec<T> {
        let collection = self.remote.name();
        match RecordStore::<T>::list(&self.remote).await {
            Ok(records) if records.is_empty() => {
                let local = self.list_local().await;
                if local.is_empty() {
                    records
                } else {
                    tracing::debug!(collection, records = local.len(), "remote empty, serving local records");
                    local
                }
            }
            Ok(records) => records,
            Err(e) if e.is_unavailable() => {
                tracing::warn!(collection, "remote unavailable, listing local records: {e}");
                self.list_local().await
            }
            Err(e) => {
                tracing::error!(collection, "listing failed: {e}");
                Vec::new()
            }
        }
    }

    async fn list_local(&self) -> Vec<T> {
        match self.local.list().await {
            Ok(mut records) => {
                T::sort(&mut records);
                records
            }
            Err(e) => {
                tracing::error!(collection = self.local.name(), "local listing failed: {e}");
                Vec::new()
            }
        }
    }

    pub async fn add(&self, draft: T::Draft) -> Result<T, StoreError> {
        let record = match RecordStore::<T>::add(&self.remote, draft.clone()).await {
            Ok(record) => record,
            Err(e) if e.is_unavailable() => {
                tracing::warn!(collection = self.remote.name(), "remote unavailable, adding locally: {e}");
                self.local.add(draft).await?
            }
            Err(e) => return Err(e),
        };
        tracing::debug!(collection = self.remote.name(), id = %record.id(), "added record");
        self.publish();
        Ok(record)
    }

    /// Replace every field of `record` except its id.
    pub async fn update(&self, record: &T) -> Result<(), StoreError> {
        let collection = self.remote.name();
        if record.id().is_local() {
            tracing::debug!(collection, id = %record.id(), "local id, updating locally");
            self.local.update(record).await?;
        } else {
            match RecordStore::<T>::update(&self.remote, record).await {
                Ok(()) => {}
                Err(e) if e.is_unavailable() => {
                    tracing::warn!(collection, id = %record.id(), "remote unavailable, updating locally: {e}");
                    self.local.update(record).await?;
                }
                Err(e) => return Err(e),
            }
        }
        self.publish();
        Ok(())
    }

    /// Best-effort delete. Only local storage failures are returned.
    pub async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        let collection = self.remote.name();
        if id.is_local() {
            tracing::debug!(collection, %id, "local id, deleting locally");
            RecordStore::<T>::delete(&self.local, id).await?;
        } else {
            match RecordStore::<T>::delete(&self.remote, id).await {
                Ok(()) => {}
                Err(e) if e.is_unavailable() => {
                    tracing::warn!(collection, %id, "remote unavailable, deleting locally: {e}");
                    RecordStore::<T>::delete(&self.local, id).await?;
                }
                Err(e) => {
                    tracing::error!(collection, %id, "delete failed: {e}");
                    return Ok(());
                }
            }
        }
        self.publish();
        Ok(())
    }

    /// Overwrite only `fields` of a remote record. Availability errors are
    /// returned for the caller to fall back on.
    pub(crate) async fn patch_remote(&self, id: &RecordId, fields: Fields) -> Result<(), StoreError> {
        self.remote.patch(id, fields).await
    }
}
