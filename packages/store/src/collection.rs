//! # Local collections
//!
//! [`LocalCollection`] keeps an ordered list of records of one type under a single
//! key of a [`KeyValueStorage`] area (`pawlos_local_db_<name>`). It is the fallback
//! home for records whenever the remote document store cannot be used.
//!
//! The collection deliberately behaves like a remote API: every operation is async
//! and waits for the configured latency before touching storage, and ids are minted
//! by the store on [`add`](RecordStore::add).
//!
//! ## Semantics
//!
//! | Operation | Behaviour |
//! |-----------|-----------|
//! | [`open`](LocalCollection::open) | Writes the seed list if nothing is stored under the key yet. |
//! | `list` | The whole list in stored order (newest first). |
//! | `add` | Mints `local_<millis>_<7 base36 chars>`, prepends, persists. |
//! | `update` | Replaces the record with the same id; no-op if absent. |
//! | `delete` | Removes the first record with the id; no-op if absent. |
//! | [`edit`](LocalCollection::edit) | Changes one record in place; reports whether it existed. |
//!
//! Ids compare by string form. Every write is a full load-modify-save of the list,
//! serialized per collection by a process-local lock. There is no version check,
//! so the last writer wins.

use std::marker::PhantomData;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use rand::Rng;

use crate::error::StoreError;
use crate::models::RecordId;
use crate::record::{Record, RecordStore};
use crate::storage::SharedStorage;

/// Namespace prefix of every collection key.
pub const DB_PREFIX: &str = "pawlos_local_db_";

/// Simulated round-trip of a local operation.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(400);

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 7;

#[derive(Debug)]
pub struct LocalCollection<T> {
    name: String,
    storage: SharedStorage,
    latency: Duration,
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> LocalCollection<T> {
    /// Open the collection `name`, seeding it with `seed` if it does not exist yet or
    /// holds an empty value.
    pub fn open(
        name: &str,
        seed: Vec<T>,
        storage: SharedStorage,
        latency: Duration,
    ) -> Result<Self, StoreError> {
        let collection = Self {
            name: name.to_string(),
            storage,
            latency,
            write_lock: Mutex::new(()),
            _record: PhantomData,
        };

        let stored = collection.storage.get_item(&collection.key())?;
        if stored.map_or(true, |raw| raw.is_empty()) {
            tracing::debug!(collection = name, records = seed.len(), "seeding local collection");
            collection.save(&seed)?;
        }

        Ok(collection)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage key holding this collection.
    pub fn key(&self) -> String {
        format!("{DB_PREFIX}{}", self.name)
    }

    fn load(&self) -> Result<Vec<T>, StoreError> {
        match self.storage.get_item(&self.key())? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    fn save(&self, items: &[T]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(items)?;
        self.storage.set_item(&self.key(), &raw)
    }

    /// Load, let `f` edit the list, and save if `f` reports a change.
    fn modify<R>(&self, f: impl FnOnce(&mut Vec<T>) -> (bool, R)) -> Result<R, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut items = self.load()?;
        let (changed, out) = f(&mut items);
        if changed {
            self.save(&items)?;
        }
        Ok(out)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Apply `f` to the record `id` and persist the result. Returns `false`, and
    /// writes nothing, when no such record exists.
    pub async fn edit(
        &self,
        id: &RecordId,
        f: impl FnOnce(&mut T) + Send,
    ) -> Result<bool, StoreError> {
        self.simulate_latency().await;
        self.modify(|items| match items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                f(item);
                (true, true)
            }
            None => (false, false),
        })
    }

    fn generate_id() -> RecordId {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect();
        RecordId::Text(format!(
            "{}{}_{}",
            RecordId::LOCAL_PREFIX,
            Utc::now().timestamp_millis(),
            suffix
        ))
    }
}

impl<T: Record> RecordStore<T> for LocalCollection<T> {
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        self.simulate_latency().await;
        self.load()
    }

    async fn add(&self, draft: T::Draft) -> Result<T, StoreError> {
        self.simulate_latency().await;
        let record = T::from_draft(Self::generate_id(), draft);
        self.modify(|items| {
            items.insert(0, record.clone());
            (true, ())
        })?;
        tracing::debug!(collection = %self.name, id = %record.id(), "added local record");
        Ok(record)
    }

    async fn update(&self, record: &T) -> Result<(), StoreError> {
        self.simulate_latency().await;
        self.modify(|items| {
            match items.iter().position(|item| item.id() == record.id()) {
                Some(index) => {
                    items[index] = record.clone();
                    (true, ())
                }
                None => (false, ()),
            }
        })
    }

    async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        self.simulate_latency().await;
        self.modify(|items| match items.iter().position(|item| item.id() == id) {
            Some(index) => {
                items.remove(index);
                (true, ())
            }
            None => (false, ()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{Category, Project, ProjectDraft};
    use crate::storage::KeyValueStorage;
    use crate::MemoryStorage;

    fn draft(title: &str) -> ProjectDraft {
        ProjectDraft {
            title: title.to_string(),
            description: format!("{title} description"),
            technologies: vec!["Rust".to_string(), "Axum".to_string()],
            image_url: "https://picsum.photos/600/400".to_string(),
            link: "#".to_string(),
            category: Category::Development,
            visible: true,
        }
    }

    fn open(storage: &MemoryStorage, seed: Vec<Project>) -> LocalCollection<Project> {
        LocalCollection::open("projects", seed, Arc::new(storage.clone()), Duration::ZERO).unwrap()
    }

    #[tokio::test]
    async fn test_seed_only_when_absent() {
        let storage = MemoryStorage::new();
        let seeded = open(&storage, crate::seed::initial_projects());
        assert_eq!(seeded.list().await.unwrap().len(), 4);

        // A second open must not overwrite what is stored
        seeded.delete(&RecordId::Number(1)).await.unwrap();
        let reopened = open(&storage, crate::seed::initial_projects());
        assert_eq!(reopened.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_value_is_seeded_on_open() {
        let storage = MemoryStorage::new();
        storage.set_item("pawlos_local_db_projects", "").unwrap();
        let collection = open(&storage, crate::seed::initial_projects());
        assert_eq!(collection.list().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_value_reads_as_empty_list() {
        let storage = MemoryStorage::new();
        let collection = open(&storage, crate::seed::initial_projects());
        storage.set_item("pawlos_local_db_projects", "").unwrap();
        assert!(collection.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_prepends_with_local_id() {
        let storage = MemoryStorage::new();
        let collection = open(&storage, crate::seed::initial_projects());

        let added = collection.add(draft("Newest")).await.unwrap();
        assert!(added.id.is_local());
        assert_eq!(added.title, "Newest");
        assert_eq!(added.technologies, vec!["Rust", "Axum"]);

        let items = collection.list().await.unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0], added);
        assert_eq!(items[1].id, RecordId::Number(1));
    }

    #[tokio::test]
    async fn test_generated_ids_are_unique() {
        let storage = MemoryStorage::new();
        let collection = open(&storage, Vec::new());

        let a = collection.add(draft("a")).await.unwrap();
        let b = collection.add(draft("b")).await.unwrap();
        assert_ne!(a.id, b.id);

        let RecordId::Text(id) = &a.id else {
            panic!("local ids are strings");
        };
        let parts: Vec<&str> = id.splitn(3, '_').collect();
        assert_eq!(parts[0], "local");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 7);
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let storage = MemoryStorage::new();
        let collection = open(&storage, crate::seed::initial_projects());

        let mut second = collection.list().await.unwrap()[1].clone();
        second.title = "Renamed".to_string();
        collection.update(&second).await.unwrap();

        let items = collection.list().await.unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[1], second);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_are_noops() {
        let storage = MemoryStorage::new();
        let collection = open(&storage, crate::seed::initial_projects());
        let before = collection.list().await.unwrap();

        let ghost = Project::from_draft(RecordId::from("local_0_missing"), draft("ghost"));
        collection.update(&ghost).await.unwrap();
        collection.delete(&ghost.id).await.unwrap();

        assert_eq!(collection.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete_matches_by_string_form() {
        let storage = MemoryStorage::new();
        let collection = open(&storage, crate::seed::initial_projects());

        collection.delete(&RecordId::from("2")).await.unwrap();

        let ids: Vec<String> = collection
            .list()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
    }

    #[tokio::test]
    async fn test_edit_in_place() {
        let storage = MemoryStorage::new();
        let collection = open(&storage, crate::seed::initial_projects());

        let hidden = collection
            .edit(&RecordId::from("3"), |p| p.visible = false)
            .await
            .unwrap();
        assert!(hidden);
        assert!(!collection.list().await.unwrap()[2].visible);

        let missing = collection
            .edit(&RecordId::from("local_0_none"), |p| p.visible = false)
            .await
            .unwrap();
        assert!(!missing);
    }
}
