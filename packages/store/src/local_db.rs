//! The local fallback database: one collection per entity type.

use std::time::Duration;

use crate::collection::LocalCollection;
use crate::error::StoreError;
use crate::models::{Message, Project};
use crate::seed::initial_projects;
use crate::storage::SharedStorage;

pub const PROJECTS: &str = "projects";
pub const MESSAGES: &str = "messages";

#[derive(Debug)]
pub struct LocalBackend {
    pub projects: LocalCollection<Project>,
    pub messages: LocalCollection<Message>,
}

impl LocalBackend {
    /// Open both collections, seeding projects with the built-in gallery and
    /// messages with an empty inbox on first use.
    pub fn open(storage: SharedStorage, latency: Duration) -> Result<Self, StoreError> {
        Ok(Self {
            projects: LocalCollection::open(PROJECTS, initial_projects(), storage.clone(), latency)?,
            messages: LocalCollection::open(MESSAGES, Vec::new(), storage, latency)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::record::RecordStore;
    use crate::storage::KeyValueStorage;
    use crate::MemoryStorage;

    #[tokio::test]
    async fn test_open_seeds_both_namespaces() {
        let storage = MemoryStorage::new();
        let backend = LocalBackend::open(Arc::new(storage.clone()), Duration::ZERO).unwrap();

        assert_eq!(backend.projects.list().await.unwrap().len(), 4);
        assert!(backend.messages.list().await.unwrap().is_empty());
        assert_eq!(
            storage.get_item("pawlos_local_db_messages").unwrap().as_deref(),
            Some("[]")
        );
        assert!(storage.get_item("pawlos_local_db_projects").unwrap().is_some());
    }
}
