use serde::ser::Error as _;
use serde::Serialize;
use serde_json::Value;
use store::{Record, RecordId, RecordStore, StoreError};

use super::{DocumentClient, Fields};

/// One named collection of a [`DocumentClient`], exposed as a record store.
#[derive(Clone, Debug)]
pub struct RemoteCollection<C> {
    client: C,
    name: &'static str,
}

impl<C: DocumentClient> RemoteCollection<C> {
    pub fn new(client: C, name: &'static str) -> Self {
        Self { client, name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Overwrite only `fields` of the record `id`.
    pub async fn patch(&self, id: &RecordId, fields: Fields) -> Result<(), StoreError> {
        self.client
            .patch_document(self.name, &id.to_string(), fields)
            .await
    }
}

/// Serialize a record or draft into document fields, dropping `id`.
pub(crate) fn to_fields<S: Serialize>(value: &S) -> Result<Fields, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(mut fields) => {
            fields.remove("id");
            Ok(fields)
        }
        other => Err(StoreError::Encoding(serde_json::Error::custom(format!(
            "records must serialize to objects, got {other}"
        )))),
    }
}

impl<T: Record, C: DocumentClient> RecordStore<T> for RemoteCollection<C> {
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        let documents = self
            .client
            .list_documents(self.name, T::sort_order())
            .await?;

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            let id = document.id.clone();
            match serde_json::from_value::<T>(document.into_record_json()) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(collection = self.name, %id, "skipping malformed document: {e}");
                }
            }
        }
        Ok(records)
    }

    async fn add(&self, draft: T::Draft) -> Result<T, StoreError> {
        let fields = to_fields(&draft)?;
        let id = self.client.create_document(self.name, fields).await?;
        Ok(T::from_draft(RecordId::Text(id), draft))
    }

    async fn update(&self, record: &T) -> Result<(), StoreError> {
        let fields = to_fields(record)?;
        self.patch(record.id(), fields).await
    }

    async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        self.client
            .delete_document(self.name, &id.to_string())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryDocuments;
    use store::{Category, Project, ProjectDraft};

    fn draft() -> ProjectDraft {
        ProjectDraft {
            title: "Remote".into(),
            description: "Stored remotely".into(),
            technologies: vec!["Firestore".into()],
            image_url: "https://img".into(),
            link: "https://example.com".into(),
            category: Category::Architecture,
            visible: true,
        }
    }

    #[tokio::test]
    async fn test_document_fields_exclude_id() {
        let documents = MemoryDocuments::new();
        let projects = RemoteCollection::new(documents.clone(), "projects");

        let added = RecordStore::<Project>::add(&projects, draft()).await.unwrap();
        assert!(!added.id.is_local());

        let stored = documents.document("projects", &added.id.to_string()).unwrap();
        assert!(!stored.contains_key("id"));
        assert_eq!(stored["imageUrl"], "https://img");

        let listed = RecordStore::<Project>::list(&projects).await.unwrap();
        assert_eq!(listed, vec![added]);
    }

    #[tokio::test]
    async fn test_malformed_documents_are_skipped() {
        let documents = MemoryDocuments::new();
        let mut bad = Fields::new();
        bad.insert("title".into(), Value::Bool(true));
        documents.insert("projects", "broken", bad);

        let projects = RemoteCollection::new(documents, "projects");
        let listed = RecordStore::<Project>::list(&projects).await.unwrap();
        assert!(listed.is_empty());
    }
}
