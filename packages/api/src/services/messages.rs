use serde_json::Value;
use store::{LocalCollection, Message, MessageDraft, RecordId, StoreError};

use super::FallbackCollection;
use crate::events::{ChangeEvent, EventBus};
use crate::remote::{DocumentClient, Fields, RemoteCollection};

/// Remote collection holding the inbox.
pub const COLLECTION: &str = "messages";

/// The contact-form inbox, newest first.
#[derive(Debug)]
pub struct MessageService<C> {
    records: FallbackCollection<Message, C>,
}

impl<C: DocumentClient> MessageService<C> {
    pub fn new(client: C, local: LocalCollection<Message>, events: EventBus) -> Self {
        Self {
            records: FallbackCollection::new(
                RemoteCollection::new(client, COLLECTION),
                local,
                events,
                ChangeEvent::Message,
            ),
        }
    }

    /// Store a new inquiry, unread and stamped with the current time.
    pub async fn send(
        &self,
        name: String,
        email: String,
        content: String,
    ) -> Result<Message, StoreError> {
        self.records.add(MessageDraft::new(name, email, content)).await
    }

    pub async fn list(&self) -> Vec<Message> {
        self.records.list().await
    }

    pub async fn mark_read(&self, id: &RecordId) -> Result<(), StoreError> {
        if id.is_local() {
            return self.mark_read_locally(id).await;
        }

        let mut fields = Fields::new();
        fields.insert("read".to_string(), Value::Bool(true));
        match self.records.patch_remote(id, fields).await {
            Ok(()) => {
                self.records.publish();
                Ok(())
            }
            Err(e) if e.is_unavailable() => {
                tracing::warn!(%id, "remote unavailable, marking read locally: {e}");
                self.mark_read_locally(id).await
            }
            Err(e) => Err(e),
        }
    }

    async fn mark_read_locally(&self, id: &RecordId) -> Result<(), StoreError> {
        if self.records.local().edit(id, |m| m.read = true).await? {
            self.records.publish();
        } else {
            tracing::debug!(%id, "no local message to mark read");
        }
        Ok(())
    }

    pub async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        self.records.delete(id).await
    }

    pub async fn unread_count(&self) -> usize {
        self.list().await.iter().filter(|m| !m.read).count()
    }

    pub fn records(&self) -> &FallbackCollection<Message, C> {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use store::{MemoryStorage, RecordStore, RemoteFailure};

    use super::*;
    use crate::remote::MemoryDocuments;

    fn service(docs: &MemoryDocuments) -> (MessageService<MemoryDocuments>, EventBus) {
        let events = EventBus::default();
        let local = LocalCollection::open(
            "messages",
            Vec::new(),
            Arc::new(MemoryStorage::new()),
            Duration::ZERO,
        )
        .unwrap();
        (MessageService::new(docs.clone(), local, events.clone()), events)
    }

    async fn send(service: &MessageService<MemoryDocuments>, name: &str) -> Message {
        service
            .send(name.to_string(), format!("{name}@example.com"), "Hello".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_send_stamps_unread_now() {
        let docs = MemoryDocuments::new();
        let (messages, events) = service(&docs);
        let mut sub = events.subscribe();
        let before = Utc::now();

        let sent = send(&messages, "ada").await;
        assert!(!sent.read);
        assert!(sent.date >= before);
        assert_eq!(sub.drain(), vec![ChangeEvent::Message]);

        let stored = docs.document(COLLECTION, &sent.id.to_string()).unwrap();
        assert_eq!(stored["read"], false);
        assert_eq!(stored["email"], "ada@example.com");
        assert!(stored["date"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let docs = MemoryDocuments::new();
        for (id, day) in [("a", 1), ("b", 3), ("c", 2)] {
            let date = Utc.with_ymd_and_hms(2024, 5, day, 10, 0, 0).unwrap();
            let Value::Object(fields) = json!({
                "name": id, "email": "x@y.z", "content": "hi", "date": date, "read": false
            }) else {
                unreachable!()
            };
            docs.insert(COLLECTION, id, fields);
        }
        let (messages, _) = service(&docs);

        let ids: Vec<String> = messages.list().await.iter().map(|m| m.id.to_string()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent() {
        let docs = MemoryDocuments::new();
        let (messages, events) = service(&docs);
        let sent = send(&messages, "ada").await;
        let mut sub = events.subscribe();

        messages.mark_read(&sent.id).await.unwrap();
        messages.mark_read(&sent.id).await.unwrap();

        let listed = messages.list().await;
        assert_eq!(listed.len(), 1);
        assert!(listed[0].read);
        assert_eq!(sub.drain(), vec![ChangeEvent::Message, ChangeEvent::Message]);
        assert_eq!(messages.unread_count().await, 0);
    }

    #[tokio::test]
    async fn test_mark_read_falls_back_locally() {
        let docs = MemoryDocuments::new();
        docs.fail_with(Some(RemoteFailure::permission_denied()));
        let (messages, events) = service(&docs);

        let sent = send(&messages, "offline").await;
        assert!(sent.id.is_local());
        assert_eq!(messages.unread_count().await, 1);

        let mut sub = events.subscribe();
        messages.mark_read(&sent.id).await.unwrap();
        assert_eq!(sub.drain(), vec![ChangeEvent::Message]);
        assert_eq!(messages.unread_count().await, 0);

        // A remote id that only fails over to an empty local inbox
        messages.mark_read(&RecordId::from("remote1")).await.unwrap();
        assert!(sub.drain().is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_returns_other_errors() {
        let docs = MemoryDocuments::new();
        let (messages, events) = service(&docs);
        let mut sub = events.subscribe();

        let err = messages.mark_read(&RecordId::from("gone")).await.unwrap_err();
        assert!(!err.is_unavailable());
        assert!(sub.drain().is_empty());
    }

    #[tokio::test]
    async fn test_offline_inbox_is_sorted_by_date() {
        let docs = MemoryDocuments::new();
        docs.fail_with(Some(RemoteFailure::unavailable()));
        let (messages, _) = service(&docs);

        let older = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let local = messages.records().local();
        for date in [newer, older] {
            let mut draft = MessageDraft::new("n".into(), "e@x.y".into(), "c".into());
            draft.date = date;
            local.add(draft).await.unwrap();
        }

        let dates: Vec<_> = messages.list().await.iter().map(|m| m.date).collect();
        assert_eq!(dates, vec![newer, older]);
    }

    #[tokio::test]
    async fn test_delete_removes_message() {
        let docs = MemoryDocuments::new();
        let (messages, _) = service(&docs);
        let keep = send(&messages, "keep").await;
        let spam = send(&messages, "spam").await;

        messages.delete(&spam.id).await.unwrap();
        let listed = messages.list().await;
        assert_eq!(listed, vec![keep]);
        assert!(RecordStore::<Message>::list(messages.records().local())
            .await
            .unwrap()
            .is_empty());
    }
}
