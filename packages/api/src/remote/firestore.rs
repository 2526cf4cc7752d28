//! # Cloud Firestore over REST
//!
//! Implements [`DocumentClient`] against the Firestore v1 REST API:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list (unordered) | `GET {documents}/{collection}`, following `nextPageToken` |
//! | list (ordered) | `POST {documents}:runQuery` with a `structuredQuery.orderBy` |
//! | create | `POST {documents}/{collection}`, key taken from the returned `name` |
//! | patch | `PATCH {documents}/{collection}/{id}` with `updateMask.fieldPaths` and `currentDocument.exists=true` |
//! | delete | `DELETE {documents}/{collection}/{id}` |
//!
//! The signed-in operator's ID token, when there is one, is sent as a bearer token;
//! the security rules decide what an anonymous caller may do. A request answered
//! `UNAUTHENTICATED` has its token renewed and is sent once more, anonymously if the
//! renewal ended the session. Error bodies
//! (`{"error": {"code", "message", "status"}}`) become [`RemoteFailure`]s whose code
//! is the kebab-cased status (`PERMISSION_DENIED` → `permission-denied`). Requests
//! that never got a response fail with `unavailable`.

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use store::{RemoteFailure, SortOrder, StoreError};

use super::value::{decode_fields, encode_fields};
use super::{Document, DocumentClient, Fields};
use crate::auth::IdentityToolkit;
use crate::config::FirebaseConfig;
use crate::error::ConfigError;

const PAGE_SIZE: &str = "300";

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Value,
}

impl From<RawDocument> for Document {
    fn from(raw: RawDocument) -> Self {
        Document {
            id: document_id(&raw.name).to_string(),
            fields: decode_fields(&raw.fields),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryRow {
    document: Option<RawDocument>,
}

#[derive(Clone, Debug)]
pub struct FirestoreClient {
    http: Client,
    documents_url: String,
    api_key: String,
    auth: Option<Arc<IdentityToolkit>>,
}

impl FirestoreClient {
    /// Requests run as whoever is signed in to `auth`, or anonymously without it.
    pub fn new(
        config: &FirebaseConfig,
        auth: Option<Arc<IdentityToolkit>>,
    ) -> Result<Self, ConfigError> {
        if config.project_id.trim().is_empty() {
            return Err(ConfigError::Invalid("firebase.project_id is empty".into()));
        }
        let base = config.firestore_url.trim_end_matches('/');
        Url::parse(base).map_err(|e| {
            ConfigError::Invalid(format!("firebase.firestore_url {base:?}: {e}"))
        })?;

        Ok(Self {
            http: Client::new(),
            documents_url: format!(
                "{base}/projects/{}/databases/{}/documents",
                config.project_id, config.database
            ),
            api_key: config.api_key.clone(),
            auth,
        })
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self.http.request(method, url);
        if self.api_key.is_empty() {
            return builder;
        }
        builder.query(&[("key", self.api_key.as_str())])
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let Some(auth) = &self.auth else {
            return send(request).await;
        };
        let Some(token) = auth.id_token().await else {
            return send(request).await;
        };
        let retry = request.try_clone();

        match send(request.bearer_auth(&token)).await {
            Err(StoreError::Remote(failure)) if failure.code == "unauthenticated" => {
                let Some(retry) = retry else {
                    return Err(StoreError::Remote(failure));
                };
                tracing::debug!("ID token rejected by the document store, renewing");
                match auth.renew(&token).await {
                    Some(renewed) => send(retry.bearer_auth(renewed)).await,
                    None => send(retry).await,
                }
            }
            outcome => outcome,
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{collection}", self.documents_url)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.documents_url)
    }

    async fn list_pages(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .request(Method::GET, self.collection_url(collection))
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let page: ListResponse = read_json(self.send(request).await?).await?;
            documents.extend(page.documents.into_iter().map(Document::from));

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }
        Ok(documents)
    }

    async fn run_query(
        &self,
        collection: &str,
        order: SortOrder,
    ) -> Result<Vec<Document>, StoreError> {
        let direction = if order.descending { "DESCENDING" } else { "ASCENDING" };
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "orderBy": [{ "field": { "fieldPath": order.field }, "direction": direction }],
            }
        });
        let url = format!("{}:runQuery", self.documents_url);
        let rows: Vec<QueryRow> =
            read_json(self.send(self.request(Method::POST, url).json(&body)).await?).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.document)
            .map(Document::from)
            .collect())
    }
}

impl DocumentClient for FirestoreClient {
    async fn list_documents(
        &self,
        collection: &str,
        order: Option<SortOrder>,
    ) -> Result<Vec<Document>, StoreError> {
        tracing::debug!(collection, ?order, "listing documents");
        match order {
            Some(order) => self.run_query(collection, order).await,
            None => self.list_pages(collection).await,
        }
    }

    async fn create_document(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let body = json!({ "fields": encode_fields(&fields) });
        let request = self
            .request(Method::POST, self.collection_url(collection))
            .json(&body);
        let created: RawDocument = read_json(self.send(request).await?).await?;
        let id = document_id(&created.name).to_string();
        tracing::debug!(collection, %id, "created document");
        Ok(id)
    }

    async fn patch_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let mut query: Vec<(&str, &str)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();
        query.push(("currentDocument.exists", "true"));

        let body = json!({ "fields": encode_fields(&fields) });
        let request = self
            .request(Method::PATCH, self.document_url(collection, id))
            .query(&query)
            .json(&body);
        self.send(request).await?;
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.send(self.request(Method::DELETE, self.document_url(collection, id)))
            .await?;
        Ok(())
    }
}

/// Last segment of a full document name
/// (`projects/p/databases/(default)/documents/messages/abc` → `abc`).
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

async fn send(request: RequestBuilder) -> Result<Response, StoreError> {
    let response = request.send().await.map_err(transport_failure)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Remote(parse_failure(status.as_u16(), &body)))
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    response.json().await.map_err(|e| {
        if e.is_decode() {
            StoreError::Remote(RemoteFailure::new("internal", e.to_string()))
        } else {
            transport_failure(e)
        }
    })
}

fn transport_failure(error: reqwest::Error) -> StoreError {
    tracing::debug!("firestore request failed: {error}");
    StoreError::Remote(RemoteFailure::new("unavailable", error.to_string()))
}

/// Turn an error response into a failure with a kebab-case code.
fn parse_failure(status: u16, body: &str) -> RemoteFailure {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    // runQuery reports errors as a one-element array
    let error = parsed
        .get("error")
        .or_else(|| parsed.get(0).and_then(|first| first.get("error")));

    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {status}"));
    let code = match error.and_then(|e| e.get("status")).and_then(Value::as_str) {
        Some(status) => status.to_ascii_lowercase().replace('_', "-"),
        None => status_code(status).to_string(),
    };
    RemoteFailure::new(code, message)
}

fn status_code(status: u16) -> &'static str {
    match status {
        400 => "invalid-argument",
        401 => "unauthenticated",
        403 => "permission-denied",
        404 => "not-found",
        409 => "already-exists",
        429 => "resource-exhausted",
        503 | 504 => "unavailable",
        _ => "unknown",
    }
}
