//! A Firebase project on a loopback port, for exercising the REST clients.
//!
//! Serves `accounts:signInWithPassword`, `accounts:lookup`, the `securetoken` token
//! exchange and document reads. Document requests with the current ID token get the
//! stored documents, a stale token gets `401 UNAUTHENTICATED` and no token at all
//! gets `403 PERMISSION_DENIED`, the way a locked-down Firestore answers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Form, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{any, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::FirebaseConfig;

pub(crate) const EMAIL: &str = "admin@pawlos.dev";
pub(crate) const PASSWORD: &str = "correct horse";

#[derive(Debug)]
struct Project {
    id_token: String,
    refresh_token: String,
    issued: u32,
    sign_in_lifetime: u64,
    refresh_revoked: bool,
    refreshes: u32,
    documents: Vec<Value>,
}

impl Project {
    fn issue(&mut self) {
        self.issued += 1;
        self.id_token = format!("id-{}", self.issued);
        self.refresh_token = format!("refresh-{}", self.issued);
    }
}

type Shared = Arc<Mutex<Project>>;

#[derive(Clone, Debug)]
pub(crate) struct FakeFirebase {
    base: String,
    project: Shared,
}

impl FakeFirebase {
    pub(crate) async fn start() -> Self {
        let project: Shared = Arc::new(Mutex::new(Project {
            id_token: "id-0".into(),
            refresh_token: "refresh-0".into(),
            issued: 0,
            sign_in_lifetime: 3600,
            refresh_revoked: false,
            refreshes: 0,
            documents: Vec::new(),
        }));
        let router = Router::new()
            .route("/identity/v1/accounts:signInWithPassword", post(sign_in))
            .route("/identity/v1/accounts:lookup", post(lookup))
            .route("/securetoken/v1/token", post(token))
            .route("/firestore/{*path}", any(documents))
            .with_state(project.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Self {
            base: format!("http://{addr}"),
            project,
        }
    }

    fn project(&self) -> MutexGuard<'_, Project> {
        self.project.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn config(&self) -> FirebaseConfig {
        FirebaseConfig {
            api_key: "key".into(),
            project_id: "portfolio".into(),
            database: "(default)".into(),
            firestore_url: format!("{}/firestore/v1", self.base),
            auth_url: format!("{}/identity/v1", self.base),
            token_url: format!("{}/securetoken/v1", self.base),
        }
    }

    /// `expiresIn` reported by later sign-ins.
    pub(crate) fn set_sign_in_lifetime(&self, secs: u64) {
        self.project().sign_in_lifetime = secs;
    }

    /// Stop accepting the current ID token, as if it had expired.
    pub(crate) fn expire_id_token(&self) {
        let mut project = self.project();
        project.id_token = format!("id-{}-expired", project.issued);
    }

    /// Refuse every further token exchange.
    pub(crate) fn revoke_refresh_token(&self) {
        self.project().refresh_revoked = true;
    }

    pub(crate) fn refreshes(&self) -> u32 {
        self.project().refreshes
    }

    pub(crate) fn current_refresh_token(&self) -> String {
        self.project().refresh_token.clone()
    }

    pub(crate) fn add_project(&self, id: &str, title: &str) {
        self.project().documents.push(json!({
            "name": format!("projects/portfolio/databases/(default)/documents/projects/{id}"),
            "fields": {
                "title": { "stringValue": title },
                "description": { "stringValue": "remote" },
                "category": { "stringValue": "Development" },
                "visible": { "booleanValue": true },
            },
        }));
    }
}

fn rejected(status: StatusCode, message: &str, reason: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "error": { "code": status.as_u16(), "message": message, "status": reason }
        })),
    )
}

async fn sign_in(State(project): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["email"] != EMAIL || body["password"] != PASSWORD {
        return rejected(StatusCode::BAD_REQUEST, "INVALID_LOGIN_CREDENTIALS", "INVALID_ARGUMENT");
    }
    let mut project = project.lock().unwrap_or_else(PoisonError::into_inner);
    project.issue();
    (
        StatusCode::OK,
        Json(json!({
            "localId": "u1",
            "email": EMAIL,
            "displayName": "",
            "idToken": project.id_token,
            "refreshToken": project.refresh_token,
            "expiresIn": project.sign_in_lifetime.to_string(),
        })),
    )
}

async fn lookup(Json(_): Json<Value>) -> Json<Value> {
    Json(json!({ "users": [{ "localId": "u1", "email": EMAIL }] }))
}

#[derive(Debug, Deserialize)]
struct Exchange {
    grant_type: String,
    refresh_token: String,
}

async fn token(State(project): State<Shared>, Form(form): Form<Exchange>) -> (StatusCode, Json<Value>) {
    let mut project = project.lock().unwrap_or_else(PoisonError::into_inner);
    if form.grant_type != "refresh_token"
        || project.refresh_revoked
        || form.refresh_token != project.refresh_token
    {
        return rejected(StatusCode::BAD_REQUEST, "TOKEN_EXPIRED", "INVALID_ARGUMENT");
    }
    project.refreshes += 1;
    project.issue();
    (
        StatusCode::OK,
        Json(json!({
            "id_token": project.id_token,
            "refresh_token": project.refresh_token,
            "expires_in": "3600",
            "token_type": "Bearer",
            "user_id": "u1",
        })),
    )
}

async fn documents(State(project): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let project = project.lock().unwrap_or_else(PoisonError::into_inner);
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match bearer {
        None => rejected(
            StatusCode::FORBIDDEN,
            "Missing or insufficient permissions.",
            "PERMISSION_DENIED",
        ),
        Some(token) if token != project.id_token => rejected(
            StatusCode::UNAUTHORIZED,
            "Request had invalid authentication credentials.",
            "UNAUTHENTICATED",
        ),
        Some(_) => (
            StatusCode::OK,
            Json(json!({ "documents": project.documents })),
        ),
    }
}
