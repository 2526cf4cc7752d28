//! # Firebase Authentication over REST
//!
//! Email/password sign-in against the Identity Toolkit API:
//!
//! 1. **[`sign_in`](AuthProvider::sign_in)**: `accounts:signInWithPassword`. The ID
//!    token, its lifetime and the refresh token are kept for document requests and
//!    the session is persisted under [`SESSION_KEY`].
//! 2. **[`id_token`](IdentityToolkit::id_token)**: the token to send with a request,
//!    renewed through the `securetoken` `token` endpoint once it is within
//!    five minutes of expiring. [`renew`](IdentityToolkit::renew) does the same for a
//!    token a server has already rejected.
//! 3. **[`update_profile`](AuthProvider::update_profile)**: `accounts:update` with the
//!    current ID token.
//! 4. **[`restore_session`](IdentityToolkit::restore_session)**: at startup, trades the
//!    persisted refresh token for a fresh ID token, reloads the profile with
//!    `accounts:lookup` and announces the session.
//! 5. **[`sign_out`](AuthProvider::sign_out)**: local only, forgets the tokens and the
//!    persisted session.
//!
//! A refresh token the provider rejects ends the session: it is forgotten and `None`
//! goes out on the session channel. A renewal that fails for lack of network keeps
//! the old token and tries again on the next request.
//!
//! REST errors arrive as upper-case reasons (`INVALID_PASSWORD`, `EMAIL_NOT_FOUND`, ...)
//! and are renamed to the `auth/*` codes the auth service translates.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use store::{ProfileUpdate, SharedStorage};
use tokio::sync::watch;
use tokio::time::Instant;

use super::{AuthProvider, ProviderUser};
use crate::config::FirebaseConfig;
use crate::error::{ConfigError, ProviderError};

/// Storage key of the persisted session.
pub const SESSION_KEY: &str = "pawlos_auth_session";

const NETWORK_FAILED: &str = "auth/network-request-failed";

/// Lifetime assumed when a response does not state one.
const DEFAULT_LIFETIME: Duration = Duration::from_secs(3600);
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    refresh_token: String,
    user: ProviderUser,
}

#[derive(Clone, Debug)]
struct Session {
    stored: StoredSession,
    expires_at: Instant,
}

impl Session {
    fn is_stale(&self) -> bool {
        self.expires_at <= Instant::now() + REFRESH_MARGIN
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default, alias = "profilePicture")]
    photo_url: Option<String>,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug)]
pub struct IdentityToolkit {
    http: Client,
    auth_url: String,
    token_url: String,
    api_key: String,
    storage: SharedStorage,
    session: Mutex<Option<Session>>,
    /// One renewal at a time.
    renewing: tokio::sync::Mutex<()>,
    sessions: watch::Sender<Option<ProviderUser>>,
}

impl IdentityToolkit {
    pub fn new(config: &FirebaseConfig, storage: SharedStorage) -> Result<Self, ConfigError> {
        if config.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("firebase.api_key is empty".into()));
        }
        for (name, url) in [("auth_url", &config.auth_url), ("token_url", &config.token_url)] {
            Url::parse(url)
                .map_err(|e| ConfigError::Invalid(format!("firebase.{name} {url:?}: {e}")))?;
        }

        let (sessions, _) = watch::channel(None);
        Ok(Self {
            http: Client::new(),
            auth_url: config.auth_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            storage,
            session: Mutex::new(None),
            renewing: tokio::sync::Mutex::new(()),
            sessions,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn accounts(&self, method: &str) -> RequestBuilder {
        self.http
            .post(format!("{}/accounts:{method}", self.auth_url))
            .query(&[("key", self.api_key.as_str())])
    }

    fn persist(&self, stored: &StoredSession) {
        match serde_json::to_string(stored) {
            Ok(raw) => {
                if let Err(e) = self.storage.set_item(SESSION_KEY, &raw) {
                    tracing::warn!("could not persist auth session: {e}");
                }
            }
            Err(e) => tracing::warn!("could not encode auth session: {e}"),
        }
    }

    /// Make `stored` current for `lifetime` and persist it.
    fn install(&self, stored: StoredSession, lifetime: Duration) {
        self.persist(&stored);
        *self.lock() = Some(Session {
            stored,
            expires_at: Instant::now() + lifetime,
        });
    }

    fn forget(&self) {
        *self.lock() = None;
        if let Err(e) = self.storage.remove_item(SESSION_KEY) {
            tracing::warn!("could not remove persisted auth session: {e}");
        }
    }

    /// Forget the session and tell the session channel it is gone.
    fn expire(&self) {
        self.forget();
        self.sessions.send_replace(None);
    }

    async fn exchange(&self, refresh_token: &str) -> Result<RefreshResponse, ProviderError> {
        send(
            self.http
                .post(format!("{}/token", self.token_url))
                .query(&[("key", self.api_key.as_str())])
                .form(&[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                ]),
        )
        .await
    }

    /// The ID token of the signed-in operator, renewed first if it is about to
    /// expire. `None` when nobody is signed in or the session just ended.
    pub async fn id_token(&self) -> Option<String> {
        let token = {
            let guard = self.lock();
            let session = guard.as_ref()?;
            if !session.is_stale() {
                return Some(session.stored.user.id_token.clone());
            }
            session.stored.user.id_token.clone()
        };
        self.renew(&token).await
    }

    /// Replace `rejected` with a fresh ID token.
    ///
    /// Returns the current token without a round trip if another caller already
    /// replaced it. Ends the session when the provider refuses the refresh token.
    pub async fn renew(&self, rejected: &str) -> Option<String> {
        let _renewing = self.renewing.lock().await;
        let refresh_token = {
            let guard = self.lock();
            let session = guard.as_ref()?;
            if session.stored.user.id_token != rejected {
                return Some(session.stored.user.id_token.clone());
            }
            session.stored.refresh_token.clone()
        };

        match self.exchange(&refresh_token).await {
            Ok(refreshed) => {
                let mut stored = self.lock().as_ref()?.stored.clone();
                stored.user.id_token = refreshed.id_token.clone();
                stored.refresh_token = refreshed.refresh_token;
                self.install(stored, lifetime(refreshed.expires_in.as_deref()));
                tracing::debug!("renewed ID token");
                Some(refreshed.id_token)
            }
            Err(e) if e.code == NETWORK_FAILED => {
                tracing::warn!("could not renew ID token: {e}");
                Some(rejected.to_string())
            }
            Err(e) => {
                tracing::info!(code = %e.code, "ID token renewal refused, session ended");
                self.expire();
                None
            }
        }
    }

    /// Resume the session persisted by an earlier run.
    ///
    /// Returns `Ok(None)` when nothing was persisted. A refresh token the provider
    /// rejects is discarded; a network failure leaves it in place for the next start.
    pub async fn restore_session(&self) -> Result<Option<ProviderUser>, ProviderError> {
        let raw = match self.storage.get_item(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::warn!("could not read persisted auth session: {e}");
                return Ok(None);
            }
        };
        let stored: StoredSession = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("discarding unreadable auth session: {e}");
                self.forget();
                return Ok(None);
            }
        };

        let refreshed = match self.exchange(&stored.refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                if e.code != NETWORK_FAILED {
                    tracing::info!("persisted auth session rejected ({}), signing out", e.code);
                    self.forget();
                }
                return Err(e);
            }
        };

        let lookup: LookupResponse = send(
            self.accounts("lookup")
                .json(&json!({ "idToken": refreshed.id_token })),
        )
        .await?;
        let user = match lookup.users.into_iter().next() {
            Some(found) => ProviderUser {
                uid: found.local_id,
                email: found.email,
                display_name: found.display_name,
                photo_url: found.photo_url,
                id_token: refreshed.id_token,
            },
            None => ProviderUser {
                id_token: refreshed.id_token,
                ..stored.user
            },
        };

        tracing::info!(uid = %user.uid, "restored auth session");
        self.install(
            StoredSession {
                refresh_token: refreshed.refresh_token,
                user: user.clone(),
            },
            lifetime(refreshed.expires_in.as_deref()),
        );
        self.sessions.send_replace(Some(user.clone()));
        Ok(Some(user))
    }
}

impl AuthProvider for IdentityToolkit {
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError> {
        let body = json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let response: SignInResponse = send(self.accounts("signInWithPassword").json(&body)).await?;

        let user = ProviderUser {
            uid: response.local_id,
            email: response.email,
            display_name: response.display_name,
            photo_url: response.photo_url,
            id_token: response.id_token,
        };
        self.install(
            StoredSession {
                refresh_token: response.refresh_token,
                user: user.clone(),
            },
            lifetime(response.expires_in.as_deref()),
        );
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.forget();
        Ok(())
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ProviderError> {
        let Some(id_token) = self.id_token().await else {
            return Err(ProviderError::new("auth/no-current-user", "No user is signed in."));
        };

        let mut body = json!({
            "idToken": id_token,
            "returnSecureToken": false,
        });
        if let Some(name) = &update.name {
            body["displayName"] = Value::String(name.clone());
        }
        if let Some(photo_url) = &update.photo_url {
            body["photoUrl"] = Value::String(photo_url.clone());
        }
        let _: Value = send(self.accounts("update").json(&body)).await?;

        let stored = {
            let mut guard = self.lock();
            let Some(session) = guard.as_mut() else {
                return Ok(());
            };
            if let Some(name) = &update.name {
                session.stored.user.display_name = Some(name.clone());
            }
            if let Some(photo_url) = &update.photo_url {
                session.stored.user.photo_url = Some(photo_url.clone());
            }
            session.stored.clone()
        };
        self.persist(&stored);
        Ok(())
    }

    fn has_session(&self) -> bool {
        self.lock().is_some()
    }

    fn sessions(&self) -> watch::Receiver<Option<ProviderUser>> {
        self.sessions.subscribe()
    }
}

/// `expiresIn` is a decimal count of seconds.
fn lifetime(expires_in: Option<&str>) -> Duration {
    expires_in
        .and_then(|secs| secs.trim().parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_LIFETIME)
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::new(NETWORK_FAILED, e.to_string()))?;
    if response.status().is_success() {
        return response
            .json()
            .await
            .map_err(|e| ProviderError::new("auth/internal-error", e.to_string()));
    }
    let body = response.text().await.unwrap_or_default();
    Err(parse_error(&body))
}

/// Rename a REST error body to an `auth/*` code.
fn parse_error(body: &str) -> ProviderError {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let message = parsed
        .pointer("/error/message")
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN")
        .to_string();
    // "TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account has been ..."
    let reason = message.split([' ', ':']).next().unwrap_or_default();

    let code = match reason {
        "INVALID_EMAIL" => "auth/invalid-email".to_string(),
        "USER_DISABLED" => "auth/user-disabled".to_string(),
        "EMAIL_NOT_FOUND" => "auth/user-not-found".to_string(),
        "INVALID_PASSWORD" => "auth/wrong-password".to_string(),
        "INVALID_LOGIN_CREDENTIALS" => "auth/invalid-credential".to_string(),
        "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => {
            "auth/operation-not-allowed".to_string()
        }
        "CONFIGURATION_NOT_FOUND" => "auth/configuration-not-found".to_string(),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "auth/too-many-requests".to_string(),
        "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "INVALID_REFRESH_TOKEN" => {
            "auth/user-token-expired".to_string()
        }
        other => format!("auth/{}", other.to_ascii_lowercase().replace('_', "-")),
    };
    ProviderError::new(code, message)
}
