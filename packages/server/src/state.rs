//! Application state shared by every handler.

use std::sync::Arc;

use api::auth::{AuthProvider, IdentityToolkit};
use api::remote::{DocumentClient, FirestoreClient, RemoteClient};
use api::{AuthService, ConfigError, EventBus, MessageService, PortfolioConfig, ProjectService};
use store::{FileStorage, LocalBackend, Preferences, SharedStorage, StoreError};
use thiserror::Error;

/// The document store and identity provider a server runs against.
pub trait Backend: Send + Sync + 'static {
    type Documents: DocumentClient + Clone + 'static;
    type Identity: AuthProvider + 'static;
}

/// Cloud Firestore plus Firebase Authentication.
pub struct Firebase;

impl Backend for Firebase {
    type Documents = FirestoreClient;
    type Identity = IdentityToolkit;
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not open local storage: {0}")]
    Store(#[from] StoreError),

    #[error("could not bind {0}: {1}")]
    Bind(String, std::io::Error),

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

pub struct AppState<B: Backend> {
    pub config: PortfolioConfig,
    pub events: EventBus,
    pub projects: ProjectService<B::Documents>,
    pub messages: MessageService<B::Documents>,
    pub auth: Arc<AuthService<B::Identity>>,
    pub preferences: Preferences,
}

pub type SharedState<B> = Arc<AppState<B>>;

impl<B: Backend> AppState<B> {
    /// Wire the services over already-constructed storage and remote handles.
    pub fn assemble(
        config: PortfolioConfig,
        storage: SharedStorage,
        documents: B::Documents,
        identity: Arc<B::Identity>,
    ) -> Result<Self, StoreError> {
        let events = EventBus::default();
        let local = LocalBackend::open(storage.clone(), config.local.latency())?;
        let auth = Arc::new(AuthService::new(identity, events.clone()));

        Ok(Self {
            projects: ProjectService::new(documents.clone(), local.projects, events.clone()),
            messages: MessageService::new(documents, local.messages, events.clone()),
            auth,
            preferences: Preferences::new(storage),
            events,
            config,
        })
    }
}

impl AppState<Firebase> {
    /// Config, then storage, then the remote client, then the services. Resumes a
    /// persisted operator session if there is one.
    pub async fn build(config: PortfolioConfig) -> Result<SharedState<Firebase>, StartupError> {
        let data_dir = config.local.data_dir();
        tracing::info!(data_dir = %data_dir.display(), "opening local storage");
        let storage: SharedStorage = Arc::new(FileStorage::new(data_dir));

        let remote = RemoteClient::shared(&config.firebase, storage.clone())?;
        let state = Arc::new(Self::assemble(
            config,
            storage,
            remote.documents.clone(),
            remote.auth.clone(),
        )?);

        state.auth.clone().watch();
        match remote.auth.restore_session().await {
            Ok(Some(user)) => tracing::info!(uid = %user.uid, "operator session resumed"),
            Ok(None) => tracing::debug!("no persisted operator session"),
            Err(e) => tracing::warn!("could not resume operator session: {e}"),
        }
        Ok(state)
    }
}

/// In-process documents and accounts.
#[cfg(test)]
pub(crate) struct InMemory;

#[cfg(test)]
impl Backend for InMemory {
    type Documents = api::remote::MemoryDocuments;
    type Identity = api::auth::MemoryAuthProvider;
}
