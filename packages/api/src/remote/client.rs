//! Process-wide remote handles using the `OnceLock` pattern.

use std::sync::{Arc, OnceLock};

use store::SharedStorage;

use super::FirestoreClient;
use crate::auth::IdentityToolkit;
use crate::config::FirebaseConfig;
use crate::error::ConfigError;

static CLIENT: OnceLock<RemoteClient> = OnceLock::new();

/// The document store and identity provider of one remote project. Document
/// requests carry the provider's ID token.
#[derive(Clone, Debug)]
pub struct RemoteClient {
    config: FirebaseConfig,
    pub documents: FirestoreClient,
    pub auth: Arc<IdentityToolkit>,
}

impl RemoteClient {
    /// Build a fresh client. Fails on an empty api key or project id and on
    /// endpoints that are not URLs.
    pub fn new(config: &FirebaseConfig, storage: SharedStorage) -> Result<Self, ConfigError> {
        let auth = Arc::new(IdentityToolkit::new(config, storage)?);
        let documents = FirestoreClient::new(config, Some(auth.clone()))?;
        tracing::debug!(project = %config.project_id, database = %config.database, "remote client ready");
        Ok(Self {
            config: config.clone(),
            documents,
            auth,
        })
    }

    /// The client of this process, built on first use.
    ///
    /// Later calls return the same client whatever settings they pass; a mismatch
    /// is logged rather than treated as an error.
    pub fn shared(
        config: &FirebaseConfig,
        storage: SharedStorage,
    ) -> Result<&'static RemoteClient, ConfigError> {
        if let Some(existing) = CLIENT.get() {
            if existing.config != *config {
                tracing::warn!(
                    project = %existing.config.project_id,
                    requested = %config.project_id,
                    "remote client already initialized with different settings, keeping it"
                );
            }
            return Ok(existing);
        }
        let client = Self::new(config, storage)?;
        Ok(CLIENT.get_or_init(|| client))
    }

    pub fn config(&self) -> &FirebaseConfig {
        &self.config
    }
}
