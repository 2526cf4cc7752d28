//! # Authentication providers
//!
//! The auth service talks to an identity provider through [`AuthProvider`]:
//!
//! - [`MemoryAuthProvider`]: in-process accounts with failure injection, for tests.
//! - [`IdentityToolkit`]: Firebase Authentication over its REST API (feature
//!   `remote`), persisting the session so it survives restarts.
//!
//! Explicit sign-in and sign-out return their outcome directly. The
//! [`sessions`](AuthProvider::sessions) channel only carries transitions the
//! provider makes on its own: a session restored at startup, or one that expired.

mod memory;

#[cfg(feature = "remote")]
mod identity_toolkit;

use std::future::Future;

use serde::{Deserialize, Serialize};
use store::{ProfileUpdate, User};
use tokio::sync::watch;

use crate::error::ProviderError;

pub use memory::MemoryAuthProvider;

#[cfg(feature = "remote")]
pub use identity_toolkit::{IdentityToolkit, SESSION_KEY};

/// Fallback display name when the provider knows neither a name nor an email.
pub const DEFAULT_NAME: &str = "Admin";
/// Title given to every signed-in operator.
pub const DEFAULT_TITLE: &str = "Administrator";

/// A signed-in account as the provider reports it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUser {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub id_token: String,
}

impl ProviderUser {
    /// The operator this account represents.
    pub fn to_user(&self) -> User {
        let email = self.email.clone().unwrap_or_default();
        let name = self
            .display_name
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| {
                email
                    .split('@')
                    .next()
                    .filter(|local| !local.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_NAME.to_string());

        User {
            email,
            name,
            photo_url: self.photo_url.clone(),
            title: Some(DEFAULT_TITLE.to_string()),
            token: Some(self.id_token.clone()),
        }
    }
}

pub trait AuthProvider: Send + Sync {
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<ProviderUser, ProviderError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Change the display name and photo of the signed-in account. Fields absent
    /// from `update` are left alone; `title` is not a provider field.
    fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    fn has_session(&self) -> bool;

    fn sessions(&self) -> watch::Receiver<Option<ProviderUser>>;
}
