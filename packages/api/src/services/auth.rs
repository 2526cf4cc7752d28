use std::sync::{Arc, PoisonError, RwLock};

use store::{ProfileUpdate, User};
use tokio::task::JoinHandle;

use crate::auth::{AuthProvider, ProviderUser};
use crate::error::AuthError;
use crate::events::{ChangeEvent, EventBus};

/// The operator session: anonymous, or authenticated as one [`User`].
///
/// Every transition, whether from [`login`](Self::login), [`logout`](Self::logout),
/// a profile edit or the provider's own session channel, publishes
/// [`ChangeEvent::Auth`].
#[derive(Debug)]
pub struct AuthService<P> {
    provider: Arc<P>,
    current: RwLock<Option<User>>,
    events: EventBus,
}

impl<P: AuthProvider + 'static> AuthService<P> {
    pub fn new(provider: Arc<P>, events: EventBus) -> Self {
        Self {
            provider,
            current: RwLock::new(None),
            events,
        }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    fn set_current(&self, user: Option<User>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = user;
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let account = self.provider.sign_in(email, password).await.map_err(|e| {
            tracing::info!(code = %e.code, "login rejected");
            AuthError::from_login_failure(&e)
        })?;

        let user = account.to_user();
        tracing::info!(email = %user.email, "operator logged in");
        self.set_current(Some(user.clone()));
        self.events.publish(ChangeEvent::Auth);
        Ok(user)
    }

    /// Always ends anonymous, even if the provider fails to sign out.
    pub async fn logout(&self) {
        if let Err(e) = self.provider.sign_out().await {
            tracing::warn!("provider sign-out failed: {e}");
        }
        self.set_current(None);
        self.events.publish(ChangeEvent::Auth);
    }

    pub async fn update_current_user(&self, update: ProfileUpdate) -> Result<User, AuthError> {
        if self.current_user().is_none() {
            return Err(AuthError::NoCurrentUser);
        }
        if self.provider.has_session() {
            self.provider
                .update_profile(&update)
                .await
                .map_err(AuthError::Profile)?;
        }

        let updated = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            let user = current.as_mut().ok_or(AuthError::NoCurrentUser)?;
            user.apply(&update);
            user.clone()
        };
        self.events.publish(ChangeEvent::Auth);
        Ok(updated)
    }

    pub fn current_user(&self) -> Option<User> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    fn apply_session(&self, session: Option<ProviderUser>) {
        match session {
            Some(account) => {
                let user = account.to_user();
                tracing::info!(email = %user.email, "provider session restored");
                self.set_current(Some(user));
            }
            None => {
                tracing::info!("provider session ended");
                self.set_current(None);
            }
        }
        self.events.publish(ChangeEvent::Auth);
    }

    /// Follow the provider's session channel until the provider goes away.
    pub fn watch(self: Arc<Self>) -> JoinHandle<()> {
        let mut sessions = self.provider.sessions();
        tokio::spawn(async move {
            while sessions.changed().await.is_ok() {
                let session = sessions.borrow_and_update().clone();
                self.apply_session(session);
            }
            tracing::debug!("auth session channel closed");
        })
    }
}
