use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use store::ProfileUpdate;
use tokio::sync::watch;

use super::{AuthProvider, ProviderUser};
use crate::error::ProviderError;

#[derive(Clone, Debug)]
struct Account {
    password: String,
    display_name: Option<String>,
    photo_url: Option<String>,
    disabled: bool,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    session: Option<ProviderUser>,
    sign_in_failure: Option<ProviderError>,
    sign_out_failure: Option<ProviderError>,
    profile_failure: Option<ProviderError>,
    issued_tokens: u64,
}

/// Accounts held in process memory.
///
/// Sign-in validates like the hosted provider does and reports the same
/// `auth/*` codes, so the service's error translation can be exercised without
/// a network.
#[derive(Debug)]
pub struct MemoryAuthProvider {
    inner: Mutex<Inner>,
    sessions: watch::Sender<Option<ProviderUser>>,
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        let (sessions, _) = watch::channel(None);
        Self {
            inner: Mutex::new(Inner::default()),
            sessions,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_account(self, email: &str, password: &str, display_name: Option<&str>) -> Self {
        self.add_account(email, password, display_name);
        self
    }

    pub fn add_account(&self, email: &str, password: &str, display_name: Option<&str>) {
        self.lock().accounts.insert(
            email.to_lowercase(),
            Account {
                password: password.to_string(),
                display_name: display_name.map(str::to_string),
                photo_url: None,
                disabled: false,
            },
        );
    }

    pub fn disable(&self, email: &str) {
        if let Some(account) = self.lock().accounts.get_mut(&email.to_lowercase()) {
            account.disabled = true;
        }
    }

    /// Fail every following sign-in with `failure`, or stop with `None`.
    pub fn fail_sign_in(&self, failure: Option<ProviderError>) {
        self.lock().sign_in_failure = failure;
    }

    pub fn fail_sign_out(&self, failure: Option<ProviderError>) {
        self.lock().sign_out_failure = failure;
    }

    pub fn fail_profile(&self, failure: Option<ProviderError>) {
        self.lock().profile_failure = failure;
    }

    /// The current session, if any.
    pub fn session(&self) -> Option<ProviderUser> {
        self.lock().session.clone()
    }

    /// Install `user` as a session restored from an earlier run and announce it.
    pub fn restore(&self, user: ProviderUser) {
        self.lock().session = Some(user.clone());
        self.sessions.send_replace(Some(user));
    }

    /// Drop the session as if its token expired and announce it.
    pub fn expire_session(&self) {
        self.lock().session = None;
        self.sessions.send_replace(None);
    }
}

impl AuthProvider for MemoryAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError> {
        let mut inner = self.lock();
        if let Some(failure) = &inner.sign_in_failure {
            return Err(failure.clone());
        }

        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(ProviderError::new("auth/invalid-email", "The email address is badly formatted."));
        }
        let Some(account) = inner.accounts.get(&email).cloned() else {
            return Err(ProviderError::new("auth/user-not-found", "There is no user record for this email."));
        };
        if account.disabled {
            return Err(ProviderError::new("auth/user-disabled", "The user account has been disabled."));
        }
        if account.password != password {
            return Err(ProviderError::new("auth/wrong-password", "The password is invalid."));
        }

        inner.issued_tokens += 1;
        let user = ProviderUser {
            uid: format!("uid-{email}"),
            email: Some(email),
            display_name: account.display_name,
            photo_url: account.photo_url,
            id_token: format!("memory-token-{}", inner.issued_tokens),
        };
        inner.session = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let mut inner = self.lock();
        if let Some(failure) = &inner.sign_out_failure {
            return Err(failure.clone());
        }
        inner.session = None;
        Ok(())
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ProviderError> {
        let mut inner = self.lock();
        if let Some(failure) = &inner.profile_failure {
            return Err(failure.clone());
        }
        let Some(session) = inner.session.as_mut() else {
            return Err(ProviderError::new("auth/no-current-user", "No user is signed in."));
        };
        if let Some(name) = &update.name {
            session.display_name = Some(name.clone());
        }
        if let Some(photo_url) = &update.photo_url {
            session.photo_url = Some(photo_url.clone());
        }

        let email = session.email.clone().unwrap_or_default();
        if let Some(account) = inner.accounts.get_mut(&email) {
            if let Some(name) = &update.name {
                account.display_name = Some(name.clone());
            }
            if let Some(photo_url) = &update.photo_url {
                account.photo_url = Some(photo_url.clone());
            }
        }
        Ok(())
    }

    fn has_session(&self) -> bool {
        self.lock().session.is_some()
    }

    fn sessions(&self) -> watch::Receiver<Option<ProviderUser>> {
        self.sessions.subscribe()
    }
}
