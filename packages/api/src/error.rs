use thiserror::Error;

/// A failure reported by the authentication provider, with its raw code
/// (`auth/wrong-password`, `auth/network-request-failed`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by the auth service. The login variants display as the fixed
/// messages shown to the operator; provider codes are never part of them.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email address.")]
    InvalidEmail,

    #[error("This user account has been disabled.")]
    UserDisabled,

    #[error("No user found with this email.")]
    UserNotFound,

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Login service not configured. Please contact the administrator.")]
    NotConfigured,

    #[error("Network error. Check your connection.")]
    Network,

    #[error("Login failed. Please check credentials.")]
    Failed,

    #[error("No user logged in")]
    NoCurrentUser,

    #[error("Failed to update profile: {0}")]
    Profile(ProviderError),
}

impl AuthError {
    /// Translate a provider login failure into the operator-facing vocabulary.
    pub fn from_login_failure(error: &ProviderError) -> Self {
        match error.code.as_str() {
            "auth/invalid-email" => AuthError::InvalidEmail,
            "auth/user-disabled" => AuthError::UserDisabled,
            "auth/user-not-found" => AuthError::UserNotFound,
            "auth/wrong-password" | "auth/invalid-credential" => AuthError::InvalidCredentials,
            "auth/configuration-not-found" | "auth/operation-not-allowed" => {
                AuthError::NotConfigured
            }
            "auth/network-request-failed" => AuthError::Network,
            _ => AuthError::Failed,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("could not render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}
