//! # Store errors and the availability classifier
//!
//! Every record store, local or remote, fails with [`StoreError`]. Remote failures
//! carry the backend's error code and message as a [`RemoteFailure`] so that one
//! predicate, [`StoreError::is_unavailable`], can decide whether an entity service
//! should fall back to the local collection.

use thiserror::Error;

/// A failure reported by the remote document store.
///
/// `code` uses the kebab-case vocabulary of the Firebase SDKs
/// (`permission-denied`, `unavailable`, `not-found`, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteFailure {
    pub code: String,
    pub message: String,
}

impl RemoteFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn permission_denied() -> Self {
        Self::new(
            "permission-denied",
            "Missing or insufficient permissions.",
        )
    }

    pub fn unavailable() -> Self {
        Self::new("unavailable", "Failed to get document because the client is offline.")
    }
}

impl std::fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("remote store error ({0})")]
    Remote(RemoteFailure),

    #[error("local storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the remote store cannot be used right now.
    ///
    /// This is the only place availability is decided; every service operation
    /// routes through it.
    pub fn is_unavailable(&self) -> bool {
        let StoreError::Remote(failure) = self else {
            return false;
        };
        failure.code == "permission-denied"
            || failure.code == "unavailable"
            || failure.code.contains("offline")
            || failure
                .message
                .contains("Missing or insufficient permissions")
    }
}

impl From<RemoteFailure> for StoreError {
    fn from(failure: RemoteFailure) -> Self {
        StoreError::Remote(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_codes() {
        assert!(StoreError::from(RemoteFailure::permission_denied()).is_unavailable());
        assert!(StoreError::from(RemoteFailure::unavailable()).is_unavailable());
        assert!(StoreError::from(RemoteFailure::new("client-offline", "")).is_unavailable());
        assert!(StoreError::from(RemoteFailure::new(
            "unknown",
            "FirebaseError: Missing or insufficient permissions."
        ))
        .is_unavailable());
    }

    #[test]
    fn test_other_failures_are_not_availability() {
        assert!(!StoreError::from(RemoteFailure::new("not-found", "No document to update"))
            .is_unavailable());
        assert!(!StoreError::from(RemoteFailure::new("invalid-argument", "bad field"))
            .is_unavailable());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        assert!(!StoreError::from(io).is_unavailable());
    }
}
