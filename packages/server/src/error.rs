use api::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use store::StoreError;
use thiserror::Error;

/// Handler errors, rendered as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// For writes to an existing record: the document store's `not-found` becomes
    /// a 404 naming `what`.
    pub fn missing(what: &'static str) -> impl FnOnce(StoreError) -> ApiError {
        move |e| match e {
            StoreError::Remote(failure) if failure.code == "not-found" => ApiError::NotFound(what),
            other => ApiError::Store(other),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(AuthError::Network | AuthError::NotConfigured) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Auth(AuthError::Profile(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Store(StoreError::Remote(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::RemoteFailure;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Network).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(StoreError::Remote(RemoteFailure::new("invalid-argument", "x"))).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::missing("Project")(StoreError::Remote(RemoteFailure::new(
                "not-found",
                "No document to update"
            )))
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::missing("Project")(StoreError::Remote(RemoteFailure::unavailable())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Validation("name is required".into()).to_string(),
            "name is required"
        );
    }
}
