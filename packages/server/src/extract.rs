use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use store::User;

use crate::error::ApiError;
use crate::state::{Backend, SharedState};

/// The signed-in operator. Dashboard handlers take this to require a login.
///
/// The request must carry the operator's ID token as a bearer token.
#[derive(Clone, Debug)]
pub struct Operator(pub User);

impl<B: Backend> FromRequestParts<SharedState<B>> for Operator {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState<B>,
    ) -> Result<Self, Self::Rejection> {
        let Some(user) = state.auth.current_user() else {
            return Err(ApiError::Unauthorized);
        };
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthorized)?;

        match user.token.as_deref() {
            Some(token) if token == bearer.token() => Ok(Operator(user)),
            _ => {
                tracing::debug!("rejected dashboard request with stale token");
                Err(ApiError::Unauthorized)
            }
        }
    }
}
