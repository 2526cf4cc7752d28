use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use store::{ProfileUpdate, User};

use crate::error::ApiError;
use crate::extract::Operator;
use crate::state::{Backend, SharedState};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// Sign in. The returned user's `token` authorizes dashboard requests.
pub async fn login<B: Backend>(
    State(state): State<SharedState<B>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<User>, ApiError> {
    let user = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(user))
}

pub async fn logout<B: Backend>(State(state): State<SharedState<B>>) -> StatusCode {
    state.auth.logout().await;
    StatusCode::NO_CONTENT
}

pub async fn me(Operator(user): Operator) -> Json<User> {
    Json(user)
}

pub async fn update_me<B: Backend>(
    _operator: Operator,
    State(state): State<SharedState<B>>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.auth.update_current_user(update).await?))
}
