use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use store::Message;

use super::record_id;
use crate::error::ApiError;
use crate::extract::Operator;
use crate::state::{Backend, SharedState};

/// The public contact form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    name: String,
    email: String,
    content: String,
}

impl ContactForm {
    fn validate(&self) -> Result<(), ApiError> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("content", &self.content),
        ] {
            if value.trim().is_empty() {
                return Err(ApiError::Validation(format!("{field} is required")));
            }
        }
        Ok(())
    }
}

pub async fn send<B: Backend>(
    State(state): State<SharedState<B>>,
    Json(form): Json<ContactForm>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    form.validate()?;
    let message = state
        .messages
        .send(form.name, form.email, form.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn list<B: Backend>(
    _operator: Operator,
    State(state): State<SharedState<B>>,
) -> Json<Vec<Message>> {
    Json(state.messages.list().await)
}

pub async fn unread<B: Backend>(
    _operator: Operator,
    State(state): State<SharedState<B>>,
) -> Json<Value> {
    Json(json!({ "count": state.messages.unread_count().await }))
}

pub async fn mark_read<B: Backend>(
    _operator: Operator,
    State(state): State<SharedState<B>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .messages
        .mark_read(&record_id(id))
        .await
        .map_err(ApiError::missing("Message"))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove<B: Backend>(
    _operator: Operator,
    State(state): State<SharedState<B>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.messages.delete(&record_id(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
