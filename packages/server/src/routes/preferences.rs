use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::{Backend, SharedState};

pub async fn mute<B: Backend>(State(state): State<SharedState<B>>) -> Result<Json<Value>, ApiError> {
    Ok(Json(json!({ "muted": state.preferences.is_muted()? })))
}

pub async fn toggle_mute<B: Backend>(
    State(state): State<SharedState<B>>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(json!({ "muted": state.preferences.toggle_mute()? })))
}
