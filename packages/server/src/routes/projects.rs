use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use store::{Category, Project, ProjectDraft, Record};

use super::record_id;
use crate::error::ApiError;
use crate::extract::Operator;
use crate::state::{Backend, SharedState};

#[derive(Debug, Default, Deserialize)]
pub struct PublicQuery {
    category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// The gallery as visitors see it. `All` or no category means every category.
pub async fn list_public<B: Backend>(
    State(state): State<SharedState<B>>,
    Query(query): Query<PublicQuery>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let category = query
        .category
        .as_deref()
        .filter(|c| !c.is_empty() && *c != "All")
        .map(str::parse::<Category>)
        .transpose()
        .map_err(ApiError::Validation)?;
    Ok(Json(state.projects.list_public(category).await))
}

pub async fn dashboard<B: Backend>(
    _operator: Operator,
    State(state): State<SharedState<B>>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Project>> {
    Json(state.projects.search(&query.q).await)
}

pub async fn create<B: Backend>(
    _operator: Operator,
    State(state): State<SharedState<B>>,
    Json(draft): Json<ProjectDraft>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    if draft.title.trim().is_empty() {
        return Err(ApiError::Validation("title is required".into()));
    }
    let project = state.projects.add(draft).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update<B: Backend>(
    _operator: Operator,
    State(state): State<SharedState<B>>,
    Path(id): Path<String>,
    Json(draft): Json<ProjectDraft>,
) -> Result<Json<Project>, ApiError> {
    let project = Project::from_draft(record_id(id), draft);
    state
        .projects
        .update(&project)
        .await
        .map_err(ApiError::missing("Project"))?;
    Ok(Json(project))
}

pub async fn toggle_visibility<B: Backend>(
    _operator: Operator,
    State(state): State<SharedState<B>>,
    Path(id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    let id = record_id(id);
    let project = state
        .projects
        .list()
        .await
        .into_iter()
        .find(|p| p.id == id)
        .ok_or(ApiError::NotFound("Project"))?;
    Ok(Json(state.projects.toggle_visibility(&project).await?))
}

pub async fn remove<B: Backend>(
    _operator: Operator,
    State(state): State<SharedState<B>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.projects.delete(&record_id(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
