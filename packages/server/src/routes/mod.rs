//! # HTTP routes
//!
//! | Route | Access | Purpose |
//! |-------|--------|---------|
//! | `GET /api/projects?category=` | public | visible projects, optionally one category |
//! | `POST /api/messages` | public | contact form |
//! | `POST /api/auth/login`, `POST /api/auth/logout` | public | operator session |
//! | `GET /api/preferences/mute`, `POST /api/preferences/mute/toggle` | public | sound preference |
//! | `GET /api/events` | public | server-sent change events |
//! | `GET /api/dashboard/projects?q=` | operator | every project, searchable |
//! | `POST /api/projects`, `PUT`/`DELETE /api/projects/{id}`, `POST /api/projects/{id}/visibility` | operator | gallery editing |
//! | `GET /api/messages`, `GET /api/messages/unread`, `POST /api/messages/{id}/read`, `DELETE /api/messages/{id}` | operator | inbox |
//! | `GET`/`PATCH /api/auth/me` | operator | profile |
//!
//! Operator routes need `Authorization: Bearer <token>` with the token returned by
//! login; anything else is a 401.

mod auth;
mod events;
mod messages;
mod preferences;
mod projects;

use axum::routing::{delete, get, post, put};
use axum::Router;
use store::RecordId;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::{Backend, SharedState};

pub fn router<B: Backend>(state: SharedState<B>) -> Router {
    Router::new()
        .route(
            "/api/projects",
            get(projects::list_public::<B>).post(projects::create::<B>),
        )
        .route(
            "/api/projects/{id}",
            put(projects::update::<B>).delete(projects::remove::<B>),
        )
        .route(
            "/api/projects/{id}/visibility",
            post(projects::toggle_visibility::<B>),
        )
        .route("/api/dashboard/projects", get(projects::dashboard::<B>))
        .route(
            "/api/messages",
            get(messages::list::<B>).post(messages::send::<B>),
        )
        .route("/api/messages/unread", get(messages::unread::<B>))
        .route("/api/messages/{id}/read", post(messages::mark_read::<B>))
        .route("/api/messages/{id}", delete(messages::remove::<B>))
        .route("/api/auth/login", post(auth::login::<B>))
        .route("/api/auth/logout", post(auth::logout::<B>))
        .route("/api/auth/me", get(auth::me).patch(auth::update_me::<B>))
        .route("/api/preferences/mute", get(preferences::mute::<B>))
        .route(
            "/api/preferences/mute/toggle",
            post(preferences::toggle_mute::<B>),
        )
        .route("/api/events", get(events::stream::<B>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Path ids: seeded records have numeric ids, everything else strings.
fn record_id(raw: String) -> RecordId {
    match raw.parse::<i64>() {
        Ok(n) => RecordId::Number(n),
        Err(_) => RecordId::Text(raw),
    }
}
