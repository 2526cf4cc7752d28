//! # Entity and auth services
//!
//! What the presentation layer calls. Entity services never make the caller pick a
//! backend: each operation tries the remote collection and falls back to the local
//! one when [`store::StoreError::is_unavailable`] says the remote cannot be used.
//!
//! | Service | Records | Event |
//! |---------|---------|-------|
//! | [`ProjectService`] | gallery projects | `project-change` |
//! | [`MessageService`] | contact-form messages, newest first | `message-change` |
//! | [`AuthService`] | the operator session | `auth-change` |

mod auth;
mod fallback;
mod messages;
mod projects;

pub use auth::AuthService;
pub use fallback::FallbackCollection;
pub use messages::MessageService;
pub use projects::ProjectService;
