//! # API crate — data services for the Pawlos portfolio
//!
//! This crate sits between the presentation layer (the `server` crate) and the two
//! homes of the site's data: a hosted document store, and the local collections of
//! the `store` crate that take over whenever the hosted store cannot be used.
//!
//! ## Modules
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`auth`] | — | Identity providers: in-memory accounts, and Firebase Authentication over REST (`remote`) |
//! | [`config`] | — | `portfolio.toml` / environment configuration |
//! | [`error`] | — | Auth, provider and configuration errors |
//! | [`events`] | — | Change notifications (`project-change`, `message-change`, `auth-change`) |
//! | [`remote`] | partly `remote` | Document client interface, in-memory documents, Firestore over REST |
//! | [`services`] | — | Project, message and auth services with remote → local fallback |
//!
//! ## Construction order
//!
//! Configuration, then storage, then the remote client, then the auth service, then
//! the entity services. The `server` crate does this in `AppState::build`.

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod remote;
pub mod services;

#[cfg(all(test, feature = "remote"))]
mod fake_firebase;

pub use config::PortfolioConfig;
pub use error::{AuthError, ConfigError, ProviderError};
pub use events::{ChangeEvent, EventBus, Subscription};
pub use services::{AuthService, FallbackCollection, MessageService, ProjectService};
