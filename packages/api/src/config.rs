//! # Site configuration (`portfolio.toml`)
//!
//! Settings are layered with the `config` crate, later sources winning:
//!
//! 1. built-in defaults,
//! 2. an optional `portfolio.toml` in the working directory,
//! 3. environment variables prefixed `PORTFOLIO__` with `__` between sections
//!    (`PORTFOLIO__FIREBASE__API_KEY`, `PORTFOLIO__LOCAL__LATENCY_MS`).
//!
//! A `.env` file is read first through `dotenvy`, so its variables take part in
//! step 3.
//!
//! ```toml
//! [firebase]
//! api_key = "AIza..."
//! project_id = "my-portfolio"
//! database = "(default)"
//! firestore_url = "https://firestore.googleapis.com/v1"  # emulator: http://localhost:8080/v1
//!
//! [local]
//! data_dir = "/var/lib/pawlos"   # defaults to the platform data dir
//! latency_ms = 400
//!
//! [server]
//! bind = "127.0.0.1:8080"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_FILE: &str = "portfolio.toml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    pub firebase: FirebaseConfig,
    pub local: LocalConfig,
    pub server: ServerConfig,
}

/// Remote project settings. Endpoints are overridable for the emulator suite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub database: String,
    pub firestore_url: String,
    pub auth_url: String,
    pub token_url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    pub latency_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    builder
        .set_default("firebase.api_key", "")?
        .set_default("firebase.project_id", "")?
        .set_default("firebase.database", "(default)")?
        .set_default("firebase.firestore_url", "https://firestore.googleapis.com/v1")?
        .set_default("firebase.auth_url", "https://identitytoolkit.googleapis.com/v1")?
        .set_default("firebase.token_url", "https://securetoken.googleapis.com/v1")?
        .set_default("local.latency_ms", 400)?
        .set_default("server.bind", "127.0.0.1:8080")
}

impl PortfolioConfig {
    /// Load `.env`, then `portfolio.toml` (if present), then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load_file(DEFAULT_FILE)
    }

    /// Defaults, then `path` (optional), then the environment.
    pub fn load_file(path: &str) -> Result<Self, ConfigError> {
        let config = with_defaults(Config::builder())?
            .add_source(File::with_name(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("PORTFOLIO")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Defaults overlaid with a TOML document, ignoring the environment.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config = with_defaults(Config::builder())?
            .add_source(File::from_str(s, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Render the effective configuration.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl LocalConfig {
    /// Directory holding the local collections: the configured one, or
    /// `<platform data dir>/pawlos`.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("pawlos")
        })
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = PortfolioConfig::from_toml("").unwrap();
        assert_eq!(config.firebase.database, "(default)");
        assert_eq!(config.firebase.firestore_url, "https://firestore.googleapis.com/v1");
        assert!(config.firebase.api_key.is_empty());
        assert_eq!(config.local.latency(), Duration::from_millis(400));
        assert_eq!(config.local.data_dir, None);
        assert!(config.local.data_dir().ends_with("pawlos"));
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_document_overrides_defaults() {
        let config = PortfolioConfig::from_toml(
            r#"
            [firebase]
            api_key = "key"
            project_id = "portfolio"
            firestore_url = "http://localhost:8081/v1"

            [local]
            data_dir = "/tmp/pawlos-test"
            latency_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.firebase.api_key, "key");
        assert_eq!(config.firebase.project_id, "portfolio");
        assert_eq!(config.firebase.firestore_url, "http://localhost:8081/v1");
        assert_eq!(config.firebase.auth_url, "https://identitytoolkit.googleapis.com/v1");
        assert_eq!(config.local.data_dir(), PathBuf::from("/tmp/pawlos-test"));
        assert!(config.local.latency().is_zero());
    }

    #[test]
    fn test_toml_render_reloads() {
        let config = PortfolioConfig::from_toml("[firebase]\nproject_id = \"p\"\n").unwrap();
        let rendered = config.to_toml().unwrap();
        assert_eq!(PortfolioConfig::from_toml(&rendered).unwrap(), config);
    }
}
