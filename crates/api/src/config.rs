//! Application configuration: optional `inkworks.toml`, then `INKWORKS__*`
//! environment variables (e.g. `INKWORKS__SERVER__PORT=9000`).

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use inkworks_infra::EngineConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("storage.database_url is required for the postgres backend")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
}

impl StorageConfig {
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("inkworks").required(false))
            .add_source(Environment::with_prefix("INKWORKS").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        if cfg.storage.backend == StorageBackend::Postgres {
            cfg.storage.database_url()?;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(raw: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_source_uses_defaults() {
        let cfg = from_toml("");
        assert_eq!(cfg.server.bind_addr(), "0.0.0.0:8080");
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.engine, EngineConfig::default());
    }

    #[test]
    fn sections_override_individually() {
        let cfg = from_toml(
            r#"
            [server]
            port = 9100

            [engine]
            max_conflict_retries = 5

            [storage]
            backend = "postgres"
            database_url = "postgres://localhost/inkworks"
            "#,
        );
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.engine.max_conflict_retries, 5);
        assert_eq!(cfg.engine.draft_prefix, "DRAFT-");
        assert_eq!(cfg.storage.database_url().unwrap(), "postgres://localhost/inkworks");
    }

    #[test]
    fn blank_database_url_is_missing() {
        let storage = StorageConfig {
            backend: StorageBackend::Postgres,
            database_url: Some("  ".to_string()),
        };
        assert!(matches!(storage.database_url(), Err(ConfigError::MissingDatabaseUrl)));
    }
}
