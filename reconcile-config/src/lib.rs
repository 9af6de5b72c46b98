//! Layered application configuration (SPEC_FULL.md AMBIENT STACK): built-in
//! defaults, then an optional file, then environment variables prefixed
//! `RECONCILE`, mirroring the original's `viper`-backed
//! `config.New(...).Read(&cfg)` layering and its `mapstructure`-tagged
//! `Configuration` struct groupings. This crate has no teacher/example
//! counterpart in the retrieval pack — see DESIGN.md for that
//! pack-enrichment call.

mod error;

use std::collections::HashMap;

use config::{Config, Environment, File};
use serde::Deserialize;

pub use error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub port: u16,
    /// Mounted path prefix for the authenticated `/v1/...` routes, e.g. `/api`.
    pub api_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    /// Upper bound on concurrently `spawn`ed ingestion tasks per workflow.
    pub max_workers: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub level: String,
}

/// One HTTP Basic Auth `(client_id, client_secret)` pair. `AppConfig::basic_auth`
/// is a list, mirroring the original's `[]BasicAuthConfig`, so operators can
/// rotate or add callers without redeploying a single hardcoded pair.
#[derive(Debug, Clone, Deserialize)]
pub struct BasicAuthEntry {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint_url: Option<String>,
    pub allow_http: bool,
}

impl From<StorageSettings> for reconcile_storage::StorageConfig {
    fn from(settings: StorageSettings) -> Self {
        reconcile_storage::StorageConfig {
            bucket: settings.bucket,
            region: settings.region,
            access_key_id: settings.access_key_id,
            secret_access_key: settings.secret_access_key,
            endpoint_url: settings.endpoint_url,
            allow_http: settings.allow_http,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub worker: WorkerSettings,
    pub database: DatabaseSettings,
    pub log: LogSettings,
    #[serde(default)]
    pub basic_auth: Vec<BasicAuthEntry>,
    pub storage: StorageSettings,
}

impl AppConfig {
    /// `client_id -> client_secret`, the shape the HTTP layer's auth
    /// middleware checks requests against.
    pub fn credentials_map(&self) -> HashMap<String, String> {
        self.basic_auth
            .iter()
            .map(|entry| (entry.client_id.clone(), entry.client_secret.clone()))
            .collect()
    }

    /// Loads defaults, then `{config_path}` if present, then `RECONCILE__*`
    /// environment variables (`__` as the nesting separator, e.g.
    /// `RECONCILE__SERVER__PORT`).
    pub fn load(config_path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("server.port", 8080)?
            .set_default("server.api_prefix", "/api")?
            .set_default("worker.max_workers", 8)?
            .set_default("database.max_connections", 5)?
            .set_default("log.level", "info")?
            .set_default("storage.region", "us-east-1")?
            .set_default("storage.allow_http", false)?
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix("RECONCILE").separator("__"));

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
