//! Application configuration.
//!
//! All external collaborator settings (upstream store credentials, configured
//! root groups, token secret) live in an explicit [`AppConfig`] passed into
//! the components that need them. Nothing reads ambient process state at call
//! time; missing upstream configuration fails at startup, before any tree
//! walk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// One independently-configured external folder hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Stable identifier for the group, used as the sync lock key and stored
    /// on every folder record belonging to this hierarchy.
    pub group_id: String,
    /// External id of the hierarchy's root folder.
    pub root_external_id: String,
}

/// Connection settings for the external hierarchical-storage API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Bearer token presented to the upstream listing and byte-stream APIs.
    pub auth_token: String,
}

/// Capability-token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Server-held MAC secret. Never logged.
    pub secret: String,
    /// Token lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub ttl_secs: u64,
}

fn default_token_ttl() -> u64 {
    300
}

fn default_bind_address() -> String {
    "127.0.0.1:9400".to_string()
}

/// Configuration for a docgate server instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path where the folder cache database is stored.
    pub storage_path: PathBuf,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// External root hierarchies to aggregate.
    pub groups: Vec<GroupConfig>,
    pub upstream: UpstreamConfig,
    pub token: TokenConfig,
    /// Shared key required on privileged endpoints (sync trigger, full tree).
    pub admin_key: String,
    /// Shared key the authenticated frontend tier presents on token
    /// issuance.
    pub api_key: String,
}

impl AppConfig {
    /// Validate the configuration, rejecting anything that would otherwise
    /// fail deep inside a sync run or a token issuance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.groups.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one root group must be configured".to_string(),
            ));
        }
        for group in &self.groups {
            if group.group_id.is_empty() || group.root_external_id.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "group '{}' has an empty id or root",
                    group.group_id
                )));
            }
        }
        if self.upstream.base_url.is_empty() {
            return Err(ConfigError::Invalid(
                "upstream base_url is not set".to_string(),
            ));
        }
        if self.upstream.auth_token.is_empty() {
            return Err(ConfigError::Invalid(
                "upstream auth_token is not set".to_string(),
            ));
        }
        if self.token.secret.is_empty() {
            return Err(ConfigError::Invalid(
                "token secret is not set".to_string(),
            ));
        }
        if self.token.ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "token ttl_secs must be positive".to_string(),
            ));
        }
        if self.admin_key.is_empty() {
            return Err(ConfigError::Invalid("admin_key is not set".to_string()));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::Invalid("api_key is not set".to_string()));
        }
        Ok(())
    }
}

/// Load and validate an application configuration from the given path or from
/// the `DOCGATE_CONFIG` environment variable.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let config_path = path
        .map(|p| p.to_string())
        .or_else(|| std::env::var("DOCGATE_CONFIG").ok())
        .unwrap_or_else(|| "config/docgate.json".to_string());

    let config_str = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Read {
        path: config_path.clone(),
        source: e,
    })?;
    let config: AppConfig =
        serde_json::from_str(&config_str).map_err(|e| ConfigError::Parse {
            path: config_path.clone(),
            source: e,
        })?;
    config.validate()?;
    Ok(config)
}
