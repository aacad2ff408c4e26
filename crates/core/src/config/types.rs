use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::catalog_source::LeetCodeConfig;
use crate::sync::SyncConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub catalog_source: LeetCodeConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("drillbook.db")
}

/// Statistics defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatsConfig {
    /// Ranking length used when a request doesn't ask for one.
    #[serde(default = "default_top_n")]
    pub top_n: i64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

fn default_top_n() -> i64 {
    10
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub catalog_source: SanitizedCatalogSourceConfig,
    pub sync: SyncConfig,
    pub stats: StatsConfig,
}

/// Sanitized catalog source config (session token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCatalogSourceConfig {
    pub endpoint: String,
    pub category_slug: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub session_token_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let source = &config.catalog_source;
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            catalog_source: SanitizedCatalogSourceConfig {
                endpoint: source.endpoint.clone(),
                category_slug: source.category_slug.clone(),
                user_agent: source.user_agent.clone(),
                timeout_secs: source.timeout_secs,
                session_token_configured: source
                    .session_token
                    .as_deref()
                    .is_some_and(|t| !t.is_empty()),
            },
            sync: config.sync.clone(),
            stats: config.stats.clone(),
        }
    }
}
