//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Defaults applied to new profiles.
    #[serde(default)]
    pub profile: ProfileConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Local file storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory uploaded files are written to.
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    /// URL prefix under which stored files are served.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            base_url: default_base_url(),
        }
    }
}

/// Profile defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileConfig {
    /// School assigned when registration leaves it blank.
    #[serde(default = "default_school")]
    pub default_school: String,
    /// Storage key of the placeholder profile photo.
    #[serde(default = "default_photo")]
    pub default_photo: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            default_school: default_school(),
            default_photo: default_photo(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_base_path() -> PathBuf {
    PathBuf::from("./media")
}

fn default_base_url() -> String {
    "/media".to_string()
}

fn default_school() -> String {
    "ENSAE Dakar".to_string()
}

fn default_photo() -> String {
    "profils/default_profile.jpeg".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `NOXA_ENV`)
    /// 3. Environment variables with `NOXA_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("NOXA_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("NOXA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("NOXA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults() {
        let profile = ProfileConfig::default();
        assert_eq!(profile.default_school, "ENSAE Dakar");
        assert_eq!(profile.default_photo, "profils/default_profile.jpeg");
    }

    #[test]
    fn test_minimal_config_fills_defaults() {
        let raw = config::Config::builder()
            .set_override("server.url", "http://localhost:8000")
            .unwrap()
            .set_override("database.url", "postgres://localhost/noxa")
            .unwrap()
            .build()
            .unwrap();
        let config: Config = raw.try_deserialize().unwrap();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.storage.base_url, "/media");
        assert_eq!(config.profile.default_school, "ENSAE Dakar");
    }
}
