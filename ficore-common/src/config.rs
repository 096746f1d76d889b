//! Configuration loading and database path resolution
//!
//! Resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable config file is never fatal: it is logged and the
//! compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "FICORE_CONFIG";

/// Environment variable naming the database file
pub const DATABASE_ENV: &str = "FICORE_DATABASE";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5800;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FicoreConfig {
    pub database_path: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl Default for FicoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl FicoreConfig {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// `host:port` for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Find the config file: CLI, then `FICORE_CONFIG`, then the user and
/// system locations. Returns `None` when nothing exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_locations()
        .into_iter()
        .find(|path| path.exists())
}

/// `~/.config/ficore/config.toml`, then `/etc/ficore/config.toml`
fn default_config_locations() -> Vec<PathBuf> {
    let mut locations = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("ficore").join("config.toml"));
    }
    if cfg!(unix) {
        locations.push(PathBuf::from("/etc/ficore/config.toml"));
    }
    locations
}

/// Where the loaded config came from
///
/// Binaries load config before logging is up (the file picks the log
/// level), so the outcome is reported afterwards with [`ConfigOrigin::log`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOrigin {
    File(PathBuf),
    Defaults,
    Invalid { path: PathBuf, reason: String },
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            ConfigOrigin::File(path) => info!("Loaded config from {}", path.display()),
            ConfigOrigin::Defaults => warn!("No config file found, using compiled defaults"),
            ConfigOrigin::Invalid { path, reason } => warn!(
                "Could not load config {}: {}. Using compiled defaults",
                path.display(),
                reason
            ),
        }
    }
}

/// Load the config, falling back to defaults when missing or invalid
pub fn load_config(cli_arg: Option<&Path>) -> (FicoreConfig, ConfigOrigin) {
    let Some(path) = resolve_config_path(cli_arg) else {
        return (FicoreConfig::default(), ConfigOrigin::Defaults);
    };

    match FicoreConfig::from_file(&path) {
        Ok(config) => (config, ConfigOrigin::File(path)),
        Err(e) => (
            FicoreConfig::default(),
            ConfigOrigin::Invalid {
                path,
                reason: e.to_string(),
            },
        ),
    }
}

/// Database file: CLI, then `FICORE_DATABASE`, then config, then default
pub fn resolve_database_path(cli_arg: Option<&Path>, config: &FicoreConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATABASE_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.database_path {
        return path.clone();
    }

    default_database_path()
}

/// `<local data dir>/ficore/ficore.db`
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ficore"))
        .unwrap_or_else(|| PathBuf::from("./ficore_data"))
        .join("ficore.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FicoreConfig::default();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.bind_address(), "127.0.0.1:5800");
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: FicoreConfig = toml::from_str("port = 9000").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, DEFAULT_HOST);
    }

    #[test]
    fn test_cli_database_path_wins() {
        let config = FicoreConfig {
            database_path: Some(PathBuf::from("/from/config.db")),
            ..Default::default()
        };
        let path = resolve_database_path(Some(Path::new("/from/cli.db")), &config);
        assert_eq!(path, PathBuf::from("/from/cli.db"));
    }

    #[test]
    fn test_default_database_path_file_name() {
        let path = default_database_path();
        assert_eq!(path.file_name().unwrap(), "ficore.db");
        assert!(path.parent().unwrap().ends_with("ficore"));
    }
}
