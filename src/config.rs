//! Configuration management for the entity catalog
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (catalog.toml)
//! - Environment variables (CATALOG__*)
//!
//! ## Example config file (catalog.toml):
//! ```toml
//! [database]
//! path = "./crm.db"
//!
//! [export]
//! dir = "./exports"
//!
//! [auth]
//! username = "admin"
//! password = "admin123"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::Credentials;

/// Main configuration for the catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Login settings
    #[serde(default)]
    pub auth: Credentials,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite file
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory that receives CSV exports
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("catalog.db")
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("exports")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
        }
    }
}

impl CatalogConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering a specific file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["catalog.toml", ".catalog.toml", "config/catalog.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "catalog") {
            let xdg_config = config_dir.config_dir().join("catalog.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // CATALOG__DATABASE__PATH, CATALOG__EXPORT__DIR, ...
        builder = builder.add_source(
            Environment::with_prefix("CATALOG")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Database path (resolves relative paths against the working directory)
    pub fn database_path(&self) -> PathBuf {
        resolve(&self.database.path)
    }

    /// Export directory (resolves relative paths against the working directory)
    pub fn export_dir(&self) -> PathBuf {
        resolve(&self.export.dir)
    }
}

fn resolve(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = CatalogConfig::default();
        assert_eq!(config.database.path, PathBuf::from("catalog.db"));
        assert_eq!(config.export.dir, PathBuf::from("exports"));
        assert_eq!(config.auth.username, "admin");
    }

    #[test]
    fn test_serialize_config() {
        let config = CatalogConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[export]"));
        assert!(toml_str.contains("[auth]"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[database]\npath = \"/tmp/crm.db\"\n").unwrap();

        let config = CatalogConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/crm.db"));
        assert_eq!(config.export.dir, PathBuf::from("exports"));
    }

    #[test]
    fn test_relative_paths_resolve() {
        let config = CatalogConfig::default();
        assert!(config.database_path().is_absolute());
        assert!(config.export_dir().ends_with("exports"));
    }
}
