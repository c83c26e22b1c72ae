//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Adapters receive the sections they need at construction time
//! and never consult global state.

pub mod database;
pub mod disk;
pub mod filemanager;
pub mod logging;
pub mod security;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use self::database::DatabaseConfig;
use self::disk::DiskConfig;
use self::filemanager::{FileManagerConfig, ThumbnailConfig};
use self::logging::LoggingConfig;
use self::security::{FileSecurityConfig, UrlConfig};

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Adapter selection and behaviour.
    #[serde(default)]
    pub filemanager: FileManagerConfig,
    /// Metadata database settings (database mode only).
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Named disks available to the adapters.
    #[serde(default = "default_disks")]
    pub disks: HashMap<String, DiskConfig>,
    /// Upload validation settings.
    #[serde(default)]
    pub security: FileSecurityConfig,
    /// URL generation settings.
    #[serde(default)]
    pub urls: UrlConfig,
    /// Thumbnail generation settings.
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            filemanager: FileManagerConfig::default(),
            database: DatabaseConfig::default(),
            disks: default_disks(),
            security: FileSecurityConfig::default(),
            urls: UrlConfig::default(),
            thumbnails: ThumbnailConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Merges the given file with an optional environment overlay
    /// (`config/{env}.toml`) and environment variables prefixed with
    /// `FILEMANAGER__`.
    pub fn load(path: &str, env: Option<&str>) -> Result<Self, AppError> {
        let mut builder =
            config::Config::builder().add_source(config::File::with_name(path).required(false));

        if let Some(env) = env {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("FILEMANAGER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Look up the disk the adapters are bound to.
    pub fn active_disk(&self) -> Result<&DiskConfig, AppError> {
        self.disks.get(&self.filemanager.disk).ok_or_else(|| {
            AppError::configuration(format!(
                "Disk '{}' is not configured",
                self.filemanager.disk
            ))
        })
    }
}

fn default_disks() -> HashMap<String, DiskConfig> {
    let mut disks = HashMap::new();
    disks.insert("public".to_string(), DiskConfig::default());
    disks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_active_disk() {
        let config = AppConfig::default();
        let disk = config.active_disk().unwrap();
        assert_eq!(disk.driver, "local");
        assert_eq!(config.filemanager.mode, "database");
    }

    #[test]
    fn test_unknown_disk_is_configuration_error() {
        let mut config = AppConfig::default();
        config.filemanager.disk = "missing".to_string();
        let err = config.active_disk().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load("does/not/exist", None).unwrap();
        assert_eq!(config.filemanager.root, "uploads");
        assert_eq!(config.filemanager.max_depth, 50);
    }
}
