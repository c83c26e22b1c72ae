//! Disk manager: holds the named disks built from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use filemanager_core::config::disk::DiskConfig;
use filemanager_core::error::AppError;
use filemanager_core::result::AppResult;
use filemanager_core::traits::disk::Disk;

use crate::providers::{LocalDisk, MemoryDisk};

/// Registry of named disks.
#[derive(Debug, Clone, Default)]
pub struct DiskManager {
    /// Map of disk name to driver instance.
    disks: Arc<RwLock<HashMap<String, Arc<dyn Disk>>>>,
}

impl DiskManager {
    /// Create a new empty disk manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured disk.
    pub async fn from_config(configs: &HashMap<String, DiskConfig>) -> AppResult<Self> {
        let manager = Self::new();
        for (name, config) in configs {
            let disk = build_disk(config).await?;
            info!(disk = %name, driver = %config.driver, "Registered disk");
            manager.register(name, disk).await;
        }
        Ok(manager)
    }

    /// Register a disk under a name, replacing any previous one.
    pub async fn register(&self, name: &str, disk: Arc<dyn Disk>) {
        let mut disks = self.disks.write().await;
        disks.insert(name.to_string(), disk);
    }

    /// Get a disk by name.
    pub async fn get(&self, name: &str) -> AppResult<Arc<dyn Disk>> {
        let disks = self.disks.read().await;
        disks
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::configuration(format!("Disk '{name}' is not configured")))
    }

    /// List all registered disk names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let disks = self.disks.read().await;
        let mut names: Vec<String> = disks.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Instantiate the driver a disk configuration names.
pub async fn build_disk(config: &DiskConfig) -> AppResult<Arc<dyn Disk>> {
    match config.driver.as_str() {
        "local" => {
            let mut disk = LocalDisk::new(&config.root).await?;
            if let Some(url) = &config.url {
                disk = disk.with_url(url.clone());
            }
            if let Some(key) = &config.signing_key {
                disk = disk.with_signing_key(key.clone());
            }
            Ok(Arc::new(disk))
        }
        "memory" => Ok(Arc::new(MemoryDisk::new(
            config.url.clone(),
            config.signing_key.clone(),
        ))),
        other => Err(AppError::configuration(format!(
            "Unsupported disk driver '{other}'"
        ))),
    }
}
