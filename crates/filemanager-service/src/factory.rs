//! Adapter selection from configuration.

use std::sync::Arc;

use tracing::info;

use filemanager_core::config::AppConfig;
use filemanager_core::error::AppError;
use filemanager_core::result::AppResult;
use filemanager_core::types::{AdapterMode, RequestContext};
use filemanager_database::DatabasePool;
use filemanager_database::migration::ensure_schema;
use filemanager_storage::DiskManager;

use crate::adapter::{DatabaseAdapter, FileManagerAdapter, StorageAdapter};

/// Builds the adapter the configured mode names.
///
/// The mode is parsed when the factory is constructed, so an unknown mode
/// stops start-up instead of failing individual calls.
#[derive(Debug, Clone)]
pub struct AdapterFactory {
    config: AppConfig,
    mode: AdapterMode,
    disks: DiskManager,
    database: Option<DatabasePool>,
    context: RequestContext,
}

impl AdapterFactory {
    /// Create a factory over already-built disks.
    pub fn new(config: AppConfig, disks: DiskManager) -> AppResult<Self> {
        let mode = config.filemanager.mode.parse()?;
        Ok(Self {
            config,
            mode,
            disks,
            database: None,
            context: RequestContext::default(),
        })
    }

    /// Build disks and, in database mode, connect and bootstrap the schema.
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let disks = DiskManager::from_config(&config.disks).await?;
        let mut factory = Self::new(config, disks)?;

        if factory.mode == AdapterMode::Database {
            let db = DatabasePool::connect(&factory.config.database).await?;
            if factory.config.database.auto_migrate {
                ensure_schema(&db, &factory.config.filemanager.table).await?;
            }
            factory.database = Some(db);
        }

        info!(mode = %factory.mode, disk = %factory.config.filemanager.disk, "Adapter factory ready");
        Ok(factory)
    }

    /// Use an existing database pool.
    pub fn with_database(mut self, db: DatabasePool) -> Self {
        self.database = Some(db);
        self
    }

    /// Caller identity handed to every adapter made.
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// The configured mode.
    pub fn mode(&self) -> AdapterMode {
        self.mode
    }

    /// The configuration adapters are built from.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The database pool, in database mode.
    pub fn database(&self) -> Option<&DatabasePool> {
        self.database.as_ref()
    }

    /// Build an adapter for the configured mode and disk.
    pub async fn make(&self) -> AppResult<Arc<dyn FileManagerAdapter>> {
        let disk_name = self.config.filemanager.disk.as_str();
        let disk = self.disks.get(disk_name).await?;

        match self.mode {
            AdapterMode::Storage => {
                let adapter = StorageAdapter::new(disk_name, disk, &self.config)?
                    .with_context(self.context.clone());
                Ok(Arc::new(adapter))
            }
            AdapterMode::Database => {
                let db = self.database.clone().ok_or_else(|| {
                    AppError::configuration("Database mode requires a database connection")
                })?;
                let adapter = DatabaseAdapter::new(db, disk_name, disk, &self.config)?
                    .with_context(self.context.clone());
                Ok(Arc::new(adapter))
            }
        }
    }
}
