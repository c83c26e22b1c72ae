//! Shared fixtures for adapter integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use filemanager_core::config::AppConfig;
use filemanager_core::config::disk::DiskConfig;
use filemanager_core::error::AppError;
use filemanager_core::result::AppResult;
use filemanager_core::traits::disk::{ByteStream, Disk, DiskObjectMeta};
use filemanager_database::DatabasePool;
use filemanager_database::migration::ensure_schema;
use filemanager_entity::FileManagerItem;
use filemanager_service::{DatabaseAdapter, StorageAdapter};
use filemanager_storage::providers::MemoryDisk;

/// Configuration with a single in-memory disk named `public` and the
/// adapters confined to `uploads`.
pub fn test_config(mode: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.filemanager.mode = mode.to_string();
    config.filemanager.disk = "public".to_string();
    config.filemanager.root = "uploads".to_string();
    config.database.url = "sqlite::memory:".to_string();
    config.disks = HashMap::from([(
        "public".to_string(),
        DiskConfig {
            driver: "memory".to_string(),
            root: String::new(),
            url: Some("https://files.test".to_string()),
            signing_key: Some("test-key".to_string()),
        },
    )]);
    config
}

/// Storage adapter over a fresh memory disk.
pub fn storage_adapter(config: &AppConfig) -> (StorageAdapter, Arc<MemoryDisk>) {
    let disk = Arc::new(MemoryDisk::new(
        Some("https://files.test".to_string()),
        Some("test-key".to_string()),
    ));
    let adapter = StorageAdapter::new("public", disk.clone(), config).unwrap();
    (adapter, disk)
}

/// Database adapter over a fresh in-memory SQLite database.
pub async fn database_adapter(config: &AppConfig) -> (DatabaseAdapter, Arc<MemoryDisk>) {
    let db = DatabasePool::in_memory().await.unwrap();
    ensure_schema(&db, &config.filemanager.table).await.unwrap();
    let disk = Arc::new(MemoryDisk::new(
        Some("https://files.test".to_string()),
        Some("test-key".to_string()),
    ));
    let adapter = DatabaseAdapter::new(db, "public", disk.clone(), config).unwrap();
    (adapter, disk)
}

/// Names of items in listing order.
pub fn names(items: &[FileManagerItem]) -> Vec<String> {
    items.iter().map(|i| i.name().to_string()).collect()
}

/// Stored blob path of a database-backed item.
pub fn storage_path(item: &FileManagerItem) -> Option<String> {
    match item {
        FileManagerItem::Database(item) => item.record().storage_path.clone(),
        FileManagerItem::Storage(_) => None,
    }
}

/// Memory disk whose `delete_dir` fails for one path.
#[derive(Debug)]
pub struct StuckDirDisk {
    pub inner: MemoryDisk,
    pub stuck: String,
}

#[async_trait]
impl Disk for StuckDirDisk {
    fn driver(&self) -> &str {
        self.inner.driver()
    }

    async fn list(&self, path: &str) -> AppResult<Vec<DiskObjectMeta>> {
        self.inner.list(path).await
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        self.inner.exists(path).await
    }

    async fn is_directory(&self, path: &str) -> AppResult<bool> {
        self.inner.is_directory(path).await
    }

    async fn metadata(&self, path: &str) -> AppResult<DiskObjectMeta> {
        self.inner.metadata(path).await
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        self.inner.read_bytes(path).await
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        self.inner.write(path, data).await
    }

    async fn create_dir(&self, path: &str) -> AppResult<()> {
        self.inner.create_dir(path).await
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.inner.delete(path).await
    }

    async fn delete_dir(&self, path: &str) -> AppResult<()> {
        if path == self.stuck {
            return Err(AppError::storage("Directory is busy"));
        }
        self.inner.delete_dir(path).await
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        self.inner.copy(from, to).await
    }

    async fn rename(&self, from: &str, to: &str) -> AppResult<()> {
        self.inner.rename(from, to).await
    }

    fn url(&self, path: &str) -> Option<String> {
        self.inner.url(path)
    }

    fn supports_temporary_urls(&self) -> bool {
        self.inner.supports_temporary_urls()
    }

    async fn temporary_url(&self, path: &str, ttl: Duration) -> AppResult<String> {
        self.inner.temporary_url(path, ttl).await
    }
}

/// Memory disk that streams files in small chunks and counts what it hands
/// out. Whole-file reads are refused.
#[derive(Debug)]
pub struct ChunkedDisk {
    pub inner: MemoryDisk,
    chunk: usize,
    served: Arc<AtomicUsize>,
}

impl ChunkedDisk {
    pub fn new(chunk: usize) -> Self {
        Self {
            inner: MemoryDisk::new(
                Some("https://files.test".to_string()),
                Some("test-key".to_string()),
            ),
            chunk,
            served: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bytes pulled from read streams so far.
    pub fn served(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Disk for ChunkedDisk {
    fn driver(&self) -> &str {
        self.inner.driver()
    }

    async fn list(&self, path: &str) -> AppResult<Vec<DiskObjectMeta>> {
        self.inner.list(path).await
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        self.inner.exists(path).await
    }

    async fn is_directory(&self, path: &str) -> AppResult<bool> {
        self.inner.is_directory(path).await
    }

    async fn metadata(&self, path: &str) -> AppResult<DiskObjectMeta> {
        self.inner.metadata(path).await
    }

    async fn read_bytes(&self, _path: &str) -> AppResult<Bytes> {
        Err(AppError::storage("Whole-file reads are disabled"))
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let data = self.inner.read_bytes(path).await?;
        let chunks: Vec<Bytes> = data.chunks(self.chunk).map(Bytes::copy_from_slice).collect();
        let served = self.served.clone();
        Ok(Box::pin(futures::stream::iter(chunks).map(move |chunk| {
            served.fetch_add(chunk.len(), Ordering::SeqCst);
            Ok::<_, std::io::Error>(chunk)
        })))
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        self.inner.write(path, data).await
    }

    async fn create_dir(&self, path: &str) -> AppResult<()> {
        self.inner.create_dir(path).await
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.inner.delete(path).await
    }

    async fn delete_dir(&self, path: &str) -> AppResult<()> {
        self.inner.delete_dir(path).await
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        self.inner.copy(from, to).await
    }

    async fn rename(&self, from: &str, to: &str) -> AppResult<()> {
        self.inner.rename(from, to).await
    }

    fn url(&self, path: &str) -> Option<String> {
        self.inner.url(path)
    }

    fn supports_temporary_urls(&self) -> bool {
        self.inner.supports_temporary_urls()
    }

    async fn temporary_url(&self, path: &str, ttl: Duration) -> AppResult<String> {
        self.inner.temporary_url(path, ttl).await
    }
}
