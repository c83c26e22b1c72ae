//! Disk trait for pluggable blob storage backends.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// Metadata about a stored object or directory.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DiskObjectMeta {
    /// Path within the disk, without a leading slash.
    pub path: String,
    /// Size in bytes (zero for directories).
    pub size_bytes: u64,
    /// MIME type (if known).
    pub mime_type: Option<String>,
    /// Last modified timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
    /// Whether this is a directory.
    pub is_directory: bool,
}

impl DiskObjectMeta {
    /// The final path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// A byte stream type used for reading file contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for blob storage disks.
///
/// All paths are disk-relative, `/`-separated, and carry no leading slash.
/// Implementations do not validate paths against a root; callers resolve
/// user input through a path resolver first.
#[async_trait]
pub trait Disk: Send + Sync + std::fmt::Debug + 'static {
    /// Return the driver name (e.g., "local", "memory").
    fn driver(&self) -> &str;

    /// List the direct children of a directory. A missing directory lists
    /// as empty.
    async fn list(&self, path: &str) -> AppResult<Vec<DiskObjectMeta>>;

    /// Check whether a file or directory exists at the given path.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// Check whether a directory exists at the given path.
    async fn is_directory(&self, path: &str) -> AppResult<bool>;

    /// Get metadata about a file or directory.
    async fn metadata(&self, path: &str) -> AppResult<DiskObjectMeta>;

    /// Read a file into memory.
    async fn read_bytes(&self, path: &str) -> AppResult<Bytes>;

    /// Read a file as a byte stream.
    async fn read(&self, path: &str) -> AppResult<ByteStream>;

    /// Write bytes to a file, creating missing parent directories.
    async fn write(&self, path: &str, data: Bytes) -> AppResult<()>;

    /// Create a directory (and any missing parents).
    async fn create_dir(&self, path: &str) -> AppResult<()>;

    /// Delete a file. Deleting a missing file succeeds.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Delete a directory and all its contents recursively.
    async fn delete_dir(&self, path: &str) -> AppResult<()>;

    /// Copy a single file.
    async fn copy(&self, from: &str, to: &str) -> AppResult<()>;

    /// Move a single file.
    async fn rename(&self, from: &str, to: &str) -> AppResult<()>;

    /// The public URL of a file, if the disk is publicly served.
    fn url(&self, path: &str) -> Option<String>;

    /// Whether [`Disk::temporary_url`] can produce signed URLs.
    fn supports_temporary_urls(&self) -> bool {
        false
    }

    /// A signed URL that stops working after `ttl`.
    async fn temporary_url(&self, path: &str, ttl: Duration) -> AppResult<String>;
}
