//! Local filesystem disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::StreamExt;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::debug;

use filemanager_core::error::{AppError, ErrorKind};
use filemanager_core::result::AppResult;
use filemanager_core::traits::disk::{ByteStream, Disk, DiskObjectMeta};

use super::{check_segments, child_path, mime_from_path};
use crate::signing::UrlSigner;

/// Local filesystem disk rooted at a directory.
#[derive(Debug, Clone)]
pub struct LocalDisk {
    /// Root directory for all stored files.
    root: PathBuf,
    /// Public base URL, when the directory is web-served.
    url: Option<String>,
    /// Signs temporary URLs when a key is configured.
    signer: Option<UrlSigner>,
}

impl LocalDisk {
    /// Create a new local disk rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create disk root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            url: None,
            signer: None,
        })
    }

    /// Serve files from a public base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Enable signed temporary URLs.
    pub fn with_signing_key(mut self, key: impl Into<String>) -> Self {
        self.signer = Some(UrlSigner::new(key));
        self
    }

    /// Resolve a disk path to an absolute path within the root.
    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        check_segments(path)?;
        let clean = path.trim_matches('/');
        Ok(if clean.is_empty() {
            self.root.clone()
        } else {
            self.root.join(clean)
        })
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    fn not_found_or(e: std::io::Error, path: &str, action: &str) -> AppError {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::not_found(format!("Path not found: {path}"))
        } else {
            AppError::with_source(ErrorKind::Storage, format!("Failed to {action}: {path}"), e)
        }
    }
}

#[async_trait]
impl Disk for LocalDisk {
    fn driver(&self) -> &str {
        "local"
    }

    async fn list(&self, path: &str) -> AppResult<Vec<DiskObjectMeta>> {
        let full_path = self.resolve(path)?;
        if !full_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to list directory: {path}"),
                e,
            )
        })?;

        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let entry_meta = entry.metadata().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to get entry metadata", e)
            })?;

            let name = entry.file_name().to_string_lossy().to_string();
            let entry_path = child_path(path, &name);
            let is_directory = entry_meta.is_dir();

            entries.push(DiskObjectMeta {
                mime_type: if is_directory {
                    None
                } else {
                    mime_from_path(&entry_path)
                },
                path: entry_path,
                size_bytes: if is_directory { 0 } else { entry_meta.len() },
                last_modified: entry_meta
                    .modified()
                    .ok()
                    .map(chrono::DateTime::<chrono::Utc>::from),
                is_directory,
            });
        }

        entries.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then(a.path.cmp(&b.path))
        });

        Ok(entries)
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        Ok(fs::try_exists(self.resolve(path)?).await.unwrap_or(false))
    }

    async fn is_directory(&self, path: &str) -> AppResult<bool> {
        let full_path = self.resolve(path)?;
        Ok(fs::metadata(&full_path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn metadata(&self, path: &str) -> AppResult<DiskObjectMeta> {
        let full_path = self.resolve(path)?;
        let meta = fs::metadata(&full_path)
            .await
            .map_err(|e| Self::not_found_or(e, path, "get metadata"))?;

        let clean = path.trim_matches('/').to_string();
        Ok(DiskObjectMeta {
            mime_type: if meta.is_file() {
                mime_from_path(&clean)
            } else {
                None
            },
            size_bytes: if meta.is_dir() { 0 } else { meta.len() },
            last_modified: meta
                .modified()
                .ok()
                .map(chrono::DateTime::<chrono::Utc>::from),
            is_directory: meta.is_dir(),
            path: clean,
        })
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(path)?;
        let data = fs::read(&full_path)
            .await
            .map_err(|e| Self::not_found_or(e, path, "read file"))?;
        Ok(Bytes::from(data))
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let full_path = self.resolve(path)?;
        let file = fs::File::open(&full_path)
            .await
            .map_err(|e| Self::not_found_or(e, path, "open file"))?;

        let stream = ReaderStream::new(file);
        Ok(Box::pin(stream.map(|r| r.map(Bytes::from))))
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write file: {path}"),
                e,
            )
        })?;

        debug!(path, bytes = data.len(), "Wrote file");
        Ok(())
    }

    async fn create_dir(&self, path: &str) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        fs::create_dir_all(&full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create directory: {path}"),
                e,
            )
        })?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete file: {path}"),
                e,
            )),
        }
    }

    async fn delete_dir(&self, path: &str) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        if full_path == self.root {
            return Err(AppError::storage("Refusing to delete the disk root"));
        }
        match fs::remove_dir_all(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete directory: {path}"),
                e,
            )),
        }
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        let from_path = self.resolve(from)?;
        let to_path = self.resolve(to)?;
        self.ensure_parent(&to_path).await?;

        fs::copy(&from_path, &to_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to copy {from} -> {to}"),
                e,
            )
        })?;
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> AppResult<()> {
        let from_path = self.resolve(from)?;
        let to_path = self.resolve(to)?;
        self.ensure_parent(&to_path).await?;

        fs::rename(&from_path, &to_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to move {from} -> {to}"),
                e,
            )
        })?;
        Ok(())
    }

    fn url(&self, path: &str) -> Option<String> {
        self.url
            .as_ref()
            .map(|base| format!("{base}/{}", crate::signing::encode_path(path)))
    }

    fn supports_temporary_urls(&self) -> bool {
        self.signer.is_some() && self.url.is_some()
    }

    async fn temporary_url(&self, path: &str, ttl: Duration) -> AppResult<String> {
        match (&self.signer, &self.url) {
            (Some(signer), Some(base)) => Ok(signer.temporary_url(base, path, ttl)),
            _ => Err(AppError::storage(
                "This disk does not support temporary URLs",
            )),
        }
    }
}
