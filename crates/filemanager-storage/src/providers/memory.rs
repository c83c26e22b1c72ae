//! In-process object store disk.
//!
//! Behaves like a bucket: objects are keyed by path and directories exist
//! either as explicit markers or implicitly through object key prefixes.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};

use filemanager_core::error::AppError;
use filemanager_core::result::AppResult;
use filemanager_core::traits::disk::{ByteStream, Disk, DiskObjectMeta};

use super::{check_segments, child_path, mime_from_path};
use crate::signing::UrlSigner;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    modified: DateTime<Utc>,
}

/// In-memory object store.
#[derive(Debug, Clone)]
pub struct MemoryDisk {
    objects: Arc<DashMap<String, StoredObject>>,
    directories: Arc<DashSet<String>>,
    base_url: String,
    signer: UrlSigner,
}

impl MemoryDisk {
    /// Create an empty store. Temporary URLs are always available; the key
    /// defaults to a per-process random value.
    pub fn new(base_url: Option<String>, signing_key: Option<String>) -> Self {
        let key = signing_key.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Self {
            objects: Arc::new(DashMap::new()),
            directories: Arc::new(DashSet::new()),
            base_url: base_url
                .unwrap_or_else(|| "memory://".to_string())
                .trim_end_matches('/')
                .to_string(),
            signer: UrlSigner::new(key),
        }
    }

    fn key(path: &str) -> AppResult<String> {
        check_segments(path)?;
        Ok(path.trim_matches('/').to_string())
    }

    fn add_parents(&self, key: &str) {
        let mut current = key;
        while let Some(idx) = current.rfind('/') {
            current = &current[..idx];
            self.directories.insert(current.to_string());
        }
    }

    fn dir_exists(&self, key: &str) -> bool {
        if key.is_empty() || self.directories.contains(key) {
            return true;
        }
        let prefix = format!("{key}/");
        self.objects.iter().any(|e| e.key().starts_with(&prefix))
    }

    fn object_meta(key: &str, object: &StoredObject) -> DiskObjectMeta {
        DiskObjectMeta {
            path: key.to_string(),
            size_bytes: object.data.len() as u64,
            mime_type: mime_from_path(key),
            last_modified: Some(object.modified),
            is_directory: false,
        }
    }

    fn dir_meta(key: &str) -> DiskObjectMeta {
        DiskObjectMeta {
            path: key.to_string(),
            size_bytes: 0,
            mime_type: None,
            last_modified: None,
            is_directory: true,
        }
    }
}

impl Default for MemoryDisk {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[async_trait]
impl Disk for MemoryDisk {
    fn driver(&self) -> &str {
        "memory"
    }

    async fn list(&self, path: &str) -> AppResult<Vec<DiskObjectMeta>> {
        let key = Self::key(path)?;
        let prefix = if key.is_empty() {
            String::new()
        } else {
            format!("{key}/")
        };

        let mut entries: BTreeMap<String, DiskObjectMeta> = BTreeMap::new();

        for dir in self.directories.iter() {
            if let Some(rest) = dir.key().strip_prefix(&prefix) {
                let name = rest.split('/').next().unwrap_or_default();
                if !name.is_empty() {
                    let child = child_path(&key, name);
                    entries.insert(child.clone(), Self::dir_meta(&child));
                }
            }
        }

        for object in self.objects.iter() {
            if let Some(rest) = object.key().strip_prefix(&prefix) {
                let mut parts = rest.splitn(2, '/');
                let name = parts.next().unwrap_or_default();
                if name.is_empty() {
                    continue;
                }
                let child = child_path(&key, name);
                if parts.next().is_some() {
                    entries.insert(child.clone(), Self::dir_meta(&child));
                } else {
                    entries.insert(child.clone(), Self::object_meta(&child, object.value()));
                }
            }
        }

        let mut entries: Vec<DiskObjectMeta> = entries.into_values().collect();
        entries.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then(a.path.cmp(&b.path))
        });
        Ok(entries)
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        let key = Self::key(path)?;
        Ok(self.objects.contains_key(&key) || self.dir_exists(&key))
    }

    async fn is_directory(&self, path: &str) -> AppResult<bool> {
        let key = Self::key(path)?;
        Ok(!self.objects.contains_key(&key) && self.dir_exists(&key))
    }

    async fn metadata(&self, path: &str) -> AppResult<DiskObjectMeta> {
        let key = Self::key(path)?;
        if let Some(object) = self.objects.get(&key) {
            return Ok(Self::object_meta(&key, object.value()));
        }
        if self.dir_exists(&key) {
            return Ok(Self::dir_meta(&key));
        }
        Err(AppError::not_found(format!("Path not found: {path}")))
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        let key = Self::key(path)?;
        self.objects
            .get(&key)
            .map(|o| o.data.clone())
            .ok_or_else(|| AppError::not_found(format!("File not found: {path}")))
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let data = self.read_bytes(path).await?;
        Ok(Box::pin(futures::stream::iter(vec![Ok(data)])))
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        let key = Self::key(path)?;
        if key.is_empty() {
            return Err(AppError::storage("Cannot write an object without a key"));
        }
        self.add_parents(&key);
        self.objects.insert(
            key,
            StoredObject {
                data,
                modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn create_dir(&self, path: &str) -> AppResult<()> {
        let key = Self::key(path)?;
        if key.is_empty() {
            return Ok(());
        }
        if self.objects.contains_key(&key) {
            return Err(AppError::storage(format!(
                "An object already exists at {path}"
            )));
        }
        self.add_parents(&key);
        self.directories.insert(key);
        Ok(())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let key = Self::key(path)?;
        self.objects.remove(&key);
        Ok(())
    }

    async fn delete_dir(&self, path: &str) -> AppResult<()> {
        let key = Self::key(path)?;
        if key.is_empty() {
            return Err(AppError::storage("Refusing to delete the disk root"));
        }
        let prefix = format!("{key}/");
        self.objects.retain(|k, _| !k.starts_with(&prefix));
        self.directories
            .retain(|d| d != &key && !d.starts_with(&prefix));
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        let data = self.read_bytes(from).await?;
        self.write(to, data).await
    }

    async fn rename(&self, from: &str, to: &str) -> AppResult<()> {
        let from_key = Self::key(from)?;
        let (_, object) = self
            .objects
            .remove(&from_key)
            .ok_or_else(|| AppError::not_found(format!("File not found: {from}")))?;
        let to_key = Self::key(to)?;
        self.add_parents(&to_key);
        self.objects.insert(to_key, object);
        Ok(())
    }

    fn url(&self, path: &str) -> Option<String> {
        Some(format!(
            "{}/{}",
            self.base_url,
            crate::signing::encode_path(path)
        ))
    }

    fn supports_temporary_urls(&self) -> bool {
        true
    }

    async fn temporary_url(&self, path: &str, ttl: Duration) -> AppResult<String> {
        Ok(self.signer.temporary_url(&self.base_url, path, ttl))
    }
}
