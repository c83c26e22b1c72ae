//! Storage-backed item.

use chrono::{DateTime, Utc};

use filemanager_core::traits::disk::DiskObjectMeta;

use super::model::ItemKind;

/// An item derived from a disk listing, relative to a configured root.
#[derive(Debug, Clone)]
pub struct StorageItem {
    meta: DiskObjectMeta,
    disk: String,
    path: String,
}

impl StorageItem {
    /// Build an item from disk metadata. `root` is the disk directory the
    /// adapter is confined to; the display path is relative to it.
    pub fn new(meta: DiskObjectMeta, root: &str, disk: impl Into<String>) -> Self {
        let root = root.trim_matches('/');
        let relative = if root.is_empty() {
            meta.path.as_str()
        } else {
            meta.path
                .strip_prefix(root)
                .map(|rest| rest.trim_start_matches('/'))
                .unwrap_or(meta.path.as_str())
        };
        let path = format!("/{relative}");
        Self {
            meta,
            disk: disk.into(),
            path,
        }
    }

    /// Name of the disk the item lives on.
    pub fn disk(&self) -> &str {
        &self.disk
    }

    /// Raw disk metadata.
    pub fn meta(&self) -> &DiskObjectMeta {
        &self.meta
    }

    pub(crate) fn identifier(&self) -> &str {
        &self.meta.path
    }

    pub(crate) fn name(&self) -> &str {
        self.meta.name()
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn kind(&self) -> ItemKind {
        if self.meta.is_directory {
            ItemKind::Folder
        } else {
            ItemKind::File
        }
    }

    pub(crate) fn size(&self) -> Option<u64> {
        Some(self.meta.size_bytes)
    }

    pub(crate) fn mime_type(&self) -> Option<String> {
        self.meta.mime_type.clone()
    }

    pub(crate) fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.meta.last_modified
    }
}
