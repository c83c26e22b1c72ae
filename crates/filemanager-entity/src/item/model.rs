//! Backend-independent item model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::database::DatabaseItem;
use super::storage::StorageItem;

/// Whether an item is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A folder (directory).
    Folder,
    /// A file.
    File,
}

impl ItemKind {
    /// The kind as stored in the `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::File => "file",
        }
    }

    /// Parse a stored kind. Anything that is not `folder` is a file.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("folder") {
            Self::Folder
        } else {
            Self::File
        }
    }
}

/// One file or folder, regardless of backend.
///
/// The kind is fixed at construction; size, duration, and thumbnail are
/// only reported for files.
#[derive(Debug, Clone)]
pub enum FileManagerItem {
    /// A row in the metadata table.
    Database(DatabaseItem),
    /// An entry on a disk.
    Storage(StorageItem),
}

impl FileManagerItem {
    /// Identifier unique within the adapter: a row id or a disk path.
    pub fn identifier(&self) -> &str {
        match self {
            Self::Database(item) => item.identifier(),
            Self::Storage(item) => item.identifier(),
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Database(item) => item.name(),
            Self::Storage(item) => item.name(),
        }
    }

    /// Absolute display path, always starting with `/`.
    pub fn path(&self) -> &str {
        match self {
            Self::Database(item) => item.path(),
            Self::Storage(item) => item.path(),
        }
    }

    /// Display path of the containing folder; `None` at the root level.
    pub fn parent_path(&self) -> Option<String> {
        parent_of(self.path())
    }

    /// File or folder.
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Database(item) => item.kind(),
            Self::Storage(item) => item.kind(),
        }
    }

    /// Whether this item is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind() == ItemKind::Folder
    }

    /// Whether this item is a file.
    pub fn is_file(&self) -> bool {
        self.kind() == ItemKind::File
    }

    /// Size in bytes; `None` for folders.
    pub fn size(&self) -> Option<u64> {
        if self.is_folder() {
            return None;
        }
        match self {
            Self::Database(item) => item.size(),
            Self::Storage(item) => item.size(),
        }
    }

    /// MIME type of a file.
    pub fn mime_type(&self) -> Option<String> {
        if self.is_folder() {
            return None;
        }
        match self {
            Self::Database(item) => item.mime_type(),
            Self::Storage(item) => item.mime_type(),
        }
    }

    /// Lowercased extension of a file.
    pub fn extension(&self) -> Option<String> {
        if self.is_folder() {
            return None;
        }
        let (_, ext) = filemanager_core::types::upload::split_extension(self.name());
        ext.map(|e| e.to_lowercase())
    }

    /// Last modification time.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Database(item) => item.last_modified(),
            Self::Storage(item) => item.last_modified(),
        }
    }

    /// Thumbnail reference of a file.
    pub fn thumbnail(&self) -> Option<&str> {
        if self.is_folder() {
            return None;
        }
        match self {
            Self::Database(item) => item.thumbnail(),
            Self::Storage(_) => None,
        }
    }

    /// Media duration in seconds.
    pub fn duration(&self) -> Option<i64> {
        if self.is_folder() {
            return None;
        }
        match self {
            Self::Database(item) => item.duration(),
            Self::Storage(_) => None,
        }
    }

    /// Number of ancestor folders between this item and the root.
    pub fn depth(&self) -> usize {
        self.path()
            .split('/')
            .filter(|s| !s.is_empty())
            .count()
            .saturating_sub(1)
    }

    /// Flatten into a serializable summary.
    pub fn summary(&self) -> ItemSummary {
        ItemSummary {
            id: self.identifier().to_string(),
            name: self.name().to_string(),
            path: self.path().to_string(),
            parent_path: self.parent_path(),
            kind: self.kind(),
            size: self.size(),
            mime_type: self.mime_type(),
            extension: self.extension(),
            last_modified: self.last_modified(),
            thumbnail: self.thumbnail().map(str::to_string),
            duration: self.duration(),
            depth: self.depth(),
        }
    }
}

impl Serialize for FileManagerItem {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.summary().serialize(serializer)
    }
}

/// Serializable snapshot of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    /// Identifier.
    pub id: String,
    /// Name.
    pub name: String,
    /// Absolute display path.
    pub path: String,
    /// Parent display path.
    pub parent_path: Option<String>,
    /// File or folder.
    pub kind: ItemKind,
    /// Size in bytes.
    pub size: Option<u64>,
    /// MIME type.
    pub mime_type: Option<String>,
    /// Extension.
    pub extension: Option<String>,
    /// Last modified.
    pub last_modified: Option<DateTime<Utc>>,
    /// Thumbnail reference.
    pub thumbnail: Option<String>,
    /// Duration in seconds.
    pub duration: Option<i64>,
    /// Ancestor count.
    pub depth: usize,
}

/// Parent of a display path; `None` for root-level entries.
pub(crate) fn parent_of(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    let idx = trimmed.rfind('/')?;
    if idx == 0 {
        None
    } else {
        Some(trimmed[..idx].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_of() {
        assert_eq!(parent_of("/a/b/c.txt"), Some("/a/b".to_string()));
        assert_eq!(parent_of("/a"), None);
        assert_eq!(parent_of("/"), None);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(ItemKind::parse("folder"), ItemKind::Folder);
        assert_eq!(ItemKind::parse("FOLDER"), ItemKind::Folder);
        assert_eq!(ItemKind::parse("file"), ItemKind::File);
    }
}
