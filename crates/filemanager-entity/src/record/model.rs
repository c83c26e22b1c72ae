//! Hierarchical record model.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::file_type::FileType;
use crate::item::ItemKind;

/// One node of the folder/file tree as stored in the metadata table.
///
/// `parent_id` references another row of the same table. Sibling names are
/// unique per parent and the parent chain never forms a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ItemRecord {
    /// Row identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// `"folder"` or `"file"`.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub item_type: String,
    /// Category of a file (`image`, `video`, ...).
    pub file_type: Option<String>,
    /// Containing folder; `None` at the root.
    pub parent_id: Option<i64>,
    /// File size in bytes.
    pub size: Option<i64>,
    /// Media duration in seconds.
    pub duration: Option<i64>,
    /// Disk path of the generated thumbnail.
    pub thumbnail: Option<String>,
    /// Disk path of the file bytes.
    pub storage_path: Option<String>,
    /// MIME type of the file.
    pub mime_type: Option<String>,
    /// Creation time (unix seconds).
    pub created_at: i64,
    /// Last update time (unix seconds).
    pub updated_at: i64,
}

impl ItemRecord {
    /// File or folder.
    pub fn kind(&self) -> ItemKind {
        ItemKind::parse(&self.item_type)
    }

    /// Whether this row is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind() == ItemKind::Folder
    }

    /// Parsed file category.
    pub fn category(&self) -> FileType {
        self.file_type
            .as_deref()
            .map(FileType::parse)
            .unwrap_or(if self.is_folder() {
                FileType::Folder
            } else {
                FileType::Other
            })
    }

    /// Last update as a timestamp.
    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.updated_at, 0).single()
    }
}

/// Data required to insert a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItemRecord {
    /// Display name.
    pub name: String,
    /// File or folder.
    pub kind: ItemKind,
    /// File category.
    pub file_type: FileType,
    /// Containing folder.
    pub parent_id: Option<i64>,
    /// File size in bytes.
    pub size: Option<i64>,
    /// Media duration in seconds.
    pub duration: Option<i64>,
    /// Thumbnail disk path.
    pub thumbnail: Option<String>,
    /// Disk path of the bytes.
    pub storage_path: Option<String>,
    /// MIME type.
    pub mime_type: Option<String>,
}

impl NewItemRecord {
    /// A folder row.
    pub fn folder(name: impl Into<String>, parent_id: Option<i64>) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Folder,
            file_type: FileType::Folder,
            parent_id,
            size: None,
            duration: None,
            thumbnail: None,
            storage_path: None,
            mime_type: None,
        }
    }
}
