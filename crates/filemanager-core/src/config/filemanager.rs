//! Adapter selection and behaviour configuration.

use serde::{Deserialize, Serialize};

/// Settings shared by both adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileManagerConfig {
    /// Which adapter to build: `"database"` or `"storage"`.
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Name of the disk (key in `[disks]`) that holds file bytes.
    #[serde(default = "default_disk")]
    pub disk: String,
    /// Directory on the disk the adapters are confined to.
    #[serde(default = "default_root")]
    pub root: String,
    /// Whether dot-prefixed entries appear in storage listings.
    #[serde(default)]
    pub show_hidden: bool,
    /// Maximum upload size in bytes (default 100 MB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size: u64,
    /// Metadata table used by the database adapter.
    #[serde(default = "default_table")]
    pub table: String,
    /// Recursion bound for tree building and recursive copies.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Default cap for `get_contents` previews (default 1 MB).
    #[serde(default = "default_preview_max")]
    pub preview_max_bytes: u64,
}

impl Default for FileManagerConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            disk: default_disk(),
            root: default_root(),
            show_hidden: false,
            max_upload_size: default_max_upload(),
            table: default_table(),
            max_depth: default_max_depth(),
            preview_max_bytes: default_preview_max(),
        }
    }
}

/// Thumbnail generation for uploaded images (database mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Whether thumbnails are generated on upload.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Edge length of the bounding square in pixels.
    #[serde(default = "default_thumbnail_size")]
    pub size: u32,
    /// Directory under the root where thumbnails are written.
    #[serde(default = "default_thumbnail_dir")]
    pub directory: String,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size: default_thumbnail_size(),
            directory: default_thumbnail_dir(),
        }
    }
}

fn default_mode() -> String {
    "database".to_string()
}

fn default_disk() -> String {
    "public".to_string()
}

fn default_root() -> String {
    "uploads".to_string()
}

fn default_max_upload() -> u64 {
    104_857_600 // 100 MB
}

fn default_table() -> String {
    "file_system_items".to_string()
}

fn default_max_depth() -> usize {
    50
}

fn default_preview_max() -> u64 {
    1_048_576 // 1 MB
}

fn default_true() -> bool {
    true
}

fn default_thumbnail_size() -> u32 {
    256
}

fn default_thumbnail_dir() -> String {
    ".thumbnails".to_string()
}
