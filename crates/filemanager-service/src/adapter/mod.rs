//! The adapter contract shared by both backends.
//!
//! Read methods degrade to an empty list or `None` when the backend fails;
//! only a path traversal fault is returned as an error. Mutating methods
//! return an [`AppError`] whose message is a sentence for the end user.

pub mod database;
pub mod storage;

use std::fmt;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{error, info, warn};

use filemanager_core::error::{AppError, ErrorKind};
use filemanager_core::result::AppResult;
use filemanager_core::traits::disk::{ByteStream, Disk};
use filemanager_core::types::{AdapterMode, UploadedFile};
use filemanager_entity::{Breadcrumb, FileManagerItem, FolderNode};

pub use database::DatabaseAdapter;
pub use storage::StorageAdapter;

/// One backend's implementation of the file manager operations.
#[async_trait]
pub trait FileManagerAdapter: Send + Sync + fmt::Debug {
    /// Direct children of a folder, folders first, then by name ignoring
    /// case. `None` lists the root.
    async fn get_items(&self, path: Option<&str>) -> AppResult<Vec<FileManagerItem>>;

    /// Direct child folders of a folder, in the same order.
    async fn get_folders(&self, path: Option<&str>) -> AppResult<Vec<FileManagerItem>>;

    /// A single item by identifier.
    async fn get_item(&self, id: &str) -> AppResult<Option<FileManagerItem>>;

    /// Every folder as a nested tree.
    async fn get_folder_tree(&self) -> AppResult<Vec<FolderNode>>;

    /// Trail from the root to a folder; always starts with the root crumb.
    async fn get_breadcrumbs(&self, path: Option<&str>) -> AppResult<Vec<Breadcrumb>>;

    /// Create a folder named `name` inside `parent_path`.
    async fn create_folder(
        &self,
        name: &str,
        parent_path: Option<&str>,
    ) -> AppResult<FileManagerItem>;

    /// Store an upload inside `path`, renaming it when the name is taken.
    async fn upload_file(
        &self,
        file: UploadedFile,
        path: Option<&str>,
    ) -> AppResult<FileManagerItem>;

    /// Rename an item in place.
    async fn rename(&self, id: &str, new_name: &str) -> AppResult<()>;

    /// Move an item into another folder. `None` moves it to the root.
    async fn move_item(&self, id: &str, new_parent_path: Option<&str>) -> AppResult<()>;

    /// Delete an item; folders are deleted with their contents.
    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Delete several items one by one and return how many succeeded.
    async fn delete_many(&self, ids: &[String]) -> AppResult<usize>;

    /// Whether an identifier resolves to a live item.
    async fn exists(&self, id: &str) -> AppResult<bool>;

    /// URL a client can fetch the file from.
    async fn get_url(&self, id: &str) -> AppResult<Option<String>>;

    /// File contents as text, truncated past `max_size` bytes.
    async fn get_contents(&self, id: &str, max_size: Option<u64>) -> AppResult<Option<String>>;

    /// File contents as a byte stream.
    async fn get_stream(&self, id: &str) -> AppResult<Option<ByteStream>>;

    /// File size in bytes.
    async fn get_size(&self, id: &str) -> AppResult<Option<u64>>;

    /// Which backend this adapter runs on.
    fn mode_name(&self) -> AdapterMode;
}

/// Turn a failed read into its empty value unless it is a fault.
pub(crate) fn recover<T: Default>(operation: &'static str, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_fault() => Err(e),
        Err(e) => {
            warn!(operation, error = %e, "Read failed, returning empty result");
            Ok(T::default())
        }
    }
}

/// Log a failed mutation and hide backend detail behind a user sentence.
///
/// Errors built by the adapters already carry a user sentence and pass
/// through. Errors wrapping a backend cause are re-worded.
pub(crate) fn failed(operation: &'static str, target: &str, err: AppError) -> AppError {
    if err.is_fault() {
        return err;
    }
    if err.source.is_none() {
        info!(operation, item = %target, reason = %err.message, "Operation rejected");
        return err;
    }
    error!(operation, item = %target, error = %err, "Operation failed");
    let kind = err.kind;
    AppError::with_source(
        kind,
        format!("Could not {operation}. Please try again."),
        err,
    )
}

/// Folders first, then by name ignoring case.
pub(crate) fn sort_items(items: &mut [FileManagerItem]) {
    items.sort_by(|a, b| {
        b.is_folder()
            .cmp(&a.is_folder())
            .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
            .then_with(|| a.name().cmp(b.name()))
    });
}

/// Stream at most `max` bytes of a stored file and render them as text.
pub(crate) async fn read_preview(disk: &dyn Disk, path: &str, max: u64) -> AppResult<String> {
    let total = disk.metadata(path).await?.size_bytes;
    let limit = usize::try_from(max).unwrap_or(usize::MAX);
    let mut stream = disk.read(path).await?;
    let mut data = Vec::new();
    while data.len() <= limit {
        let Some(chunk) = stream.next().await else {
            break;
        };
        let chunk = chunk.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to read {path}"), e)
        })?;
        data.extend_from_slice(&chunk);
    }
    let total = total.max(data.len() as u64);
    Ok(preview_text(&data, limit, total))
}

/// Decode bytes as text, cutting at `max` bytes on a character boundary
/// and appending a marker.
pub(crate) fn preview_text(data: &[u8], max: usize, total: u64) -> String {
    if data.len() <= max {
        return String::from_utf8_lossy(data).into_owned();
    }
    // Back off over continuation bytes so a multi-byte character is never split.
    let cut = (max.saturating_sub(3)..=max)
        .rev()
        .find(|&i| data[i] & 0xC0 != 0x80)
        .unwrap_or(max);
    let mut text = String::from_utf8_lossy(&data[..cut]).into_owned();
    text.push_str(&format!(
        "\n\n[... truncated: showing {cut} of {total} bytes ...]"
    ));
    text
}
