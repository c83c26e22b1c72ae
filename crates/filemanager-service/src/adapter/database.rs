//! Adapter over the hierarchical metadata table, with file bytes on a disk.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use sqlx::AnyConnection;
use tracing::{info, warn};
use uuid::Uuid;

use filemanager_core::config::AppConfig;
use filemanager_core::error::{AppError, ErrorKind};
use filemanager_core::result::AppResult;
use filemanager_core::traits::disk::{ByteStream, Disk};
use filemanager_core::types::upload::{split_extension, with_name_suffix};
use filemanager_core::types::{AdapterMode, RequestContext, UploadedFile};
use filemanager_database::{DatabasePool, ItemRepository, ItemTx};
use filemanager_entity::{
    Breadcrumb, DatabaseItem, FileManagerItem, FileType, FolderNode, ItemKind, ItemRecord,
    NewItemRecord,
};
use filemanager_storage::{PathResolver, ThumbnailGenerator};

use super::{FileManagerAdapter, failed, read_preview, recover, sort_items};
use crate::security::FileSecurityService;
use crate::url::FileUrlService;

/// File manager over metadata rows.
///
/// Identifiers are row ids rendered as strings. Every mutation runs in a
/// transaction that re-reads its target rows under a write lock and checks
/// its preconditions again before writing, so two conflicting requests
/// cannot both succeed.
#[derive(Debug, Clone)]
pub struct DatabaseAdapter {
    repo: ItemRepository,
    disk: Arc<dyn Disk>,
    disk_name: String,
    blob_root: String,
    max_depth: usize,
    preview_max_bytes: u64,
    security: FileSecurityService,
    urls: FileUrlService,
    thumbnails: Option<ThumbnailGenerator>,
    context: RequestContext,
}

impl DatabaseAdapter {
    /// Create an adapter over `db`, storing bytes on `disk`.
    ///
    /// The schema must already exist (see `migration::ensure_schema`).
    pub fn new(
        db: DatabasePool,
        disk_name: &str,
        disk: Arc<dyn Disk>,
        config: &AppConfig,
    ) -> AppResult<Self> {
        let settings = &config.filemanager;
        let blob_root = PathResolver::new(&settings.root, disk_name)?
            .root()
            .to_string();
        let thumbnails = config.thumbnails.enabled.then(|| {
            ThumbnailGenerator::new(
                Arc::clone(&disk),
                &join(&blob_root, &config.thumbnails.directory),
                config.thumbnails.size,
            )
        });

        Ok(Self {
            repo: ItemRepository::new(db, settings.table.clone())?,
            urls: FileUrlService::new(&config.urls, Arc::clone(&disk))?,
            security: FileSecurityService::new(config.security.clone(), settings.max_upload_size),
            disk,
            disk_name: disk_name.to_string(),
            blob_root,
            max_depth: settings.max_depth,
            preview_max_bytes: settings.preview_max_bytes,
            thumbnails,
            context: RequestContext::default(),
        })
    }

    /// Attach the caller identity recorded with each mutation.
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// The repository this adapter runs its queries through.
    pub fn repository(&self) -> &ItemRepository {
        &self.repo
    }

    /// Resolve a `/`-delimited folder path to a row id, one segment at a
    /// time. Numeric input is taken as an id directly. `Ok(None)` is the
    /// root.
    pub async fn path_to_folder_id(&self, path: Option<&str>) -> AppResult<Option<i64>> {
        let raw = path.map(str::trim).unwrap_or_default();
        let pool = self.repo.db().pool();

        if let Ok(id) = raw.parse::<i64>() {
            return match self.repo.find_by_id(pool, id).await? {
                Some(record) if record.is_folder() => Ok(Some(id)),
                _ => Err(AppError::not_found("The folder does not exist.")),
            };
        }

        let mut current = None;
        for segment in raw
            .split(['/', '\\'])
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != ".")
        {
            match self.repo.find_child(pool, current, segment).await? {
                Some(record) if record.is_folder() => current = Some(record.id),
                _ => {
                    return Err(AppError::not_found(format!(
                        "The folder \"{raw}\" does not exist."
                    )));
                }
            }
        }
        Ok(current)
    }

    /// Rename `id` only if its name is still `expected_name`.
    ///
    /// Fails with a conflict when another request renamed the row since the
    /// caller read it.
    pub async fn rename_if_unchanged(
        &self,
        id: &str,
        expected_name: &str,
        new_name: &str,
    ) -> AppResult<()> {
        const OP: &str = "rename the item";
        let new_name = self
            .security
            .validate_name(new_name)
            .map_err(|e| failed(OP, id, e))?;
        let row_id = parse_id(id).ok_or_else(|| failed(OP, id, item_not_found()))?;

        self.rename_locked(row_id, expected_name, &new_name)
            .await
            .map_err(|e| failed(OP, id, e))?;
        info!(id = row_id, name = %new_name, user = %self.context.user_label(), "Item renamed");
        Ok(())
    }

    /// Display path of the folder `parent` (empty for the root).
    async fn folder_path(&self, parent: Option<i64>) -> AppResult<String> {
        let Some(id) = parent else {
            return Ok(String::new());
        };
        let chain = self.repo.ancestors(self.repo.db().pool(), id).await?;
        Ok(chain.iter().map(|r| format!("/{}", r.name)).collect())
    }

    async fn to_item(&self, record: ItemRecord) -> AppResult<FileManagerItem> {
        let path = format!("{}/{}", self.folder_path(record.parent_id).await?, record.name);
        Ok(FileManagerItem::Database(DatabaseItem::new(record, path)))
    }

    async fn find_item(&self, id: i64) -> AppResult<Option<FileManagerItem>> {
        match self.repo.find_by_id(self.repo.db().pool(), id).await? {
            Some(record) => self.to_item(record).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        path: Option<&str>,
        kind: Option<ItemKind>,
    ) -> AppResult<Vec<FileManagerItem>> {
        let parent = self.path_to_folder_id(path).await?;
        let base = self.folder_path(parent).await?;
        let rows = self
            .repo
            .children(self.repo.db().pool(), parent, kind)
            .await?;
        let mut items: Vec<FileManagerItem> = rows
            .into_iter()
            .map(|record| {
                let path = format!("{base}/{}", record.name);
                FileManagerItem::Database(DatabaseItem::new(record, path))
            })
            .collect();
        sort_items(&mut items);
        Ok(items)
    }

    /// The file row `id` names, if it has stored bytes.
    async fn file_record(&self, id: &str) -> AppResult<Option<ItemRecord>> {
        let Some(row_id) = parse_id(id) else {
            return Ok(None);
        };
        let record = self.repo.find_by_id(self.repo.db().pool(), row_id).await?;
        Ok(record.filter(|r| !r.is_folder() && r.storage_path.is_some()))
    }

    /// Lock the destination folder row; the root needs no lock.
    async fn lock_parent(&self, conn: &mut AnyConnection, parent: Option<i64>) -> AppResult<()> {
        let Some(id) = parent else {
            return Ok(());
        };
        match self.repo.lock_by_id(conn, id).await? {
            Some(record) if record.is_folder() => Ok(()),
            _ => Err(AppError::not_found("The destination folder does not exist.")),
        }
    }

    async fn create_folder_row(&self, name: &str, parent: Option<i64>) -> AppResult<ItemRecord> {
        let mut tx = self.repo.begin().await?;
        self.lock_parent(&mut tx, parent).await?;
        if self
            .repo
            .lock_sibling(&mut tx, parent, name, None)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A file or folder named \"{name}\" already exists here."
            )));
        }
        let record = self
            .repo
            .insert(&mut tx, &NewItemRecord::folder(name, parent))
            .await?;
        commit(tx).await?;
        Ok(record)
    }

    async fn store_upload(
        &self,
        file: UploadedFile,
        name: String,
        parent: Option<i64>,
    ) -> AppResult<ItemRecord> {
        let mut tx = self.repo.begin().await?;
        self.lock_parent(&mut tx, parent).await?;

        let mut name = name;
        if self
            .repo
            .lock_sibling(&mut tx, parent, &name, None)
            .await?
            .is_some()
        {
            name = with_name_suffix(&name, &Utc::now().timestamp().to_string());
            if self
                .repo
                .lock_sibling(&mut tx, parent, &name, None)
                .await?
                .is_some()
            {
                return Err(AppError::conflict(format!(
                    "A file named \"{name}\" already exists here."
                )));
            }
        }

        let mime_type = file.mime_type.clone().or_else(|| {
            mime_guess::from_path(&name)
                .first_raw()
                .map(str::to_string)
        });
        let blob = self.blob_path(&name);
        self.disk.write(&blob, file.data.clone()).await?;
        let thumbnail = self.make_thumbnail(mime_type.as_deref(), &file.data).await;

        let data = NewItemRecord {
            file_type: FileType::detect(&name, mime_type.as_deref()),
            name,
            kind: ItemKind::File,
            parent_id: parent,
            size: Some(file.size() as i64),
            duration: file.duration_seconds,
            thumbnail: thumbnail.clone(),
            storage_path: Some(blob.clone()),
            mime_type,
        };

        let record = match self.repo.insert(&mut tx, &data).await {
            Ok(record) => record,
            Err(e) => {
                self.discard_blob(&blob, thumbnail.as_deref()).await;
                return Err(e);
            }
        };
        if let Err(e) = commit(tx).await {
            self.discard_blob(&blob, thumbnail.as_deref()).await;
            return Err(e);
        }
        Ok(record)
    }

    async fn rename_locked(&self, id: i64, expected_name: &str, new_name: &str) -> AppResult<()> {
        let mut tx = self.repo.begin().await?;
        let row = self
            .repo
            .lock_by_id(&mut tx, id)
            .await?
            .ok_or_else(item_not_found)?;

        if row.name != expected_name {
            return Err(AppError::conflict(
                "The item was modified by another request. Refresh and try again.",
            ));
        }
        if row.name == new_name {
            return Ok(());
        }
        if self
            .repo
            .lock_sibling(&mut tx, row.parent_id, new_name, Some(id))
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A file or folder named \"{new_name}\" already exists here."
            )));
        }

        self.repo.update_name(&mut tx, id, new_name).await?;
        commit(tx).await
    }

    async fn move_locked(&self, id: i64, dest: Option<i64>) -> AppResult<()> {
        let current = self
            .repo
            .find_by_id(self.repo.db().pool(), id)
            .await?
            .ok_or_else(item_not_found)?;
        if current.parent_id == dest {
            return Ok(());
        }

        let mut tx = self.repo.begin().await?;
        let row = self
            .repo
            .lock_by_id(&mut tx, id)
            .await?
            .ok_or_else(item_not_found)?;

        if let Some(dest_id) = dest {
            if dest_id == id {
                return Err(cycle_error());
            }
            self.lock_parent(&mut tx, dest).await?;
            if row.is_folder() {
                let chain = self.repo.ancestors(&mut *tx, dest_id).await?;
                if chain.iter().any(|ancestor| ancestor.id == id) {
                    return Err(cycle_error());
                }
            }
        }

        if row.parent_id == dest {
            return Ok(());
        }
        if self
            .repo
            .lock_sibling(&mut tx, dest, &row.name, Some(id))
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "An item named \"{}\" already exists in the destination folder.",
                row.name
            )));
        }

        self.repo.update_parent(&mut tx, id, dest).await?;
        commit(tx).await
    }

    /// Delete a row and everything below it. Returns the removed rows.
    async fn delete_locked(&self, id: i64) -> AppResult<Vec<ItemRecord>> {
        let mut tx = self.repo.begin().await?;
        let row = self
            .repo
            .lock_by_id(&mut tx, id)
            .await?
            .ok_or_else(item_not_found)?;

        let mut removed = if row.is_folder() {
            self.repo.descendants(&mut *tx, id).await?
        } else {
            Vec::new()
        };
        let mut ids = vec![id];
        ids.extend(removed.iter().map(|r| r.id));
        self.repo.delete_ids(&mut tx, &ids).await?;
        commit(tx).await?;

        removed.push(row);
        Ok(removed)
    }

    /// Delete stored bytes and thumbnails of removed file rows. Failures are
    /// logged; the rows stay deleted.
    async fn remove_blobs(&self, records: &[ItemRecord]) {
        for record in records.iter().filter(|r| !r.is_folder()) {
            self.discard_blob(
                record.storage_path.as_deref().unwrap_or_default(),
                record.thumbnail.as_deref(),
            )
            .await;
        }
    }

    async fn discard_blob(&self, blob: &str, thumbnail: Option<&str>) {
        for path in std::iter::once(blob)
            .chain(thumbnail)
            .filter(|p| !p.is_empty())
        {
            if let Err(e) = self.disk.delete(path).await {
                warn!(path, disk = %self.disk_name, error = %e, "Failed to delete stored file");
            }
        }
    }

    async fn make_thumbnail(&self, mime_type: Option<&str>, data: &Bytes) -> Option<String> {
        let generator = self.thumbnails.as_ref()?;
        if !mime_type.is_some_and(ThumbnailGenerator::is_supported) {
            return None;
        }
        match generator.generate(data.clone()).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "Thumbnail generation failed, storing upload without one");
                None
            }
        }
    }

    fn blob_path(&self, name: &str) -> String {
        let file_name = match split_extension(name).1 {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_lowercase()),
            None => Uuid::new_v4().to_string(),
        };
        join(&self.blob_root, &file_name)
    }

    fn build_tree(
        &self,
        parent: Option<i64>,
        base: &str,
        depth: usize,
        by_parent: &HashMap<Option<i64>, Vec<&ItemRecord>>,
        counts: &HashMap<i64, u64>,
    ) -> Vec<FolderNode> {
        if depth >= self.max_depth {
            return Vec::new();
        }
        by_parent
            .get(&parent)
            .map(|folders| {
                folders
                    .iter()
                    .map(|folder| {
                        let path = format!("{base}/{}", folder.name);
                        FolderNode {
                            id: folder.id.to_string(),
                            name: folder.name.clone(),
                            file_count: counts.get(&folder.id).copied().unwrap_or(0),
                            children: self.build_tree(
                                Some(folder.id),
                                &path,
                                depth + 1,
                                by_parent,
                                counts,
                            ),
                            path,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl FileManagerAdapter for DatabaseAdapter {
    async fn get_items(&self, path: Option<&str>) -> AppResult<Vec<FileManagerItem>> {
        recover("get_items", self.list(path, None).await)
    }

    async fn get_folders(&self, path: Option<&str>) -> AppResult<Vec<FileManagerItem>> {
        recover("get_folders", self.list(path, Some(ItemKind::Folder)).await)
    }

    async fn get_item(&self, id: &str) -> AppResult<Option<FileManagerItem>> {
        let Some(row_id) = parse_id(id) else {
            return Ok(None);
        };
        recover("get_item", self.find_item(row_id).await)
    }

    async fn get_folder_tree(&self) -> AppResult<Vec<FolderNode>> {
        let pool = self.repo.db().pool();
        let folders = recover("get_folder_tree", self.repo.all_folders(pool).await)?;
        let counts = recover("get_folder_tree", self.repo.file_counts(pool).await)?;

        let mut by_parent: HashMap<Option<i64>, Vec<&ItemRecord>> = HashMap::new();
        for folder in &folders {
            by_parent.entry(folder.parent_id).or_default().push(folder);
        }
        Ok(self.build_tree(None, "", 0, &by_parent, &counts))
    }

    async fn get_breadcrumbs(&self, path: Option<&str>) -> AppResult<Vec<Breadcrumb>> {
        let mut crumbs = vec![Breadcrumb::root()];
        let folder = recover(
            "get_breadcrumbs",
            self.path_to_folder_id(path).await,
        )?;
        let Some(id) = folder else {
            return Ok(crumbs);
        };

        let chain = recover(
            "get_breadcrumbs",
            self.repo.ancestors(self.repo.db().pool(), id).await,
        )?;
        let mut current = String::new();
        for record in chain {
            current.push('/');
            current.push_str(&record.name);
            crumbs.push(Breadcrumb {
                id: Some(record.id.to_string()),
                name: record.name,
                path: current.clone(),
            });
        }
        Ok(crumbs)
    }

    async fn create_folder(
        &self,
        name: &str,
        parent_path: Option<&str>,
    ) -> AppResult<FileManagerItem> {
        const OP: &str = "create the folder";
        let name = self
            .security
            .validate_name(name)
            .map_err(|e| failed(OP, name, e))?;
        let target = parent_path.unwrap_or("/");
        let parent = self
            .path_to_folder_id(parent_path)
            .await
            .map_err(|e| failed(OP, target, e))?;

        let record = self
            .create_folder_row(&name, parent)
            .await
            .map_err(|e| failed(OP, &name, e))?;
        info!(id = record.id, name = %name, user = %self.context.user_label(), "Folder created");
        self.to_item(record).await.map_err(|e| failed(OP, &name, e))
    }

    async fn upload_file(
        &self,
        file: UploadedFile,
        path: Option<&str>,
    ) -> AppResult<FileManagerItem> {
        const OP: &str = "upload the file";
        self.security
            .validate_upload(&file)
            .map_err(|e| failed(OP, &file.original_name, e))?;
        let name = self
            .security
            .sanitize_name(&file.original_name)
            .map_err(|e| failed(OP, &file.original_name, e))?;
        let parent = self
            .path_to_folder_id(path)
            .await
            .map_err(|e| failed(OP, path.unwrap_or("/"), e))?;

        let original = file.original_name.clone();
        let record = self
            .store_upload(file, name, parent)
            .await
            .map_err(|e| failed(OP, &original, e))?;
        info!(
            id = record.id,
            name = %record.name,
            size = record.size.unwrap_or_default(),
            user = %self.context.user_label(),
            "File uploaded"
        );
        self.to_item(record).await.map_err(|e| failed(OP, &original, e))
    }

    async fn rename(&self, id: &str, new_name: &str) -> AppResult<()> {
        const OP: &str = "rename the item";
        let row_id = parse_id(id).ok_or_else(|| failed(OP, id, item_not_found()))?;
        let current = self
            .repo
            .find_by_id(self.repo.db().pool(), row_id)
            .await
            .map_err(|e| failed(OP, id, e))?
            .ok_or_else(|| failed(OP, id, item_not_found()))?;
        self.rename_if_unchanged(id, &current.name, new_name).await
    }

    async fn move_item(&self, id: &str, new_parent_path: Option<&str>) -> AppResult<()> {
        const OP: &str = "move the item";
        let row_id = parse_id(id).ok_or_else(|| failed(OP, id, item_not_found()))?;
        let dest = self
            .path_to_folder_id(new_parent_path)
            .await
            .map_err(|e| failed(OP, new_parent_path.unwrap_or("/"), e))?;

        self.move_locked(row_id, dest)
            .await
            .map_err(|e| failed(OP, id, e))?;
        info!(id = row_id, parent = ?dest, user = %self.context.user_label(), "Item moved");
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        const OP: &str = "delete the item";
        let row_id = parse_id(id).ok_or_else(|| failed(OP, id, item_not_found()))?;
        let removed = self
            .delete_locked(row_id)
            .await
            .map_err(|e| failed(OP, id, e))?;
        self.remove_blobs(&removed).await;
        info!(
            id = row_id,
            rows = removed.len(),
            user = %self.context.user_label(),
            "Item deleted"
        );
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> AppResult<usize> {
        let mut deleted = 0;
        for id in ids {
            if self.delete(id).await.is_ok() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn exists(&self, id: &str) -> AppResult<bool> {
        let Some(row_id) = parse_id(id) else {
            return Ok(false);
        };
        recover(
            "exists",
            self.repo
                .find_by_id(self.repo.db().pool(), row_id)
                .await
                .map(|r| r.is_some()),
        )
    }

    async fn get_url(&self, id: &str) -> AppResult<Option<String>> {
        let record = recover("get_url", self.file_record(id).await)?;
        let Some(path) = record.and_then(|r| r.storage_path) else {
            return Ok(None);
        };
        Ok(Some(self.urls.url_for(&path, id.trim()).await))
    }

    async fn get_contents(&self, id: &str, max_size: Option<u64>) -> AppResult<Option<String>> {
        let record = recover("get_contents", self.file_record(id).await)?;
        let Some(path) = record.and_then(|r| r.storage_path) else {
            return Ok(None);
        };
        let max = max_size.unwrap_or(self.preview_max_bytes);
        recover(
            "get_contents",
            read_preview(&*self.disk, &path, max).await.map(Some),
        )
    }

    async fn get_stream(&self, id: &str) -> AppResult<Option<ByteStream>> {
        let record = recover("get_stream", self.file_record(id).await)?;
        let Some(path) = record.and_then(|r| r.storage_path) else {
            return Ok(None);
        };
        recover("get_stream", self.disk.read(&path).await.map(Some))
    }

    async fn get_size(&self, id: &str) -> AppResult<Option<u64>> {
        let Some(record) = recover("get_size", self.file_record(id).await)? else {
            return Ok(None);
        };
        if let Some(size) = record.size {
            return Ok(Some(size.max(0) as u64));
        }
        let path = record.storage_path.unwrap_or_default();
        recover(
            "get_size",
            self.disk.metadata(&path).await.map(|m| Some(m.size_bytes)),
        )
    }

    fn mode_name(&self) -> AdapterMode {
        AdapterMode::Database
    }
}

fn parse_id(id: &str) -> Option<i64> {
    id.trim().parse().ok()
}

fn item_not_found() -> AppError {
    AppError::not_found("The item was not found.")
}

fn cycle_error() -> AppError {
    AppError::invalid_hierarchy("A folder cannot be moved into itself or one of its subfolders.")
}

async fn commit(tx: ItemTx) -> AppResult<()> {
    tx.commit()
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e))
}

fn join(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('/');
    let name = name.trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
