//! Adapter that works directly on a disk, using paths as identifiers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{error, info, warn};

use filemanager_core::config::AppConfig;
use filemanager_core::error::{AppError, ErrorKind};
use filemanager_core::result::AppResult;
use filemanager_core::traits::disk::{ByteStream, Disk, DiskObjectMeta};
use filemanager_core::types::upload::with_name_suffix;
use filemanager_core::types::{AdapterMode, RequestContext, UploadedFile};
use filemanager_entity::{Breadcrumb, FileManagerItem, FolderNode, StorageItem};
use filemanager_storage::PathResolver;
use filemanager_storage::path::is_hidden;

use super::{FileManagerAdapter, failed, read_preview, recover, sort_items};
use crate::security::FileSecurityService;
use crate::url::FileUrlService;

/// File manager over a disk with no metadata store.
///
/// Identifiers are root-prefixed disk paths such as `uploads/docs/a.txt`.
/// Every incoming path is normalized by a [`PathResolver`] confined to the
/// configured root. Folders are renamed and moved by copying the tree and
/// deleting the source.
#[derive(Debug, Clone)]
pub struct StorageAdapter {
    disk: Arc<dyn Disk>,
    disk_name: String,
    resolver: PathResolver,
    show_hidden: bool,
    max_depth: usize,
    preview_max_bytes: u64,
    security: FileSecurityService,
    urls: FileUrlService,
}

impl StorageAdapter {
    /// Create an adapter over `disk` (registered as `disk_name`).
    pub fn new(disk_name: &str, disk: Arc<dyn Disk>, config: &AppConfig) -> AppResult<Self> {
        let settings = &config.filemanager;
        Ok(Self {
            resolver: PathResolver::new(&settings.root, disk_name)?,
            urls: FileUrlService::new(&config.urls, Arc::clone(&disk))?,
            security: FileSecurityService::new(config.security.clone(), settings.max_upload_size),
            disk,
            disk_name: disk_name.to_string(),
            show_hidden: settings.show_hidden,
            max_depth: settings.max_depth,
            preview_max_bytes: settings.preview_max_bytes,
        })
    }

    /// Attach the caller identity reported in security events.
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.resolver = self.resolver.with_context(context);
        self
    }

    /// The resolver confining this adapter.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    fn item(&self, meta: DiskObjectMeta) -> FileManagerItem {
        FileManagerItem::Storage(StorageItem::new(
            meta,
            self.resolver.root(),
            self.disk_name.clone(),
        ))
    }

    fn visible(&self, meta: &DiskObjectMeta) -> bool {
        self.show_hidden || !is_hidden(meta.name())
    }

    async fn list(&self, path: Option<&str>, folders_only: bool) -> AppResult<Vec<FileManagerItem>> {
        let dir = self.resolver.normalize(path)?;
        let entries = self.disk.list(&dir).await?;
        let mut items: Vec<FileManagerItem> = entries
            .into_iter()
            .filter(|meta| self.visible(meta) && (!folders_only || meta.is_directory))
            .map(|meta| self.item(meta))
            .collect();
        sort_items(&mut items);
        Ok(items)
    }

    /// Metadata of an existing entry, with a user-facing not-found error.
    async fn existing(&self, path: &str) -> AppResult<DiskObjectMeta> {
        self.disk.metadata(path).await.map_err(|e| {
            if e.is(ErrorKind::NotFound) {
                AppError::not_found("The item was not found.")
            } else {
                e
            }
        })
    }

    /// Succeeds when `dir` is the root or an existing directory.
    async fn ensure_folder(&self, dir: &str) -> AppResult<()> {
        if self.resolver.is_root(dir) || self.disk.is_directory(dir).await? {
            Ok(())
        } else {
            Err(AppError::not_found("The destination folder does not exist."))
        }
    }

    /// Disk path of the file `id` names; `None` for folders and misses.
    async fn file_path(&self, id: &str) -> AppResult<Option<String>> {
        let path = self.resolver.normalize(Some(id))?;
        if self.resolver.is_root(&path) {
            return Ok(None);
        }
        match self.disk.metadata(&path).await {
            Ok(meta) if !meta.is_directory => Ok(Some(path)),
            Ok(_) => Ok(None),
            Err(e) if e.is(ErrorKind::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn build_node(&self, meta: DiskObjectMeta, depth: usize) -> BoxFuture<'_, FolderNode> {
        async move {
            let entries = self.disk.list(&meta.path).await.unwrap_or_else(|e| {
                warn!(path = %meta.path, error = %e, "Failed to list folder while building tree");
                Vec::new()
            });
            let file_count = entries
                .iter()
                .filter(|e| !e.is_directory && self.visible(e))
                .count() as u64;

            let mut children = Vec::new();
            if depth + 1 < self.max_depth {
                for sub in entries
                    .into_iter()
                    .filter(|e| e.is_directory && self.visible(e))
                {
                    children.push(self.build_node(sub, depth + 1).await);
                }
            }
            sort_nodes(&mut children);

            FolderNode {
                id: meta.path.clone(),
                name: meta.name().to_string(),
                path: self.resolver.display_path(&meta.path),
                file_count,
                children,
            }
        }
        .boxed()
    }

    /// Copy a directory tree, refusing trees deeper than the depth cap.
    fn copy_tree(&self, from: String, to: String, depth: usize) -> BoxFuture<'_, AppResult<()>> {
        async move {
            if depth >= self.max_depth {
                return Err(AppError::storage(format!(
                    "The folder is nested deeper than {} levels and cannot be copied.",
                    self.max_depth
                )));
            }
            self.disk.create_dir(&to).await?;
            for entry in self.disk.list(&from).await? {
                let dest = format!("{to}/{}", entry.name());
                if entry.is_directory {
                    self.copy_tree(entry.path.clone(), dest, depth + 1).await?;
                } else {
                    self.disk.copy(&entry.path, &dest).await?;
                }
            }
            Ok(())
        }
        .boxed()
    }

    /// Move a directory by copy then delete.
    ///
    /// A failed copy removes the partial destination and leaves the source
    /// alone. A failed source delete keeps the destination, so both trees
    /// exist and the caller gets a storage error saying so.
    async fn relocate_dir(&self, source: &str, target: &str) -> AppResult<()> {
        if let Err(e) = self
            .copy_tree(source.to_string(), target.to_string(), 0)
            .await
        {
            if let Err(cleanup) = self.disk.delete_dir(target).await {
                warn!(path = %target, error = %cleanup, "Failed to remove partial folder copy");
            }
            return Err(e);
        }

        if let Err(e) = self.disk.delete_dir(source).await {
            error!(from = %source, to = %target, error = %e, "Folder copied but source could not be removed");
            return Err(AppError::storage(format!(
                "The folder was copied to \"{}\" but the original could not be removed.",
                self.resolver.display_path(target)
            )));
        }
        Ok(())
    }

    async fn relocate(&self, meta: &DiskObjectMeta, target: &str) -> AppResult<()> {
        if meta.is_directory {
            self.relocate_dir(&meta.path, target).await
        } else {
            self.disk.rename(&meta.path, target).await
        }
    }
}

#[async_trait]
impl FileManagerAdapter for StorageAdapter {
    async fn get_items(&self, path: Option<&str>) -> AppResult<Vec<FileManagerItem>> {
        recover("get_items", self.list(path, false).await)
    }

    async fn get_folders(&self, path: Option<&str>) -> AppResult<Vec<FileManagerItem>> {
        recover("get_folders", self.list(path, true).await)
    }

    async fn get_item(&self, id: &str) -> AppResult<Option<FileManagerItem>> {
        let path = self.resolver.normalize(Some(id))?;
        if self.resolver.is_root(&path) {
            return Ok(None);
        }
        match self.disk.metadata(&path).await {
            Ok(meta) => Ok(Some(self.item(meta))),
            Err(e) if e.is(ErrorKind::NotFound) => Ok(None),
            Err(e) => recover("get_item", Err(e)),
        }
    }

    async fn get_folder_tree(&self) -> AppResult<Vec<FolderNode>> {
        let root = self.resolver.normalize(None)?;
        let entries = recover("get_folder_tree", self.disk.list(&root).await)?;

        let mut nodes = Vec::new();
        if self.max_depth > 0 {
            for meta in entries
                .into_iter()
                .filter(|e| e.is_directory && self.visible(e))
            {
                nodes.push(self.build_node(meta, 0).await);
            }
        }
        sort_nodes(&mut nodes);
        Ok(nodes)
    }

    async fn get_breadcrumbs(&self, path: Option<&str>) -> AppResult<Vec<Breadcrumb>> {
        let dir = self.resolver.normalize(path)?;
        let mut crumbs = vec![Breadcrumb::root()];
        let mut current = self.resolver.root().to_string();
        for segment in self
            .resolver
            .display_path(&dir)
            .split('/')
            .filter(|s| !s.is_empty())
        {
            current = if current.is_empty() {
                segment.to_string()
            } else {
                format!("{current}/{segment}")
            };
            crumbs.push(Breadcrumb {
                id: Some(current.clone()),
                name: segment.to_string(),
                path: self.resolver.display_path(&current),
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
        let parent = self.resolver.normalize(parent_path)?;
        self.ensure_folder(&parent)
            .await
            .map_err(|e| failed(OP, &parent, e))?;

        let target = self.resolver.child(&parent, &name)?;
        let taken = self
            .disk
            .exists(&target)
            .await
            .map_err(|e| failed(OP, &target, e))?;
        if taken {
            return Err(failed(
                OP,
                &target,
                AppError::conflict(format!(
                    "A file or folder named \"{name}\" already exists here."
                )),
            ));
        }

        self.disk
            .create_dir(&target)
            .await
            .map_err(|e| failed(OP, &target, e))?;
        let meta = self
            .disk
            .metadata(&target)
            .await
            .map_err(|e| failed(OP, &target, e))?;

        info!(path = %target, disk = %self.disk_name, "Folder created");
        Ok(self.item(meta))
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
        let mut name = self
            .security
            .sanitize_name(&file.original_name)
            .map_err(|e| failed(OP, &file.original_name, e))?;

        let dir = self.resolver.normalize(path)?;
        self.ensure_folder(&dir)
            .await
            .map_err(|e| failed(OP, &dir, e))?;

        let mut target = self.resolver.child(&dir, &name)?;
        if self
            .disk
            .exists(&target)
            .await
            .map_err(|e| failed(OP, &target, e))?
        {
            name = with_name_suffix(&name, &Utc::now().timestamp().to_string());
            target = self.resolver.child(&dir, &name)?;
            if self
                .disk
                .exists(&target)
                .await
                .map_err(|e| failed(OP, &target, e))?
            {
                return Err(failed(
                    OP,
                    &target,
                    AppError::conflict(format!(
                        "A file named \"{name}\" already exists here."
                    )),
                ));
            }
        }

        let size = file.size();
        self.disk
            .write(&target, file.data)
            .await
            .map_err(|e| failed(OP, &target, e))?;
        let meta = self
            .disk
            .metadata(&target)
            .await
            .map_err(|e| failed(OP, &target, e))?;

        info!(path = %target, size, disk = %self.disk_name, "File uploaded");
        Ok(self.item(meta))
    }

    async fn rename(&self, id: &str, new_name: &str) -> AppResult<()> {
        const OP: &str = "rename the item";
        let new_name = self
            .security
            .validate_name(new_name)
            .map_err(|e| failed(OP, id, e))?;
        let source = self.resolver.normalize(Some(id))?;
        if self.resolver.is_root(&source) {
            return Err(AppError::validation("The root folder cannot be renamed."));
        }
        let meta = self
            .existing(&source)
            .await
            .map_err(|e| failed(OP, &source, e))?;

        let target = self.resolver.child(parent_dir(&source), &new_name)?;
        if target == source {
            return Ok(());
        }
        let taken = self
            .disk
            .exists(&target)
            .await
            .map_err(|e| failed(OP, &target, e))?;
        if taken {
            return Err(failed(
                OP,
                &target,
                AppError::conflict(format!(
                    "A file or folder named \"{new_name}\" already exists here."
                )),
            ));
        }

        self.relocate(&meta, &target)
            .await
            .map_err(|e| failed(OP, &source, e))?;
        info!(from = %source, to = %target, "Item renamed");
        Ok(())
    }

    async fn move_item(&self, id: &str, new_parent_path: Option<&str>) -> AppResult<()> {
        const OP: &str = "move the item";
        let source = self.resolver.normalize(Some(id))?;
        if self.resolver.is_root(&source) {
            return Err(AppError::validation("The root folder cannot be moved."));
        }
        let meta = self
            .existing(&source)
            .await
            .map_err(|e| failed(OP, &source, e))?;
        let dest = self.resolver.normalize(new_parent_path)?;

        if parent_dir(&source) == dest {
            return Ok(());
        }
        if meta.is_directory
            && (dest == source || dest.starts_with(&format!("{source}/")))
        {
            return Err(failed(
                OP,
                &source,
                AppError::invalid_hierarchy(
                    "A folder cannot be moved into itself or one of its subfolders.",
                ),
            ));
        }
        self.ensure_folder(&dest)
            .await
            .map_err(|e| failed(OP, &dest, e))?;

        let target = self.resolver.child(&dest, meta.name())?;
        let taken = self
            .disk
            .exists(&target)
            .await
            .map_err(|e| failed(OP, &target, e))?;
        if taken {
            return Err(failed(
                OP,
                &target,
                AppError::conflict(format!(
                    "An item named \"{}\" already exists in the destination folder.",
                    meta.name()
                )),
            ));
        }

        self.relocate(&meta, &target)
            .await
            .map_err(|e| failed(OP, &source, e))?;
        info!(from = %source, to = %target, "Item moved");
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        const OP: &str = "delete the item";
        let path = self.resolver.normalize(Some(id))?;
        if self.resolver.is_root(&path) {
            return Err(AppError::validation("The root folder cannot be deleted."));
        }
        let meta = self
            .existing(&path)
            .await
            .map_err(|e| failed(OP, &path, e))?;

        let result = if meta.is_directory {
            self.disk.delete_dir(&path).await
        } else {
            self.disk.delete(&path).await
        };
        result.map_err(|e| failed(OP, &path, e))?;

        info!(path = %path, folder = meta.is_directory, "Item deleted");
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> AppResult<usize> {
        let mut deleted = 0;
        for id in ids {
            match self.delete(id).await {
                Ok(()) => deleted += 1,
                Err(e) if e.is_fault() => return Err(e),
                Err(_) => {}
            }
        }
        Ok(deleted)
    }

    async fn exists(&self, id: &str) -> AppResult<bool> {
        let path = self.resolver.normalize(Some(id))?;
        recover("exists", self.disk.exists(&path).await)
    }

    async fn get_url(&self, id: &str) -> AppResult<Option<String>> {
        let path = recover("get_url", self.file_path(id).await)?;
        match path {
            Some(path) => Ok(Some(self.urls.url_for(&path, &path).await)),
            None => Ok(None),
        }
    }

    async fn get_contents(&self, id: &str, max_size: Option<u64>) -> AppResult<Option<String>> {
        let Some(path) = recover("get_contents", self.file_path(id).await)? else {
            return Ok(None);
        };
        let max = max_size.unwrap_or(self.preview_max_bytes);
        recover(
            "get_contents",
            read_preview(&*self.disk, &path, max).await.map(Some),
        )
    }

    async fn get_stream(&self, id: &str) -> AppResult<Option<ByteStream>> {
        let Some(path) = recover("get_stream", self.file_path(id).await)? else {
            return Ok(None);
        };
        recover("get_stream", self.disk.read(&path).await.map(Some))
    }

    async fn get_size(&self, id: &str) -> AppResult<Option<u64>> {
        let Some(path) = recover("get_size", self.file_path(id).await)? else {
            return Ok(None);
        };
        recover(
            "get_size",
            self.disk.metadata(&path).await.map(|m| Some(m.size_bytes)),
        )
    }

    fn mode_name(&self) -> AdapterMode {
        AdapterMode::Storage
    }
}

/// Containing directory of a disk path.
fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

fn sort_nodes(nodes: &mut [FolderNode]) {
    nodes.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}
