//! Commands that change files and folders.

use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use crate::output::{self, OutputFormat};
use filemanager_core::result::AppResult;
use filemanager_core::types::UploadedFile;
use filemanager_service::FileManagerAdapter;

/// Arguments for `mkdir`
#[derive(Debug, Args)]
pub struct MkdirArgs {
    /// Folder name
    pub name: String,

    /// Parent folder path (root when omitted)
    #[arg(short, long)]
    pub parent: Option<String>,
}

/// Arguments for `upload`
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Path to the local file
    pub file: PathBuf,

    /// Target folder path (root when omitted)
    #[arg(short, long)]
    pub to: Option<String>,

    /// Override the file name
    #[arg(short, long)]
    pub name: Option<String>,
}

/// Arguments for `mv`
#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Item identifier
    pub id: String,

    /// Destination folder path (root when omitted)
    #[arg(short, long)]
    pub to: Option<String>,
}

/// Arguments for `rename`
#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Item identifier
    pub id: String,

    /// New name
    pub name: String,
}

/// Arguments for `rm`
#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Item identifiers
    #[arg(required = true)]
    pub ids: Vec<String>,
}

/// Create a folder.
pub async fn mkdir(
    adapter: &dyn FileManagerAdapter,
    args: &MkdirArgs,
    format: OutputFormat,
) -> AppResult<()> {
    let folder = adapter
        .create_folder(&args.name, args.parent.as_deref())
        .await?;
    match format {
        OutputFormat::Table => output::print_success(&format!(
            "Folder '{}' created (id: {})",
            folder.path(),
            folder.identifier()
        )),
        OutputFormat::Json => output::print_json(&folder),
    }
    Ok(())
}

/// Upload a local file.
pub async fn upload(
    adapter: &dyn FileManagerAdapter,
    args: &UploadArgs,
    format: OutputFormat,
) -> AppResult<()> {
    let mut file = UploadedFile::from_path(&args.file).await?;
    if let Some(name) = &args.name {
        file.original_name = name.clone();
    }
    debug!(name = %file.original_name, size = file.size(), "Uploading local file");

    let item = adapter.upload_file(file, args.to.as_deref()).await?;
    match format {
        OutputFormat::Table => output::print_success(&format!(
            "File '{}' uploaded (id: {}, size: {})",
            item.path(),
            item.identifier(),
            output::human_size(item.size().unwrap_or_default())
        )),
        OutputFormat::Json => output::print_json(&item),
    }
    Ok(())
}

/// Move an item.
pub async fn move_item(adapter: &dyn FileManagerAdapter, args: &MoveArgs) -> AppResult<()> {
    adapter.move_item(&args.id, args.to.as_deref()).await?;
    output::print_success(&format!(
        "Moved '{}' to {}",
        args.id,
        args.to.as_deref().unwrap_or("/")
    ));
    Ok(())
}

/// Rename an item.
pub async fn rename(adapter: &dyn FileManagerAdapter, args: &RenameArgs) -> AppResult<()> {
    adapter.rename(&args.id, &args.name).await?;
    output::print_success(&format!("Renamed '{}' to '{}'", args.id, args.name));
    Ok(())
}

/// Delete items. A single id reports its own error; several are deleted
/// best-effort and counted.
pub async fn remove(adapter: &dyn FileManagerAdapter, args: &RemoveArgs) -> AppResult<()> {
    if let [id] = args.ids.as_slice() {
        adapter.delete(id).await?;
        output::print_success(&format!("Deleted '{id}'"));
        return Ok(());
    }

    let deleted = adapter.delete_many(&args.ids).await?;
    if deleted == args.ids.len() {
        output::print_success(&format!("Deleted {deleted} items"));
    } else {
        output::print_warning(&format!(
            "Deleted {deleted} of {} items",
            args.ids.len()
        ));
    }
    Ok(())
}
