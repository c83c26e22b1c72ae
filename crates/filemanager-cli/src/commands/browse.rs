//! Read-only commands.

use clap::Args;

use crate::output::{self, OutputFormat};
use filemanager_core::error::AppError;
use filemanager_core::result::AppResult;
use filemanager_service::FileManagerAdapter;

/// Arguments for `ls`
#[derive(Debug, Args)]
pub struct LsArgs {
    /// Folder path (root when omitted)
    pub path: Option<String>,

    /// Only list folders
    #[arg(long)]
    pub folders: bool,
}

/// Arguments naming one item
#[derive(Debug, Args)]
pub struct IdArgs {
    /// Item identifier
    pub id: String,
}

/// Arguments for `cat`
#[derive(Debug, Args)]
pub struct CatArgs {
    /// File identifier
    pub id: String,

    /// Maximum number of bytes to print
    #[arg(short, long)]
    pub max: Option<u64>,
}

/// List a folder.
pub async fn list(
    adapter: &dyn FileManagerAdapter,
    args: &LsArgs,
    format: OutputFormat,
) -> AppResult<()> {
    let path = args.path.as_deref();
    let items = if args.folders {
        adapter.get_folders(path).await?
    } else {
        adapter.get_items(path).await?
    };

    if format == OutputFormat::Table {
        let trail: Vec<String> = adapter
            .get_breadcrumbs(path)
            .await?
            .into_iter()
            .map(|crumb| crumb.name)
            .collect();
        println!("{}", trail.join(" › "));
    }
    output::print_items(&items, format);
    Ok(())
}

/// Print the folder tree.
pub async fn tree(adapter: &dyn FileManagerAdapter, format: OutputFormat) -> AppResult<()> {
    let nodes = adapter.get_folder_tree().await?;
    output::print_tree(&nodes, format);
    Ok(())
}

/// Show one item.
pub async fn info(
    adapter: &dyn FileManagerAdapter,
    args: &IdArgs,
    format: OutputFormat,
) -> AppResult<()> {
    let item = adapter
        .get_item(&args.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No item with id '{}'.", args.id)))?;
    output::print_item(&item, format);
    Ok(())
}

/// Print a file's text.
pub async fn cat(adapter: &dyn FileManagerAdapter, args: &CatArgs) -> AppResult<()> {
    let text = adapter
        .get_contents(&args.id, args.max)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No readable file with id '{}'.", args.id)))?;
    println!("{text}");
    Ok(())
}

/// Print a file's URL.
pub async fn url(adapter: &dyn FileManagerAdapter, args: &IdArgs) -> AppResult<()> {
    let url = adapter
        .get_url(&args.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No file with id '{}'.", args.id)))?;
    println!("{url}");
    Ok(())
}
