//! CLI command definitions and dispatch.

pub mod browse;
pub mod manage;
pub mod migrate;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use filemanager_core::config::AppConfig;
use filemanager_core::result::AppResult;
use filemanager_service::{AdapterFactory, FileManagerAdapter};

/// File manager: browse and manage files through the database or storage backend
#[derive(Debug, Parser)]
#[command(name = "filemanager", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay loaded from `config/{env}.toml`
    #[arg(short, long, env = "FILEMANAGER_ENV")]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the contents of a folder
    Ls(browse::LsArgs),
    /// Show the folder tree
    Tree,
    /// Show details of one item
    Info(browse::IdArgs),
    /// Print the text contents of a file
    Cat(browse::CatArgs),
    /// Print a URL for a file
    Url(browse::IdArgs),
    /// Create a folder
    Mkdir(manage::MkdirArgs),
    /// Upload a local file
    Upload(manage::UploadArgs),
    /// Move an item to another folder
    Mv(manage::MoveArgs),
    /// Rename an item
    Rename(manage::RenameArgs),
    /// Delete one or more items
    Rm(manage::RemoveArgs),
    /// Create the metadata table (database mode)
    Migrate,
}

impl Cli {
    /// Execute the CLI command against a loaded configuration
    pub async fn execute(&self, config: AppConfig) -> AppResult<()> {
        if let Commands::Migrate = self.command {
            return migrate::execute(&config).await;
        }

        let adapter = build_adapter(config).await?;
        let adapter: &dyn FileManagerAdapter = &*adapter;
        match &self.command {
            Commands::Ls(args) => browse::list(adapter, args, self.format).await,
            Commands::Tree => browse::tree(adapter, self.format).await,
            Commands::Info(args) => browse::info(adapter, args, self.format).await,
            Commands::Cat(args) => browse::cat(adapter, args).await,
            Commands::Url(args) => browse::url(adapter, args).await,
            Commands::Mkdir(args) => manage::mkdir(adapter, args, self.format).await,
            Commands::Upload(args) => manage::upload(adapter, args, self.format).await,
            Commands::Mv(args) => manage::move_item(adapter, args).await,
            Commands::Rename(args) => manage::rename(adapter, args).await,
            Commands::Rm(args) => manage::remove(adapter, args).await,
            Commands::Migrate => Ok(()),
        }
    }
}

/// Helper: load configuration from file, overlay and environment
pub fn load_config(config_path: &str, env: Option<&str>) -> AppResult<AppConfig> {
    AppConfig::load(config_path, env)
}

/// Helper: build the adapter the configuration selects
pub async fn build_adapter(config: AppConfig) -> AppResult<Arc<dyn FileManagerAdapter>> {
    AdapterFactory::from_config(config).await?.make().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from([
            "filemanager",
            "--format",
            "json",
            "mkdir",
            "docs",
            "--parent",
            "/media",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Mkdir(args) => {
                assert_eq!(args.name, "docs");
                assert_eq!(args.parent.as_deref(), Some("/media"));
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["filemanager", "rm", "1", "2", "3"]).unwrap();
        match cli.command {
            Commands::Rm(args) => assert_eq!(args.ids, vec!["1", "2", "3"]),
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.config, "config/default.toml");
    }

    #[test]
    fn test_rm_requires_an_id() {
        assert!(Cli::try_parse_from(["filemanager", "rm"]).is_err());
    }
}
