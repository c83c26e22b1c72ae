//! Command-line front end for the file manager.
//!
//! Every command goes through [`filemanager_service::AdapterFactory`], so
//! the same commands drive the database and the storage backend.

pub mod commands;
pub mod output;

pub use commands::{Cli, Commands, load_config};
pub use output::OutputFormat;
