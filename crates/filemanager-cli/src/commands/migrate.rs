//! Metadata schema bootstrap command.

use tracing::info;

use crate::output;
use filemanager_core::config::AppConfig;
use filemanager_core::result::AppResult;
use filemanager_core::types::AdapterMode;
use filemanager_database::DatabasePool;
use filemanager_database::migration::ensure_schema;

/// Create the metadata table and indexes when missing.
pub async fn execute(config: &AppConfig) -> AppResult<()> {
    let mode: AdapterMode = config.filemanager.mode.parse()?;
    if mode != AdapterMode::Database {
        output::print_warning("Storage mode keeps no metadata; nothing to migrate.");
        return Ok(());
    }

    let table = &config.filemanager.table;
    println!("Ensuring metadata table '{table}'...");
    let db = DatabasePool::connect(&config.database).await?;
    ensure_schema(&db, table).await?;
    info!(table = %table, dialect = ?db.dialect(), "Metadata schema ready");
    db.close().await;

    output::print_success("Metadata schema is up to date.");
    Ok(())
}
