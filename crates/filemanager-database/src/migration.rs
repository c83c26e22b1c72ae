//! Schema bootstrap for the metadata table.

use tracing::info;

use filemanager_core::error::{AppError, ErrorKind};

use crate::connection::{DatabasePool, Dialect};

/// Validate a table name before it is interpolated into SQL.
pub fn validate_table_name(table: &str) -> Result<(), AppError> {
    let valid = !table.is_empty()
        && table.len() <= 63
        && !table.starts_with(|c: char| c.is_ascii_digit())
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::configuration(format!(
            "Invalid metadata table name '{table}'"
        )))
    }
}

/// Create the self-referencing item table and its indexes when missing.
pub async fn ensure_schema(pool: &DatabasePool, table: &str) -> Result<(), AppError> {
    validate_table_name(table)?;
    info!(table, "Ensuring metadata schema");

    let id_column = match pool.dialect() {
        Dialect::Postgres => "id BIGSERIAL PRIMARY KEY",
        Dialect::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
    };

    let statements = [
        format!(
            "CREATE TABLE IF NOT EXISTS {table} ( \
                {id_column}, \
                name TEXT NOT NULL, \
                type TEXT NOT NULL, \
                file_type TEXT, \
                parent_id BIGINT REFERENCES {table}(id) ON DELETE CASCADE, \
                size BIGINT, \
                duration BIGINT, \
                thumbnail TEXT, \
                storage_path TEXT, \
                mime_type TEXT, \
                created_at BIGINT NOT NULL, \
                updated_at BIGINT NOT NULL \
             )"
        ),
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {table}_parent_name_key ON {table} (parent_id, name)"
        ),
        // NULL parents never collide in the composite index above.
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {table}_root_name_key ON {table} (name) \
             WHERE parent_id IS NULL"
        ),
        format!("CREATE INDEX IF NOT EXISTS {table}_type_idx ON {table} (type)"),
    ];

    for statement in &statements {
        sqlx::query(statement)
            .execute(pool.pool())
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to create schema: {e}"),
                    e,
                )
            })?;
    }

    info!(table, "Metadata schema ready");
    Ok(())
}
