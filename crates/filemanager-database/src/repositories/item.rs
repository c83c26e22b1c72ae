//! Item repository implementation.
//!
//! Plain reads are generic over the executor so callers can run them on
//! the pool or inside an open transaction. The `lock_*` queries and all
//! writes take the transaction's connection.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{Any, AnyConnection, Executor, Transaction};

use filemanager_core::error::{AppError, ErrorKind};
use filemanager_core::result::AppResult;
use filemanager_entity::{ItemKind, ItemRecord, NewItemRecord};

use crate::connection::DatabasePool;
use crate::migration::validate_table_name;

/// An open transaction on the metadata database.
pub type ItemTx = Transaction<'static, Any>;

const COLUMNS: &str = "id, name, type, file_type, parent_id, size, duration, thumbnail, \
                       storage_path, mime_type, created_at, updated_at";

/// Bound on ancestor walks; deeper chains are treated as corrupt.
const MAX_CHAIN: i64 = 256;

/// Repository for item CRUD, hierarchy walks, and row locks.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    db: DatabasePool,
    table: String,
}

impl ItemRepository {
    /// Create a repository over `table`.
    pub fn new(db: DatabasePool, table: impl Into<String>) -> AppResult<Self> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self { db, table })
    }

    /// The pool used for reads outside a transaction.
    pub fn db(&self) -> &DatabasePool {
        &self.db
    }

    /// Metadata table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Begin a transaction.
    pub async fn begin(&self) -> AppResult<ItemTx> {
        self.db
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e))
    }

    /// Find an item by ID.
    pub async fn find_by_id<'c, E>(&self, exec: E, id: i64) -> AppResult<Option<ItemRecord>>
    where
        E: Executor<'c, Database = Any>,
    {
        let sql = format!("SELECT {COLUMNS} FROM {} WHERE id = $1", self.table);
        sqlx::query_as::<_, ItemRecord>(&sql)
            .bind(id)
            .fetch_optional(exec)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find item", e))
    }

    /// Find the child of `parent_id` named exactly `name`.
    pub async fn find_child<'c, E>(
        &self,
        exec: E,
        parent_id: Option<i64>,
        name: &str,
    ) -> AppResult<Option<ItemRecord>>
    where
        E: Executor<'c, Database = Any>,
    {
        let sql = format!(
            "SELECT {COLUMNS} FROM {} WHERE name = $1 AND {} LIMIT 1",
            self.table,
            parent_filter(parent_id, 2)
        );
        let mut query = sqlx::query_as::<_, ItemRecord>(&sql).bind(name);
        if let Some(parent) = parent_id {
            query = query.bind(parent);
        }
        query
            .fetch_optional(exec)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find child item", e))
    }

    /// Direct children of `parent_id`, folders first, then by name without
    /// regard to case. `kind` restricts the result to one kind.
    pub async fn children<'c, E>(
        &self,
        exec: E,
        parent_id: Option<i64>,
        kind: Option<ItemKind>,
    ) -> AppResult<Vec<ItemRecord>>
    where
        E: Executor<'c, Database = Any>,
    {
        let kind_filter = kind
            .map(|k| format!(" AND type = '{}'", k.as_str()))
            .unwrap_or_default();
        let sql = format!(
            "SELECT {COLUMNS} FROM {} WHERE {}{kind_filter} \
             ORDER BY CASE WHEN type = 'folder' THEN 0 ELSE 1 END, LOWER(name), name",
            self.table,
            parent_filter(parent_id, 1)
        );
        let mut query = sqlx::query_as::<_, ItemRecord>(&sql);
        if let Some(parent) = parent_id {
            query = query.bind(parent);
        }
        query
            .fetch_all(exec)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    /// Every folder row, ordered by name.
    pub async fn all_folders<'c, E>(&self, exec: E) -> AppResult<Vec<ItemRecord>>
    where
        E: Executor<'c, Database = Any>,
    {
        let sql = format!(
            "SELECT {COLUMNS} FROM {} WHERE type = 'folder' ORDER BY LOWER(name), name",
            self.table
        );
        sqlx::query_as::<_, ItemRecord>(&sql)
            .fetch_all(exec)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folders", e))
    }

    /// Number of files directly inside each folder that has any.
    pub async fn file_counts<'c, E>(&self, exec: E) -> AppResult<HashMap<i64, u64>>
    where
        E: Executor<'c, Database = Any>,
    {
        let sql = format!(
            "SELECT parent_id, COUNT(*) FROM {} \
             WHERE type = 'file' AND parent_id IS NOT NULL GROUP BY parent_id",
            self.table
        );
        let rows: Vec<(i64, i64)> = sqlx::query_as(&sql)
            .fetch_all(exec)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count files", e))?;
        Ok(rows
            .into_iter()
            .map(|(parent, count)| (parent, count.max(0) as u64))
            .collect())
    }

    /// The chain from the top-level ancestor down to `id` itself.
    ///
    /// Empty when `id` does not exist.
    pub async fn ancestors<'c, E>(&self, exec: E, id: i64) -> AppResult<Vec<ItemRecord>>
    where
        E: Executor<'c, Database = Any>,
    {
        let sql = format!(
            "WITH RECURSIVE chain (id, parent_id, lvl) AS ( \
                 SELECT id, parent_id, 0 FROM {t} WHERE id = $1 \
                 UNION ALL \
                 SELECT p.id, p.parent_id, chain.lvl + 1 FROM {t} p \
                 JOIN chain ON p.id = chain.parent_id WHERE chain.lvl < {MAX_CHAIN} \
             ) \
             SELECT {cols} FROM {t} i JOIN chain ON i.id = chain.id ORDER BY chain.lvl DESC",
            t = self.table,
            cols = qualified("i"),
        );
        sqlx::query_as::<_, ItemRecord>(&sql)
            .bind(id)
            .fetch_all(exec)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load ancestors", e))
    }

    /// Every row below `id` (not including `id`).
    pub async fn descendants<'c, E>(&self, exec: E, id: i64) -> AppResult<Vec<ItemRecord>>
    where
        E: Executor<'c, Database = Any>,
    {
        let sql = format!(
            "WITH RECURSIVE tree (id) AS ( \
                 SELECT id FROM {t} WHERE parent_id = $1 \
                 UNION \
                 SELECT c.id FROM {t} c JOIN tree ON c.parent_id = tree.id \
             ) \
             SELECT {cols} FROM {t} i JOIN tree ON i.id = tree.id",
            t = self.table,
            cols = qualified("i"),
        );
        sqlx::query_as::<_, ItemRecord>(&sql)
            .bind(id)
            .fetch_all(exec)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to load descendants", e)
            })
    }

    /// Select `id` and hold its row lock until the transaction ends.
    pub async fn lock_by_id(
        &self,
        conn: &mut AnyConnection,
        id: i64,
    ) -> AppResult<Option<ItemRecord>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {} WHERE id = $1{}",
            self.table,
            self.db.dialect().lock_clause()
        );
        sqlx::query_as::<_, ItemRecord>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock item", e))
    }

    /// Select and lock the sibling named `name` under `parent_id`, skipping
    /// `exclude` (the row being renamed or moved).
    pub async fn lock_sibling(
        &self,
        conn: &mut AnyConnection,
        parent_id: Option<i64>,
        name: &str,
        exclude: Option<i64>,
    ) -> AppResult<Option<ItemRecord>> {
        let next = if parent_id.is_some() { 3 } else { 2 };
        let exclude_filter = exclude
            .map(|_| format!(" AND id <> ${next}"))
            .unwrap_or_default();
        let sql = format!(
            "SELECT {COLUMNS} FROM {} WHERE name = $1 AND {}{exclude_filter} LIMIT 1{}",
            self.table,
            parent_filter(parent_id, 2),
            self.db.dialect().lock_clause()
        );
        let mut query = sqlx::query_as::<_, ItemRecord>(&sql).bind(name);
        if let Some(parent) = parent_id {
            query = query.bind(parent);
        }
        if let Some(id) = exclude {
            query = query.bind(id);
        }
        query
            .fetch_optional(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock sibling", e))
    }

    /// Insert a row and return it as stored.
    pub async fn insert(
        &self,
        conn: &mut AnyConnection,
        data: &NewItemRecord,
    ) -> AppResult<ItemRecord> {
        let now = Utc::now().timestamp();
        let sql = format!(
            "INSERT INTO {} (name, type, file_type, parent_id, size, duration, thumbnail, \
             storage_path, mime_type, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {COLUMNS}",
            self.table
        );
        sqlx::query_as::<_, ItemRecord>(&sql)
            .bind(&data.name)
            .bind(data.kind.as_str())
            .bind(data.file_type.as_str())
            .bind(data.parent_id)
            .bind(data.size)
            .bind(data.duration)
            .bind(data.thumbnail.as_deref())
            .bind(data.storage_path.as_deref())
            .bind(data.mime_type.as_deref())
            .bind(now)
            .bind(now)
            .fetch_one(conn)
            .await
            .map_err(write_error("Failed to insert item"))
    }

    /// Rename a row. Returns whether a row was updated.
    pub async fn update_name(
        &self,
        conn: &mut AnyConnection,
        id: i64,
        name: &str,
    ) -> AppResult<bool> {
        let sql = format!(
            "UPDATE {} SET name = $1, updated_at = $2 WHERE id = $3",
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(name)
            .bind(Utc::now().timestamp())
            .bind(id)
            .execute(conn)
            .await
            .map_err(write_error("Failed to rename item"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Re-parent a row. Returns whether a row was updated.
    pub async fn update_parent(
        &self,
        conn: &mut AnyConnection,
        id: i64,
        parent_id: Option<i64>,
    ) -> AppResult<bool> {
        let sql = format!(
            "UPDATE {} SET parent_id = $1, updated_at = $2 WHERE id = $3",
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(parent_id)
            .bind(Utc::now().timestamp())
            .bind(id)
            .execute(conn)
            .await
            .map_err(write_error("Failed to move item"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete rows by ID. Returns the number of rows removed.
    pub async fn delete_ids(&self, conn: &mut AnyConnection, ids: &[i64]) -> AppResult<u64> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);
        let mut removed = 0;
        for id in ids {
            let result = sqlx::query(&sql)
                .bind(*id)
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to delete item", e)
                })?;
            removed += result.rows_affected();
        }
        Ok(removed)
    }
}

/// `parent_id IS NULL` for the root level, otherwise a bound comparison.
fn parent_filter(parent_id: Option<i64>, placeholder: usize) -> String {
    match parent_id {
        Some(_) => format!("parent_id = ${placeholder}"),
        None => "parent_id IS NULL".to_string(),
    }
}

fn qualified(alias: &str) -> String {
    COLUMNS
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Unique-index violations surface as a name conflict.
fn write_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        let duplicate = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
        if duplicate {
            AppError::with_source(
                ErrorKind::Conflict,
                "An item with this name already exists in this location.",
                e,
            )
        } else {
            AppError::with_source(ErrorKind::Database, context, e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::ensure_schema;
    use filemanager_entity::FileType;

    async fn repo() -> ItemRepository {
        let db = DatabasePool::in_memory().await.unwrap();
        ensure_schema(&db, "items").await.unwrap();
        ItemRepository::new(db, "items").unwrap()
    }

    fn file(name: &str, parent_id: Option<i64>) -> NewItemRecord {
        NewItemRecord {
            name: name.to_string(),
            kind: ItemKind::File,
            file_type: FileType::Document,
            parent_id,
            size: Some(3),
            duration: None,
            thumbnail: None,
            storage_path: Some(format!("uploads/{name}")),
            mime_type: Some("text/plain".into()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_hierarchy() {
        let repo = repo().await;
        let mut tx = repo.begin().await.unwrap();
        let docs = repo
            .insert(&mut tx, &NewItemRecord::folder("docs", None))
            .await
            .unwrap();
        let sub = repo
            .insert(&mut tx, &NewItemRecord::folder("sub", Some(docs.id)))
            .await
            .unwrap();
        let a = repo.insert(&mut tx, &file("a.txt", Some(sub.id))).await.unwrap();
        repo.insert(&mut tx, &file("B.txt", Some(docs.id))).await.unwrap();
        tx.commit().await.unwrap();

        let chain = repo.ancestors(repo.db().pool(), a.id).await.unwrap();
        let names: Vec<_> = chain.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "sub", "a.txt"]);

        let children = repo.children(repo.db().pool(), Some(docs.id), None).await.unwrap();
        let names: Vec<_> = children.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["sub", "B.txt"]);

        let below = repo.descendants(repo.db().pool(), docs.id).await.unwrap();
        assert_eq!(below.len(), 3);

        let counts = repo.file_counts(repo.db().pool()).await.unwrap();
        assert_eq!(counts.get(&docs.id), Some(&1));
        assert_eq!(counts.get(&sub.id), Some(&1));
    }

    #[tokio::test]
    async fn test_duplicate_sibling_is_conflict() {
        let repo = repo().await;
        let mut tx = repo.begin().await.unwrap();
        let docs = repo
            .insert(&mut tx, &NewItemRecord::folder("docs", None))
            .await
            .unwrap();
        repo.insert(&mut tx, &file("a.txt", Some(docs.id))).await.unwrap();
        let err = repo
            .insert(&mut tx, &file("a.txt", Some(docs.id)))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_duplicate_root_name_is_conflict() {
        let repo = repo().await;
        let mut tx = repo.begin().await.unwrap();
        repo.insert(&mut tx, &NewItemRecord::folder("dup", None))
            .await
            .unwrap();
        let err = repo
            .insert(&mut tx, &NewItemRecord::folder("dup", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let other = repo.insert(&mut tx, &file("other.txt", None)).await.unwrap();
        let err = repo.update_name(&mut tx, other.id, "dup").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let docs = repo
            .insert(&mut tx, &NewItemRecord::folder("docs", None))
            .await
            .unwrap();
        let nested = repo
            .insert(&mut tx, &NewItemRecord::folder("dup", Some(docs.id)))
            .await
            .unwrap();
        let err = repo.update_parent(&mut tx, nested.id, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_lock_sibling_excludes_self() {
        let repo = repo().await;
        let mut tx = repo.begin().await.unwrap();
        let a = repo.insert(&mut tx, &file("a.txt", None)).await.unwrap();

        let found = repo.lock_sibling(&mut tx, None, "a.txt", None).await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(a.id));
        let skipped = repo
            .lock_sibling(&mut tx, None, "a.txt", Some(a.id))
            .await
            .unwrap();
        assert!(skipped.is_none());

        assert!(repo.update_name(&mut tx, a.id, "b.txt").await.unwrap());
        assert_eq!(repo.delete_ids(&mut tx, &[a.id, 999]).await.unwrap(), 1);
        tx.commit().await.unwrap();
        assert!(repo.find_by_id(repo.db().pool(), a.id).await.unwrap().is_none());
    }
}
