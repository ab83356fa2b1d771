//! `RowStore` implementation over a rusqlite connection.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use docsync_core::statement::is_valid_identifier;
use docsync_core::{RawOutcome, Result, Row, RowStore, SyncError};

use crate::errors::StorageError;

/// Busy timeout for the shared connection; external writers may hold the
/// file briefly.
const BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// SQLite-backed row store.
///
/// One connection behind a mutex: the engine's read rate is one polling
/// pass per interval plus occasional ad-hoc statements, so contention is
/// not a concern here.
pub struct SqliteRowStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteRowStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)
            .map_err(|e| StorageError::from(e).into_transient())?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| StorageError::from(e).into_transient())?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path),
        })
    }

    /// In-memory database; `storage_mtime` reports no backing file.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::from(e).into_transient())?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

#[async_trait]
impl RowStore for SqliteRowStore {
    async fn query_rows(&self, table: &str) -> Result<Vec<Row>> {
        if !is_valid_identifier(table) {
            return Err(SyncError::configuration(format!(
                "Invalid table name: {table}"
            )));
        }
        let conn = self.lock().map_err(StorageError::into_transient)?;
        query_json_rows(&conn, &format!("SELECT * FROM {table}"))
            .map_err(StorageError::into_transient)
    }

    async fn aggregate_max(
        &self,
        table: &str,
        column: &str,
    ) -> Result<Option<serde_json::Value>> {
        if !is_valid_identifier(table) || !is_valid_identifier(column) {
            return Err(SyncError::configuration(format!(
                "Invalid identifier: {table}.{column}"
            )));
        }
        let conn = self.lock().map_err(StorageError::into_transient)?;
        let value: rusqlite::types::Value = conn
            .query_row(&format!("SELECT MAX({column}) FROM {table}"), [], |row| {
                row.get(0)
            })
            .map_err(|e| StorageError::from(e).into_transient())?;
        Ok(match owned_to_json(value) {
            serde_json::Value::Null => None,
            json => Some(json),
        })
    }

    async fn raw_execute(&self, sql: &str) -> Result<RawOutcome> {
        let conn = self.lock().map_err(StorageError::into_statement)?;
        let leading = sql
            .trim_start()
            .split_whitespace()
            .next()
            .map(str::to_ascii_uppercase)
            .unwrap_or_default();

        if leading == "SELECT" || leading == "PRAGMA" {
            let rows =
                query_json_rows(&conn, sql).map_err(StorageError::into_statement)?;
            Ok(RawOutcome::Rows(rows))
        } else {
            let affected = conn
                .execute(sql, [])
                .map_err(|e| StorageError::from(e).into_statement())?;
            Ok(RawOutcome::Affected(affected))
        }
    }

    async fn storage_mtime(&self) -> Result<Option<i64>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        match std::fs::metadata(path).and_then(|meta| meta.modified()) {
            Ok(modified) => Ok(modified
                .duration_since(UNIX_EPOCH)
                .ok()
                .map(|d| d.as_millis() as i64)),
            Err(_) => Ok(None),
        }
    }
}

/// Run a row-returning statement and convert every row to a JSON map keyed
/// by column name.
fn query_json_rows(
    conn: &Connection,
    sql: &str,
) -> std::result::Result<Vec<Row>, StorageError> {
    let mut stmt = conn.prepare(sql)?;
    let column_names: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    let mut raw_rows = stmt.query([])?;
    while let Some(raw) = raw_rows.next()? {
        let mut row = Row::new();
        for (index, name) in column_names.iter().enumerate() {
            row.insert(name.clone(), ref_to_json(raw.get_ref(index)?));
        }
        rows.push(row);
    }
    Ok(rows)
}

fn ref_to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
        ValueRef::Blob(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn owned_to_json(value: rusqlite::types::Value) -> serde_json::Value {
    match value {
        rusqlite::types::Value::Null => serde_json::Value::Null,
        rusqlite::types::Value::Integer(i) => serde_json::Value::from(i),
        rusqlite::types::Value::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        rusqlite::types::Value::Text(text) => serde_json::Value::String(text),
        rusqlite::types::Value::Blob(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> SqliteRowStore {
        let store = SqliteRowStore::open_in_memory().expect("open");
        {
            let conn = store.conn.lock().unwrap();
            conn.execute_batch(
                "CREATE TABLE Orders (
                     id INTEGER PRIMARY KEY AUTOINCREMENT,
                     status TEXT NOT NULL,
                     updatedAt TEXT NOT NULL DEFAULT '2026-01-05 10:00:00'
                 );
                 INSERT INTO Orders (status) VALUES ('open');
                 INSERT INTO Orders (status) VALUES ('done');",
            )
            .expect("seed");
        }
        store
    }

    #[tokio::test]
    async fn query_rows_returns_json_maps() {
        let store = seeded_store();
        let rows = store.query_rows("Orders").await.expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id"), Some(&serde_json::json!(1)));
        assert_eq!(rows[1].get("status"), Some(&serde_json::json!("done")));
    }

    #[tokio::test]
    async fn query_rows_rejects_invalid_identifier() {
        let store = seeded_store();
        let err = store.query_rows("Orders; DROP TABLE x").await.unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
    }

    #[tokio::test]
    async fn aggregate_max_reads_update_column() {
        let store = seeded_store();
        let max = store.aggregate_max("Orders", "updatedAt").await.expect("max");
        assert_eq!(max, Some(serde_json::json!("2026-01-05 10:00:00")));
    }

    #[tokio::test]
    async fn aggregate_max_of_empty_table_is_none() {
        let store = seeded_store();
        store.raw_execute("DELETE FROM Orders").await.expect("clear");
        let max = store.aggregate_max("Orders", "updatedAt").await.expect("max");
        assert_eq!(max, None);
    }

    #[tokio::test]
    async fn aggregate_max_missing_column_errors() {
        let store = seeded_store();
        assert!(store.aggregate_max("Orders", "modified").await.is_err());
    }

    #[tokio::test]
    async fn raw_execute_splits_reads_and_writes() {
        let store = seeded_store();

        let outcome = store
            .raw_execute("SELECT * FROM Orders ORDER BY id")
            .await
            .expect("select");
        assert_eq!(outcome.rows().len(), 2);

        let outcome = store
            .raw_execute("UPDATE Orders SET status = 'archived'")
            .await
            .expect("update");
        assert_eq!(outcome.affected(), 2);
    }

    #[tokio::test]
    async fn raw_execute_surfaces_native_error_text() {
        let store = seeded_store();
        let err = store
            .raw_execute("SELECT * FROM Orderz")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Orderz"), "got: {err}");
    }

    #[tokio::test]
    async fn pragma_returns_rows() {
        let store = seeded_store();
        let outcome = store
            .raw_execute("PRAGMA table_info(Orders)")
            .await
            .expect("pragma");
        let names: Vec<_> = outcome
            .rows()
            .iter()
            .filter_map(|row| row.get("name").and_then(serde_json::Value::as_str))
            .collect();
        assert!(names.contains(&"id"));
        assert!(names.contains(&"updatedAt"));
    }

    #[tokio::test]
    async fn in_memory_store_has_no_mtime() {
        let store = seeded_store();
        assert_eq!(store.storage_mtime().await.expect("mtime"), None);
    }
}
