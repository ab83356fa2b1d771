//! Row-store access contract consumed by the sync engine.

use async_trait::async_trait;

use crate::errors::Result;

/// One stored row as a column-name → JSON-value map.
///
/// `serde_json::Map` iterates in key order, which keeps rendered documents
/// deterministic for a given row set.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Outcome of a raw statement executed against the store.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutcome {
    /// Rows returned by a SELECT or PRAGMA statement.
    Rows(Vec<Row>),
    /// Affected-row count reported for any other statement.
    Affected(usize),
}

impl RawOutcome {
    /// Rows if this outcome carries any, empty slice otherwise.
    pub fn rows(&self) -> &[Row] {
        match self {
            Self::Rows(rows) => rows,
            Self::Affected(_) => &[],
        }
    }

    /// Affected-row count, zero for row-returning statements.
    pub fn affected(&self) -> usize {
        match self {
            Self::Rows(_) => 0,
            Self::Affected(count) => *count,
        }
    }
}

/// Access to the relational store backing the export documents.
///
/// The engine never assumes a schema; monitored tables are runtime
/// configuration and every read goes through this seam.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// All current rows of `table`.
    async fn query_rows(&self, table: &str) -> Result<Vec<Row>>;

    /// `MAX(column)` over `table`, `None` when the table is empty or the
    /// column yields NULL. Errors when the column or table is absent.
    async fn aggregate_max(&self, table: &str, column: &str)
        -> Result<Option<serde_json::Value>>;

    /// Execute one raw statement. Row-returning statements (SELECT, PRAGMA)
    /// yield [`RawOutcome::Rows`]; everything else yields
    /// [`RawOutcome::Affected`]. Engine failures surface as
    /// [`SyncError::Statement`](crate::SyncError::Statement) with the native
    /// error text.
    async fn raw_execute(&self, sql: &str) -> Result<RawOutcome>;

    /// Modification time of the storage file in epoch milliseconds, `None`
    /// when the store has no backing file. Fallback change signal only.
    async fn storage_mtime(&self) -> Result<Option<i64>>;
}
