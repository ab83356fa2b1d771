//! Per-table change detection against the last confirmed observation.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};
use log::{debug, warn};

use crate::errors::Result;
use crate::store::RowStore;
use crate::sync::cadence::CHECKSUM_SAMPLE_ROWS;
use crate::sync::observation::TableObservation;
use crate::sync::suppression::SuppressionLedger;

/// Detection knobs. Monitored schemas are caller-defined, so the update
/// column is configurable; the default matches ORM-managed tables.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub update_column: String,
    pub sample_rows: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            update_column: "updatedAt".to_string(),
            sample_rows: CHECKSUM_SAMPLE_ROWS,
        }
    }
}

/// Decides per table whether stored content diverges from the last
/// observation.
#[derive(Clone)]
pub struct ChangeDetector {
    store: Arc<dyn RowStore>,
    config: DetectorConfig,
}

impl ChangeDetector {
    pub fn new(store: Arc<dyn RowStore>, config: DetectorConfig) -> Self {
        Self { store, config }
    }

    /// Take a fresh observation of `table`.
    ///
    /// The modification-time side degrades gracefully (update column → file
    /// mtime → zero); only a failing row count makes the whole observation
    /// fail, since without it the checksum carries no signal.
    pub async fn observe(&self, table: &str) -> Result<TableObservation> {
        let last_modified_ms = self.current_mod_time(table).await;
        let checksum = self.current_checksum(table).await?;
        Ok(TableObservation {
            table: table.to_string(),
            last_modified_ms,
            checksum,
        })
    }

    /// True when `table` diverged from `last`. Suppressed tables and any
    /// internal failure report no change; a monitor tick must never crash
    /// the host process.
    pub async fn has_changed(
        &self,
        table: &str,
        last: &TableObservation,
        suppression: &SuppressionLedger,
    ) -> bool {
        if suppression.is_suppressed(table) {
            debug!("[DbMonitor] {} suppressed, skipping detection", table);
            return false;
        }
        match self.observe(table).await {
            Ok(current) => last.diverges_from(&current),
            Err(err) => {
                warn!("[DbMonitor] Detection failed for {}: {}", table, err);
                false
            }
        }
    }

    /// Prefer `MAX(update_column)`; fall back to the storage file's mtime
    /// when the column is absent or the query fails, zero when neither
    /// signal exists.
    async fn current_mod_time(&self, table: &str) -> i64 {
        match self
            .store
            .aggregate_max(table, &self.config.update_column)
            .await
        {
            Ok(Some(value)) => {
                if let Some(ms) = timestamp_millis(&value) {
                    return ms;
                }
                debug!(
                    "[DbMonitor] Unparseable {} value for {}: {}",
                    self.config.update_column, table, value
                );
                self.file_mtime_fallback().await
            }
            Ok(None) => self.file_mtime_fallback().await,
            Err(_) => self.file_mtime_fallback().await,
        }
    }

    async fn file_mtime_fallback(&self) -> i64 {
        match self.store.storage_mtime().await {
            Ok(Some(ms)) => ms,
            Ok(None) => 0,
            Err(err) => {
                debug!("[DbMonitor] Storage mtime unavailable: {}", err);
                0
            }
        }
    }

    /// Row count concatenated with the ids of the most recent rows by
    /// descending id; count alone when no id column exists.
    async fn current_checksum(&self, table: &str) -> Result<String> {
        let count_sql = format!("SELECT COUNT(*) AS count FROM {table}");
        let outcome = self.store.raw_execute(&count_sql).await?;
        let row_count = outcome
            .rows()
            .first()
            .and_then(|row| row.get("count"))
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0);

        let ids_sql = format!(
            "SELECT GROUP_CONCAT(id) AS ids FROM \
             (SELECT id FROM {table} ORDER BY id DESC LIMIT {limit})",
            limit = self.config.sample_rows
        );
        match self.store.raw_execute(&ids_sql).await {
            Ok(outcome) => {
                let ids = outcome
                    .rows()
                    .first()
                    .and_then(|row| row.get("ids"))
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("")
                    .to_string();
                Ok(format!("{row_count}-{ids}"))
            }
            Err(_) => Ok(row_count.to_string()),
        }
    }
}

/// Parse an update-column value into epoch milliseconds. Accepts epoch
/// numbers, RFC 3339, and SQLite's `CURRENT_TIMESTAMP` format.
fn timestamp_millis(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(number) => number.as_i64(),
        serde_json::Value::String(text) => {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                return Some(parsed.timestamp_millis());
            }
            if let Ok(parsed) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
                return Some(parsed.and_utc().timestamp_millis());
            }
            None
        }
        _ => None,
    }
}
