//! Statement execution and the synchronous export trigger for mutations.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SyncError};
use crate::statement::classify::{
    classify_statement, has_destructive_keyword, is_valid_identifier, StatementKind,
};
use crate::store::{RawOutcome, Row, RowStore};
use crate::sync::{ExportCoordinator, SuppressionLedger};
use crate::targets::ExportTargetRegistry;

/// Structured result of one executed statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementOutput {
    pub rows: Vec<Row>,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub affected_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_insert_id: Option<i64>,
    pub message: String,
}

/// Classifies ad-hoc statements, executes them, and for mutations targeting
/// a mapped table synchronously exports the document, bypassing the polling
/// delay.
#[derive(Clone)]
pub struct StatementExecutor {
    store: Arc<dyn RowStore>,
    coordinator: ExportCoordinator,
    registry: Arc<ExportTargetRegistry>,
    suppression: Arc<SuppressionLedger>,
    /// Delay before responding after a mutation-triggered export, bounding
    /// the race with a concurrent reader re-fetching the document.
    settle: Duration,
    /// Same grace the monitor uses, so it does not independently
    /// re-trigger on this statement's change.
    suppression_grace: Duration,
}

impl StatementExecutor {
    pub fn new(
        store: Arc<dyn RowStore>,
        coordinator: ExportCoordinator,
        registry: Arc<ExportTargetRegistry>,
        suppression: Arc<SuppressionLedger>,
        settle: Duration,
        suppression_grace: Duration,
    ) -> Self {
        Self {
            store,
            coordinator,
            registry,
            suppression,
            settle,
            suppression_grace,
        }
    }

    /// Execute one raw statement.
    ///
    /// In hardened mode only SELECT and PRAGMA run; anything else is
    /// rejected before execution. Execution failures surface with the
    /// native engine text. A failed post-mutation export never fails the
    /// statement's own result; the statement already committed.
    pub async fn execute(&self, sql: &str, hardened: bool) -> Result<StatementOutput> {
        let classification = classify_statement(sql);

        match classification.kind {
            StatementKind::Query | StatementKind::Pragma => {
                let outcome = self.store.raw_execute(sql).await?;
                Ok(row_output(outcome))
            }
            StatementKind::Mutation => {
                if hardened {
                    return Err(SyncError::permission_denied(
                        "Only SELECT and PRAGMA statements are allowed in hardened mode",
                    ));
                }
                if has_destructive_keyword(sql) {
                    warn!(
                        "[Statement] Potentially destructive statement executed: {}",
                        truncate(sql, 100)
                    );
                }

                let outcome = self.store.raw_execute(sql).await?;
                let affected_rows = outcome.affected();
                let is_insert = sql
                    .trim_start()
                    .get(..6)
                    .is_some_and(|head| head.eq_ignore_ascii_case("INSERT"));
                let last_insert_id = if is_insert { self.last_insert_id().await } else { None };

                self.export_after_mutation(classification.target_table.as_deref())
                    .await;

                let message = match last_insert_id {
                    Some(id) => format!(
                        "Statement executed successfully. {affected_rows} row(s) affected. Last inserted ID: {id}"
                    ),
                    None => {
                        format!("Statement executed successfully. {affected_rows} row(s) affected.")
                    }
                };
                Ok(StatementOutput {
                    rows: Vec::new(),
                    row_count: 0,
                    columns: Vec::new(),
                    affected_rows,
                    last_insert_id,
                    message,
                })
            }
        }
    }

    /// User tables from the catalog, sorted by name.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let outcome = self
            .store
            .raw_execute(
                "SELECT name FROM sqlite_master \
                 WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .await?;
        Ok(outcome
            .rows()
            .iter()
            .filter_map(|row| row.get("name").and_then(serde_json::Value::as_str))
            .map(str::to_string)
            .collect())
    }

    /// Column metadata for one table via `PRAGMA table_info`.
    pub async fn table_schema(&self, table: &str) -> Result<Vec<Row>> {
        if !is_valid_identifier(table) {
            return Err(SyncError::configuration(format!(
                "Invalid table name: {table}"
            )));
        }
        let outcome = self
            .store
            .raw_execute(&format!("PRAGMA table_info({table})"))
            .await?;
        Ok(outcome.rows().to_vec())
    }

    /// Best-effort follow-up lookup; silently omitted when it fails.
    async fn last_insert_id(&self) -> Option<i64> {
        match self
            .store
            .raw_execute("SELECT last_insert_rowid() AS lastInsertRowid")
            .await
        {
            Ok(outcome) => outcome
                .rows()
                .first()
                .and_then(|row| row.get("lastInsertRowid"))
                .and_then(serde_json::Value::as_i64),
            Err(err) => {
                debug!("[Statement] last_insert_rowid lookup failed: {}", err);
                None
            }
        }
    }

    /// Export the mutated table's document before the statement responds.
    /// Only the lexically first extracted table is considered; DDL and
    /// unmapped tables are left to the polling monitor or a force sync.
    async fn export_after_mutation(&self, target_table: Option<&str>) {
        let Some(name) = target_table else {
            debug!("[Statement] Mutation without extractable table, no export triggered");
            return;
        };
        let Some(target) = self.registry.resolve(name).cloned() else {
            warn!("[Statement] No export target for mutated table {}", name);
            return;
        };

        self.suppression.hold(&target.table);
        if let Err(err) = self.coordinator.export(&target).await {
            // Freshness degradation only; the monitor re-detects later.
            error!("[Statement] Failed to export after mutation: {}", err);
        }
        tokio::time::sleep(self.settle).await;
        self.suppression
            .release_after(&target.table, self.suppression_grace);
    }
}

/// Shape rows for the caller: column list from the first row's keys, keys
/// de-qualified by stripping any `table.` prefix.
fn row_output(outcome: RawOutcome) -> StatementOutput {
    let rows: Vec<Row> = outcome
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|(key, value)| (dequalify(key).to_string(), value.clone()))
                .collect()
        })
        .collect();
    let columns: Vec<String> = rows
        .first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();
    let row_count = rows.len();
    StatementOutput {
        rows,
        row_count,
        columns,
        affected_rows: 0,
        last_insert_id: None,
        message: format!("Query executed successfully. {row_count} row(s) returned."),
    }
}

fn dequalify(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or(key)
}

fn truncate(sql: &str, max_chars: usize) -> String {
    sql.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_output_dequalifies_columns_and_keys() {
        let mut row = Row::new();
        row.insert("Orders.id".to_string(), serde_json::json!(1));
        row.insert("status".to_string(), serde_json::json!("open"));
        let output = row_output(RawOutcome::Rows(vec![row]));

        assert_eq!(output.columns, vec!["id".to_string(), "status".to_string()]);
        assert_eq!(output.rows[0].get("id"), Some(&serde_json::json!(1)));
        assert_eq!(output.row_count, 1);
    }

    #[test]
    fn empty_result_has_no_columns() {
        let output = row_output(RawOutcome::Rows(Vec::new()));
        assert!(output.columns.is_empty());
        assert_eq!(output.message, "Query executed successfully. 0 row(s) returned.");
    }
}
