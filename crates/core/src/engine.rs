//! Engine facade wiring store, renderer and targets into the monitor and
//! the raw-statement path.

use std::sync::Arc;
use std::time::Duration;

use crate::errors::Result;
use crate::render::DocumentRenderer;
use crate::statement::{StatementExecutor, StatementOutput};
use crate::store::{Row, RowStore};
use crate::sync::{
    ChangeMonitor, ExportCoordinator, MonitorConfig, SuppressionLedger, STATEMENT_SETTLE_MS,
};
use crate::targets::{ExportTarget, ExportTargetRegistry};

/// Engine-wide configuration.
#[derive(Debug, Clone, Default)]
pub struct SyncEngineConfig {
    pub monitor: MonitorConfig,
    /// Settle delay after a statement-triggered export; `None` uses the
    /// default.
    pub statement_settle: Option<Duration>,
}

/// The public surface of the synchronization engine.
///
/// Monitor and statement path share one suppression ledger, so a
/// statement-triggered export is never re-detected by the poller inside the
/// grace window.
#[derive(Clone)]
pub struct SyncEngine {
    monitor: ChangeMonitor,
    executor: StatementExecutor,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn RowStore>,
        renderer: Arc<dyn DocumentRenderer>,
        targets: Vec<ExportTarget>,
        config: SyncEngineConfig,
    ) -> Self {
        let registry = Arc::new(ExportTargetRegistry::new(targets));
        let suppression = Arc::new(SuppressionLedger::new());
        let coordinator = ExportCoordinator::new(
            Arc::clone(&store),
            renderer.clone(),
            Arc::clone(&registry),
        );
        let monitor = ChangeMonitor::new(
            Arc::clone(&store),
            renderer,
            Arc::clone(&registry),
            Arc::clone(&suppression),
            config.monitor.clone(),
        );
        let executor = StatementExecutor::new(
            store,
            coordinator,
            registry,
            suppression,
            config
                .statement_settle
                .unwrap_or(Duration::from_millis(STATEMENT_SETTLE_MS)),
            config.monitor.suppression_grace,
        );
        Self { monitor, executor }
    }

    /// Start the polling monitor; idempotent.
    pub async fn start_monitoring(&self) {
        self.monitor.start().await;
    }

    /// Stop the polling monitor; idempotent.
    pub async fn stop_monitoring(&self) {
        self.monitor.stop().await;
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_monitoring()
    }

    /// Unconditionally export every target, bypassing detection.
    pub async fn force_sync_all(&self) {
        self.monitor.force_sync_all().await;
    }

    /// Unconditionally export one table; configuration error when unmapped.
    pub async fn sync_table(&self, name: &str) -> Result<()> {
        self.monitor.sync_table(name).await
    }

    /// Execute one raw statement under the given mode.
    pub async fn execute_statement(&self, sql: &str, hardened: bool) -> Result<StatementOutput> {
        self.executor.execute(sql, hardened).await
    }

    /// User tables currently present in the store.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.executor.list_tables().await
    }

    /// Column metadata for one table.
    pub async fn table_schema(&self, table: &str) -> Result<Vec<Row>> {
        self.executor.table_schema(table).await
    }
}
