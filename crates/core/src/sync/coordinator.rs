//! Renders a table's current rows into its export document.

use std::sync::Arc;

use log::{info, warn};

use crate::errors::Result;
use crate::render::DocumentRenderer;
use crate::store::RowStore;
use crate::targets::{ExportTarget, ExportTargetRegistry};

/// Reads current rows and hands them to the renderer.
#[derive(Clone)]
pub struct ExportCoordinator {
    store: Arc<dyn RowStore>,
    renderer: Arc<dyn DocumentRenderer>,
    registry: Arc<ExportTargetRegistry>,
}

impl ExportCoordinator {
    pub fn new(
        store: Arc<dyn RowStore>,
        renderer: Arc<dyn DocumentRenderer>,
        registry: Arc<ExportTargetRegistry>,
    ) -> Self {
        Self {
            store,
            renderer,
            registry,
        }
    }

    /// Export by table name. An unmapped name is a logged no-op; I/O
    /// failures propagate, and the caller clears any suppression state
    /// regardless of the outcome.
    pub async fn export_table(&self, name: &str) -> Result<()> {
        let Some(target) = self.registry.resolve(name) else {
            warn!("[DbMonitor] No export target for {}, skipping export", name);
            return Ok(());
        };
        self.export(target).await
    }

    /// Export one resolved target.
    pub async fn export(&self, target: &ExportTarget) -> Result<()> {
        let rows = self.store.query_rows(&target.table).await?;
        self.renderer.render(target, &rows).await?;
        info!(
            "[DbMonitor] Exported {} ({} rows) -> {}",
            target.table,
            rows.len(),
            target.document
        );
        Ok(())
    }
}
