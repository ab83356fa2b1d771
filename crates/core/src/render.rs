//! Document rendering contract.

use async_trait::async_trait;

use crate::errors::Result;
use crate::store::Row;
use crate::targets::ExportTarget;

/// Renders a table's current rows into its export document.
///
/// Implementations are assumed atomic and idempotent for a given row set;
/// the serialization format is entirely theirs.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, target: &ExportTarget, rows: &[Row]) -> Result<()>;
}
