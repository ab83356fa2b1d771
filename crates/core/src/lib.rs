//! docsync core: keeps per-table export documents consistent with a live
//! SQLite store that has no native change feed.
//!
//! Mutations can arrive through ORM-mediated CRUD, through ad-hoc raw
//! statements, or as out-of-band edits to the storage file. The engine
//! detects all three and produces one export per settled change without
//! looping on its own writes.

pub mod engine;
pub mod errors;
pub mod render;
pub mod statement;
pub mod store;
pub mod sync;
pub mod targets;

pub use engine::{SyncEngine, SyncEngineConfig};
pub use errors::{Result, SyncError};
pub use render::DocumentRenderer;
pub use statement::{classify_statement, StatementClassification, StatementExecutor, StatementKind, StatementOutput};
pub use store::{RawOutcome, Row, RowStore};
pub use sync::{
    ChangeDetector, ChangeMonitor, DetectorConfig, ExportCoordinator, MonitorConfig,
    SuppressionLedger, TableObservation,
};
pub use targets::{ExportTarget, ExportTargetRegistry};
