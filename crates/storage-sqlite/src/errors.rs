//! Storage-level error wrapper.

use docsync_core::SyncError;
use thiserror::Error;

/// Errors raised inside the SQLite store before conversion to the engine's
/// error type.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Native SQLite failure.
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("Connection lock poisoned")]
    Poisoned,
}

impl StorageError {
    /// Engine-read conversion: failures during detection/export reads are
    /// freshness-only and retried by the caller.
    pub fn into_transient(self) -> SyncError {
        SyncError::transient_io(self.to_string())
    }

    /// Raw-statement conversion: the native engine text travels verbatim
    /// to the caller for interactive debugging.
    pub fn into_statement(self) -> SyncError {
        SyncError::statement(self.to_string())
    }
}
