//! Error types for the docsync core crate.

use thiserror::Error;

/// Result type alias for sync engine operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors surfaced by the sync engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A table name has no export target mapping.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Read/write failure during detection or export. Freshness-only:
    /// callers log and retry on a later cycle.
    #[error("I/O error: {0}")]
    TransientIo(String),

    /// Hardened mode rejected a statement before execution.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid or failing statement; carries the native engine error text
    /// verbatim for interactive debugging.
    #[error("Statement error: {0}")]
    Statement(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a transient I/O error.
    pub fn transient_io(message: impl Into<String>) -> Self {
        Self::TransientIo(message.into())
    }

    /// Create a permission-denied error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    /// Create a statement error from native engine text.
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement(message.into())
    }

    /// True when the failure only degrades document freshness and the
    /// change will be re-detected on a later cycle.
    pub fn is_freshness_only(&self) -> bool {
        matches!(self, Self::TransientIo(_))
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        Self::TransientIo(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_io_is_freshness_only() {
        assert!(SyncError::transient_io("disk full").is_freshness_only());
        assert!(!SyncError::permission_denied("read-only").is_freshness_only());
        assert!(!SyncError::configuration("no mapping").is_freshness_only());
    }

    #[test]
    fn statement_error_keeps_native_text() {
        let err = SyncError::statement("no such table: Orderz");
        assert_eq!(err.to_string(), "Statement error: no such table: Orderz");
    }
}
