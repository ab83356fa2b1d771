//! Per-table suppression of self-caused change signals.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Suppression state for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suppression {
    /// An export is in flight; suppressed with no deadline.
    Held,
    /// Export finished; suppressed until the grace deadline passes.
    Until(Instant),
}

/// Tracks which tables the monitor must currently ignore because the engine
/// itself just wrote their documents.
///
/// Per-table rather than a single global flag: an export of table A never
/// masks detection of a genuine concurrent change to table B. Deadlines use
/// `tokio::time::Instant` and release lazily on the next query; there is no
/// background timer to cancel.
#[derive(Debug, Default)]
pub struct SuppressionLedger {
    entries: Mutex<HashMap<String, Suppression>>,
}

impl SuppressionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress `table` for the duration of an export.
    pub fn hold(&self, table: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(table.to_string(), Suppression::Held);
    }

    /// Convert a hold into a timed release `grace` from now. Always called
    /// after an export attempt, success or failure, since the window must
    /// lift on schedule even when the export is stuck or failed.
    pub fn release_after(&self, table: &str, grace: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(table.to_string(), Suppression::Until(Instant::now() + grace));
    }

    /// True while `table` is held or inside its grace window. Expired
    /// entries are pruned as a side effect.
    pub fn is_suppressed(&self, table: &str) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(table) {
            None => false,
            Some(Suppression::Held) => true,
            Some(Suppression::Until(deadline)) => {
                if Instant::now() < *deadline {
                    true
                } else {
                    entries.remove(table);
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn held_table_is_suppressed_without_deadline() {
        let ledger = SuppressionLedger::new();
        ledger.hold("Orders");
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(ledger.is_suppressed("Orders"));
    }

    #[tokio::test(start_paused = true)]
    async fn release_lifts_after_grace() {
        let ledger = SuppressionLedger::new();
        ledger.hold("Orders");
        ledger.release_after("Orders", Duration::from_millis(2_000));
        assert!(ledger.is_suppressed("Orders"));

        tokio::time::advance(Duration::from_millis(1_999)).await;
        assert!(ledger.is_suppressed("Orders"));

        tokio::time::advance(Duration::from_millis(2)).await;
        assert!(!ledger.is_suppressed("Orders"));
    }

    #[tokio::test(start_paused = true)]
    async fn suppression_is_scoped_per_table() {
        let ledger = SuppressionLedger::new();
        ledger.hold("Orders");
        assert!(ledger.is_suppressed("Orders"));
        assert!(!ledger.is_suppressed("MenuItems"));
    }
}
