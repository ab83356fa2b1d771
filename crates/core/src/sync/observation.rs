//! Last confirmed per-table observation.

use serde::{Deserialize, Serialize};

/// Last confirmed (modification time, checksum) pair for one monitored table.
///
/// Created when the monitor baselines, overwritten after each confirmed
/// export. Never persisted: a process restart re-baselines without
/// exporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableObservation {
    pub table: String,
    /// Best known modification time in epoch milliseconds, zero when no
    /// signal was available.
    pub last_modified_ms: i64,
    /// Row count concatenated with the ids of the most recent rows;
    /// authoritative disambiguator when the timestamp signal is silent.
    pub checksum: String,
}

impl TableObservation {
    /// Empty baseline used before the first successful read.
    pub fn empty(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            last_modified_ms: 0,
            checksum: String::new(),
        }
    }

    /// True when `current` diverges from this observation. Logical OR of the
    /// two signals: the update column is not bumped by every write path, and
    /// file mtime cannot localize which table changed.
    pub fn diverges_from(&self, current: &TableObservation) -> bool {
        current.last_modified_ms > self.last_modified_ms || current.checksum != self.checksum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(mod_ms: i64, checksum: &str) -> TableObservation {
        TableObservation {
            table: "Orders".to_string(),
            last_modified_ms: mod_ms,
            checksum: checksum.to_string(),
        }
    }

    #[test]
    fn newer_mod_time_alone_diverges() {
        assert!(obs(100, "3-3,2,1").diverges_from(&obs(200, "3-3,2,1")));
    }

    #[test]
    fn checksum_change_alone_diverges() {
        // In-place UPDATE keeps count and ids but a stale clock; the
        // timestamp side must carry it, and vice versa for id churn.
        assert!(obs(100, "3-3,2,1").diverges_from(&obs(100, "3-4,3,2")));
    }

    #[test]
    fn identical_observation_does_not_diverge() {
        assert!(!obs(100, "3-3,2,1").diverges_from(&obs(100, "3-3,2,1")));
    }

    #[test]
    fn older_mod_time_with_same_checksum_does_not_diverge() {
        assert!(!obs(100, "3-3,2,1").diverges_from(&obs(50, "3-3,2,1")));
    }
}
