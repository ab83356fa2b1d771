//! Core cadence constants for the change monitor.

/// Default polling interval between detection ticks (ms).
pub const MONITOR_POLL_INTERVAL_MS: u64 = 3_000;

/// Grace delay after an export before suppression lifts (ms). Absorbs the
/// non-atomicity between the document write and a watcher's read.
pub const SUPPRESSION_GRACE_MS: u64 = 2_000;

/// Settle delay after a statement-triggered export before the statement
/// result is returned (ms). Bounds the race with a concurrent reader
/// re-fetching the document.
pub const STATEMENT_SETTLE_MS: u64 = 100;

/// Number of most-recent row ids sampled into the table checksum.
pub const CHECKSUM_SAMPLE_ROWS: u32 = 10;
