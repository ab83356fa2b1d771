//! Polling monitor: orchestrates detector, coordinator and suppression.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{error, info, warn};

use crate::errors::{Result, SyncError};
use crate::render::DocumentRenderer;
use crate::store::RowStore;
use crate::sync::cadence::{MONITOR_POLL_INTERVAL_MS, SUPPRESSION_GRACE_MS};
use crate::sync::coordinator::ExportCoordinator;
use crate::sync::detector::{ChangeDetector, DetectorConfig};
use crate::sync::observation::TableObservation;
use crate::sync::suppression::SuppressionLedger;
use crate::targets::ExportTargetRegistry;

/// Monitor timing knobs.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Delay between detection ticks.
    pub poll_interval: Duration,
    /// Delay after an export before suppression lifts. Without it the
    /// engine's own export would appear as an external change on the very
    /// next tick and loop forever.
    pub suppression_grace: Duration,
    pub detector: DetectorConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(MONITOR_POLL_INTERVAL_MS),
            suppression_grace: Duration::from_millis(SUPPRESSION_GRACE_MS),
            detector: DetectorConfig::default(),
        }
    }
}

struct MonitorInner {
    detector: ChangeDetector,
    coordinator: ExportCoordinator,
    registry: Arc<ExportTargetRegistry>,
    suppression: Arc<SuppressionLedger>,
    observations: Mutex<HashMap<String, TableObservation>>,
    running: AtomicBool,
    /// Bumped on every stop; a polling task exits once its captured epoch
    /// goes stale, so a quick stop/start never leaves two loops ticking.
    epoch: AtomicU64,
    config: MonitorConfig,
}

/// Watches every export target on a fixed interval and re-exports the ones
/// whose stored content diverged from the last confirmed observation.
#[derive(Clone)]
pub struct ChangeMonitor {
    inner: Arc<MonitorInner>,
}

impl ChangeMonitor {
    pub fn new(
        store: Arc<dyn RowStore>,
        renderer: Arc<dyn DocumentRenderer>,
        registry: Arc<ExportTargetRegistry>,
        suppression: Arc<SuppressionLedger>,
        config: MonitorConfig,
    ) -> Self {
        let detector = ChangeDetector::new(Arc::clone(&store), config.detector.clone());
        let coordinator = ExportCoordinator::new(store, renderer, Arc::clone(&registry));
        Self {
            inner: Arc::new(MonitorInner {
                detector,
                coordinator,
                registry,
                suppression,
                observations: Mutex::new(HashMap::new()),
                running: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                config,
            }),
        }
    }

    /// Start polling. Idempotent: a second call while running is a logged
    /// no-op. Baselines an observation for every target (first read, no
    /// export) before the first tick.
    pub async fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            info!("[DbMonitor] Already monitoring database");
            return;
        }
        info!(
            "[DbMonitor] Starting database change monitoring (every {}ms)",
            self.inner.config.poll_interval.as_millis()
        );
        self.inner.baseline_all().await;

        let inner = Arc::clone(&self.inner);
        let my_epoch = inner.epoch.load(Ordering::SeqCst);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.config.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first interval tick fires immediately; the baseline just
            // ran, so consume it before polling.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if inner.epoch.load(Ordering::SeqCst) != my_epoch
                    || !inner.running.load(Ordering::SeqCst)
                {
                    break;
                }
                inner.run_tick().await;
            }
        });
    }

    /// Stop polling; idempotent. Only future ticks are halted. A tick
    /// already in flight, including its export, runs to completion.
    pub async fn stop(&self) {
        if self.inner.running.swap(false, Ordering::SeqCst) {
            self.inner.epoch.fetch_add(1, Ordering::SeqCst);
            info!("[DbMonitor] Monitoring stopped");
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Export every target unconditionally and refresh all observations,
    /// bypassing detection. Per-target failures are logged and do not abort
    /// the remaining targets.
    pub async fn force_sync_all(&self) {
        info!("[DbMonitor] Force syncing all tables");
        for target in self.inner.registry.targets() {
            self.inner.suppression.hold(&target.table);
            match self.inner.coordinator.export(target).await {
                Ok(()) => self.inner.refresh_observation(&target.table).await,
                Err(err) => {
                    error!("[DbMonitor] Force sync failed for {}: {}", target.table, err);
                }
            }
            self.inner
                .suppression
                .release_after(&target.table, self.inner.config.suppression_grace);
        }
    }

    /// Export one table unconditionally. Fails with a configuration error
    /// when `name` has no export target; export I/O failures propagate
    /// while suppression still releases on schedule.
    pub async fn sync_table(&self, name: &str) -> Result<()> {
        let target = self
            .inner
            .registry
            .resolve(name)
            .cloned()
            .ok_or_else(|| SyncError::configuration(format!("Unknown table: {name}")))?;

        info!("[DbMonitor] Syncing {}", target.table);
        self.inner.suppression.hold(&target.table);
        let result = self.inner.coordinator.export(&target).await;
        if result.is_ok() {
            self.inner.refresh_observation(&target.table).await;
        }
        self.inner
            .suppression
            .release_after(&target.table, self.inner.config.suppression_grace);
        result
    }
}

impl MonitorInner {
    async fn baseline_all(&self) {
        let mut observations = HashMap::new();
        for target in self.registry.targets() {
            let observation = match self.detector.observe(&target.table).await {
                Ok(observation) => observation,
                Err(err) => {
                    warn!("[DbMonitor] Could not baseline {}: {}", target.table, err);
                    TableObservation::empty(&target.table)
                }
            };
            observations.insert(target.table.clone(), observation);
        }
        *self.observations.lock().unwrap_or_else(|e| e.into_inner()) = observations;
    }

    /// One detection pass over every target. Each table is independent;
    /// nothing here may escape as an error or the interval task would die.
    async fn run_tick(&self) {
        for target in self.registry.targets() {
            let last = self
                .observations
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .get(&target.table)
                .cloned()
                .unwrap_or_else(|| TableObservation::empty(&target.table));

            if !self
                .detector
                .has_changed(&target.table, &last, &self.suppression)
                .await
            {
                continue;
            }

            info!("[DbMonitor] Detected changes in {}", target.table);
            self.suppression.hold(&target.table);
            match self.coordinator.export(target).await {
                Ok(()) => {
                    // Refresh with freshly recomputed values, not the
                    // pre-change ones, so rows written during the export
                    // window are re-detected next tick.
                    self.refresh_observation(&target.table).await;
                }
                Err(err) => {
                    // Observation stays stale on purpose: the change is
                    // retried next tick once suppression lifts.
                    error!("[DbMonitor] Error exporting {}: {}", target.table, err);
                }
            }
            self.suppression
                .release_after(&target.table, self.config.suppression_grace);
        }
    }

    async fn refresh_observation(&self, table: &str) {
        match self.detector.observe(table).await {
            Ok(observation) => {
                self.observations
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(table.to_string(), observation);
            }
            Err(err) => {
                warn!(
                    "[DbMonitor] Could not refresh observation for {}: {}",
                    table, err
                );
            }
        }
    }
}
