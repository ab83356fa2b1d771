//! Change detection, suppression, and the polling monitor.

mod cadence;
mod coordinator;
mod detector;
mod monitor;
mod observation;
mod suppression;

pub use cadence::*;
pub use coordinator::ExportCoordinator;
pub use detector::{ChangeDetector, DetectorConfig};
pub use monitor::{ChangeMonitor, MonitorConfig};
pub use observation::TableObservation;
pub use suppression::SuppressionLedger;
