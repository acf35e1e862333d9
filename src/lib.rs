//! runner-energy - Energy log normalization for mobile profiling experiments
//!
//! Transforms per-device energy logs (Android BatteryManager samples, external
//! wattmeter samples) into one canonical time series and derives comparable
//! metrics through a deterministic pipeline: source adaptation → canonical
//! dataset → metrics derivation → experiment records.
//!
//! ## Modules
//!
//! - **Adapters**: map each raw log format onto the canonical schema
//! - **Metrics**: energy by trapezoidal integration, power aggregates, timing
//! - **Spectrum**: frequency-domain view of the power signal
//! - **Loader**: batch loading of experiment plans with per-entry isolation

pub mod adapters;
pub mod config;
pub mod error;
pub mod experiment;
pub mod loader;
pub mod metrics;
pub mod report;
pub mod schema;
pub mod spectrum;
pub mod types;

pub use adapters::{BatteryManagerAdapter, EnergySourceAdapter, WattometerAdapter};
pub use config::{ExperimentPlan, ExperimentSpec};
pub use error::EnergyError;
pub use experiment::ExperimentRecord;
pub use loader::{BatchLoader, LoadOutcome, SkippedEntry};
pub use metrics::EnergyMetrics;
pub use spectrum::PowerSpectrum;
pub use types::{CanonicalDataset, CanonicalSample, SourceType, TimestampCell};

/// Crate version embedded in reports
pub const RUNNER_ENERGY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "runner-energy";
