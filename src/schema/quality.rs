//! Canonical dataset quality inspection
//!
//! Counts the cells the metrics engine will treat as invalid, so partially
//! corrupt logs are visible in reports instead of silently dropping metrics.

use crate::types::CanonicalDataset;
use serde::{Deserialize, Serialize};

/// Data-quality summary of a canonical dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetQuality {
    /// Rows in the dataset
    pub rows: usize,
    /// Rows discarded by the adapter before the dataset was built
    pub dropped_rows: usize,
    /// Rows whose timestamp does not resolve to epoch milliseconds
    pub unresolved_timestamps: usize,
    pub missing_volts: usize,
    pub missing_current: usize,
    pub missing_power: usize,
    /// Resolved timestamps never decrease in row order
    pub monotonic: bool,
}

impl DatasetQuality {
    pub fn inspect(dataset: &CanonicalDataset) -> Self {
        let mut quality = DatasetQuality {
            rows: dataset.len(),
            dropped_rows: dataset.dropped_rows,
            monotonic: true,
            ..Default::default()
        };

        let mut previous: Option<i64> = None;
        for sample in &dataset.samples {
            match sample.timestamp.resolve_millis() {
                Some(ms) => {
                    if previous.is_some_and(|prev| ms < prev) {
                        quality.monotonic = false;
                    }
                    previous = Some(ms);
                }
                None => quality.unresolved_timestamps += 1,
            }
            if sample.bus_volts.is_none() {
                quality.missing_volts += 1;
            }
            if sample.current_milli_amps.is_none() {
                quality.missing_current += 1;
            }
            if !sample.power_watts.is_some_and(f64::is_finite) {
                quality.missing_power += 1;
            }
        }

        quality
    }

    /// No missing, unresolved or dropped cells
    pub fn is_complete(&self) -> bool {
        self.dropped_rows == 0
            && self.unresolved_timestamps == 0
            && self.missing_volts == 0
            && self.missing_current == 0
            && self.missing_power == 0
    }
}
