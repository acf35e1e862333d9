//! Core types for the runner-energy pipeline
//!
//! This module defines the data structures that flow through each stage:
//! source identifiers, canonical samples and the canonical dataset that every
//! source adapter produces.

use crate::error::EnergyError;
use crate::schema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Source identifier for provenance tracking and adapter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Android BatteryManager samples (µA current, mV voltage)
    BatteryManager,
    /// External wattmeter samples (date-time text, V, mA, W)
    Wattometer,
}

impl SourceType {
    pub const ALL: [SourceType; 2] = [SourceType::BatteryManager, SourceType::Wattometer];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::BatteryManager => "batterymanager",
            SourceType::Wattometer => "wattometer",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = EnergyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceType::ALL
            .into_iter()
            .find(|source| source.as_str() == s.trim())
            .ok_or_else(|| EnergyError::UnknownSource(s.to_string()))
    }
}

/// Raw timestamp cell as it appears in a canonical dataset.
///
/// Adapters that already know the epoch value store `EpochMillis`; adapters
/// that keep the raw column store `Text` and leave resolution to the metrics
/// engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimestampCell {
    EpochMillis(i64),
    Text(String),
    Missing,
}

impl TimestampCell {
    /// Build a cell from a raw CSV field, keeping integral values as epoch millis.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return TimestampCell::Missing;
        }
        match trimmed.parse::<i64>() {
            Ok(ms) => TimestampCell::EpochMillis(ms),
            Err(_) => TimestampCell::Text(trimmed.to_string()),
        }
    }

    /// Resolve to epoch milliseconds.
    ///
    /// Precedence per cell: integer millis, integral decimal text, then
    /// date-time text. Anything else is unresolved.
    pub fn resolve_millis(&self) -> Option<i64> {
        match self {
            TimestampCell::EpochMillis(ms) => Some(*ms),
            TimestampCell::Text(text) => schema::parse_numeric_millis(text)
                .or_else(|| schema::parse_datetime_millis(text)),
            TimestampCell::Missing => None,
        }
    }
}

impl fmt::Display for TimestampCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampCell::EpochMillis(ms) => write!(f, "{ms}"),
            TimestampCell::Text(text) => f.write_str(text),
            TimestampCell::Missing => Ok(()),
        }
    }
}

/// One canonical row: timestamp, bus voltage, current and power
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSample {
    pub timestamp: TimestampCell,
    /// Bus voltage (V)
    pub bus_volts: Option<f64>,
    /// Current (mA)
    pub current_milli_amps: Option<f64>,
    /// Power (W)
    pub power_watts: Option<f64>,
}

impl CanonicalSample {
    /// Build a sample whose power is derived from voltage and current.
    pub fn from_volts_and_milliamps(
        timestamp: TimestampCell,
        bus_volts: Option<f64>,
        current_milli_amps: Option<f64>,
    ) -> Self {
        let power_watts = match (bus_volts, current_milli_amps) {
            (Some(volts), Some(milli_amps)) => Some(volts * (milli_amps / 1000.0)),
            _ => None,
        };
        Self {
            timestamp,
            bus_volts,
            current_milli_amps,
            power_watts,
        }
    }
}

/// Where a canonical dataset came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: SourceType,
    /// File name of the data file that was read (no directory part)
    pub file_name: String,
    /// Full path of the data file that was read
    pub file_path: PathBuf,
}

/// Ordered sequence of canonical samples plus provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDataset {
    pub provenance: Provenance,
    pub samples: Vec<CanonicalSample>,
    /// Raw rows the adapter discarded (e.g. unparseable wattmeter timestamps)
    pub dropped_rows: usize,
}

impl CanonicalDataset {
    pub fn new(provenance: Provenance, samples: Vec<CanonicalSample>) -> Self {
        Self {
            provenance,
            samples,
            dropped_rows: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Resolved timestamps in row order, `None` where a cell does not resolve
    pub fn resolved_timestamps(&self) -> Vec<Option<i64>> {
        self.samples
            .iter()
            .map(|s| s.timestamp.resolve_millis())
            .collect()
    }

    /// Every timestamp resolved, or `None` if any cell fails
    pub fn all_timestamps_millis(&self) -> Option<Vec<i64>> {
        self.samples
            .iter()
            .map(|s| s.timestamp.resolve_millis())
            .collect()
    }

    /// Every power value present and finite, or `None` if any is not
    pub fn all_power_watts(&self) -> Option<Vec<f64>> {
        self.samples
            .iter()
            .map(|s| s.power_watts.filter(|p| p.is_finite()))
            .collect()
    }

    /// Data-quality summary of this dataset
    pub fn quality(&self) -> schema::DatasetQuality {
        schema::DatasetQuality::inspect(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_from_str() {
        assert_eq!(
            "batterymanager".parse::<SourceType>().unwrap(),
            SourceType::BatteryManager
        );
        assert_eq!(
            "wattometer".parse::<SourceType>().unwrap(),
            SourceType::Wattometer
        );
        let err = "oscilloscope".parse::<SourceType>().unwrap_err();
        assert!(matches!(err, EnergyError::UnknownSource(ref s) if s == "oscilloscope"));
    }

    #[test]
    fn test_source_type_serde_lowercase() {
        let json = serde_json::to_string(&SourceType::BatteryManager).unwrap();
        assert_eq!(json, "\"batterymanager\"");
        let parsed: SourceType = serde_json::from_str("\"wattometer\"").unwrap();
        assert_eq!(parsed, SourceType::Wattometer);
    }

    #[test]
    fn test_timestamp_cell_from_raw() {
        assert_eq!(
            TimestampCell::from_raw(" 1704067200000 "),
            TimestampCell::EpochMillis(1_704_067_200_000)
        );
        assert_eq!(TimestampCell::from_raw(""), TimestampCell::Missing);
        assert_eq!(
            TimestampCell::from_raw("2024-01-01 00:00:00"),
            TimestampCell::Text("2024-01-01 00:00:00".to_string())
        );
    }

    #[test]
    fn test_timestamp_cell_resolution_precedence() {
        assert_eq!(
            TimestampCell::Text("1704067200000.0".to_string()).resolve_millis(),
            Some(1_704_067_200_000)
        );
        assert_eq!(
            TimestampCell::Text("2024-01-01 00:00:01".to_string()).resolve_millis(),
            Some(1_704_067_201_000)
        );
        assert_eq!(TimestampCell::Text("garbage".to_string()).resolve_millis(), None);
        assert_eq!(TimestampCell::Missing.resolve_millis(), None);
    }

    #[test]
    fn test_sample_power_derivation() {
        let sample = CanonicalSample::from_volts_and_milliamps(
            TimestampCell::EpochMillis(0),
            Some(4.0),
            Some(500.0),
        );
        assert_eq!(sample.power_watts, Some(2.0));

        let sample =
            CanonicalSample::from_volts_and_milliamps(TimestampCell::Missing, None, Some(500.0));
        assert_eq!(sample.power_watts, None);
    }

    #[test]
    fn test_all_power_rejects_non_finite() {
        let provenance = Provenance {
            source: SourceType::Wattometer,
            file_name: "w.csv".to_string(),
            file_path: PathBuf::from("w.csv"),
        };
        let dataset = CanonicalDataset::new(
            provenance,
            vec![
                CanonicalSample {
                    timestamp: TimestampCell::EpochMillis(0),
                    bus_volts: Some(4.0),
                    current_milli_amps: Some(100.0),
                    power_watts: Some(0.4),
                },
                CanonicalSample {
                    timestamp: TimestampCell::EpochMillis(1000),
                    bus_volts: Some(4.0),
                    current_milli_amps: Some(100.0),
                    power_watts: Some(f64::NAN),
                },
            ],
        );
        assert!(dataset.all_power_watts().is_none());
        assert_eq!(dataset.all_timestamps_millis(), Some(vec![0, 1000]));
    }
}
