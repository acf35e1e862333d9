//! Metrics derivation
//!
//! This module derives summary metrics from a canonical dataset:
//! - Consumed energy by trapezoidal integration of power over time
//! - Power aggregates (mean, sample standard deviation, min, max)
//! - Start time and duration
//!
//! Every metric is `None` when the data it needs is missing or invalid. The
//! engine never re-sorts samples; integration follows row order.

use crate::types::CanonicalDataset;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Watt-milliseconds per watt-hour
const WMS_PER_WH: f64 = 3_600_000.0;

/// Joules per watt-hour
pub const JOULES_PER_WH: f64 = 3600.0;

/// Layout used for start-time strings (UTC)
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Derived metrics of one canonical dataset, computed once
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyMetrics {
    /// Consumed energy (Wh)
    pub energy_wh: Option<f64>,
    /// Mean power (W)
    pub power_avg: Option<f64>,
    /// Sample standard deviation of power (W)
    pub power_std: Option<f64>,
    pub power_min: Option<f64>,
    pub power_max: Option<f64>,
    /// Seconds between first and last valid timestamp
    pub duration_seconds: Option<f64>,
    /// First valid timestamp as `YYYY-MM-DD HH:MM:SS` (UTC)
    pub start_time: Option<String>,
}

impl EnergyMetrics {
    /// Derive all metrics from a dataset
    pub fn derive(dataset: &CanonicalDataset) -> Self {
        let aggregates = compute_power_aggregates(dataset);

        Self {
            energy_wh: compute_energy_wh(dataset),
            power_avg: aggregates.map(|a| a.mean),
            power_std: aggregates.and_then(|a| a.std),
            power_min: aggregates.map(|a| a.min),
            power_max: aggregates.map(|a| a.max),
            duration_seconds: compute_duration_seconds(dataset),
            start_time: compute_start_time(dataset),
        }
    }

    /// Consumed energy in Joules, always `energy_wh * 3600`
    pub fn energy_joules(&self) -> Option<f64> {
        self.energy_wh.map(wh_to_joules)
    }
}

/// Convert watt-hours to Joules
pub fn wh_to_joules(wh: f64) -> f64 {
    wh * JOULES_PER_WH
}

/// Power aggregates over a dataset with fully valid power values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerAggregates {
    pub mean: f64,
    /// `None` with fewer than two samples
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

/// Compute power aggregates.
///
/// Strict policy: a single absent or non-finite power value makes every
/// aggregate unavailable.
pub fn compute_power_aggregates(dataset: &CanonicalDataset) -> Option<PowerAggregates> {
    let power = dataset.all_power_watts()?;
    if power.is_empty() {
        return None;
    }

    let n = power.len() as f64;
    let mean = power.iter().sum::<f64>() / n;
    let std = if power.len() > 1 {
        let variance = power.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(variance.sqrt())
    } else {
        None
    };
    let min = power.iter().copied().fold(f64::INFINITY, f64::min);
    let max = power.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(PowerAggregates {
        mean,
        std,
        min,
        max,
    })
}

/// Compute consumed energy (Wh) with the trapezoidal rule.
///
/// Requires a non-empty dataset where every timestamp resolves and every
/// power value is valid. A single sample integrates to zero.
pub fn compute_energy_wh(dataset: &CanonicalDataset) -> Option<f64> {
    if dataset.is_empty() {
        return None;
    }
    let time_ms = dataset.all_timestamps_millis()?;
    let power = dataset.all_power_watts()?;

    Some(trapezoid(&power, &time_ms)? / WMS_PER_WH)
}

/// Trapezoidal integral of `y` over `x` (milliseconds), in row order.
///
/// `None` if a time step does not fit in an `i64`.
pub fn trapezoid(y: &[f64], x_ms: &[i64]) -> Option<f64> {
    y.windows(2)
        .zip(x_ms.windows(2))
        .map(|(yw, xw)| {
            let dt = xw[1].checked_sub(xw[0])?;
            Some(dt as f64 * (yw[0] + yw[1]) / 2.0)
        })
        .sum()
}

/// Format the first valid timestamp as a UTC start-time string
pub fn compute_start_time(dataset: &CanonicalDataset) -> Option<String> {
    let first = dataset.resolved_timestamps().into_iter().flatten().next()?;
    Utc.timestamp_millis_opt(first)
        .single()
        .map(|dt| dt.format(START_TIME_FORMAT).to_string())
}

/// Seconds between the first and last valid timestamps.
///
/// `None` when the last valid timestamp precedes the first (unsorted rows)
/// or the span does not fit in an `i64`.
pub fn compute_duration_seconds(dataset: &CanonicalDataset) -> Option<f64> {
    let valid: Vec<i64> = dataset.resolved_timestamps().into_iter().flatten().collect();
    let first = *valid.first()?;
    let last = *valid.last()?;
    if last < first {
        return None;
    }
    Some(last.checked_sub(first)? as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CanonicalSample, Provenance, SourceType, TimestampCell};
    use std::path::PathBuf;

    fn dataset(rows: &[(TimestampCell, Option<f64>)]) -> CanonicalDataset {
        let samples = rows
            .iter()
            .map(|(ts, p)| CanonicalSample {
                timestamp: ts.clone(),
                bus_volts: Some(4.0),
                current_milli_amps: p.map(|w| w / 4.0 * 1000.0),
                power_watts: *p,
            })
            .collect();
        CanonicalDataset::new(
            Provenance {
                source: SourceType::Wattometer,
                file_name: "test.csv".to_string(),
                file_path: PathBuf::from("test.csv"),
            },
            samples,
        )
    }

    fn ms(v: i64) -> TimestampCell {
        TimestampCell::EpochMillis(v)
    }

    #[test]
    fn test_constant_power_energy() {
        // 2 W for 3600 s -> 2 Wh
        let rows: Vec<_> = (0..=3600).map(|s| (ms(s * 1000), Some(2.0))).collect();
        let metrics = EnergyMetrics::derive(&dataset(&rows));

        let wh = metrics.energy_wh.unwrap();
        assert!((wh - 2.0).abs() < 1e-9);
        assert_eq!(metrics.duration_seconds, Some(3600.0));
    }

    #[test]
    fn test_irregular_sampling_trapezoid() {
        // 0..1 s at 1 W, 1..4 s ramp 1 -> 3 W: 1 + 3*2 = 7 W*s
        let ds = dataset(&[(ms(0), Some(1.0)), (ms(1000), Some(1.0)), (ms(4000), Some(3.0))]);
        let wh = compute_energy_wh(&ds).unwrap();
        assert!((wh - 7.0 / 3600.0).abs() < 1e-12);
    }

    #[test]
    fn test_joules_are_exact_multiple_of_wh() {
        let ds = dataset(&[(ms(0), Some(1.3)), (ms(750), Some(2.9)), (ms(1900), Some(0.4))]);
        let metrics = EnergyMetrics::derive(&ds);
        assert_eq!(
            metrics.energy_joules(),
            Some(metrics.energy_wh.unwrap() * 3600.0)
        );
    }

    #[test]
    fn test_power_aggregates() {
        let ds = dataset(&[
            (ms(0), Some(1.0)),
            (ms(1000), Some(2.0)),
            (ms(2000), Some(3.0)),
            (ms(3000), Some(4.0)),
        ]);
        let metrics = EnergyMetrics::derive(&ds);
        assert_eq!(metrics.power_avg, Some(2.5));
        assert_eq!(metrics.power_min, Some(1.0));
        assert_eq!(metrics.power_max, Some(4.0));
        // sample std of 1..4
        let expected = (5.0f64 / 3.0).sqrt();
        assert!((metrics.power_std.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_non_numeric_power_blocks_power_metrics_only() {
        let ds = dataset(&[
            (ms(1_704_067_200_000), Some(1.0)),
            (ms(1_704_067_201_000), None),
            (ms(1_704_067_205_000), Some(3.0)),
        ]);
        let metrics = EnergyMetrics::derive(&ds);

        assert_eq!(metrics.energy_wh, None);
        assert_eq!(metrics.energy_joules(), None);
        assert_eq!(metrics.power_avg, None);
        assert_eq!(metrics.power_std, None);
        assert_eq!(metrics.power_min, None);
        assert_eq!(metrics.power_max, None);
        assert_eq!(metrics.start_time.as_deref(), Some("2024-01-01 00:00:00"));
        assert_eq!(metrics.duration_seconds, Some(5.0));
    }

    #[test]
    fn test_empty_dataset_has_no_metrics() {
        let metrics = EnergyMetrics::derive(&dataset(&[]));
        assert_eq!(metrics, EnergyMetrics::default());
    }

    #[test]
    fn test_single_sample() {
        let metrics = EnergyMetrics::derive(&dataset(&[(ms(1000), Some(2.0))]));
        assert_eq!(metrics.energy_wh, Some(0.0));
        assert_eq!(metrics.power_avg, Some(2.0));
        assert_eq!(metrics.power_std, None);
        assert_eq!(metrics.duration_seconds, Some(0.0));
    }

    #[test]
    fn test_unresolved_timestamp_blocks_energy_but_not_duration() {
        let ds = dataset(&[
            (TimestampCell::Text("bogus".to_string()), Some(1.0)),
            (ms(2000), Some(1.0)),
            (ms(5000), Some(1.0)),
        ]);
        let metrics = EnergyMetrics::derive(&ds);
        assert_eq!(metrics.energy_wh, None);
        assert_eq!(metrics.power_avg, Some(1.0));
        assert_eq!(metrics.duration_seconds, Some(3.0));
        assert_eq!(metrics.start_time.as_deref(), Some("1970-01-01 00:00:02"));
    }

    #[test]
    fn test_no_valid_timestamps() {
        let ds = dataset(&[(TimestampCell::Missing, Some(1.0))]);
        assert_eq!(compute_start_time(&ds), None);
        assert_eq!(compute_duration_seconds(&ds), None);
    }

    #[test]
    fn test_datetime_text_timestamps_integrate() {
        let ds = dataset(&[
            (TimestampCell::Text("2024-01-01 00:00:00".to_string()), Some(3.6)),
            (TimestampCell::Text("2024-01-01 00:00:10".to_string()), Some(3.6)),
        ]);
        let wh = compute_energy_wh(&ds).unwrap();
        assert!((wh - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_energy_follows_row_order() {
        // Row order: 0 -> 2 s (+2 W*s), 2 -> 1 s (-1 W*s) = 1 W*s.
        // Sorted order would give 2 W*s.
        let ds = dataset(&[(ms(0), Some(1.0)), (ms(2000), Some(1.0)), (ms(1000), Some(1.0))]);
        let wh = compute_energy_wh(&ds).unwrap();
        assert!((wh - 1.0 / 3600.0).abs() < 1e-12);
        assert_eq!(ds.samples[2].timestamp, ms(1000));
    }

    #[test]
    fn test_extreme_timestamps_make_time_metrics_unavailable() {
        let ds = dataset(&[(ms(i64::MIN), Some(1.0)), (ms(i64::MAX), Some(1.0))]);
        let metrics = EnergyMetrics::derive(&ds);

        assert_eq!(metrics.energy_wh, None);
        assert_eq!(metrics.duration_seconds, None);
        assert_eq!(metrics.power_avg, Some(1.0));
    }

    #[test]
    fn test_last_before_first_has_no_duration() {
        let ds = dataset(&[
            (ms(5000), Some(1.0)),
            (TimestampCell::Missing, Some(1.0)),
            (ms(2000), Some(1.0)),
        ]);
        assert_eq!(compute_duration_seconds(&ds), None);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let ds = dataset(&[(ms(0), Some(1.1)), (ms(333), Some(2.2)), (ms(999), Some(0.7))]);
        assert_eq!(EnergyMetrics::derive(&ds), EnergyMetrics::derive(&ds));
    }
}
