//! Canonical and raw column definitions
//!
//! Column names for the canonical four-column layout, the raw battery-manager
//! columns, and the timestamp parsing rules shared by adapters and metrics.

use crate::error::EnergyError;
use chrono::{DateTime, NaiveDateTime};

/// Canonical timestamp column (epoch milliseconds)
pub const TIMESTAMP: &str = "Timestamp";
/// Canonical bus voltage column (V)
pub const BUS_VOLTS: &str = "BusVolts";
/// Canonical current column (mA)
pub const CURRENT_MILLI_AMPS: &str = "CurrentMilliAmps";
/// Canonical power column (W)
pub const POWER_WATTS: &str = "PowerWatts";

/// Canonical columns in output order
pub const CANONICAL_COLUMNS: [&str; 4] = [TIMESTAMP, BUS_VOLTS, CURRENT_MILLI_AMPS, POWER_WATTS];

/// Battery-manager current column (µA)
pub const BATTERY_CURRENT_NOW: &str = "BATTERY_PROPERTY_CURRENT_NOW";
/// Battery-manager voltage column (mV)
pub const BATTERY_EXTRA_VOLTAGE: &str = "EXTRA_VOLTAGE";

/// Naive date-time layouts accepted for timestamp text, interpreted as UTC.
///
/// `%.f` also matches an absent fractional part.
pub const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Locate each named column in a header row.
///
/// Header cells are compared after trimming surrounding whitespace. Returns the
/// column indices in the order of `names`.
pub fn require_columns<'a, I>(headers: I, names: &[&str]) -> Result<Vec<usize>, EnergyError>
where
    I: IntoIterator<Item = &'a str>,
{
    let headers: Vec<&str> = headers.into_iter().map(str::trim).collect();
    names
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| EnergyError::Schema(format!("missing column '{}'", name)))
        })
        .collect()
}

/// Parse a numeric cell, treating empty and non-numeric text as absent
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse text holding an integral number of epoch milliseconds (`"1700000000000.0"`)
pub fn parse_numeric_millis(raw: &str) -> Option<i64> {
    let value = parse_number(raw)?;
    if value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}

/// Parse date-time text into epoch milliseconds.
///
/// Zoned RFC 3339 values are converted to UTC; naive values in
/// [`DATETIME_FORMATS`] are taken as UTC.
pub fn parse_datetime_millis(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(zoned) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(zoned.timestamp_millis());
    }

    DATETIME_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(trimmed, format)
            .ok()
            .map(|naive| naive.and_utc().timestamp_millis())
    })
}
