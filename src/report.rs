//! Summary reporting and canonical export
//!
//! Turns experiment records into summary rows and renders them as a text
//! table, JSON or CSV. Also writes canonical datasets back out in the
//! four-column CSV layout.

use crate::error::EnergyError;
use crate::experiment::ExperimentRecord;
use crate::loader::{LoadOutcome, SkippedEntry};
use crate::schema::{DatasetQuality, CANONICAL_COLUMNS};
use crate::types::{CanonicalDataset, SourceType};
use crate::{PRODUCER_NAME, RUNNER_ENERGY_VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::Write;
use uuid::Uuid;

/// Placeholder for unavailable metrics in text output
pub const NOT_AVAILABLE: &str = "N/A";

/// Public metrics of one experiment run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub name: String,
    pub source: SourceType,
    pub file: String,
    pub start_time: Option<String>,
    pub duration_seconds: Option<f64>,
    pub energy_wh: Option<f64>,
    pub energy_joules: Option<f64>,
    pub power_avg_watts: Option<f64>,
    pub power_min_watts: Option<f64>,
    pub power_max_watts: Option<f64>,
    pub power_std_watts: Option<f64>,
    pub quality: DatasetQuality,
}

impl From<&ExperimentRecord> for SummaryRow {
    fn from(record: &ExperimentRecord) -> Self {
        Self {
            name: record.display_name().to_string(),
            source: record.source(),
            file: record.data_file_name().to_string(),
            start_time: record.start_time().map(str::to_string),
            duration_seconds: record.duration_seconds(),
            energy_wh: record.energy_wh(),
            energy_joules: record.energy_joules(),
            power_avg_watts: record.power_avg(),
            power_min_watts: record.power_min(),
            power_max_watts: record.power_max(),
            power_std_watts: record.power_std(),
            quality: record.quality(),
        }
    }
}

/// Producer metadata embedded in JSON reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Summary of a batch load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub producer: ReportProducer,
    pub generated_at_utc: String,
    pub experiments: Vec<SummaryRow>,
    #[serde(default)]
    pub skipped: Vec<SkippedSummary>,
}

/// Skipped entry as it appears in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSummary {
    pub name: Option<String>,
    pub source: SourceType,
    pub path: String,
    pub code: String,
    pub message: String,
}

impl From<&SkippedEntry> for SkippedSummary {
    fn from(entry: &SkippedEntry) -> Self {
        Self {
            name: entry.name.clone(),
            source: entry.source,
            path: entry.path.display().to_string(),
            code: entry.code.clone(),
            message: entry.message.clone(),
        }
    }
}

impl SummaryReport {
    pub fn from_outcome(outcome: &LoadOutcome) -> Self {
        Self {
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: RUNNER_ENERGY_VERSION.to_string(),
                instance_id: Uuid::new_v4().to_string(),
            },
            generated_at_utc: Utc::now().to_rfc3339(),
            experiments: outcome.records.iter().map(SummaryRow::from).collect(),
            skipped: outcome.skipped.iter().map(SkippedSummary::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, EnergyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

const TABLE_HEADERS: [&str; 11] = [
    "Name",
    "Source",
    "File",
    "Start Time",
    "Duration (s)",
    "Energy (Wh)",
    "Energy (J)",
    "Average Power (W)",
    "Min Power (W)",
    "Max Power (W)",
    "Std Power (W)",
];

fn table_cells(row: &SummaryRow) -> [String; 11] {
    [
        row.name.clone(),
        row.source.to_string(),
        row.file.clone(),
        row.start_time
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        fmt_metric(row.duration_seconds, 3),
        fmt_metric(row.energy_wh, 6),
        fmt_metric(row.energy_joules, 3),
        fmt_metric(row.power_avg_watts, 4),
        fmt_metric(row.power_min_watts, 4),
        fmt_metric(row.power_max_watts, 4),
        fmt_metric(row.power_std_watts, 4),
    ]
}

/// Format an optional metric, `N/A` when absent
pub fn fmt_metric(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Render rows as an aligned plain-text table
pub fn render_table(rows: &[SummaryRow]) -> String {
    let cells: Vec<[String; 11]> = rows.iter().map(table_cells).collect();

    let mut widths: Vec<usize> = TABLE_HEADERS.iter().map(|h| h.len()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:<width$}", value, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&format_line(TABLE_HEADERS.to_vec()));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format_line(rule.iter().map(String::as_str).collect()));
    out.push('\n');
    for row in &cells {
        out.push_str(&format_line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

/// Write rows as CSV; absent metrics are empty cells
pub fn write_summary_csv<W: Write>(rows: &[SummaryRow], writer: W) -> Result<(), EnergyError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(TABLE_HEADERS)?;

    let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    for row in rows {
        wtr.write_record([
            row.name.clone(),
            row.source.to_string(),
            row.file.clone(),
            row.start_time.clone().unwrap_or_default(),
            opt(row.duration_seconds),
            opt(row.energy_wh),
            opt(row.energy_joules),
            opt(row.power_avg_watts),
            opt(row.power_min_watts),
            opt(row.power_max_watts),
            opt(row.power_std_watts),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a dataset in the canonical `Timestamp,BusVolts,CurrentMilliAmps,PowerWatts` layout
pub fn write_canonical_csv<W: Write>(
    dataset: &CanonicalDataset,
    writer: W,
) -> Result<(), EnergyError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CANONICAL_COLUMNS)?;

    let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    for sample in &dataset.samples {
        wtr.write_record([
            sample.timestamp.to_string(),
            opt(sample.bus_volts),
            opt(sample.current_milli_amps),
            opt(sample.power_watts),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
