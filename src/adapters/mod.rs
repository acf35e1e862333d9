//! Energy source adapters
//!
//! This module provides adapters that read raw per-device energy logs and map
//! them to the canonical four-column schema. Adapter selection is a closed
//! mapping from [`SourceType`] to an adapter instance.

mod batterymanager;
mod wattometer;

pub use batterymanager::BatteryManagerAdapter;
pub use wattometer::WattometerAdapter;

use crate::error::EnergyError;
use crate::types::{CanonicalDataset, CanonicalSample, Provenance, SourceType};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Samples parsed from one raw data file
#[derive(Debug, Clone, Default)]
pub struct ParsedSamples {
    pub samples: Vec<CanonicalSample>,
    /// Raw rows discarded during parsing
    pub dropped_rows: usize,
}

/// Trait for raw energy log adapters
pub trait EnergySourceAdapter {
    /// Source this adapter understands
    fn source_type(&self) -> SourceType;

    /// Parse one raw data file into canonical samples
    fn parse_file(&self, file: &Path) -> Result<ParsedSamples, EnergyError>;

    /// Resolve `path` to a data file and load it as a canonical dataset.
    ///
    /// Samples are put in ascending time order when every timestamp resolves.
    fn load(&self, path: &Path) -> Result<CanonicalDataset, EnergyError> {
        let file = resolve_data_file(path)?;
        debug!(source = %self.source_type(), file = %file.display(), "reading data file");

        let parsed = self.parse_file(&file)?;
        let mut samples = parsed.samples;
        if sort_by_time(&mut samples) {
            debug!(file = %file.display(), "samples were out of order and have been sorted");
        }

        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let provenance = Provenance {
            source: self.source_type(),
            file_name,
            file_path: file,
        };

        let mut dataset = CanonicalDataset::new(provenance, samples);
        dataset.dropped_rows = parsed.dropped_rows;
        Ok(dataset)
    }
}

impl SourceType {
    /// Adapter implementing this source format
    pub fn adapter(&self) -> &'static dyn EnergySourceAdapter {
        match self {
            SourceType::BatteryManager => &BatteryManagerAdapter,
            SourceType::Wattometer => &WattometerAdapter,
        }
    }
}

/// Resolve a data location to a single CSV file.
///
/// A directory resolves to its first `*.csv` entry in lexical file-name order.
/// A file path is returned as-is.
pub fn resolve_data_file(path: &Path) -> Result<PathBuf, EnergyError> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if !path.is_dir() {
        return Err(EnergyError::NotFound(format!(
            "{} does not exist",
            path.display()
        )));
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && is_csv(p))
        .collect();
    candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    candidates.into_iter().next().ok_or_else(|| {
        EnergyError::NotFound(format!("no CSV file found in {}", path.display()))
    })
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Stable-sort samples by resolved timestamp.
///
/// Leaves the order untouched when any timestamp is unresolved. Returns true
/// if the order changed.
fn sort_by_time(samples: &mut Vec<CanonicalSample>) -> bool {
    let Some(keys) = samples
        .iter()
        .map(|s| s.timestamp.resolve_millis())
        .collect::<Option<Vec<i64>>>()
    else {
        return false;
    };
    if keys.windows(2).all(|w| w[0] <= w[1]) {
        return false;
    }

    let mut keyed: Vec<(i64, CanonicalSample)> = keys.into_iter().zip(samples.drain(..)).collect();
    keyed.sort_by_key(|(ms, _)| *ms);
    samples.extend(keyed.into_iter().map(|(_, sample)| sample));
    true
}
