//! Experiment records
//!
//! An [`ExperimentRecord`] pairs one canonical dataset with the metrics derived
//! from it. Records are built by a single load-and-derive pass and are
//! read-only afterwards.

use crate::error::EnergyError;
use crate::metrics::EnergyMetrics;
use crate::schema::DatasetQuality;
use crate::spectrum::{self, PowerSpectrum};
use crate::types::{CanonicalDataset, SourceType};
use std::path::{Path, PathBuf};

/// One loaded experiment run
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentRecord {
    name: Option<String>,
    data_path: PathBuf,
    dataset: CanonicalDataset,
    metrics: EnergyMetrics,
}

impl ExperimentRecord {
    /// Load a data location with the adapter for `source` and derive metrics
    pub fn load(
        source: SourceType,
        data_path: impl AsRef<Path>,
        name: Option<String>,
    ) -> Result<Self, EnergyError> {
        let data_path = data_path.as_ref();
        let dataset = source.adapter().load(data_path)?;
        Ok(Self::with_data_path(name, data_path.to_path_buf(), dataset))
    }

    /// Build a record from an already-normalized dataset
    pub fn from_dataset(name: Option<String>, dataset: CanonicalDataset) -> Self {
        let data_path = dataset.provenance.file_path.clone();
        Self::with_data_path(name, data_path, dataset)
    }

    fn with_data_path(name: Option<String>, data_path: PathBuf, dataset: CanonicalDataset) -> Self {
        let metrics = EnergyMetrics::derive(&dataset);
        Self {
            name,
            data_path,
            dataset,
            metrics,
        }
    }

    /// Configured display name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Configured name, falling back to the data file name
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or(&self.dataset.provenance.file_name)
    }

    pub fn source(&self) -> SourceType {
        self.dataset.provenance.source
    }

    /// Location the record was loaded from (file or directory)
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Name of the data file that was actually read
    pub fn data_file_name(&self) -> &str {
        &self.dataset.provenance.file_name
    }

    pub fn dataset(&self) -> &CanonicalDataset {
        &self.dataset
    }

    pub fn metrics(&self) -> &EnergyMetrics {
        &self.metrics
    }

    pub fn energy_wh(&self) -> Option<f64> {
        self.metrics.energy_wh
    }

    pub fn energy_joules(&self) -> Option<f64> {
        self.metrics.energy_joules()
    }

    pub fn power_avg(&self) -> Option<f64> {
        self.metrics.power_avg
    }

    pub fn power_std(&self) -> Option<f64> {
        self.metrics.power_std
    }

    pub fn power_min(&self) -> Option<f64> {
        self.metrics.power_min
    }

    pub fn power_max(&self) -> Option<f64> {
        self.metrics.power_max
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.metrics.duration_seconds
    }

    pub fn start_time(&self) -> Option<&str> {
        self.metrics.start_time.as_deref()
    }

    pub fn quality(&self) -> DatasetQuality {
        self.dataset.quality()
    }

    /// Power spectrum of this run, computed on demand
    pub fn power_spectrum(&self) -> Option<PowerSpectrum> {
        spectrum::power_spectrum(&self.dataset)
    }
}
