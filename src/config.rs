//! Experiment configuration
//!
//! A plan is a list of experiment descriptors, each naming a source type and a
//! data path. A descriptor with `data_path_global` expands into one run per
//! subdirectory of that root.

use crate::error::EnergyError;
use crate::types::SourceType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One declared experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSpec {
    /// Adapter to load the data with
    pub source_type: SourceType,
    /// Data file or directory; relative to each subdirectory when
    /// `data_path_global` is set
    pub data_path: PathBuf,
    /// Root whose immediate subdirectories each hold one run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_path_global: Option<PathBuf>,
    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ExperimentSpec {
    pub fn new(source_type: SourceType, data_path: impl Into<PathBuf>) -> Self {
        Self {
            source_type,
            data_path: data_path.into(),
            data_path_global: None,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_global_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.data_path_global = Some(root.into());
        self
    }

    /// Reject descriptors that can never load
    pub fn validate(&self) -> Result<(), EnergyError> {
        if self.data_path.as_os_str().is_empty() && self.data_path_global.is_none() {
            return Err(EnergyError::Config(format!(
                "experiment {} has an empty data_path",
                self.name.as_deref().unwrap_or(self.source_type.as_str())
            )));
        }
        Ok(())
    }
}

/// Ordered list of experiments to load
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentPlan {
    pub experiments: Vec<ExperimentSpec>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanDocument {
    List(Vec<ExperimentSpec>),
    Plan(ExperimentPlan),
}

impl ExperimentPlan {
    /// Parse a plan from JSON.
    ///
    /// Accepts either a bare array of descriptors or `{"experiments": [...]}`.
    /// Unknown source types are rejected here.
    pub fn from_json(json: &str) -> Result<Self, EnergyError> {
        let document: PlanDocument = serde_json::from_str(json)
            .map_err(|e| EnergyError::Config(format!("invalid experiment plan: {}", e)))?;
        let plan = match document {
            PlanDocument::List(experiments) => ExperimentPlan { experiments },
            PlanDocument::Plan(plan) => plan,
        };
        for spec in &plan.experiments {
            spec.validate()?;
        }
        Ok(plan)
    }

    /// Read and parse a JSON plan file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EnergyError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
