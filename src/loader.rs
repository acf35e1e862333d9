//! Batch loading
//!
//! Loads every experiment of a plan, expanding global roots into one run per
//! subdirectory. A failing entry is logged, recorded in
//! [`LoadOutcome::skipped`] and left out of the results; the batch never
//! aborts on a single bad entry.

use crate::config::{ExperimentPlan, ExperimentSpec};
use crate::error::EnergyError;
use crate::experiment::ExperimentRecord;
use crate::types::SourceType;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// An entry that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub name: Option<String>,
    pub source: SourceType,
    pub path: PathBuf,
    /// Error class, see [`EnergyError::code`]
    pub code: String,
    pub message: String,
}

/// Result of a batch load
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Loaded records in declaration order, then subdirectory order
    pub records: Vec<ExperimentRecord>,
    pub skipped: Vec<SkippedEntry>,
}

impl LoadOutcome {
    pub fn loaded_count(&self) -> usize {
        self.records.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Loads experiment plans into experiment records
#[derive(Debug, Default)]
pub struct BatchLoader;

impl BatchLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a whole plan
    pub fn load_plan(&self, plan: &ExperimentPlan) -> LoadOutcome {
        self.load(&plan.experiments)
    }

    /// Load a list of experiment descriptors
    pub fn load(&self, experiments: &[ExperimentSpec]) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();

        for spec in experiments {
            match &spec.data_path_global {
                Some(root) => self.load_global(spec, root, &mut outcome),
                None => {
                    info!(source = %spec.source_type, path = %spec.data_path.display(), "loading experiment");
                    self.load_one(spec, &spec.data_path, &mut outcome);
                }
            }
        }

        info!(
            loaded = outcome.loaded_count(),
            skipped = outcome.skipped_count(),
            "total number of loaded experiments: {}",
            outcome.loaded_count()
        );
        outcome
    }

    fn load_global(&self, spec: &ExperimentSpec, root: &Path, outcome: &mut LoadOutcome) {
        info!(source = %spec.source_type, root = %root.display(), "searching run directories");

        let runs = match run_directories(root) {
            Ok(runs) => runs,
            Err(e) => {
                skip(spec, root, e, outcome);
                return;
            }
        };

        for run_dir in runs {
            let full_path = run_dir.join(&spec.data_path);
            info!(source = %spec.source_type, path = %full_path.display(), "loading experiment run");
            self.load_one(spec, &full_path, outcome);
        }
    }

    fn load_one(&self, spec: &ExperimentSpec, path: &Path, outcome: &mut LoadOutcome) {
        match ExperimentRecord::load(spec.source_type, path, spec.name.clone()) {
            Ok(record) => outcome.records.push(record),
            Err(e) => skip(spec, path, e, outcome),
        }
    }
}

fn skip(spec: &ExperimentSpec, path: &Path, err: EnergyError, outcome: &mut LoadOutcome) {
    if err.is_not_found() {
        error!(source = %spec.source_type, path = %path.display(), "file not found: {}", err);
    } else {
        error!(source = %spec.source_type, path = %path.display(), "error loading data: {}", err);
    }

    outcome.skipped.push(SkippedEntry {
        name: spec.name.clone(),
        source: spec.source_type,
        path: path.to_path_buf(),
        code: err.code().to_string(),
        message: err.to_string(),
    });
}

/// Immediate, non-hidden subdirectories of `root` in lexical order
fn run_directories(root: &Path) -> Result<Vec<PathBuf>, EnergyError> {
    if !root.is_dir() {
        return Err(EnergyError::NotFound(format!(
            "global data root {} is not a directory",
            root.display()
        )));
    }

    let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const BATTERY_CSV: &str = "Timestamp,BATTERY_PROPERTY_CURRENT_NOW,EXTRA_VOLTAGE\n\
                               1704067200000,500000,4000\n\
                               1704067201000,500000,4000\n";

    const WATT_CSV: &str = "Time,Voltage,Current,Power\n\
                            2024-01-01 00:00:00,5.0,400.0,2.0\n\
                            2024-01-01 00:00:01,5.0,400.0,2.0\n";

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_global_root_skips_run_with_missing_file() {
        let root = tempdir().unwrap();
        write(&root.path().join("A/data/wattometer/run.csv"), WATT_CSV);
        fs::create_dir_all(root.path().join("B/data/wattometer")).unwrap();
        write(&root.path().join(".hidden/data/wattometer/run.csv"), WATT_CSV);
        write(&root.path().join("stray.csv"), WATT_CSV);

        let spec = ExperimentSpec::new(SourceType::Wattometer, "data/wattometer")
            .with_name("WattoMeter TikTok")
            .with_global_root(root.path());
        let outcome = BatchLoader::new().load(&[spec]);

        assert_eq!(outcome.loaded_count(), 1);
        assert_eq!(
            outcome.records[0].data_path(),
            root.path().join("A/data/wattometer")
        );
        assert_eq!(outcome.skipped_count(), 1);
        assert_eq!(outcome.skipped[0].code, "not_found");
        assert_eq!(outcome.skipped[0].path, root.path().join("B/data/wattometer"));
    }

    #[test]
    fn test_entries_keep_declaration_order_and_isolate_failures() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("bm/log.csv"), BATTERY_CSV);
        write(&dir.path().join("wm/log.csv"), WATT_CSV);
        write(&dir.path().join("broken/log.csv"), "Timestamp,EXTRA_VOLTAGE\n1,2\n");

        let experiments = vec![
            ExperimentSpec::new(SourceType::Wattometer, dir.path().join("wm")).with_name("watt"),
            ExperimentSpec::new(SourceType::BatteryManager, dir.path().join("broken")),
            ExperimentSpec::new(SourceType::BatteryManager, dir.path().join("missing")),
            ExperimentSpec::new(SourceType::BatteryManager, dir.path().join("bm")).with_name("bm"),
        ];
        let outcome = BatchLoader::new().load(&experiments);

        let names: Vec<&str> = outcome.records.iter().map(|r| r.display_name()).collect();
        assert_eq!(names, vec!["watt", "bm"]);

        let codes: Vec<&str> = outcome.skipped.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["schema", "not_found"]);
    }

    #[test]
    fn test_extreme_timestamps_do_not_stop_the_batch() {
        let dir = tempdir().unwrap();
        write(
            &dir.path().join("bad/log.csv"),
            "Timestamp,BATTERY_PROPERTY_CURRENT_NOW,EXTRA_VOLTAGE\n\
             -9223372036854775808,500000,4000\n\
             9223372036854775807,500000,4000\n",
        );
        write(&dir.path().join("good/log.csv"), BATTERY_CSV);

        let experiments = vec![
            ExperimentSpec::new(SourceType::BatteryManager, dir.path().join("bad")).with_name("bad"),
            ExperimentSpec::new(SourceType::BatteryManager, dir.path().join("good")).with_name("good"),
        ];
        let outcome = BatchLoader::new().load(&experiments);

        let names: Vec<&str> = outcome.records.iter().map(|r| r.display_name()).collect();
        assert_eq!(names, vec!["bad", "good"]);
        assert_eq!(outcome.records[0].energy_wh(), None);
        assert_eq!(outcome.records[0].duration_seconds(), None);
        assert_eq!(outcome.records[0].power_avg(), Some(2.0));
        assert!(outcome.records[0].power_spectrum().is_none());
        assert!(outcome.records[1].energy_wh().is_some());
    }

    #[test]
    fn test_run_directories_sorted() {
        let root = tempdir().unwrap();
        for name in ["run_2", "run_10", "run_1"] {
            fs::create_dir_all(root.path().join(name)).unwrap();
        }
        let dirs = run_directories(root.path()).unwrap();
        let names: Vec<String> = dirs
            .iter()
            .map(|d| d.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["run_1", "run_10", "run_2"]);
    }

    #[test]
    fn test_missing_global_root_is_skipped() {
        let root = tempdir().unwrap();
        let spec = ExperimentSpec::new(SourceType::Wattometer, "data")
            .with_global_root(root.path().join("nowhere"));
        let outcome = BatchLoader::new().load(&[spec]);

        assert_eq!(outcome.loaded_count(), 0);
        assert_eq!(outcome.skipped_count(), 1);
        assert_eq!(outcome.skipped[0].code, "not_found");
    }

    #[test]
    fn test_load_plan_from_json() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("bm/log.csv"), BATTERY_CSV);
        let json = serde_json::json!([
            {"source_type": "batterymanager", "data_path": dir.path().join("bm"), "name": "bm"}
        ])
        .to_string();

        let plan = ExperimentPlan::from_json(&json).unwrap();
        let outcome = BatchLoader::new().load_plan(&plan);
        assert_eq!(outcome.loaded_count(), 1);
        assert_eq!(outcome.records[0].power_avg(), Some(2.0));
    }
}
