//! Battery-manager adapter
//!
//! Parses Android BatteryManager CSV logs and maps them to canonical samples.
//! Current is logged in µA and voltage in mV.

use crate::error::EnergyError;
use crate::schema::{self, BATTERY_CURRENT_NOW, BATTERY_EXTRA_VOLTAGE, TIMESTAMP};
use crate::types::{CanonicalSample, SourceType, TimestampCell};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::{EnergySourceAdapter, ParsedSamples};

/// Battery-manager log adapter
pub struct BatteryManagerAdapter;

impl EnergySourceAdapter for BatteryManagerAdapter {
    fn source_type(&self) -> SourceType {
        SourceType::BatteryManager
    }

    fn parse_file(&self, file: &Path) -> Result<ParsedSamples, EnergyError> {
        self.parse_reader(File::open(file)?)
    }
}

impl BatteryManagerAdapter {
    /// Parse battery-manager CSV from any reader
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<ParsedSamples, EnergyError> {
        let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers = rdr.headers()?.clone();
        let idx = schema::require_columns(
            headers.iter(),
            &[TIMESTAMP, BATTERY_CURRENT_NOW, BATTERY_EXTRA_VOLTAGE],
        )?;
        let (ts_idx, current_idx, voltage_idx) = (idx[0], idx[1], idx[2]);

        let mut samples = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let cell = |i: usize| record.get(i).unwrap_or("");

            // µA -> mA, mV -> V
            let current_ma = schema::parse_number(cell(current_idx)).map(|ua| ua / 1000.0);
            let volts = schema::parse_number(cell(voltage_idx)).map(|mv| mv / 1000.0);

            samples.push(CanonicalSample::from_volts_and_milliamps(
                TimestampCell::from_raw(cell(ts_idx)),
                volts,
                current_ma,
            ));
        }

        Ok(ParsedSamples {
            samples,
            dropped_rows: 0,
        })
    }
}
