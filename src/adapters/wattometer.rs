//! Wattometer adapter
//!
//! Parses external wattmeter CSV logs. Columns are positional (date-time,
//! volts, milliamps, watts); the header row is skipped and its names ignored.

use crate::error::EnergyError;
use crate::schema;
use crate::types::{CanonicalSample, SourceType, TimestampCell};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use super::{EnergySourceAdapter, ParsedSamples};

/// Positional columns a wattmeter file must provide
const POSITIONAL_COLUMNS: usize = 4;

/// Wattmeter log adapter
pub struct WattometerAdapter;

impl EnergySourceAdapter for WattometerAdapter {
    fn source_type(&self) -> SourceType {
        SourceType::Wattometer
    }

    fn parse_file(&self, file: &Path) -> Result<ParsedSamples, EnergyError> {
        self.parse_reader(File::open(file)?)
    }
}

impl WattometerAdapter {
    /// Parse wattmeter CSV from any reader.
    ///
    /// Rows whose timestamp does not parse as a date-time are dropped and
    /// counted in [`ParsedSamples::dropped_rows`].
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<ParsedSamples, EnergyError> {
        let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

        let header_len = rdr.headers()?.len();
        if header_len < POSITIONAL_COLUMNS {
            return Err(EnergyError::Schema(format!(
                "expected {} positional columns, found {}",
                POSITIONAL_COLUMNS, header_len
            )));
        }

        let mut parsed = ParsedSamples::default();
        for record in rdr.records() {
            let record = record?;
            let cell = |i: usize| record.get(i).unwrap_or("");

            let Some(timestamp_ms) = schema::parse_datetime_millis(cell(0)) else {
                parsed.dropped_rows += 1;
                continue;
            };

            // Power is taken from the meter, not derived from V x I
            parsed.samples.push(CanonicalSample {
                timestamp: TimestampCell::EpochMillis(timestamp_ms),
                bus_volts: schema::parse_number(cell(1)),
                current_milli_amps: schema::parse_number(cell(2)),
                power_watts: schema::parse_number(cell(3)),
            });
        }

        if parsed.dropped_rows > 0 {
            warn!(
                dropped = parsed.dropped_rows,
                kept = parsed.samples.len(),
                "dropped wattmeter rows with unparseable timestamps"
            );
        }

        Ok(parsed)
    }
}
