//! Canonical energy schema
//!
//! This module defines the four-column canonical layout every source adapter
//! produces, the raw column names adapters look for, and dataset validation.

mod columns;
mod quality;

pub use columns::*;
pub use quality::*;
