//! External collaborator seams: observation loading and model-state
//! persistence.
//!
//! The engine itself never touches disk or network; everything blocking
//! lives behind these traits so a deployment can swap in a database reader
//! or an object store without touching the core.

use crate::error::{ForecastError, Result};
use crate::window::Observation;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Map a calendar date to its monthly period index (months since year 0)
pub fn period_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

/// Calendar year a monthly period index falls in
pub fn period_year(period: i64) -> i32 {
    period.div_euclid(12) as i32
}

/// Supplies the ordered historical observations to forecast from
pub trait ObservationSource {
    /// Load the full series, ordered by period with no duplicates
    fn load(&self) -> Result<Vec<Observation>>;
}

#[derive(Debug, Deserialize)]
struct CsvRecord {
    date: NaiveDate,
    value: f64,
}

/// Observation source reading `date,value` records from a CSV file
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    /// Create a source for the given CSV path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ObservationSource for CsvSource {
    fn load(&self) -> Result<Vec<Observation>> {
        let mut reader = csv::Reader::from_path(&self.path)?;

        let mut series = Vec::new();
        for record in reader.deserialize() {
            let record: CsvRecord = record?;
            series.push(Observation::new(period_index(record.date), record.value));
        }

        if series.is_empty() {
            return Err(ForecastError::DataError(format!(
                "No observations found in {}",
                self.path.display()
            )));
        }

        Ok(series)
    }
}

/// Accepts and returns the opaque checkpoint blob for a fitted model.
///
/// The storage medium is the implementation's business; the only contract
/// is that `load` after `save` returns the same bytes.
pub trait StateStore {
    /// Persist the checkpoint blob
    fn save(&mut self, blob: &[u8]) -> Result<()>;

    /// Fetch the most recently persisted blob
    fn load(&self) -> Result<Vec<u8>>;
}

/// Filesystem-backed checkpoint store
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store writing to the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl StateStore for FileStore {
    fn save(&mut self, blob: &[u8]) -> Result<()> {
        fs::write(&self.path, blob)?;
        Ok(())
    }

    fn load(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.path)?)
    }
}
