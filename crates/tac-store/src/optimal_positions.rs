//! Optimal-position series as one CSV file per instrument/strategy.
//!
//! File: `<datapath>/<strategy>_<instrument>.csv`. First column is
//! `DATETIME` (RFC 3339, UTC), then one column per series label.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use tac_controls::{ControlError, ControlResult, InstrumentStrategy};

pub const DATE_INDEX_NAME: &str = "DATETIME";

#[derive(Clone, Debug, PartialEq)]
pub struct SeriesRow {
    pub timestamp: DateTime<Utc>,
    pub values: Vec<f64>,
}

/// Timestamped rows with named numeric columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabeledSeries {
    pub columns: Vec<String>,
    pub rows: Vec<SeriesRow>,
}

impl LabeledSeries {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; the value count must match the column count.
    pub fn push(&mut self, timestamp: DateTime<Utc>, values: Vec<f64>) -> ControlResult<()> {
        if values.len() != self.columns.len() {
            return Err(ControlError::storage(format!(
                "row at {} has {} values for {} columns",
                timestamp.to_rfc3339(),
                values.len(),
                self.columns.len()
            )));
        }
        self.rows.push(SeriesRow { timestamp, values });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug)]
pub struct CsvOptimalPositionData {
    datapath: PathBuf,
}

impl CsvOptimalPositionData {
    /// The directory must already exist.
    pub fn new(datapath: impl AsRef<Path>) -> ControlResult<Self> {
        let datapath = datapath.as_ref().to_path_buf();
        if !datapath.is_dir() {
            return Err(ControlError::storage(format!(
                "optimal position datapath is not a directory: {}",
                datapath.display()
            )));
        }
        Ok(Self { datapath })
    }

    pub fn filename_for(&self, instrument_strategy: &InstrumentStrategy) -> PathBuf {
        self.datapath.join(format!(
            "{}_{}.csv",
            instrument_strategy.strategy_name, instrument_strategy.instrument_code
        ))
    }

    /// Overwrites any existing file for the pair.
    pub fn write_for_instrument_strategy(
        &self,
        instrument_strategy: &InstrumentStrategy,
        series: &LabeledSeries,
    ) -> ControlResult<()> {
        let path = self.filename_for(instrument_strategy);
        let io_err = |e: csv::Error| ControlError::storage(format!("write {}: {e}", path.display()));

        let mut wtr = csv::Writer::from_path(&path).map_err(io_err)?;

        let mut header = Vec::with_capacity(series.columns.len() + 1);
        header.push(DATE_INDEX_NAME.to_string());
        header.extend(series.columns.iter().cloned());
        wtr.write_record(&header).map_err(io_err)?;

        for row in &series.rows {
            let mut record = Vec::with_capacity(row.values.len() + 1);
            record.push(row.timestamp.to_rfc3339());
            record.extend(row.values.iter().map(|v| v.to_string()));
            wtr.write_record(&record).map_err(io_err)?;
        }

        wtr.flush()
            .map_err(|e| ControlError::storage(format!("flush {}: {e}", path.display())))?;

        debug!(
            file = %path.display(),
            rows = series.rows.len(),
            "optimal positions written"
        );
        Ok(())
    }

    pub fn read_for_instrument_strategy(
        &self,
        instrument_strategy: &InstrumentStrategy,
    ) -> ControlResult<LabeledSeries> {
        let path = self.filename_for(instrument_strategy);
        if !path.exists() {
            return Err(ControlError::missing(format!(
                "optimal positions for {instrument_strategy}"
            )));
        }
        let io_err = |e: csv::Error| ControlError::storage(format!("read {}: {e}", path.display()));

        let mut rdr = csv::Reader::from_path(&path).map_err(io_err)?;
        let headers = rdr.headers().map_err(io_err)?.clone();

        let mut columns = headers.iter();
        match columns.next() {
            Some(first) if first == DATE_INDEX_NAME => {}
            other => {
                return Err(ControlError::storage(format!(
                    "{}: first column must be {DATE_INDEX_NAME}, found {:?}",
                    path.display(),
                    other
                )))
            }
        }
        let mut series = LabeledSeries::new(columns);

        for (i, rec) in rdr.records().enumerate() {
            let rec = rec.map_err(io_err)?;
            let row_num = i + 1;

            let raw_ts = rec.get(0).unwrap_or_default();
            let timestamp = DateTime::parse_from_rfc3339(raw_ts)
                .map_err(|e| {
                    ControlError::storage(format!(
                        "{} row {row_num}: bad {DATE_INDEX_NAME} '{raw_ts}': {e}",
                        path.display()
                    ))
                })?
                .with_timezone(&Utc);

            let mut values = Vec::with_capacity(rec.len().saturating_sub(1));
            for raw in rec.iter().skip(1) {
                let v: f64 = raw.trim().parse().map_err(|_| {
                    ControlError::storage(format!(
                        "{} row {row_num}: bad value '{raw}'",
                        path.display()
                    ))
                })?;
                values.push(v);
            }
            series.push(timestamp, values)?;
        }

        Ok(series)
    }
}

impl fmt::Display for CsvOptimalPositionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CsvOptimalPositionData accessing {}", self.datapath.display())
    }
}
