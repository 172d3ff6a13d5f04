//! CSV optimal-position series.
//!
//! GREEN when:
//! - the file lands at `<datapath>/<strategy>_<instrument>.csv`
//! - the first header column is DATETIME
//! - a written series reads back unchanged
//! - a missing datapath is refused up front

use chrono::{Duration, TimeZone, Utc};
use tac_controls::{ControlError, InstrumentStrategy};
use tac_store::{CsvOptimalPositionData, LabeledSeries, DATE_INDEX_NAME};

fn sample_series() -> LabeledSeries {
    let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 21, 0, 0).unwrap();
    let mut series = LabeledSeries::new(["lower_position", "upper_position", "reference_price"]);
    series.push(t0, vec![-1.0, 2.0, 101.25]).unwrap();
    series
        .push(t0 + Duration::days(1), vec![0.0, 3.0, 100.5])
        .unwrap();
    series
}

#[test]
fn writes_dated_csv_per_pair() {
    let dir = tempfile::tempdir().unwrap();
    let data = CsvOptimalPositionData::new(dir.path()).unwrap();
    let is = InstrumentStrategy::new("carry", "SOFR");

    data.write_for_instrument_strategy(&is, &sample_series())
        .unwrap();

    let path = dir.path().join("carry_SOFR.csv");
    assert_eq!(data.filename_for(&is), path);
    let raw = std::fs::read_to_string(&path).unwrap();
    let header = raw.lines().next().unwrap();
    assert!(header.starts_with(DATE_INDEX_NAME));
    assert!(header.ends_with("reference_price"));
    assert_eq!(raw.lines().count(), 3);
}

#[test]
fn read_back_matches_written() {
    let dir = tempfile::tempdir().unwrap();
    let data = CsvOptimalPositionData::new(dir.path()).unwrap();
    let is = InstrumentStrategy::new("trend", "VIX");
    let series = sample_series();

    data.write_for_instrument_strategy(&is, &series).unwrap();
    let back = data.read_for_instrument_strategy(&is).unwrap();

    assert_eq!(back, series);
}

#[test]
fn rewrite_overwrites_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let data = CsvOptimalPositionData::new(dir.path()).unwrap();
    let is = InstrumentStrategy::new("trend", "VIX");

    data.write_for_instrument_strategy(&is, &sample_series())
        .unwrap();
    let mut shorter = LabeledSeries::new(["position"]);
    shorter
        .push(Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap(), vec![4.0])
        .unwrap();
    data.write_for_instrument_strategy(&is, &shorter).unwrap();

    assert_eq!(data.read_for_instrument_strategy(&is).unwrap(), shorter);
}

#[test]
fn missing_datapath_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let err = CsvOptimalPositionData::new(dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, ControlError::Storage(_)));
}

#[test]
fn unknown_pair_is_missing_data() {
    let dir = tempfile::tempdir().unwrap();
    let data = CsvOptimalPositionData::new(dir.path()).unwrap();
    let err = data
        .read_for_instrument_strategy(&InstrumentStrategy::new("none", "X"))
        .unwrap_err();
    assert!(matches!(err, ControlError::MissingData { .. }));
}

#[test]
fn row_width_must_match_columns() {
    let mut series = LabeledSeries::new(["a", "b"]);
    let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
    assert!(series.push(t0, vec![1.0]).is_err());
    assert!(series.is_empty());
}
