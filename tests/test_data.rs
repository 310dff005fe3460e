use emissions_forecast::data::{EmissionsRecord, EmissionsTable, FEATURE_COLUMNS, TARGET_COLUMN};
use emissions_forecast::error::ForecastError;
use polars::prelude::*;
use pretty_assertions::assert_eq;

fn sample_records() -> Vec<EmissionsRecord> {
    (0..4)
        .map(|i| EmissionsRecord {
            year: 2000 + i,
            energy_consumption: 100.0 + i as f64,
            industrial_output: 80.0 + i as f64,
            population: 10.0 + i as f64,
            policy_effectiveness: 0.1 * i as f64,
            carbon_footprint: 150.0 + 2.0 * i as f64,
        })
        .collect()
}

#[test]
fn test_round_trip_through_records() {
    let records = sample_records();
    let table = EmissionsTable::from_records(&records).unwrap();

    assert_eq!(table.len(), 4);
    assert_eq!(table.records().unwrap(), records);
}

#[test]
fn test_feature_matrix_layout() {
    let table = EmissionsTable::from_records(&sample_records()).unwrap();
    let features = table.feature_matrix().unwrap();

    assert_eq!(features.shape(), &[4, FEATURE_COLUMNS.len()]);
    // Columns are ordered as FEATURE_COLUMNS
    assert_eq!(features[[0, 0]], 100.0); // energy_consumption
    assert_eq!(features[[0, 1]], 80.0); // industrial_output
    assert_eq!(features[[0, 2]], 10.0); // population
    assert_eq!(features[[0, 3]], 0.0); // policy_effectiveness
    assert_eq!(features[[3, 0]], 103.0);
}

#[test]
fn test_target_vector_and_years() {
    let table = EmissionsTable::from_records(&sample_records()).unwrap();

    let target = table.target_vector().unwrap();
    assert_eq!(target.len(), 4);
    assert_eq!(target[0], 150.0);
    assert_eq!(target[3], 156.0);

    assert_eq!(table.years().unwrap(), vec![2000, 2001, 2002, 2003]);
    assert_eq!(table.last_year().unwrap(), 2003);
}

#[test]
fn test_missing_column_is_a_schema_error() {
    let df = DataFrame::new(vec![
        Series::new("year", vec![2000i32, 2001]),
        Series::new(TARGET_COLUMN, vec![150.0, 151.0]),
    ])
    .unwrap();

    let err = EmissionsTable::from_dataframe(df).unwrap_err();
    assert!(matches!(err, ForecastError::SchemaMismatch(_)));
}

#[test]
fn test_years_must_be_strictly_increasing() {
    let mut records = sample_records();
    records[2].year = records[1].year;

    let err = EmissionsTable::from_records(&records).unwrap_err();
    assert!(matches!(err, ForecastError::DataError(_)));
}
