use emissions_forecast::data::{EmissionsRecord, EmissionsTable, ProjectedRecord};
use emissions_forecast::export::{self, RunSummary};
use emissions_forecast::pipeline::PipelineConfig;
use pretty_assertions::assert_eq;
use std::fs;

fn sample_table() -> EmissionsTable {
    let records: Vec<EmissionsRecord> = (0..3)
        .map(|i| EmissionsRecord {
            year: 2020 + i,
            energy_consumption: 100.0 + i as f64,
            industrial_output: 80.0,
            population: 10.0,
            policy_effectiveness: 0.5,
            carbon_footprint: 150.0,
        })
        .collect();
    EmissionsTable::from_records(&records).unwrap()
}

#[test]
fn test_historical_csv_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("historical.csv");

    export::write_historical_csv(&sample_table(), &path).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next().unwrap(),
        "year,energy_consumption,industrial_output,population,policy_effectiveness,carbon_footprint"
    );
    assert_eq!(lines.count(), 3);
}

#[test]
fn test_projections_csv_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("projected.csv");

    let projections = vec![
        ProjectedRecord {
            year: 2025,
            projected_carbon_footprint: 180.5,
        },
        ProjectedRecord {
            year: 2026,
            projected_carbon_footprint: 185.25,
        },
    ];

    export::write_projections_csv(&projections, &path).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let restored: Vec<ProjectedRecord> = reader
        .deserialize()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(restored, projections);
}

#[test]
fn test_run_summary_is_valid_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("summary.json");

    let summary = RunSummary {
        seed: 42,
        config: PipelineConfig::default(),
        model: "Stacked LSTM".to_string(),
        windows_total: 44,
        windows_train: 35,
        accuracy: None,
        projections: vec![ProjectedRecord {
            year: 2025,
            projected_carbon_footprint: 180.0,
        }],
    };

    export::write_run_summary(&summary, &path).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(parsed["seed"], 42);
    assert_eq!(parsed["config"]["look_back"], 5);
    assert_eq!(parsed["projections"][0]["year"], 2025);
}
