//! CSV and JSON export of run outputs

use crate::data::{EmissionsTable, ProjectedRecord};
use crate::error::Result;
use crate::metrics::ForecastAccuracy;
use crate::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write the historical table as CSV, unchanged schema
pub fn write_historical_csv<P: AsRef<Path>>(table: &EmissionsTable, path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in table.records()? {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the projected records as CSV
pub fn write_projections_csv<P: AsRef<Path>>(
    projections: &[ProjectedRecord],
    path: P,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in projections {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Summary of one pipeline run, written alongside the CSV sheets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Seed the run was executed with
    pub seed: u64,
    /// Pipeline parameters
    pub config: PipelineConfig,
    /// Name of the fitted model
    pub model: String,
    /// Total windows before the split
    pub windows_total: usize,
    /// Windows in the training split
    pub windows_train: usize,
    /// Held-out accuracy, if a test split existed
    pub accuracy: Option<ForecastAccuracy>,
    /// Rollout projections
    pub projections: Vec<ProjectedRecord>,
}

/// Write the run summary as pretty-printed JSON
pub fn write_run_summary<P: AsRef<Path>>(summary: &RunSummary, path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}
