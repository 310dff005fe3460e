//! Emissions driver table handling

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Name of the time-index column
pub const YEAR_COLUMN: &str = "year";

/// Driver columns, in the order the feature matrix is laid out
pub const FEATURE_COLUMNS: [&str; 4] = [
    "energy_consumption",
    "industrial_output",
    "population",
    "policy_effectiveness",
];

/// Name of the forecast target column
pub const TARGET_COLUMN: &str = "carbon_footprint";

/// One period of historical data: all driver values plus the target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionsRecord {
    pub year: i32,
    pub energy_consumption: f64,
    pub industrial_output: f64,
    pub population: f64,
    pub policy_effectiveness: f64,
    pub carbon_footprint: f64,
}

/// One projected period produced by the rollout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedRecord {
    pub year: i32,
    pub projected_carbon_footprint: f64,
}

/// Year-indexed table of emission drivers and the carbon footprint target
///
/// The table is backed by a polars DataFrame with a fixed schema: a `year`
/// column, the four driver columns of [`FEATURE_COLUMNS`], and the
/// [`TARGET_COLUMN`]. Years must be strictly increasing; the windowing logic
/// operates on positional order, so gaps are not interpreted.
#[derive(Debug, Clone)]
pub struct EmissionsTable {
    df: DataFrame,
}

impl EmissionsTable {
    /// Create a table from historical records
    pub fn from_records(records: &[EmissionsRecord]) -> Result<Self> {
        let year_series = Series::new(
            YEAR_COLUMN,
            records.iter().map(|r| r.year).collect::<Vec<i32>>(),
        );
        let energy = Series::new(
            FEATURE_COLUMNS[0],
            records
                .iter()
                .map(|r| r.energy_consumption)
                .collect::<Vec<f64>>(),
        );
        let industry = Series::new(
            FEATURE_COLUMNS[1],
            records
                .iter()
                .map(|r| r.industrial_output)
                .collect::<Vec<f64>>(),
        );
        let population = Series::new(
            FEATURE_COLUMNS[2],
            records.iter().map(|r| r.population).collect::<Vec<f64>>(),
        );
        let policy = Series::new(
            FEATURE_COLUMNS[3],
            records
                .iter()
                .map(|r| r.policy_effectiveness)
                .collect::<Vec<f64>>(),
        );
        let target = Series::new(
            TARGET_COLUMN,
            records
                .iter()
                .map(|r| r.carbon_footprint)
                .collect::<Vec<f64>>(),
        );

        let df = DataFrame::new(vec![year_series, energy, industry, population, policy, target])?;
        Self::from_dataframe(df)
    }

    /// Create a table from an existing DataFrame, validating the schema
    pub fn from_dataframe(df: DataFrame) -> Result<Self> {
        let names = df.get_column_names();

        if !names.contains(&YEAR_COLUMN) {
            return Err(ForecastError::SchemaMismatch(format!(
                "Missing required column '{}'",
                YEAR_COLUMN
            )));
        }
        for required in FEATURE_COLUMNS.iter().chain([TARGET_COLUMN].iter()) {
            if !names.contains(required) {
                return Err(ForecastError::SchemaMismatch(format!(
                    "Missing required column '{}'",
                    required
                )));
            }
        }

        let table = Self { df };
        table.validate_years()?;
        Ok(table)
    }

    fn validate_years(&self) -> Result<()> {
        let years = self.years()?;
        for pair in years.windows(2) {
            if pair[1] <= pair[0] {
                return Err(ForecastError::DataError(format!(
                    "Years must be strictly increasing, found {} after {}",
                    pair[1], pair[0]
                )));
            }
        }
        Ok(())
    }

    /// Get the underlying DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Number of periods in the table
    pub fn len(&self) -> usize {
        self.df.height()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Get the year index as a vector
    pub fn years(&self) -> Result<Vec<i32>> {
        let col = self.df.column(YEAR_COLUMN)?;
        match col.dtype() {
            DataType::Int32 => Ok(col.i32().unwrap().into_iter().flatten().collect()),
            DataType::Int64 => Ok(col
                .i64()
                .unwrap()
                .into_iter()
                .flatten()
                .map(|v| v as i32)
                .collect()),
            _ => Err(ForecastError::DataError(format!(
                "Column '{}' must be an integer year index",
                YEAR_COLUMN
            ))),
        }
    }

    /// Last year in the table
    pub fn last_year(&self) -> Result<i32> {
        self.years()?
            .last()
            .copied()
            .ok_or_else(|| ForecastError::DataError("Table has no rows".to_string()))
    }

    /// Driver values as a (T x F) matrix, columns ordered as [`FEATURE_COLUMNS`]
    pub fn feature_matrix(&self) -> Result<Array2<f64>> {
        let rows = self.len();
        let mut matrix = Array2::zeros((rows, FEATURE_COLUMNS.len()));

        for (j, name) in FEATURE_COLUMNS.iter().enumerate() {
            let values = self.column_as_f64(name)?;
            if values.len() != rows {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' has {} non-null values, expected {}",
                    name,
                    values.len(),
                    rows
                )));
            }
            for (i, value) in values.into_iter().enumerate() {
                matrix[[i, j]] = value;
            }
        }

        Ok(matrix)
    }

    /// Target values as a length-T vector
    pub fn target_vector(&self) -> Result<Array1<f64>> {
        let values = self.column_as_f64(TARGET_COLUMN)?;
        if values.len() != self.len() {
            return Err(ForecastError::DataError(format!(
                "Column '{}' has {} non-null values, expected {}",
                TARGET_COLUMN,
                values.len(),
                self.len()
            )));
        }
        Ok(Array1::from_vec(values))
    }

    /// Rebuild the row-wise record view, for reporting and export
    pub fn records(&self) -> Result<Vec<EmissionsRecord>> {
        let years = self.years()?;
        let features = self.feature_matrix()?;
        let target = self.target_vector()?;

        let mut records = Vec::with_capacity(years.len());
        for i in 0..years.len() {
            records.push(EmissionsRecord {
                year: years[i],
                energy_consumption: features[[i, 0]],
                industrial_output: features[[i, 1]],
                population: features[[i, 2]],
                policy_effectiveness: features[[i, 3]],
                carbon_footprint: target[i],
            });
        }
        Ok(records)
    }

    /// Helper method to get a column as f64 values
    fn column_as_f64(&self, column_name: &str) -> Result<Vec<f64>> {
        let col = self.df.column(column_name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", column_name, e))
        })?;

        match col.dtype() {
            DataType::Float64 => Ok(col.f64().unwrap().into_iter().flatten().collect()),
            DataType::Float32 => Ok(col
                .f32()
                .unwrap()
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            DataType::Int64 => Ok(col
                .i64()
                .unwrap()
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            DataType::Int32 => Ok(col
                .i32()
                .unwrap()
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            _ => Err(ForecastError::DataError(format!(
                "Column '{}' cannot be converted to f64",
                column_name
            ))),
        }
    }
}
