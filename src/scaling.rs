//! Per-column min-max scaling with inverse-transform bookkeeping

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Min-max scaler mapping each column to [0, 1] using bounds observed at fit
/// time
///
/// The fitted (min, max) pair per column is reused for every later transform
/// and inverse transform in a run; refitting would change the meaning of the
/// model's output scale. A column with min == max transforms to the constant
/// 0.0 instead of dividing by zero, and its inverse maps any scaled value back
/// to that constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    mins: Vec<f64>,
    maxs: Vec<f64>,
}

impl MinMaxScaler {
    /// Fit per-column bounds from a (T x F) matrix
    pub fn fit(data: &Array2<f64>) -> Result<Self> {
        if data.nrows() == 0 {
            return Err(ForecastError::DataError(
                "Cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let mut mins = Vec::with_capacity(data.ncols());
        let mut maxs = Vec::with_capacity(data.ncols());

        for column in data.axis_iter(Axis(1)) {
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for &value in column.iter() {
                if value < min {
                    min = value;
                }
                if value > max {
                    max = value;
                }
            }
            mins.push(min);
            maxs.push(max);
        }

        Ok(Self { mins, maxs })
    }

    /// Fit bounds and transform the fitting data in one step
    pub fn fit_transform(data: &Array2<f64>) -> Result<(Self, Array2<f64>)> {
        let scaler = Self::fit(data)?;
        let scaled = scaler.transform(data)?;
        Ok((scaler, scaled))
    }

    /// Number of columns the scaler was fitted on
    pub fn num_columns(&self) -> usize {
        self.mins.len()
    }

    /// Fitted minimum of a column
    pub fn column_min(&self, column: usize) -> Option<f64> {
        self.mins.get(column).copied()
    }

    /// Fitted maximum of a column
    pub fn column_max(&self, column: usize) -> Option<f64> {
        self.maxs.get(column).copied()
    }

    fn check_width(&self, ncols: usize) -> Result<()> {
        if ncols != self.mins.len() {
            return Err(ForecastError::SchemaMismatch(format!(
                "Scaler fitted on {} columns, got {}",
                self.mins.len(),
                ncols
            )));
        }
        Ok(())
    }

    /// Map raw values to [0, 1] using the fitted bounds, column-independent
    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(data.ncols())?;

        let mut scaled = data.clone();
        for (j, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            let min = self.mins[j];
            let range = self.maxs[j] - min;
            if range == 0.0 {
                column.fill(0.0);
            } else {
                column.mapv_inplace(|v| (v - min) / range);
            }
        }
        Ok(scaled)
    }

    /// Map scaled values back to raw units using the fitted bounds
    pub fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(data.ncols())?;

        let mut raw = data.clone();
        for (j, mut column) in raw.axis_iter_mut(Axis(1)).enumerate() {
            let min = self.mins[j];
            let range = self.maxs[j] - min;
            column.mapv_inplace(|v| min + v * range);
        }
        Ok(raw)
    }

    /// Fit a single-column scaler from a vector
    pub fn fit_column(values: &Array1<f64>) -> Result<Self> {
        let matrix = values.view().insert_axis(Axis(1)).to_owned();
        Self::fit(&matrix)
    }

    /// Transform a vector with a single-column scaler
    pub fn transform_column(&self, values: &Array1<f64>) -> Result<Array1<f64>> {
        let matrix = values.view().insert_axis(Axis(1)).to_owned();
        let scaled = self.transform(&matrix)?;
        Ok(scaled.index_axis(Axis(1), 0).to_owned())
    }

    /// Inverse-transform one scaled value with a single-column scaler
    pub fn inverse_scalar(&self, value: f64) -> Result<f64> {
        if self.mins.len() != 1 {
            return Err(ForecastError::SchemaMismatch(format!(
                "Expected a single-column scaler, this one was fitted on {} columns",
                self.mins.len()
            )));
        }
        let range = self.maxs[0] - self.mins[0];
        Ok(self.mins[0] + value * range)
    }
}
