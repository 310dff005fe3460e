//! Future driver extrapolation
//!
//! The rollout treats driver variables as exogenous: their future values are
//! assumed known or forecast independently of the model being built. This
//! module produces them by linear interpolation from each driver's last
//! observed value toward a configured terminal value.

use crate::data::{EmissionsTable, FEATURE_COLUMNS};
use crate::error::{ForecastError, Result};
use ndarray::Array2;

/// Terminal values the drivers are assumed to reach at the final future year
///
/// Drivers without a configured terminal continue flat from their last
/// observation. Configuring an unknown column is a schema error, surfaced
/// immediately rather than silently ignored.
#[derive(Debug, Clone, Default)]
pub struct ExtrapolationConfig {
    terminals: Vec<(String, f64)>,
}

impl ExtrapolationConfig {
    /// Create an empty configuration (all drivers held flat)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the terminal value a driver reaches at the final future year
    pub fn with_terminal(mut self, column: &str, value: f64) -> Self {
        self.terminals.push((column.to_string(), value));
        self
    }

    fn terminal_for(&self, column: &str) -> Option<f64> {
        self.terminals
            .iter()
            .rev()
            .find(|(name, _)| name == column)
            .map(|(_, value)| *value)
    }

    fn validate(&self) -> Result<()> {
        for (name, _) in &self.terminals {
            if !FEATURE_COLUMNS.contains(&name.as_str()) {
                return Err(ForecastError::SchemaMismatch(format!(
                    "Unknown driver column '{}' in extrapolation config",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Extrapolated future driver rows, one per future period
#[derive(Debug, Clone)]
pub struct FutureDrivers {
    years: Vec<i32>,
    features: Array2<f64>,
}

impl FutureDrivers {
    /// Future year per row, consecutive from the last historical year + 1
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Raw (unscaled) driver rows, columns ordered as the historical table
    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    /// Number of future periods
    pub fn len(&self) -> usize {
        self.years.len()
    }

    /// Check whether there are no future periods
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

/// Build future driver rows by linear interpolation
///
/// For each driver, period `k` of `n` takes the value
/// `last + (terminal - last) * k / n`; with no terminal configured the driver
/// stays at its last observed value.
pub fn linear(
    table: &EmissionsTable,
    num_future_years: usize,
    config: &ExtrapolationConfig,
) -> Result<FutureDrivers> {
    config.validate()?;
    if table.is_empty() {
        return Err(ForecastError::DataError(
            "Cannot extrapolate from an empty table".to_string(),
        ));
    }

    let history = table.feature_matrix()?;
    let last_row = history.row(history.nrows() - 1);
    let last_year = table.last_year()?;

    let mut features = Array2::zeros((num_future_years, FEATURE_COLUMNS.len()));
    let mut years = Vec::with_capacity(num_future_years);

    for k in 1..=num_future_years {
        years.push(last_year + k as i32);
        let fraction = k as f64 / num_future_years as f64;
        for (j, column) in FEATURE_COLUMNS.iter().enumerate() {
            let last = last_row[j];
            let terminal = config.terminal_for(column).unwrap_or(last);
            features[[k - 1, j]] = last + (terminal - last) * fraction;
        }
    }

    Ok(FutureDrivers { years, features })
}
