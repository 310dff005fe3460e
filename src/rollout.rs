//! Iterative multi-step forecasting over a trailing window
//!
//! The single piece of state is the current trailing window of scaled driver
//! rows. Each step feeds it to the forecaster, inverse-scales the prediction
//! into original units, then slides the window forward by dropping the oldest
//! row and appending the scaled future driver row for the period just
//! forecast. The target is never fed back as a feature, so forecast error
//! compounds only through the window's age, not through the driver channels.

use crate::data::ProjectedRecord;
use crate::error::{ForecastError, Result};
use crate::models::TrainedSequenceModel;
use crate::scaling::MinMaxScaler;
use ndarray::{s, Array2, Array3};

/// Run the rollout for as many steps as there are future driver rows
///
/// `scaled_history` is the full scaled historical feature matrix; the trailing
/// window is initialised from its last `look_back` rows. `scaled_future` must
/// share the historical column layout and carry one row per future year in
/// `future_years`. Returns one projection per future period, in chronological
/// order.
pub fn run(
    model: &dyn TrainedSequenceModel,
    scaled_history: &Array2<f64>,
    scaled_future: &Array2<f64>,
    future_years: &[i32],
    target_scaler: &MinMaxScaler,
    look_back: usize,
) -> Result<Vec<ProjectedRecord>> {
    if look_back == 0 {
        return Err(ForecastError::InvalidParameter(
            "look_back must be positive".to_string(),
        ));
    }
    if scaled_history.nrows() < look_back {
        return Err(ForecastError::InsufficientData {
            rows: scaled_history.nrows(),
            required: look_back,
        });
    }
    if scaled_future.ncols() != scaled_history.ncols() {
        return Err(ForecastError::SchemaMismatch(format!(
            "Future drivers have {} columns, history has {}",
            scaled_future.ncols(),
            scaled_history.ncols()
        )));
    }
    if scaled_future.nrows() != future_years.len() {
        return Err(ForecastError::DataError(format!(
            "{} future driver rows but {} future years",
            scaled_future.nrows(),
            future_years.len()
        )));
    }

    let num_features = scaled_history.ncols();
    let steps = scaled_future.nrows();

    // Trailing window state, seeded from the tail of the history
    let mut window = scaled_history
        .slice(s![scaled_history.nrows() - look_back.., ..])
        .to_owned();

    let mut projections = Vec::with_capacity(steps);

    for step in 0..steps {
        let mut batch = Array3::zeros((1, look_back, num_features));
        batch.slice_mut(s![0, .., ..]).assign(&window);

        let predictions = model.predict(&batch)?;
        let scaled_prediction = predictions[0];
        let value = target_scaler.inverse_scalar(scaled_prediction)?;

        projections.push(ProjectedRecord {
            year: future_years[step],
            projected_carbon_footprint: value,
        });

        // Slide: drop the oldest row, append the driver row just consumed
        if step + 1 < steps {
            let mut next = Array2::zeros((look_back, num_features));
            next.slice_mut(s![..look_back - 1, ..])
                .assign(&window.slice(s![1.., ..]));
            next.row_mut(look_back - 1).assign(&scaled_future.row(step));
            window = next;
        }
    }

    Ok(projections)
}
