//! Sliding-window sequence construction and the chronological train/test
//! split

use crate::error::{ForecastError, Result};
use ndarray::{s, Array1, Array2, Array3};

/// Slice a scaled feature matrix into fixed-length input windows, each paired
/// with the target value `horizon` steps after the window end
///
/// Window `i` covers feature rows `[i, i + look_back)` and its label is target
/// row `i + look_back + horizon - 1`. Windows preserve time order. When there
/// are not enough rows for a single window the result is empty rather than an
/// error; fitting a model on zero windows fails fast instead.
pub fn make_windows(
    features: &Array2<f64>,
    target: &Array1<f64>,
    look_back: usize,
    horizon: usize,
) -> Result<(Array3<f64>, Array1<f64>)> {
    if look_back == 0 {
        return Err(ForecastError::InvalidParameter(
            "look_back must be positive".to_string(),
        ));
    }
    if horizon == 0 {
        return Err(ForecastError::InvalidParameter(
            "forecast_horizon must be at least 1".to_string(),
        ));
    }
    if features.nrows() != target.len() {
        return Err(ForecastError::DataError(format!(
            "Feature matrix has {} rows but target has {}",
            features.nrows(),
            target.len()
        )));
    }

    let rows = features.nrows();
    let num_features = features.ncols();
    let num_windows = rows.saturating_sub(look_back + horizon);

    let mut x = Array3::zeros((num_windows, look_back, num_features));
    let mut y = Array1::zeros(num_windows);

    for i in 0..num_windows {
        x.slice_mut(s![i, .., ..])
            .assign(&features.slice(s![i..i + look_back, ..]));
        y[i] = target[i + look_back + horizon - 1];
    }

    Ok((x, y))
}

/// Split windows into train and test sets, preserving time order
///
/// The first `floor(train_ratio * n)` windows form the training set and the
/// remainder the test set. No shuffling: evaluation must reflect
/// forward-in-time generalization, not leakage from future into past.
#[allow(clippy::type_complexity)]
pub fn train_test_split(
    x: &Array3<f64>,
    y: &Array1<f64>,
    train_ratio: f64,
) -> Result<(Array3<f64>, Array3<f64>, Array1<f64>, Array1<f64>)> {
    if !(0.0..=1.0).contains(&train_ratio) {
        return Err(ForecastError::InvalidParameter(format!(
            "train_ratio must be in [0, 1], got {}",
            train_ratio
        )));
    }
    if x.shape()[0] != y.len() {
        return Err(ForecastError::DataError(format!(
            "{} windows but {} labels",
            x.shape()[0],
            y.len()
        )));
    }

    let n = x.shape()[0];
    let train_size = (n as f64 * train_ratio).floor() as usize;

    let x_train = x.slice(s![..train_size, .., ..]).to_owned();
    let x_test = x.slice(s![train_size.., .., ..]).to_owned();
    let y_train = y.slice(s![..train_size]).to_owned();
    let y_test = y.slice(s![train_size..]).to_owned();

    Ok((x_train, x_test, y_train, y_test))
}
