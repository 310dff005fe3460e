//! Baseline regressors satisfying the sequence-model contract

use crate::error::{ForecastError, Result};
use crate::models::{SequenceModel, TrainedSequenceModel};
use ndarray::{Array1, Array3};
use rand::rngs::StdRng;

/// Baseline predicting the mean training target for every window
///
/// Useful as a sanity floor for evaluation and for exercising the windowing
/// and rollout plumbing without the cost of real training.
#[derive(Debug, Clone, Default)]
pub struct MeanBaseline;

impl MeanBaseline {
    /// Create a new mean baseline
    pub fn new() -> Self {
        Self
    }
}

/// Trained mean baseline
#[derive(Debug, Clone)]
pub struct TrainedMeanBaseline {
    mean: f64,
}

impl TrainedMeanBaseline {
    /// The mean training target this baseline predicts
    pub fn mean(&self) -> f64 {
        self.mean
    }
}

impl SequenceModel for MeanBaseline {
    type Trained = TrainedMeanBaseline;

    fn fit(&self, x: &Array3<f64>, y: &Array1<f64>, _rng: &mut StdRng) -> Result<Self::Trained> {
        if x.shape()[0] == 0 || y.is_empty() {
            return Err(ForecastError::InsufficientData {
                rows: 0,
                required: 1,
            });
        }
        if x.shape()[0] != y.len() {
            return Err(ForecastError::DataError(format!(
                "{} windows but {} labels",
                x.shape()[0],
                y.len()
            )));
        }

        let mean = y.sum() / y.len() as f64;
        Ok(TrainedMeanBaseline { mean })
    }

    fn name(&self) -> &str {
        "Mean baseline"
    }
}

impl TrainedSequenceModel for TrainedMeanBaseline {
    fn predict(&self, windows: &Array3<f64>) -> Result<Array1<f64>> {
        Ok(Array1::from_elem(windows.shape()[0], self.mean))
    }

    fn name(&self) -> &str {
        "Mean baseline"
    }
}
