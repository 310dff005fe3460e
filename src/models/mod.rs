//! Sequence models for window-to-one forecasting

use crate::error::Result;
use ndarray::{Array1, Array3};
use rand::rngs::StdRng;
use std::fmt::Debug;

/// Trained sequence model mapping windows of recent feature vectors to one
/// scalar prediction each
pub trait TrainedSequenceModel: Debug {
    /// Predict one scaled target value per window in the batch
    ///
    /// Windows are shaped (batch, look_back, num_features); the result has one
    /// entry per window, in order.
    fn predict(&self, windows: &Array3<f64>) -> Result<Array1<f64>>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Sequence model that can be fitted on windowed training data
///
/// The random source is passed explicitly so stochastic initialisation is
/// reproducible; deterministic models simply ignore it.
pub trait SequenceModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedSequenceModel;

    /// Fit the model on training windows and their scaled labels
    fn fit(&self, x: &Array3<f64>, y: &Array1<f64>, rng: &mut StdRng) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod baseline;
pub mod lstm;
