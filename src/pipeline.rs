//! End-to-end forecasting pipeline
//!
//! Wires the stages of one run in order: scale, window, split, fit, evaluate
//! on the held-out test windows, extrapolate drivers, roll out. Single-pass
//! and single-threaded; all fail-fast checks of the run live here.

use crate::data::EmissionsTable;
use crate::error::{ForecastError, Result};
use crate::extrapolate::{self, ExtrapolationConfig};
use crate::metrics::{forecast_accuracy, ForecastAccuracy};
use crate::models::{SequenceModel, TrainedSequenceModel};
use crate::rollout;
use crate::scaling::MinMaxScaler;
use crate::data::ProjectedRecord;
use crate::windowing::{make_windows, train_test_split};
use ndarray::Axis;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Recognized pipeline parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Window length fed to the model per prediction
    pub look_back: usize,
    /// Steps ahead the label sits from the window end; the rollout requires 1
    pub forecast_horizon: usize,
    /// Number of future periods to roll out
    pub num_future_years: usize,
    /// Fraction of windows used for training
    pub train_ratio: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            look_back: 5,
            forecast_horizon: 1,
            num_future_years: 10,
            train_ratio: 0.8,
        }
    }
}

/// Everything one pipeline run produces
#[derive(Debug)]
pub struct ForecastOutcome<T: TrainedSequenceModel> {
    /// The fitted model
    pub trained: T,
    /// Accuracy on the held-out test windows, in original units; `None` when
    /// the test split is empty
    pub accuracy: Option<ForecastAccuracy>,
    /// Test-window predictions in original units
    pub test_predictions: Vec<f64>,
    /// Test-window actuals in original units
    pub test_actuals: Vec<f64>,
    /// Rollout projections, one per future year, chronological
    pub projections: Vec<ProjectedRecord>,
    /// Total window count before the split
    pub windows_total: usize,
    /// Windows in the training split
    pub windows_train: usize,
}

/// Single-run forecasting pipeline
#[derive(Debug, Clone, Default)]
pub struct ForecastPipeline {
    config: PipelineConfig,
}

impl ForecastPipeline {
    /// Create a pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        if config.look_back == 0 {
            return Err(ForecastError::InvalidParameter(
                "look_back must be positive".to_string(),
            ));
        }
        if config.forecast_horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast_horizon must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&config.train_ratio) {
            return Err(ForecastError::InvalidParameter(format!(
                "train_ratio must be in [0, 1], got {}",
                config.train_ratio
            )));
        }
        Ok(Self { config })
    }

    /// The configuration this pipeline runs with
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute one full run: fit, evaluate, extrapolate, roll out
    pub fn run<M: SequenceModel>(
        &self,
        table: &EmissionsTable,
        model: &M,
        extrapolation: &ExtrapolationConfig,
        rng: &mut StdRng,
    ) -> Result<ForecastOutcome<M::Trained>> {
        let config = &self.config;

        // The rollout consumes exactly one extrapolated driver row per step,
        // which is only meaningful for one-step-ahead labels
        if config.forecast_horizon != 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "Rollout requires forecast_horizon == 1, got {}",
                config.forecast_horizon
            )));
        }

        let required = config.look_back + config.forecast_horizon;
        if table.len() < required {
            return Err(ForecastError::InsufficientData {
                rows: table.len(),
                required,
            });
        }

        // Scalers are fitted once on the full historical range and reused for
        // every later transform in the run
        let features = table.feature_matrix()?;
        let target = table.target_vector()?;

        let (feature_scaler, scaled_features) = MinMaxScaler::fit_transform(&features)?;
        let target_scaler = MinMaxScaler::fit_column(&target)?;
        let scaled_target = target_scaler.transform_column(&target)?;

        let (x, y) = make_windows(
            &scaled_features,
            &scaled_target,
            config.look_back,
            config.forecast_horizon,
        )?;
        if x.shape()[0] == 0 {
            return Err(ForecastError::InsufficientData {
                rows: table.len(),
                required,
            });
        }

        let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, config.train_ratio)?;
        let windows_total = x.shape()[0];
        let windows_train = x_train.shape()[0];

        let trained = model.fit(&x_train, &y_train, rng)?;

        // Held-out evaluation, reported in original units
        let (accuracy, test_predictions, test_actuals) = if x_test.shape()[0] > 0 {
            let scaled_predictions = trained.predict(&x_test)?;
            let predictions = scaled_predictions
                .iter()
                .map(|&v| target_scaler.inverse_scalar(v))
                .collect::<Result<Vec<f64>>>()?;
            let actuals = y_test
                .iter()
                .map(|&v| target_scaler.inverse_scalar(v))
                .collect::<Result<Vec<f64>>>()?;
            let accuracy = forecast_accuracy(&predictions, &actuals)?;
            (Some(accuracy), predictions, actuals)
        } else {
            (None, Vec::new(), Vec::new())
        };

        // Future drivers share the schema of the history and are scaled with
        // the already-fitted feature scaler, never refit
        let future = extrapolate::linear(table, config.num_future_years, extrapolation)?;
        if future.features().len_of(Axis(1)) != feature_scaler.num_columns() {
            return Err(ForecastError::SchemaMismatch(format!(
                "Future drivers have {} columns, feature scaler expects {}",
                future.features().len_of(Axis(1)),
                feature_scaler.num_columns()
            )));
        }
        let scaled_future = feature_scaler.transform(future.features())?;

        let projections = rollout::run(
            &trained,
            &scaled_features,
            &scaled_future,
            future.years(),
            &target_scaler,
            config.look_back,
        )?;

        Ok(ForecastOutcome {
            trained,
            accuracy,
            test_predictions,
            test_actuals,
            projections,
            windows_total,
            windows_train,
        })
    }
}
