//! # Emissions Forecast
//!
//! A Rust library for forecasting carbon emissions from driver time series
//! with a recurrent sequence model.
//!
//! ## Features
//!
//! - Year-indexed driver table handling (energy, industry, population, policy)
//! - Per-column min-max scaling with inverse-transform bookkeeping
//! - Sliding-window sequence construction and a chronological train/test split
//! - A two-layer LSTM regressor with dropout and early stopping
//! - Linear extrapolation of exogenous drivers into future years
//! - Iterative multi-step rollout producing per-year projections
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use emissions_forecast::extrapolate::ExtrapolationConfig;
//! use emissions_forecast::models::lstm::{LstmConfig, LstmForecaster};
//! use emissions_forecast::pipeline::{ForecastPipeline, PipelineConfig};
//! use emissions_forecast::synthetic::{self, SyntheticConfig};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! # fn main() -> emissions_forecast::Result<()> {
//! // One explicit random source drives the whole run
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! // Produce a labeled driver table
//! let table = synthetic::generate(&SyntheticConfig::default(), &mut rng)?;
//!
//! // Fit, evaluate and roll out ten future years
//! let pipeline = ForecastPipeline::new(PipelineConfig::default())?;
//! let model = LstmForecaster::new(LstmConfig::default())?;
//! let outcome = pipeline.run(&table, &model, &ExtrapolationConfig::new(), &mut rng)?;
//!
//! for projection in &outcome.projections {
//!     println!("{}: {:.2}", projection.year, projection.projected_carbon_footprint);
//! }
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod error;
pub mod export;
pub mod extrapolate;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod rollout;
pub mod scaling;
pub mod synthetic;
pub mod windowing;

// Re-export commonly used types
pub use crate::data::{EmissionsRecord, EmissionsTable, ProjectedRecord};
pub use crate::error::{ForecastError, Result};
pub use crate::metrics::ForecastAccuracy;
pub use crate::models::{SequenceModel, TrainedSequenceModel};
pub use crate::pipeline::{ForecastOutcome, ForecastPipeline, PipelineConfig};
pub use crate::scaling::MinMaxScaler;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
