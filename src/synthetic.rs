//! Synthetic emissions driver generation
//!
//! Produces a labeled driver table for experimentation: each driver follows a
//! deterministic trend with Gaussian noise, and the carbon footprint is a
//! weighted combination of the drivers plus noise. The random source is an
//! explicit parameter so runs are reproducible and testable in isolation.

use crate::data::{EmissionsRecord, EmissionsTable};
use crate::error::{ForecastError, Result};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Parameters for the synthetic driver generator
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// First year of the generated table
    pub start_year: i32,
    /// Number of consecutive years to generate
    pub num_years: usize,
    /// Standard deviation of the noise added to each driver
    pub driver_noise_std: f64,
    /// Standard deviation of the noise added to the carbon footprint
    pub target_noise_std: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            start_year: 1975,
            num_years: 50,
            driver_noise_std: 1.5,
            target_noise_std: 3.0,
        }
    }
}

/// Generate a synthetic emissions table
pub fn generate(config: &SyntheticConfig, rng: &mut StdRng) -> Result<EmissionsTable> {
    if config.num_years == 0 {
        return Err(ForecastError::InvalidParameter(
            "num_years must be positive".to_string(),
        ));
    }
    if config.driver_noise_std < 0.0 || config.target_noise_std < 0.0 {
        return Err(ForecastError::InvalidParameter(
            "Noise standard deviations must be non-negative".to_string(),
        ));
    }

    let driver_noise = Normal::new(0.0, config.driver_noise_std)
        .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
    let target_noise = Normal::new(0.0, config.target_noise_std)
        .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;

    let mut records = Vec::with_capacity(config.num_years);
    for t in 0..config.num_years {
        let year = config.start_year + t as i32;
        let progress = t as f64;

        // Rising energy demand with mild curvature
        let energy_consumption =
            120.0 + 2.8 * progress + 0.02 * progress * progress + driver_noise.sample(rng);
        // Compounding industrial growth
        let industrial_output = 80.0 * 1.025f64.powf(progress) + driver_noise.sample(rng);
        // Slow linear population growth
        let population = 10.0 + 0.12 * progress + 0.1 * driver_noise.sample(rng);
        // Policy effectiveness ramps up late in the sample, clamped to [0, 1]
        let policy_raw = 1.0 / (1.0 + (-(progress - 35.0) / 6.0).exp());
        let policy_effectiveness = (policy_raw + 0.05 * rng.gen::<f64>()).clamp(0.0, 1.0);

        let carbon_footprint = 0.45 * energy_consumption + 0.30 * industrial_output
            + 4.0 * population
            - 60.0 * policy_effectiveness
            + target_noise.sample(rng);

        records.push(EmissionsRecord {
            year,
            energy_consumption,
            industrial_output,
            population,
            policy_effectiveness,
            carbon_footprint,
        });
    }

    EmissionsTable::from_records(&records)
}
