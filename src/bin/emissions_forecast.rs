use emissions_forecast::export::{self, RunSummary};
use emissions_forecast::extrapolate::ExtrapolationConfig;
use emissions_forecast::models::lstm::{LstmConfig, LstmForecaster};
use emissions_forecast::models::SequenceModel;
use emissions_forecast::pipeline::{ForecastPipeline, PipelineConfig};
use emissions_forecast::synthetic::{self, SyntheticConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::process;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run() -> emissions_forecast::Result<()> {
    // Optional arguments: seed and output directory
    let mut args = std::env::args().skip(1);
    let seed: u64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));

    let mut rng = StdRng::seed_from_u64(seed);

    println!("Generating synthetic emissions data (seed {})...", seed);
    let table = synthetic::generate(&SyntheticConfig::default(), &mut rng)?;
    println!(
        "  {} years, {}..{}",
        table.len(),
        table.years()?.first().copied().unwrap_or_default(),
        table.last_year()?
    );

    let pipeline_config = PipelineConfig::default();
    let pipeline = ForecastPipeline::new(pipeline_config.clone())?;
    let model = LstmForecaster::new(LstmConfig::default())?;

    // Drivers that keep rising vs a policy push toward full effectiveness
    let extrapolation = ExtrapolationConfig::new().with_terminal("policy_effectiveness", 1.0);

    println!("Training {} and rolling out...", model.name());
    let outcome = pipeline.run(&table, &model, &extrapolation, &mut rng)?;

    println!(
        "  {} windows ({} train / {} test), {} epochs run",
        outcome.windows_total,
        outcome.windows_train,
        outcome.windows_total - outcome.windows_train,
        outcome.trained.epochs_run()
    );

    if let Some(accuracy) = &outcome.accuracy {
        println!("{}", accuracy);
    }

    println!("Projected carbon footprint:");
    for projection in &outcome.projections {
        println!(
            "  {}: {:.2}",
            projection.year, projection.projected_carbon_footprint
        );
    }

    let historical_path = out_dir.join("historical_emissions.csv");
    let projections_path = out_dir.join("projected_emissions.csv");
    let summary_path = out_dir.join("run_summary.json");

    export::write_historical_csv(&table, &historical_path)?;
    export::write_projections_csv(&outcome.projections, &projections_path)?;
    export::write_run_summary(
        &RunSummary {
            seed,
            config: pipeline_config,
            model: model.name().to_string(),
            windows_total: outcome.windows_total,
            windows_train: outcome.windows_train,
            accuracy: outcome.accuracy.clone(),
            projections: outcome.projections.clone(),
        },
        &summary_path,
    )?;

    println!(
        "Wrote {}, {} and {}",
        historical_path.display(),
        projections_path.display(),
        summary_path.display()
    );

    Ok(())
}
