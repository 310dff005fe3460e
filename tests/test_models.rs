use emissions_forecast::error::ForecastError;
use emissions_forecast::models::baseline::MeanBaseline;
use emissions_forecast::models::lstm::{LstmConfig, LstmForecaster};
use emissions_forecast::models::{SequenceModel, TrainedSequenceModel};
use ndarray::{Array1, Array3};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Windows tracing a noiseless rising sequence
fn sample_windows(n: usize, look_back: usize, features: usize) -> (Array3<f64>, Array1<f64>) {
    let x = Array3::from_shape_fn((n, look_back, features), |(i, t, f)| {
        (i + t) as f64 / (n + look_back) as f64 + f as f64 * 0.01
    });
    let y = Array1::from_shape_fn(n, |i| (i + look_back) as f64 / (n + look_back) as f64);
    (x, y)
}

fn small_lstm_config() -> LstmConfig {
    LstmConfig::default()
        .with_hidden_size(6)
        .with_epochs(5)
        .with_patience(3)
        .with_learning_rate(0.05)
}

#[test]
fn test_mean_baseline_predicts_training_mean() {
    let (x, _) = sample_windows(4, 3, 2);
    let y = Array1::from_vec(vec![1.0, 2.0, 3.0, 6.0]);
    let mut rng = StdRng::seed_from_u64(1);

    let trained = MeanBaseline::new().fit(&x, &y, &mut rng).unwrap();
    assert_eq!(trained.mean(), 3.0);

    let predictions = trained.predict(&x).unwrap();
    assert_eq!(predictions.len(), 4);
    for &p in predictions.iter() {
        assert_eq!(p, 3.0);
    }
}

#[test]
fn test_fitting_zero_windows_fails_fast() {
    let x = Array3::<f64>::zeros((0, 5, 4));
    let y = Array1::<f64>::zeros(0);
    let mut rng = StdRng::seed_from_u64(1);

    let err = MeanBaseline::new().fit(&x, &y, &mut rng).unwrap_err();
    assert!(matches!(err, ForecastError::InsufficientData { .. }));

    let model = LstmForecaster::new(small_lstm_config()).unwrap();
    let err = model.fit(&x, &y, &mut rng).unwrap_err();
    assert!(matches!(err, ForecastError::InsufficientData { .. }));
}

#[test]
fn test_lstm_fit_and_predict_shapes() {
    let (x, y) = sample_windows(12, 4, 3);
    let model = LstmForecaster::new(small_lstm_config()).unwrap();
    let mut rng = StdRng::seed_from_u64(7);

    let trained = model.fit(&x, &y, &mut rng).unwrap();
    let predictions = trained.predict(&x).unwrap();

    assert_eq!(predictions.len(), 12);
    for &p in predictions.iter() {
        assert!(p.is_finite());
    }
}

#[test]
fn test_lstm_respects_epoch_cap_and_records_history() {
    let (x, y) = sample_windows(12, 4, 3);
    let model = LstmForecaster::new(small_lstm_config()).unwrap();
    let mut rng = StdRng::seed_from_u64(7);

    let trained = model.fit(&x, &y, &mut rng).unwrap();

    assert!(trained.epochs_run() >= 1);
    assert!(trained.epochs_run() <= 5);
    assert_eq!(trained.train_history().len(), trained.epochs_run());
    // 20% of 12 windows leaves a 2-window validation hold-out
    assert_eq!(trained.val_history().len(), trained.epochs_run());
    for &loss in trained.train_history() {
        assert!(loss.is_finite());
    }
}

#[test]
fn test_lstm_best_loss_is_minimum_of_monitored() {
    let (x, y) = sample_windows(12, 4, 3);
    let model = LstmForecaster::new(small_lstm_config()).unwrap();
    let mut rng = StdRng::seed_from_u64(11);

    let trained = model.fit(&x, &y, &mut rng).unwrap();

    let min_val = trained
        .val_history()
        .iter()
        .fold(f64::INFINITY, |acc, &v| acc.min(v));
    assert!((trained.best_loss() - min_val).abs() < 1e-12);
}

#[test]
fn test_lstm_halts_early_when_validation_loss_plateaus() {
    // All-zero windows and labels keep the hidden state and the output bias
    // at zero, so every epoch sees the same validation loss. With patience 1
    // the second epoch trips the stop long before the epoch cap.
    let x = Array3::<f64>::zeros((10, 3, 2));
    let y = Array1::<f64>::zeros(10);
    let config = LstmConfig::default()
        .with_hidden_size(4)
        .with_epochs(50)
        .with_patience(1);
    let model = LstmForecaster::new(config).unwrap();
    let mut rng = StdRng::seed_from_u64(17);

    let trained = model.fit(&x, &y, &mut rng).unwrap();

    assert!(trained.epochs_run() < 50);
    assert_eq!(trained.epochs_run(), 2);
    assert_eq!(trained.val_history(), &[0.0, 0.0]);
    assert_eq!(trained.best_loss(), 0.0);

    // The restored weights reproduce the best-epoch fit exactly
    let predictions = trained.predict(&x).unwrap();
    for &p in predictions.iter() {
        assert_eq!(p, 0.0);
    }
}

#[test]
fn test_lstm_restores_best_validation_weights() {
    let (x, y) = sample_windows(12, 4, 3);
    let model = LstmForecaster::new(small_lstm_config()).unwrap();
    let mut rng = StdRng::seed_from_u64(23);

    let trained = model.fit(&x, &y, &mut rng).unwrap();

    // The hold-out is the last 20% of the windows. If the best-epoch weights
    // were restored, re-scoring that tail reproduces the best monitored loss;
    // last-epoch weights would only match by coincidence.
    let n_val = (12.0 * 0.2) as usize;
    let x_val = x.slice(ndarray::s![12 - n_val.., .., ..]).to_owned();
    let predictions = trained.predict(&x_val).unwrap();

    let mse = predictions
        .iter()
        .zip(y.iter().skip(12 - n_val))
        .map(|(&p, &a)| (p - a).powi(2))
        .sum::<f64>()
        / n_val as f64;
    assert!((mse - trained.best_loss()).abs() < 1e-9);
}

#[test]
fn test_lstm_is_reproducible_under_the_same_seed() {
    let (x, y) = sample_windows(10, 3, 2);
    let model = LstmForecaster::new(small_lstm_config()).unwrap();

    let mut rng_a = StdRng::seed_from_u64(99);
    let mut rng_b = StdRng::seed_from_u64(99);

    let first = model.fit(&x, &y, &mut rng_a).unwrap().predict(&x).unwrap();
    let second = model.fit(&x, &y, &mut rng_b).unwrap().predict(&x).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_lstm_rejects_mismatched_prediction_windows() {
    let (x, y) = sample_windows(10, 4, 3);
    let model = LstmForecaster::new(small_lstm_config()).unwrap();
    let mut rng = StdRng::seed_from_u64(5);

    let trained = model.fit(&x, &y, &mut rng).unwrap();

    let wrong_shape = Array3::<f64>::zeros((2, 6, 3));
    let err = trained.predict(&wrong_shape).unwrap_err();
    assert!(matches!(err, ForecastError::SchemaMismatch(_)));
}

#[test]
fn test_lstm_config_validation() {
    assert!(LstmForecaster::new(LstmConfig::default().with_hidden_size(0)).is_err());
    assert!(LstmForecaster::new(LstmConfig::default().with_dropout(1.0)).is_err());
    assert!(LstmForecaster::new(LstmConfig::default().with_learning_rate(0.0)).is_err());
    assert!(LstmForecaster::new(LstmConfig::default().with_epochs(0)).is_err());
}
