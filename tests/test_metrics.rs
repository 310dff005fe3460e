use emissions_forecast::error::ForecastError;
use emissions_forecast::metrics::forecast_accuracy;

fn assert_close(value: f64, expected: f64, tolerance: f64) {
    assert!(
        (value - expected).abs() < tolerance,
        "expected {expected}, got {value}"
    );
}

#[test]
fn test_regression_metrics_known_values() {
    let forecast = vec![12.0, 18.0, 33.0, 37.0, 52.0];
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];

    let accuracy = forecast_accuracy(&forecast, &actual).unwrap();

    // Absolute errors are [2, 2, 3, 3, 2]
    assert_close(accuracy.mae, 2.4, 1e-12);
    assert_close(accuracy.mse, 6.0, 1e-12);
    assert_close(accuracy.rmse, 6.0_f64.sqrt(), 1e-12);
    // (2/10 + 2/20 + 3/30 + 3/40 + 2/50) * 100 / 5
    assert_close(accuracy.mape, 10.3, 1e-10);
    // 200 * (2/22 + 2/38 + 3/63 + 3/77 + 2/102) / 5
    assert_close(accuracy.smape, 9.98915, 1e-4);
}

#[test]
fn test_perfect_forecast_scores_zero_everywhere() {
    let values = vec![10.0, 20.0, 30.0];
    let accuracy = forecast_accuracy(&values, &values).unwrap();

    assert_eq!(accuracy.mae, 0.0);
    assert_eq!(accuracy.mse, 0.0);
    assert_eq!(accuracy.rmse, 0.0);
    assert_eq!(accuracy.mape, 0.0);
    assert_eq!(accuracy.smape, 0.0);
}

#[test]
fn test_mape_skips_zero_actuals() {
    let forecast = vec![1.0, 12.0];
    let actual = vec![0.0, 10.0];

    let accuracy = forecast_accuracy(&forecast, &actual).unwrap();

    // Only the non-zero actual contributes: (2/10 * 100) / 2
    assert_close(accuracy.mape, 10.0, 1e-12);
    assert_close(accuracy.mae, 1.5, 1e-12);
    assert_close(accuracy.mse, 2.5, 1e-12);
}

#[test]
fn test_smape_handles_zero_pairs() {
    let forecast = vec![0.0, 5.0];
    let actual = vec![0.0, 0.0];

    let accuracy = forecast_accuracy(&forecast, &actual).unwrap();

    // The (0, 0) pair contributes nothing; the (0, 5) pair saturates at 200
    assert_close(accuracy.smape, 100.0, 1e-12);
    assert_eq!(accuracy.mape, 0.0);
}

#[test]
fn test_mismatched_or_empty_inputs_are_rejected() {
    let err = forecast_accuracy(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err();
    assert!(matches!(err, ForecastError::InvalidParameter(_)));

    let empty: Vec<f64> = vec![];
    let err = forecast_accuracy(&empty, &empty).unwrap_err();
    assert!(matches!(err, ForecastError::InvalidParameter(_)));
}
