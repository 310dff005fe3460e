use emissions_forecast::error::ForecastError;
use emissions_forecast::models::TrainedSequenceModel;
use emissions_forecast::rollout;
use emissions_forecast::scaling::MinMaxScaler;
use ndarray::{Array1, Array2, Array3};
use pretty_assertions::assert_eq;
use std::cell::RefCell;

/// Stub forecaster returning a fixed scaled value, recording every window
/// shape it is asked to predict
#[derive(Debug)]
struct ConstantModel {
    value: f64,
    seen_shapes: RefCell<Vec<(usize, usize, usize)>>,
}

impl ConstantModel {
    fn new(value: f64) -> Self {
        Self {
            value,
            seen_shapes: RefCell::new(Vec::new()),
        }
    }
}

impl TrainedSequenceModel for ConstantModel {
    fn predict(&self, windows: &Array3<f64>) -> emissions_forecast::Result<Array1<f64>> {
        let shape = windows.shape();
        self.seen_shapes
            .borrow_mut()
            .push((shape[0], shape[1], shape[2]));
        Ok(Array1::from_elem(shape[0], self.value))
    }

    fn name(&self) -> &str {
        "Constant stub"
    }
}

fn target_scaler() -> MinMaxScaler {
    // Target range [100, 300]: scaled 0.5 maps back to 200
    MinMaxScaler::fit_column(&Array1::from_vec(vec![100.0, 300.0])).unwrap()
}

fn scaled_history(rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |(i, j)| (i * cols + j) as f64 / 100.0)
}

#[test]
fn test_rollout_produces_one_forecast_per_future_year() {
    let model = ConstantModel::new(0.5);
    let history = scaled_history(12, 3);
    let future = Array2::from_elem((10, 3), 0.9);
    let years: Vec<i32> = (2025..2035).collect();

    let projections =
        rollout::run(&model, &history, &future, &years, &target_scaler(), 5).unwrap();

    assert_eq!(projections.len(), 10);
    for (projection, year) in projections.iter().zip(years.iter()) {
        assert_eq!(projection.year, *year);
        assert!((projection.projected_carbon_footprint - 200.0).abs() < 1e-9);
    }
}

#[test]
fn test_rollout_window_length_stays_constant() {
    let model = ConstantModel::new(0.25);
    let history = scaled_history(8, 2);
    let future = Array2::from_elem((6, 2), 0.4);
    let years: Vec<i32> = (2030..2036).collect();

    rollout::run(&model, &history, &future, &years, &target_scaler(), 4).unwrap();

    let shapes = model.seen_shapes.borrow();
    assert_eq!(shapes.len(), 6);
    for shape in shapes.iter() {
        assert_eq!(*shape, (1, 4, 2));
    }
}

#[test]
fn test_rollout_is_deterministic_for_fixed_inputs() {
    let history = scaled_history(10, 3);
    let future = Array2::from_elem((5, 3), 0.7);
    let years: Vec<i32> = (2026..2031).collect();
    let scaler = target_scaler();

    let first =
        rollout::run(&ConstantModel::new(0.5), &history, &future, &years, &scaler, 3).unwrap();
    let second =
        rollout::run(&ConstantModel::new(0.5), &history, &future, &years, &scaler, 3).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_rollout_rejects_schema_mismatch() {
    let model = ConstantModel::new(0.5);
    let history = scaled_history(10, 3);
    let narrow_future = Array2::from_elem((5, 2), 0.4);
    let years: Vec<i32> = (2026..2031).collect();

    let err =
        rollout::run(&model, &history, &narrow_future, &years, &target_scaler(), 3).unwrap_err();
    assert!(matches!(err, ForecastError::SchemaMismatch(_)));
}

#[test]
fn test_rollout_rejects_short_history() {
    let model = ConstantModel::new(0.5);
    let history = scaled_history(3, 2);
    let future = Array2::from_elem((2, 2), 0.4);
    let years = vec![2026, 2027];

    let err = rollout::run(&model, &history, &future, &years, &target_scaler(), 5).unwrap_err();
    assert!(matches!(err, ForecastError::InsufficientData { .. }));
}

#[test]
fn test_rollout_with_zero_steps_is_empty() {
    let model = ConstantModel::new(0.5);
    let history = scaled_history(6, 2);
    let future = Array2::zeros((0, 2));
    let years: Vec<i32> = Vec::new();

    let projections =
        rollout::run(&model, &history, &future, &years, &target_scaler(), 3).unwrap();
    assert!(projections.is_empty());
}
