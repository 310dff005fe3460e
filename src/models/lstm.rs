//! Stacked LSTM regressor with dropout and early stopping

use crate::error::{ForecastError, Result};
use crate::models::{SequenceModel, TrainedSequenceModel};
use ndarray::{s, Array1, Array2, Array3};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

fn sigmoid(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

fn tanh(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(f64::tanh)
}

fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}

/// Configuration of the LSTM forecaster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmConfig {
    /// Size of each hidden state
    pub hidden_size: usize,
    /// Dropout probability between the recurrent layers and after the second
    pub dropout: f64,
    /// Learning rate for the gradient updates
    pub learning_rate: f64,
    /// Upper bound on training epochs
    pub epochs: usize,
    /// Epochs without validation improvement before training halts
    pub patience: usize,
    /// Fraction of the training windows held out for validation
    pub validation_split: f64,
    /// Mini-batch size
    pub batch_size: usize,
    /// Elementwise gradient clipping bound
    pub gradient_clip: Option<f64>,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            hidden_size: 32,
            dropout: 0.2,
            learning_rate: 0.01,
            epochs: 200,
            patience: 20,
            validation_split: 0.2,
            batch_size: 16,
            gradient_clip: Some(5.0),
        }
    }
}

impl LstmConfig {
    /// Set the hidden state size
    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    /// Set the dropout probability
    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    /// Set the learning rate
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the epoch cap
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the early-stopping patience
    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.hidden_size == 0 {
            return Err(ForecastError::InvalidParameter(
                "hidden_size must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ForecastError::InvalidParameter(
                "dropout must be in [0, 1)".to_string(),
            ));
        }
        if self.learning_rate <= 0.0 {
            return Err(ForecastError::InvalidParameter(
                "learning_rate must be positive".to_string(),
            ));
        }
        if self.epochs == 0 {
            return Err(ForecastError::InvalidParameter(
                "epochs must be positive".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ForecastError::InvalidParameter(
                "batch_size must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(ForecastError::InvalidParameter(
                "validation_split must be in [0, 1)".to_string(),
            ));
        }
        Ok(())
    }
}

/// One LSTM cell: gate weights for input, forget, cell candidate and output
#[derive(Debug, Clone)]
struct LstmCell {
    hidden_size: usize,

    w_ii: Array2<f64>,
    w_hi: Array2<f64>,
    b_i: Array1<f64>,

    w_if: Array2<f64>,
    w_hf: Array2<f64>,
    b_f: Array1<f64>,

    w_ig: Array2<f64>,
    w_hg: Array2<f64>,
    b_g: Array1<f64>,

    w_io: Array2<f64>,
    w_ho: Array2<f64>,
    b_o: Array1<f64>,
}

/// Everything the backward pass needs from one forward step
struct StepCache {
    x: Array1<f64>,
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    tanh_c: Array1<f64>,
}

/// Accumulated gradients for one cell, same layout as the weights
struct CellGrads {
    w_ii: Array2<f64>,
    w_hi: Array2<f64>,
    b_i: Array1<f64>,
    w_if: Array2<f64>,
    w_hf: Array2<f64>,
    b_f: Array1<f64>,
    w_ig: Array2<f64>,
    w_hg: Array2<f64>,
    b_g: Array1<f64>,
    w_io: Array2<f64>,
    w_ho: Array2<f64>,
    b_o: Array1<f64>,
}

impl CellGrads {
    fn zeros(input_size: usize, hidden_size: usize) -> Self {
        Self {
            w_ii: Array2::zeros((hidden_size, input_size)),
            w_hi: Array2::zeros((hidden_size, hidden_size)),
            b_i: Array1::zeros(hidden_size),
            w_if: Array2::zeros((hidden_size, input_size)),
            w_hf: Array2::zeros((hidden_size, hidden_size)),
            b_f: Array1::zeros(hidden_size),
            w_ig: Array2::zeros((hidden_size, input_size)),
            w_hg: Array2::zeros((hidden_size, hidden_size)),
            b_g: Array1::zeros(hidden_size),
            w_io: Array2::zeros((hidden_size, input_size)),
            w_ho: Array2::zeros((hidden_size, hidden_size)),
            b_o: Array1::zeros(hidden_size),
        }
    }
}

impl LstmCell {
    fn new(input_size: usize, hidden_size: usize, rng: &mut StdRng) -> Self {
        let limit = (1.0 / hidden_size as f64).sqrt();
        let dist = Uniform::new(-limit, limit);

        Self {
            hidden_size,
            w_ii: Array2::random_using((hidden_size, input_size), dist, rng),
            w_hi: Array2::random_using((hidden_size, hidden_size), dist, rng),
            b_i: Array1::zeros(hidden_size),
            w_if: Array2::random_using((hidden_size, input_size), dist, rng),
            w_hf: Array2::random_using((hidden_size, hidden_size), dist, rng),
            // Forget gate biased open at the start of training
            b_f: Array1::from_elem(hidden_size, 1.0),
            w_ig: Array2::random_using((hidden_size, input_size), dist, rng),
            w_hg: Array2::random_using((hidden_size, hidden_size), dist, rng),
            b_g: Array1::zeros(hidden_size),
            w_io: Array2::random_using((hidden_size, input_size), dist, rng),
            w_ho: Array2::random_using((hidden_size, hidden_size), dist, rng),
            b_o: Array1::zeros(hidden_size),
        }
    }

    fn init_hidden(&self) -> (Array1<f64>, Array1<f64>) {
        (Array1::zeros(self.hidden_size), Array1::zeros(self.hidden_size))
    }

    fn forward(
        &self,
        x: &Array1<f64>,
        h_prev: &Array1<f64>,
        c_prev: &Array1<f64>,
    ) -> (Array1<f64>, Array1<f64>, StepCache) {
        let i = sigmoid(&(self.w_ii.dot(x) + self.w_hi.dot(h_prev) + &self.b_i));
        let f = sigmoid(&(self.w_if.dot(x) + self.w_hf.dot(h_prev) + &self.b_f));
        let g = tanh(&(self.w_ig.dot(x) + self.w_hg.dot(h_prev) + &self.b_g));
        let o = sigmoid(&(self.w_io.dot(x) + self.w_ho.dot(h_prev) + &self.b_o));

        let c = &f * c_prev + &i * &g;
        let tanh_c = tanh(&c);
        let h = &o * &tanh_c;

        let cache = StepCache {
            x: x.clone(),
            h_prev: h_prev.clone(),
            c_prev: c_prev.clone(),
            i: i.clone(),
            f: f.clone(),
            g: g.clone(),
            o: o.clone(),
            tanh_c: tanh_c.clone(),
        };

        (h, c, cache)
    }

    /// Backward through one timestep; returns gradients w.r.t. the step input,
    /// the previous hidden state and the previous cell state
    fn backward_step(
        &self,
        cache: &StepCache,
        dh: &Array1<f64>,
        dc_carried: &Array1<f64>,
        grads: &mut CellGrads,
    ) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
        let dc = dc_carried + &(dh * &cache.o * &cache.tanh_c.mapv(|t| 1.0 - t * t));

        let d_o = dh * &cache.tanh_c;
        let dz_o = &d_o * &cache.o * &cache.o.mapv(|v| 1.0 - v);

        let d_f = &dc * &cache.c_prev;
        let dz_f = &d_f * &cache.f * &cache.f.mapv(|v| 1.0 - v);

        let d_i = &dc * &cache.g;
        let dz_i = &d_i * &cache.i * &cache.i.mapv(|v| 1.0 - v);

        let d_g = &dc * &cache.i;
        let dz_g = &d_g * &cache.g.mapv(|v| 1.0 - v * v);

        grads.w_ii += &outer(&dz_i, &cache.x);
        grads.w_hi += &outer(&dz_i, &cache.h_prev);
        grads.b_i += &dz_i;
        grads.w_if += &outer(&dz_f, &cache.x);
        grads.w_hf += &outer(&dz_f, &cache.h_prev);
        grads.b_f += &dz_f;
        grads.w_ig += &outer(&dz_g, &cache.x);
        grads.w_hg += &outer(&dz_g, &cache.h_prev);
        grads.b_g += &dz_g;
        grads.w_io += &outer(&dz_o, &cache.x);
        grads.w_ho += &outer(&dz_o, &cache.h_prev);
        grads.b_o += &dz_o;

        let dx = self.w_ii.t().dot(&dz_i)
            + self.w_if.t().dot(&dz_f)
            + self.w_ig.t().dot(&dz_g)
            + self.w_io.t().dot(&dz_o);
        let dh_prev = self.w_hi.t().dot(&dz_i)
            + self.w_hf.t().dot(&dz_f)
            + self.w_hg.t().dot(&dz_g)
            + self.w_ho.t().dot(&dz_o);
        let dc_prev = &dc * &cache.f;

        (dx, dh_prev, dc_prev)
    }

    fn apply_grads(&mut self, grads: &CellGrads, lr: f64, scale: f64, clip: Option<f64>) {
        let step = |w: &mut Array2<f64>, g: &Array2<f64>| {
            let mut delta = g.mapv(|v| v * scale);
            if let Some(bound) = clip {
                delta.mapv_inplace(|v| v.clamp(-bound, bound));
            }
            *w -= &delta.mapv(|v| v * lr);
        };
        let step_b = |b: &mut Array1<f64>, g: &Array1<f64>| {
            let mut delta = g.mapv(|v| v * scale);
            if let Some(bound) = clip {
                delta.mapv_inplace(|v| v.clamp(-bound, bound));
            }
            *b -= &delta.mapv(|v| v * lr);
        };

        step(&mut self.w_ii, &grads.w_ii);
        step(&mut self.w_hi, &grads.w_hi);
        step_b(&mut self.b_i, &grads.b_i);
        step(&mut self.w_if, &grads.w_if);
        step(&mut self.w_hf, &grads.w_hf);
        step_b(&mut self.b_f, &grads.b_f);
        step(&mut self.w_ig, &grads.w_ig);
        step(&mut self.w_hg, &grads.w_hg);
        step_b(&mut self.b_g, &grads.b_g);
        step(&mut self.w_io, &grads.w_io);
        step(&mut self.w_ho, &grads.w_ho);
        step_b(&mut self.b_o, &grads.b_o);
    }
}

/// Weights of the whole network: two stacked cells plus the linear head
#[derive(Debug, Clone)]
struct LstmWeights {
    layer1: LstmCell,
    layer2: LstmCell,
    head_w: Array1<f64>,
    head_b: f64,
}

impl LstmWeights {
    fn new(input_size: usize, hidden_size: usize, rng: &mut StdRng) -> Self {
        let limit = (1.0 / hidden_size as f64).sqrt();
        Self {
            layer1: LstmCell::new(input_size, hidden_size, rng),
            layer2: LstmCell::new(hidden_size, hidden_size, rng),
            head_w: Array1::random_using(hidden_size, Uniform::new(-limit, limit), rng),
            head_b: 0.0,
        }
    }

    /// Forward pass without dropout, used for prediction and validation
    fn forward(&self, window: &ndarray::ArrayView2<f64>) -> f64 {
        let (mut h1, mut c1) = self.layer1.init_hidden();
        let (mut h2, mut c2) = self.layer2.init_hidden();

        for t in 0..window.nrows() {
            let x = window.row(t).to_owned();
            let (h1_next, c1_next, _) = self.layer1.forward(&x, &h1, &c1);
            let (h2_next, c2_next, _) = self.layer2.forward(&h1_next, &h2, &c2);
            h1 = h1_next;
            c1 = c1_next;
            h2 = h2_next;
            c2 = c2_next;
        }

        self.head_w.dot(&h2) + self.head_b
    }
}

fn dropout_mask(len: usize, dropout: f64, rng: &mut StdRng) -> Array1<f64> {
    if dropout == 0.0 {
        return Array1::ones(len);
    }
    let keep = 1.0 - dropout;
    Array1::from_shape_fn(len, |_| {
        if rng.gen::<f64>() < keep {
            1.0 / keep
        } else {
            0.0
        }
    })
}

/// Two-layer LSTM regressor
///
/// First layer feeds its full hidden sequence to the second; the second's
/// final hidden state goes through a single linear output unit. Inverted
/// dropout is applied between the layers and after the second during
/// training. Fitting minimises squared error with truncated-history BPTT and
/// halts early when validation loss stops improving, restoring the
/// best-observed weights.
#[derive(Debug, Clone, Default)]
pub struct LstmForecaster {
    config: LstmConfig,
}

impl LstmForecaster {
    /// Create a forecaster with the given configuration
    pub fn new(config: LstmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this forecaster trains with
    pub fn config(&self) -> &LstmConfig {
        &self.config
    }

    /// Forward one sample with dropout, then backpropagate through time.
    /// Returns the squared error of the sample.
    #[allow(clippy::too_many_arguments)]
    fn train_sample(
        weights: &LstmWeights,
        window: &ndarray::ArrayView2<f64>,
        target: f64,
        dropout: f64,
        grads1: &mut CellGrads,
        grads2: &mut CellGrads,
        head_w_grad: &mut Array1<f64>,
        head_b_grad: &mut f64,
        rng: &mut StdRng,
    ) -> f64 {
        let seq_len = window.nrows();
        let hidden = weights.layer1.hidden_size;

        let (mut h1, mut c1) = weights.layer1.init_hidden();
        let (mut h2, mut c2) = weights.layer2.init_hidden();

        let mut caches1 = Vec::with_capacity(seq_len);
        let mut caches2 = Vec::with_capacity(seq_len);
        let mut masks1 = Vec::with_capacity(seq_len);

        for t in 0..seq_len {
            let x = window.row(t).to_owned();
            let (h1_next, c1_next, cache1) = weights.layer1.forward(&x, &h1, &c1);

            let mask1 = dropout_mask(hidden, dropout, rng);
            let h1_dropped = &h1_next * &mask1;

            let (h2_next, c2_next, cache2) = weights.layer2.forward(&h1_dropped, &h2, &c2);

            caches1.push(cache1);
            caches2.push(cache2);
            masks1.push(mask1);
            h1 = h1_next;
            c1 = c1_next;
            h2 = h2_next;
            c2 = c2_next;
        }

        let mask2 = dropout_mask(hidden, dropout, rng);
        let h2_dropped = &h2 * &mask2;
        let prediction = weights.head_w.dot(&h2_dropped) + weights.head_b;

        let err = prediction - target;
        let dp = 2.0 * err;

        *head_w_grad += &h2_dropped.mapv(|v| v * dp);
        *head_b_grad += dp;

        // Layer 2 receives loss gradient only at the final step
        let mut dh2 = weights.head_w.mapv(|v| v * dp) * &mask2;
        let mut dc2 = Array1::zeros(hidden);
        let mut dh1_inject: Vec<Array1<f64>> = vec![Array1::zeros(hidden); seq_len];

        for t in (0..seq_len).rev() {
            let (dx2, dh2_prev, dc2_prev) =
                weights.layer2.backward_step(&caches2[t], &dh2, &dc2, grads2);
            dh1_inject[t] = &dx2 * &masks1[t];
            dh2 = dh2_prev;
            dc2 = dc2_prev;
        }

        let mut dh1 = Array1::zeros(hidden);
        let mut dc1 = Array1::zeros(hidden);

        for t in (0..seq_len).rev() {
            let dh_total = &dh1 + &dh1_inject[t];
            let (_, dh1_prev, dc1_prev) =
                weights.layer1.backward_step(&caches1[t], &dh_total, &dc1, grads1);
            dh1 = dh1_prev;
            dc1 = dc1_prev;
        }

        err * err
    }

    fn evaluate(weights: &LstmWeights, x: &Array3<f64>, y: &Array1<f64>) -> f64 {
        let n = x.shape()[0];
        if n == 0 {
            return f64::NAN;
        }
        let mut total = 0.0;
        for s in 0..n {
            let window = x.slice(s![s, .., ..]);
            let err = weights.forward(&window) - y[s];
            total += err * err;
        }
        total / n as f64
    }
}

impl SequenceModel for LstmForecaster {
    type Trained = TrainedLstm;

    fn fit(&self, x: &Array3<f64>, y: &Array1<f64>, rng: &mut StdRng) -> Result<Self::Trained> {
        let n = x.shape()[0];
        let look_back = x.shape()[1];
        let num_features = x.shape()[2];

        if n == 0 {
            return Err(ForecastError::InsufficientData {
                rows: 0,
                required: 1,
            });
        }
        if n != y.len() {
            return Err(ForecastError::DataError(format!(
                "{} windows but {} labels",
                n,
                y.len()
            )));
        }
        if look_back == 0 || num_features == 0 {
            return Err(ForecastError::InvalidParameter(
                "Windows must have at least one timestep and one feature".to_string(),
            ));
        }

        let config = &self.config;

        // Chronological validation hold-out from the tail of the training
        // windows; an empty hold-out falls back to monitoring training loss
        let n_val = (n as f64 * config.validation_split).floor() as usize;
        let n_fit = n - n_val;
        let x_fit = x.slice(s![..n_fit, .., ..]).to_owned();
        let y_fit = y.slice(s![..n_fit]).to_owned();
        let x_val = x.slice(s![n_fit.., .., ..]).to_owned();
        let y_val = y.slice(s![n_fit..]).to_owned();

        let mut weights = LstmWeights::new(num_features, config.hidden_size, rng);
        let mut best_weights = weights.clone();
        let mut best_loss = f64::INFINITY;
        let mut wait = 0usize;

        let mut train_history = Vec::new();
        let mut val_history = Vec::new();

        let batch_size = config.batch_size.min(n_fit);

        for _epoch in 0..config.epochs {
            let mut epoch_loss = 0.0;

            for batch_start in (0..n_fit).step_by(batch_size) {
                let batch_end = (batch_start + batch_size).min(n_fit);
                let batch_len = batch_end - batch_start;

                let mut grads1 = CellGrads::zeros(num_features, config.hidden_size);
                let mut grads2 = CellGrads::zeros(config.hidden_size, config.hidden_size);
                let mut head_w_grad = Array1::zeros(config.hidden_size);
                let mut head_b_grad = 0.0;

                for s in batch_start..batch_end {
                    let window = x_fit.slice(s![s, .., ..]);
                    epoch_loss += Self::train_sample(
                        &weights,
                        &window,
                        y_fit[s],
                        config.dropout,
                        &mut grads1,
                        &mut grads2,
                        &mut head_w_grad,
                        &mut head_b_grad,
                        rng,
                    );
                }

                let scale = 1.0 / batch_len as f64;
                weights
                    .layer1
                    .apply_grads(&grads1, config.learning_rate, scale, config.gradient_clip);
                weights
                    .layer2
                    .apply_grads(&grads2, config.learning_rate, scale, config.gradient_clip);

                let mut head_delta = head_w_grad.mapv(|v| v * scale);
                let mut bias_delta = head_b_grad * scale;
                if let Some(bound) = config.gradient_clip {
                    head_delta.mapv_inplace(|v| v.clamp(-bound, bound));
                    bias_delta = bias_delta.clamp(-bound, bound);
                }
                weights.head_w -= &head_delta.mapv(|v| v * config.learning_rate);
                weights.head_b -= bias_delta * config.learning_rate;
            }

            let train_loss = epoch_loss / n_fit as f64;
            train_history.push(train_loss);

            let monitored = if n_val > 0 {
                let val_loss = Self::evaluate(&weights, &x_val, &y_val);
                val_history.push(val_loss);
                val_loss
            } else {
                train_loss
            };

            if monitored < best_loss {
                best_loss = monitored;
                best_weights = weights.clone();
                wait = 0;
            } else {
                wait += 1;
                if wait >= config.patience {
                    break;
                }
            }
        }

        Ok(TrainedLstm {
            weights: best_weights,
            look_back,
            num_features,
            best_loss,
            train_history,
            val_history,
        })
    }

    fn name(&self) -> &str {
        "Stacked LSTM"
    }
}

/// Trained LSTM with the best-by-validation weights restored
#[derive(Debug, Clone)]
pub struct TrainedLstm {
    weights: LstmWeights,
    look_back: usize,
    num_features: usize,
    best_loss: f64,
    train_history: Vec<f64>,
    val_history: Vec<f64>,
}

impl TrainedLstm {
    /// Best monitored loss observed during training
    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }

    /// Per-epoch training loss
    pub fn train_history(&self) -> &[f64] {
        &self.train_history
    }

    /// Per-epoch validation loss (empty when no hold-out was available)
    pub fn val_history(&self) -> &[f64] {
        &self.val_history
    }

    /// Number of epochs actually run before the stop
    pub fn epochs_run(&self) -> usize {
        self.train_history.len()
    }
}

impl TrainedSequenceModel for TrainedLstm {
    fn predict(&self, windows: &Array3<f64>) -> Result<Array1<f64>> {
        if windows.shape()[1] != self.look_back || windows.shape()[2] != self.num_features {
            return Err(ForecastError::SchemaMismatch(format!(
                "Model fitted on windows of shape ({}, {}), got ({}, {})",
                self.look_back,
                self.num_features,
                windows.shape()[1],
                windows.shape()[2]
            )));
        }

        let n = windows.shape()[0];
        let mut predictions = Array1::zeros(n);
        for s in 0..n {
            let window = windows.slice(s![s, .., ..]);
            predictions[s] = self.weights.forward(&window);
        }
        Ok(predictions)
    }

    fn name(&self) -> &str {
        "Stacked LSTM"
    }
}
