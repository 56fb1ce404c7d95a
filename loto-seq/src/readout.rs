use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::RngExt;
use rand::distr::Uniform;
use serde::{Deserialize, Serialize};

use crate::config::{ReadoutSolver, SequenceConfig};
use crate::error::{PipelineError, Result};
use crate::linalg::ridge_regression;
use crate::metrics::binary_cross_entropy;

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Linear map from reservoir features to one score per ball.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Readout {
    /// `[n_outputs, n_features]`
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
    pub solver: ReadoutSolver,
}

impl Readout {
    pub fn n_features(&self) -> usize {
        self.weights.ncols()
    }

    /// Scores in [0, 1], one per output.
    pub fn predict(&self, features: ArrayView1<f64>) -> Vec<f64> {
        let raw = self.weights.dot(&features) + &self.bias;
        match self.solver {
            ReadoutSolver::Logistic => raw.iter().map(|&z| sigmoid(z)).collect(),
            ReadoutSolver::Ridge => raw.iter().map(|&z| z.clamp(0.0, 1.0)).collect(),
        }
    }

    /// Mean binary cross-entropy over the rows of `features`.
    pub fn loss(&self, features: &Array2<f64>, targets: &Array2<f64>) -> f64 {
        if features.nrows() == 0 {
            return 0.0;
        }
        let total: f64 = features
            .rows()
            .into_iter()
            .zip(targets.rows())
            .map(|(x, y)| binary_cross_entropy(&self.predict(x), &y.to_vec()))
            .sum();
        total / features.nrows() as f64
    }

    /// Fit with the solver chosen in `config`.
    /// `features`: `[n, F]`, `targets`: `[n, 49]`.
    pub fn fit(
        features: &Array2<f64>,
        targets: &Array2<f64>,
        config: &SequenceConfig,
        rng: &mut StdRng,
    ) -> Result<Self> {
        if features.nrows() != targets.nrows() {
            return Err(PipelineError::DimensionMismatch {
                expected: features.nrows(),
                actual: targets.nrows(),
            });
        }
        if features.nrows() == 0 {
            return Err(PipelineError::InsufficientHistory { required: 1, actual: 0 });
        }
        match config.solver {
            ReadoutSolver::Logistic => Ok(fit_logistic(features, targets, config, rng)),
            ReadoutSolver::Ridge => fit_ridge(features, targets, config.ridge_lambda),
        }
    }
}

fn fit_ridge(features: &Array2<f64>, targets: &Array2<f64>, lambda: f64) -> Result<Readout> {
    // Append a constant column so the intercept is fitted with the weights.
    let (n, f) = features.dim();
    let mut x = Array2::ones((n, f + 1));
    x.slice_mut(ndarray::s![.., ..f]).assign(features);

    let w = ridge_regression(&x, targets, lambda)?;
    Ok(Readout {
        weights: w.slice(ndarray::s![.., ..f]).to_owned(),
        bias: w.column(f).to_owned(),
        solver: ReadoutSolver::Ridge,
    })
}

/// Mini-batch gradient descent on binary cross-entropy with L2 on the weights.
fn fit_logistic(
    features: &Array2<f64>,
    targets: &Array2<f64>,
    config: &SequenceConfig,
    rng: &mut StdRng,
) -> Readout {
    let (n, f) = features.dim();
    let outputs = targets.ncols();
    let scale = 1.0 / (f.max(1) as f64).sqrt();

    let mut weights = match Uniform::new_inclusive(-scale, scale) {
        Ok(dist) => Array2::from_shape_fn((outputs, f), |_| rng.sample(dist)),
        Err(_) => Array2::zeros((outputs, f)),
    };
    // Start from the base rate so early epochs do not waste steps on the bias.
    let base_rate = targets.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(outputs));
    let mut bias = base_rate.mapv(|p| {
        let p = p.clamp(1e-3, 1.0 - 1e-3);
        (p / (1.0 - p)).ln()
    });

    let batch_size = config.batch_size.max(1);
    let lr = config.learning_rate;
    let mut order: Vec<usize> = (0..n).collect();

    for _ in 0..config.epochs {
        order.shuffle(rng);
        for batch in order.chunks(batch_size) {
            let x = features.select(Axis(0), batch);
            let y = targets.select(Axis(0), batch);

            let mut err = x.dot(&weights.t()) + &bias;
            err.mapv_inplace(sigmoid);
            err -= &y;

            let m = batch.len() as f64;
            let grad_w = err.t().dot(&x) / m + &weights * config.l2;
            let grad_b = err.sum_axis(Axis(0)) / m;

            weights.scaled_add(-lr, &grad_w);
            bias.scaled_add(-lr, &grad_b);
        }
    }

    Readout { weights, bias, solver: ReadoutSolver::Logistic }
}
