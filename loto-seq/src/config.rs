use rand::RngExt;
use serde::{Deserialize, Serialize};

use loto_db::models::Pool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Presence mask only.
    Presence,
    /// Presence mask plus normalized sum, even ratio and unit-digit sum.
    Structural,
}

impl Encoding {
    pub fn input_dim(&self) -> usize {
        match self {
            Encoding::Presence => Pool::Balls.size(),         // 49
            Encoding::Structural => Pool::Balls.size() + 3,   // 52
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReadoutSolver {
    /// Sigmoid outputs fitted with binary cross-entropy on shuffled mini-batches.
    Logistic,
    /// Closed-form ridge regression, outputs clamped to [0, 1].
    Ridge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub window_length: usize,
    pub encoding: Encoding,
    /// Safety floor on top of `window_length + 1` for training.
    pub min_training_draws: usize,
    pub reservoir_size: usize,
    pub spectral_radius: f64,
    pub sparsity: f64,
    pub leaking_rate: f64,
    pub input_scaling: f64,
    pub noise_amplitude: f64,
    pub solver: ReadoutSolver,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub l2: f64,
    pub ridge_lambda: f64,
    /// Fraction of the most recent windows held out to measure hit rates.
    pub holdout_fraction: f64,
    /// `None` draws a fresh seed per run: training is then not reproducible,
    /// only statistically comparable across runs.
    pub seed: Option<u64>,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            window_length: 12,
            encoding: Encoding::Structural,
            min_training_draws: 15,
            reservoir_size: 200,
            spectral_radius: 0.95,
            sparsity: 0.9,
            leaking_rate: 0.3,
            input_scaling: 0.1,
            noise_amplitude: 1e-4,
            solver: ReadoutSolver::Logistic,
            epochs: 30,
            batch_size: 32,
            learning_rate: 0.05,
            l2: 1e-4,
            ridge_lambda: 1e-2,
            holdout_fraction: 0.1,
            seed: None,
        }
    }
}

impl SequenceConfig {
    pub fn min_training_history(&self) -> usize {
        (self.window_length + 1).max(self.min_training_draws)
    }

    pub fn min_inference_history(&self) -> usize {
        self.window_length
    }

    /// Reservoir state concatenated with the last input of the window.
    pub fn feature_dim(&self) -> usize {
        self.reservoir_size + self.encoding.input_dim()
    }

    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| rand::rng().random())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceReport {
    pub seed: u64,
    pub windows: usize,
    pub holdout_windows: usize,
    pub train_loss: f64,
    pub holdout_top5_hit_rate: f64,
    pub holdout_top10_hit_rate: f64,
    pub train_time_ms: u64,
}
