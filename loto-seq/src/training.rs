use std::ops::Range;
use std::time::Instant;

use loto_db::models::Draw;
use ndarray::{s, Array1, Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::{SequenceConfig, SequenceReport};
use crate::error::{PipelineError, Result};
use crate::metrics;
use crate::readout::Readout;
use crate::reservoir::Reservoir;
use crate::window::{build_windows, latest_window, TrainingWindow};

/// Reservoir plus fitted readout. Immutable once trained, so it can be shared
/// between concurrent predictions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedSequenceModel {
    pub config: SequenceConfig,
    pub seed: u64,
    pub reservoir: Reservoir,
    pub readout: Readout,
}

/// Chronological split of the windows: the most recent ones are held out.
pub struct HoldoutSplit {
    pub train: Range<usize>,
    pub holdout: Range<usize>,
}

impl HoldoutSplit {
    /// Always leaves at least one training window. With a single window
    /// nothing is held out.
    pub fn new(n: usize, fraction: f64) -> Self {
        let wanted = (n as f64 * fraction.clamp(0.0, 1.0)).round() as usize;
        let holdout = wanted.min(n.saturating_sub(1));
        let train_end = n - holdout;
        HoldoutSplit { train: 0..train_end, holdout: train_end..n }
    }
}

/// Final reservoir state followed by the last input row.
fn window_features(
    reservoir: &Reservoir,
    context: ArrayView2<f64>,
    noise: Option<&mut StdRng>,
) -> Array1<f64> {
    let state = reservoir.final_state(context, noise);
    let mut features = Array1::zeros(state.len() + context.ncols());
    features.slice_mut(s![..state.len()]).assign(&state);
    if let Some(last) = context.rows().into_iter().last() {
        features.slice_mut(s![state.len()..]).assign(&last);
    }
    features
}

fn feature_matrix(
    reservoir: &Reservoir,
    windows: &[TrainingWindow],
    feature_dim: usize,
    mut noise: Option<&mut StdRng>,
) -> Array2<f64> {
    let mut h = Array2::zeros((windows.len(), feature_dim));
    for (mut row, w) in h.rows_mut().into_iter().zip(windows) {
        row.assign(&window_features(reservoir, w.context.view(), noise.as_deref_mut()));
    }
    h
}

fn target_matrix(windows: &[TrainingWindow]) -> Array2<f64> {
    let outputs = windows.first().map_or(0, |w| w.target.len());
    let mut y = Array2::zeros((windows.len(), outputs));
    for (mut row, w) in y.rows_mut().into_iter().zip(windows) {
        row.assign(&w.target);
    }
    y
}

impl TrainedSequenceModel {
    /// One score in [0, 1] per ball for the draw following `context`.
    /// `context` must be `[window_length, input_dim]`.
    pub fn predict(&self, context: ArrayView2<f64>) -> Result<Vec<f64>> {
        let (rows, cols) = (self.config.window_length, self.config.encoding.input_dim());
        if context.nrows() != rows {
            let actual = context.nrows();
            return Err(PipelineError::DimensionMismatch { expected: rows, actual });
        }
        if context.ncols() != cols {
            let actual = context.ncols();
            return Err(PipelineError::DimensionMismatch { expected: cols, actual });
        }
        let features = window_features(&self.reservoir, context, None);
        if features.len() != self.readout.n_features() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.readout.n_features(),
                actual: features.len(),
            });
        }
        Ok(self.readout.predict(features.view()))
    }

    /// Scores for the draw after the end of a chronological `history`.
    pub fn predict_next(&self, history: &[Draw]) -> Result<Vec<f64>> {
        let context = latest_window(history, self.config.window_length, self.config.encoding)?;
        self.predict(context.view())
    }
}

/// Train on a chronological history.
///
/// Hit rates are measured on the most recent `holdout_fraction` of windows
/// with a readout fitted on the rest; the returned readout is then refitted
/// on every window.
pub fn train_sequence_model(
    history: &[Draw],
    config: &SequenceConfig,
) -> Result<(TrainedSequenceModel, SequenceReport)> {
    let start = Instant::now();

    let required = config.min_training_history();
    if history.len() < required {
        return Err(PipelineError::InsufficientHistory { required, actual: history.len() });
    }
    let windows = build_windows(history, config.window_length, config.encoding)?;

    let seed = config.resolve_seed();
    let mut rng = StdRng::seed_from_u64(seed);

    let reservoir = Reservoir::new(
        config.encoding.input_dim(),
        config.reservoir_size,
        config.spectral_radius,
        config.sparsity,
        config.input_scaling,
        config.leaking_rate,
        config.noise_amplitude,
        &mut rng,
    );

    let features = feature_matrix(&reservoir, &windows, config.feature_dim(), Some(&mut rng));
    let targets = target_matrix(&windows);

    let split = HoldoutSplit::new(windows.len(), config.holdout_fraction);
    let (top5, top10) = if split.holdout.is_empty() {
        (0.0, 0.0)
    } else {
        let train_x = features.slice(s![split.train.clone(), ..]).to_owned();
        let train_y = targets.slice(s![split.train.clone(), ..]).to_owned();
        let readout = Readout::fit(&train_x, &train_y, config, &mut rng)?;

        let held = &windows[split.holdout.clone()];
        let held_x = feature_matrix(&reservoir, held, config.feature_dim(), None);
        let predictions: Vec<Vec<f64>> =
            held_x.rows().into_iter().map(|x| readout.predict(x)).collect();
        let actuals: Vec<[u8; 5]> = history[split.holdout.start + config.window_length..]
            .iter()
            .map(|d| d.balls)
            .collect();
        (
            metrics::hit_rate(&predictions, &actuals, 5),
            metrics::hit_rate(&predictions, &actuals, 10),
        )
    };

    let readout = Readout::fit(&features, &targets, config, &mut rng)?;
    let train_loss = readout.loss(&features, &targets);

    let report = SequenceReport {
        seed,
        windows: windows.len(),
        holdout_windows: split.holdout.len(),
        train_loss,
        holdout_top5_hit_rate: top5,
        holdout_top10_hit_rate: top10,
        train_time_ms: start.elapsed().as_millis() as u64,
    };

    log::info!(
        "Sequence model trained: {} windows, loss {:.4}, holdout top5 {:.3} (baseline {:.3})",
        report.windows,
        report.train_loss,
        report.holdout_top5_hit_rate,
        metrics::random_baseline(5),
    );

    let model = TrainedSequenceModel { config: config.clone(), seed, reservoir, readout };
    Ok((model, report))
}
