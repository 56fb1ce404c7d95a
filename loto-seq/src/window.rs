use loto_db::models::Draw;
use ndarray::{Array1, Array2};

use crate::config::Encoding;
use crate::encoding::{encode_draw, encode_target};
use crate::error::{PipelineError, Result};

/// One supervised example: `L` encoded draws and the presence mask of the draw
/// that followed them.
#[derive(Debug, Clone)]
pub struct TrainingWindow {
    /// `[L, D]`, one encoded draw per row, oldest first.
    pub context: Array2<f64>,
    /// `[49]` presence mask.
    pub target: Array1<f64>,
}

/// Fails on the first draw dated strictly before its predecessor.
/// Equal dates are accepted and keep their given order.
pub fn ensure_chronological(history: &[Draw]) -> Result<()> {
    match history.windows(2).position(|pair| pair[1].date < pair[0].date) {
        Some(i) => Err(PipelineError::UnorderedHistory { index: i + 1 }),
        None => Ok(()),
    }
}

/// Stable sort, oldest first.
pub fn sort_chronological(history: &mut [Draw]) {
    history.sort_by_key(|d| d.date);
}

fn encode_context(draws: &[Draw], encoding: Encoding) -> Array2<f64> {
    let mut context = Array2::zeros((draws.len(), encoding.input_dim()));
    for (mut row, draw) in context.rows_mut().into_iter().zip(draws) {
        row.assign(&encode_draw(draw, encoding));
    }
    context
}

/// Slide a window of `window_length` draws one step at a time over a
/// chronological history. Produces `history.len() - window_length` windows.
pub fn build_windows(
    history: &[Draw],
    window_length: usize,
    encoding: Encoding,
) -> Result<Vec<TrainingWindow>> {
    if window_length == 0 {
        return Err(PipelineError::DimensionMismatch { expected: 1, actual: 0 });
    }
    if history.len() <= window_length {
        return Err(PipelineError::InsufficientHistory {
            required: window_length + 1,
            actual: history.len(),
        });
    }
    ensure_chronological(history)?;

    // Encode once, then copy rows into each overlapping window.
    let encoded = encode_context(history, encoding);
    let windows = (0..history.len() - window_length)
        .map(|i| TrainingWindow {
            context: encoded.slice(ndarray::s![i..i + window_length, ..]).to_owned(),
            target: encode_target(&history[i + window_length]),
        })
        .collect();
    Ok(windows)
}

/// The last `window_length` encoded draws, used as inference context.
pub fn latest_window(
    history: &[Draw],
    window_length: usize,
    encoding: Encoding,
) -> Result<Array2<f64>> {
    if window_length == 0 {
        return Err(PipelineError::DimensionMismatch { expected: 1, actual: 0 });
    }
    if history.len() < window_length {
        return Err(PipelineError::InsufficientHistory {
            required: window_length,
            actual: history.len(),
        });
    }
    ensure_chronological(history)?;
    Ok(encode_context(&history[history.len() - window_length..], encoding))
}
