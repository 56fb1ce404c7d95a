use loto_db::models::{Draw, Pool};
use ndarray::Array1;

use crate::config::Encoding;

/// Sum normalizer. Trained artifacts depend on this value.
pub const SUM_NORM: f64 = 255.0;
pub const PARITY_NORM: f64 = 5.0;
pub const DIGIT_SUM_NORM: f64 = 45.0;

// Also filters the derived scalars, not only the presence mask.
fn in_range_balls(draw: &Draw) -> impl Iterator<Item = u8> + '_ {
    draw.balls.iter().copied().filter(|&b| Pool::Balls.contains(b))
}

/// Encode a draw as an input vector.
/// - Presence: 49-dim, index (ball-1) set to 1.0
/// - Structural: presence followed by [sum/255, evens/5, unit digits/45]
///
/// Out-of-range balls are ignored everywhere.
pub fn encode_draw(draw: &Draw, encoding: Encoding) -> Array1<f64> {
    let mut v = Array1::zeros(encoding.input_dim());
    for b in in_range_balls(draw) {
        v[(b - 1) as usize] = 1.0;
    }
    if encoding == Encoding::Structural {
        let n = Pool::Balls.size();
        let sum: u32 = in_range_balls(draw).map(u32::from).sum();
        let evens = in_range_balls(draw).filter(|b| b % 2 == 0).count();
        let digits: u32 = in_range_balls(draw).map(|b| u32::from(b % 10)).sum();
        v[n] = sum as f64 / SUM_NORM;
        v[n + 1] = evens as f64 / PARITY_NORM;
        v[n + 2] = digits as f64 / DIGIT_SUM_NORM;
    }
    v
}

/// Multi-hot target over the 49 balls.
pub fn encode_target(draw: &Draw) -> Array1<f64> {
    encode_draw(draw, Encoding::Presence)
}
