pub mod compute;

use loto_db::models::Draw;

pub use compute::{gap, long_frequency, recent_frequency};

/// Draws counted by `recent_frequency`.
pub const RECENT_WINDOW: usize = 10;
/// Draws counted by `long_frequency`.
pub const LONG_WINDOW: usize = 50;
/// Gap reported for a number absent from the whole history.
pub const GAP_SENTINEL: usize = 100;

pub const FEATURE_NAMES: &[&str] = &[
    "number",
    "recent_frequency",
    "long_frequency",
    "gap",
    "parity",
    "high_low",
];

/// Statistics of one number over a chronological history.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberFeatures {
    pub number: u8,
    pub recent_frequency: usize,
    pub long_frequency: usize,
    pub gap: usize,
    /// 1 if even.
    pub parity: u8,
    /// 1 if above 25.
    pub high_low: u8,
}

impl NumberFeatures {
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.number as f64,
            self.recent_frequency as f64,
            self.long_frequency as f64,
            self.gap as f64,
            self.parity as f64,
            self.high_low as f64,
        ]
    }
}

#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub number: u8,
    pub features: Vec<f64>,
    pub label: f64,
}

/// Features of all 49 numbers, history oldest first.
pub fn number_features(history: &[Draw]) -> Vec<NumberFeatures> {
    compute::number_features(history)
}

/// Rows for target draw `t`: features from `history[..t]`, label 1.0 when the
/// number was drawn at `t`.
pub fn rows_for_target(history: &[Draw], t: usize) -> Vec<FeatureRow> {
    compute::rows_for_target(history, t)
}
