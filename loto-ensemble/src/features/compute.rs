use loto_db::models::{Draw, Pool};

use super::{FeatureRow, NumberFeatures, GAP_SENTINEL, LONG_WINDOW, RECENT_WINDOW};

/// Appearances of `number` in the last `window` draws.
fn frequency_in_tail(number: u8, history: &[Draw], window: usize) -> usize {
    let start = history.len().saturating_sub(window);
    history[start..]
        .iter()
        .filter(|d| d.contains(Pool::Balls, number))
        .count()
}

pub fn recent_frequency(number: u8, history: &[Draw]) -> usize {
    frequency_in_tail(number, history, RECENT_WINDOW)
}

pub fn long_frequency(number: u8, history: &[Draw]) -> usize {
    frequency_in_tail(number, history, LONG_WINDOW)
}

/// `len - index_of_last_appearance`: 1 when drawn in the newest draw,
/// `GAP_SENTINEL` when never drawn.
pub fn gap(number: u8, history: &[Draw]) -> usize {
    history
        .iter()
        .rposition(|d| d.contains(Pool::Balls, number))
        .map_or(GAP_SENTINEL, |idx| history.len() - idx)
}

pub fn number_features(history: &[Draw]) -> Vec<NumberFeatures> {
    (1..=Pool::Balls.size() as u8)
        .map(|number| NumberFeatures {
            number,
            recent_frequency: recent_frequency(number, history),
            long_frequency: long_frequency(number, history),
            gap: gap(number, history),
            parity: u8::from(number % 2 == 0),
            high_low: u8::from(number > Pool::Balls.midpoint()),
        })
        .collect()
}

pub fn rows_for_target(history: &[Draw], t: usize) -> Vec<FeatureRow> {
    let target = &history[t];
    number_features(&history[..t])
        .into_iter()
        .map(|f| FeatureRow {
            number: f.number,
            label: if target.contains(Pool::Balls, f.number) { 1.0 } else { 0.0 },
            features: f.to_vec(),
        })
        .collect()
}
