pub mod heuristic;
pub mod random_forest;
pub mod sequence;
pub mod statistical;

use loto_db::models::{Draw, Pool};

use crate::error::Result;

pub trait Predictor: Send + Sync {
    fn name(&self) -> &str;
    /// `history` is oldest first. Returns one score per ball, index = number - 1.
    fn predict(&self, history: &[Draw]) -> Result<Vec<f64>>;
}

/// 49 finite, non-negative scores.
pub fn validate_scores(scores: &[f64]) -> bool {
    scores.len() == Pool::Balls.size() && scores.iter().all(|s| s.is_finite() && *s >= 0.0)
}

/// Chronological fixture: consecutive blocks of five numbers, never 46..=49.
#[cfg(test)]
pub fn make_test_draws(n: usize) -> Vec<Draw> {
    use chrono::{Days, NaiveDate};

    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let base = (i % 9) as u8 * 5;
            Draw::new(
                start + Days::new(i as u64 * 3),
                [base + 1, base + 2, base + 3, base + 4, base + 5],
                (i % 10) as u8 + 1,
            )
        })
        .collect()
}

/// 7 in every third draw, fillers from 8..=30: 1..=6 and 31..=49 never drawn.
#[cfg(test)]
pub fn make_every_third_draws(n: usize) -> Vec<Draw> {
    use chrono::{Days, NaiveDate};

    let start = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();
    (0..n)
        .map(|i| {
            let f = |k: usize| 8 + ((i * 5 + k) % 23) as u8;
            let balls = if i % 3 == 0 {
                [7, f(0), f(1), f(2), f(3)]
            } else {
                [f(0), f(1), f(2), f(3), f(4)]
            };
            Draw::new(start + Days::new(i as u64 * 4), balls, 1)
        })
        .collect()
}

/// Numbers other than 7 absent from the last ten draws whose score is not below 7's.
#[cfg(test)]
pub fn outscoring_absent_numbers(draws: &[Draw], scores: &[f64]) -> Vec<u8> {
    let recent = &draws[draws.len().saturating_sub(10)..];
    (1..=49u8)
        .filter(|&n| n != 7 && !recent.iter().any(|d| d.balls.contains(&n)))
        .filter(|&n| scores[n as usize - 1] >= scores[6])
        .collect()
}
