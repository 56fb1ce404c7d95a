use loto_db::models::Draw;

use super::Predictor;
use crate::error::Result;
use crate::features::{number_features, NumberFeatures};

pub const BASE_SCORE: f64 = 0.5;
pub const RECENT_WEIGHT: f64 = 0.1;
pub const LONG_WEIGHT: f64 = 0.05;
/// Gaps strictly above this earn `OVERDUE_BONUS`.
pub const OVERDUE_GAP: usize = 15;
pub const OVERDUE_BONUS: f64 = 0.2;

/// `0.5 + 0.1 * recent + 0.05 * long + 0.2 if gap > 15`.
pub fn heuristic_score(features: &NumberFeatures) -> f64 {
    let overdue = if features.gap > OVERDUE_GAP { OVERDUE_BONUS } else { 0.0 };
    BASE_SCORE
        + RECENT_WEIGHT * features.recent_frequency as f64
        + LONG_WEIGHT * features.long_frequency as f64
        + overdue
}

/// Fixed-formula statistical backend. Needs no training and accepts any
/// history, including an empty one.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicModel;

impl Predictor for HeuristicModel {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn predict(&self, history: &[Draw]) -> Result<Vec<f64>> {
        Ok(number_features(history).iter().map(heuristic_score).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::GAP_SENTINEL;
    use crate::models::{
        make_every_third_draws, make_test_draws, outscoring_absent_numbers, validate_scores,
    };

    #[test]
    fn test_formula() {
        let f = NumberFeatures {
            number: 7,
            recent_frequency: 3,
            long_frequency: 10,
            gap: 16,
            parity: 0,
            high_low: 0,
        };
        assert!((heuristic_score(&f) - (0.5 + 0.3 + 0.5 + 0.2)).abs() < 1e-12);

        let f = NumberFeatures { gap: 15, ..f };
        assert!((heuristic_score(&f) - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_empty_history_scores_all_overdue() {
        let scores = HeuristicModel.predict(&[]).unwrap();
        assert!(validate_scores(&scores));
        assert!(GAP_SENTINEL > OVERDUE_GAP);
        assert!(scores.iter().all(|&s| (s - 0.7).abs() < 1e-12));
    }

    #[test]
    fn test_frequent_number_beats_absent_numbers() {
        let draws = make_every_third_draws(60);
        let scores = HeuristicModel.predict(&draws).unwrap();
        assert_eq!(outscoring_absent_numbers(&draws, &scores), Vec::<u8>::new());
    }

    #[test]
    fn test_scores_valid_on_fixture() {
        let scores = HeuristicModel.predict(&make_test_draws(80)).unwrap();
        assert!(validate_scores(&scores));
    }
}
