use loto_db::models::Draw;
use serde::{Deserialize, Serialize};

use super::heuristic::HeuristicModel;
use super::random_forest::RandomForest;
use super::Predictor;
use crate::error::Result;

/// Either statistical backend, picked at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StatisticalBackend {
    Forest(RandomForest),
    Heuristic,
}

impl StatisticalBackend {
    pub fn is_forest(&self) -> bool {
        matches!(self, StatisticalBackend::Forest(_))
    }
}

impl Predictor for StatisticalBackend {
    fn name(&self) -> &str {
        match self {
            StatisticalBackend::Forest(forest) => forest.name(),
            StatisticalBackend::Heuristic => HeuristicModel.name(),
        }
    }

    fn predict(&self, history: &[Draw]) -> Result<Vec<f64>> {
        match self {
            StatisticalBackend::Forest(forest) => forest.predict(history),
            StatisticalBackend::Heuristic => HeuristicModel.predict(history),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForestConfig;
    use crate::models::{
        make_every_third_draws, make_test_draws, outscoring_absent_numbers, validate_scores,
    };

    #[test]
    fn test_backends_share_contract() {
        let draws = make_test_draws(40);
        let forest = RandomForest::train(
            &draws,
            &ForestConfig { n_trees: 5, seed: Some(1), ..ForestConfig::default() },
        )
        .unwrap();

        for backend in [StatisticalBackend::Forest(forest), StatisticalBackend::Heuristic] {
            let scores = backend.predict(&draws).unwrap();
            assert!(validate_scores(&scores), "{}", backend.name());
        }
    }

    #[test]
    fn test_frequent_number_beats_absent_numbers_on_both_backends() {
        let draws = make_every_third_draws(60);
        for seed in 0..5 {
            let config = ForestConfig { seed: Some(seed), ..ForestConfig::default() };
            let forest = RandomForest::train(&draws, &config).unwrap();
            let backends = [StatisticalBackend::Forest(forest), StatisticalBackend::Heuristic];
            for backend in backends {
                let scores = backend.predict(&draws).unwrap();
                assert_eq!(
                    outscoring_absent_numbers(&draws, &scores),
                    Vec::<u8>::new(),
                    "{} seed={seed} score(7)={}",
                    backend.name(),
                    scores[6]
                );
            }
        }
    }

    #[test]
    fn test_heuristic_tag_roundtrip() {
        let json = serde_json::to_string(&StatisticalBackend::Heuristic).unwrap();
        assert_eq!(json, r#"{"backend":"heuristic"}"#);
        let back: StatisticalBackend = serde_json::from_str(&json).unwrap();
        assert!(!back.is_forest());
    }
}
