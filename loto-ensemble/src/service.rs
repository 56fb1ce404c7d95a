use std::sync::Arc;

use loto_db::models::Draw;
use loto_seq::window::sort_chronological;

use crate::ensemble::{fuse, ScoreMap};
use crate::error::{PipelineError, Result};
use crate::models::Predictor;
use crate::registry::ModelRegistry;

/// In-process prediction boundary: history in, fused score map out.
pub struct PredictionService {
    registry: Arc<ModelRegistry>,
}

impl PredictionService {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// Sorts `history` chronologically, then fuses both predictors.
    ///
    /// A statistical failure yields the empty map; a missing sequence model
    /// or too short a history is an error.
    pub fn predict(&self, history: &[Draw]) -> Result<ScoreMap> {
        let generation = self.registry.snapshot();
        let sequence = generation
            .sequence
            .as_ref()
            .ok_or(PipelineError::UnavailablePredictor("sequence"))?;

        let required = sequence.min_history();
        if history.len() < required {
            return Err(PipelineError::InsufficientHistory { required, actual: history.len() });
        }

        let mut sorted = history.to_vec();
        sort_chronological(&mut sorted);

        let sequence_scores = sequence.predict(&sorted)?;
        let statistical_scores = match generation.statistical.predict(&sorted) {
            Ok(scores) => Some(scores),
            Err(e) => {
                log::warn!("{} predictor failed: {e}", generation.statistical.name());
                None
            }
        };

        let scores = fuse(Some(&sequence_scores), statistical_scores.as_deref());
        log::debug!("Fused {} scores from {} draws", scores.len(), sorted.len());
        Ok(scores)
    }

    /// `predict`, with every failure logged and mapped to the empty map.
    pub fn predict_or_empty(&self, history: &[Draw]) -> ScoreMap {
        self.predict(history).unwrap_or_else(|e| {
            log::warn!("Prediction failed: {e}");
            ScoreMap::empty()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ArtifactStore;
    use crate::models::make_test_draws;
    use crate::models::sequence::SequencePredictor;
    use crate::models::statistical::StatisticalBackend;
    use crate::registry::ModelGeneration;
    use loto_seq::config::SequenceConfig;
    use loto_seq::training::train_sequence_model;

    fn service_with_sequence() -> PredictionService {
        let config = SequenceConfig {
            window_length: 6,
            reservoir_size: 16,
            epochs: 3,
            seed: Some(11),
            ..SequenceConfig::default()
        };
        let (model, _) = train_sequence_model(&make_test_draws(40), &config).unwrap();
        let store = ArtifactStore::new(std::env::temp_dir().join("loto_service_unused"));
        let registry = ModelRegistry::new(store);
        registry.install(ModelGeneration {
            version: Some("test".to_string()),
            sequence: Some(SequencePredictor::new(model)),
            statistical: StatisticalBackend::Heuristic,
        });
        PredictionService::new(Arc::new(registry))
    }

    #[test]
    fn test_full_map() {
        let service = service_with_sequence();
        let scores = service.predict(&make_test_draws(40)).unwrap();
        assert_eq!(scores.len(), 49);
        assert!(scores.iter().all(|(_, s)| s >= 0.0 && s.is_finite()));
    }

    #[test]
    fn test_unsorted_history_is_sorted_first() {
        let service = service_with_sequence();
        let draws = make_test_draws(40);
        let mut shuffled = draws.clone();
        shuffled.reverse();
        assert_eq!(service.predict(&shuffled).unwrap(), service.predict(&draws).unwrap());
    }

    #[test]
    fn test_short_history() {
        let service = service_with_sequence();
        let err = service.predict(&make_test_draws(5)).unwrap_err();
        assert_eq!(err, PipelineError::InsufficientHistory { required: 6, actual: 5 });
        assert!(service.predict_or_empty(&make_test_draws(5)).is_empty());
        assert_eq!(service.predict_or_empty(&make_test_draws(6)).len(), 49);
    }

    #[test]
    fn test_without_sequence_model() {
        let store = ArtifactStore::new(std::env::temp_dir().join("loto_service_none"));
        let registry = ModelRegistry::new(store);
        let service = PredictionService::new(Arc::new(registry));
        assert_eq!(
            service.predict(&make_test_draws(40)).unwrap_err(),
            PipelineError::UnavailablePredictor("sequence")
        );
        assert!(service.predict_or_empty(&make_test_draws(40)).is_empty());
    }
}
