use loto_db::models::Draw;
use loto_seq::training::TrainedSequenceModel;

use super::Predictor;
use crate::error::Result;

pub struct SequencePredictor {
    model: TrainedSequenceModel,
}

impl SequencePredictor {
    pub fn new(model: TrainedSequenceModel) -> Self {
        Self { model }
    }

    pub fn min_history(&self) -> usize {
        self.model.config.min_inference_history()
    }
}

impl Predictor for SequencePredictor {
    fn name(&self) -> &str {
        "sequence"
    }

    fn predict(&self, history: &[Draw]) -> Result<Vec<f64>> {
        self.model.predict_next(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::models::{make_test_draws, validate_scores};
    use loto_seq::config::SequenceConfig;
    use loto_seq::training::train_sequence_model;

    fn trained() -> SequencePredictor {
        let config = SequenceConfig {
            window_length: 6,
            reservoir_size: 16,
            epochs: 5,
            seed: Some(3),
            ..SequenceConfig::default()
        };
        let (model, _) = train_sequence_model(&make_test_draws(30), &config).unwrap();
        SequencePredictor::new(model)
    }

    #[test]
    fn test_scores_are_probabilities() {
        let predictor = trained();
        let scores = predictor.predict(&make_test_draws(30)).unwrap();
        assert!(validate_scores(&scores));
        assert!(scores.iter().all(|&s| s <= 1.0));
    }

    #[test]
    fn test_short_history_rejected() {
        let predictor = trained();
        assert_eq!(predictor.min_history(), 6);
        let err = predictor.predict(&make_test_draws(5)).unwrap_err();
        assert_eq!(err, PipelineError::InsufficientHistory { required: 6, actual: 5 });
    }
}
