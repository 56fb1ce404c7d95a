use std::path::PathBuf;

use loto_db::models::Draw;
use loto_seq::config::SequenceReport;
use loto_seq::training::{train_sequence_model, TrainedSequenceModel};
use loto_seq::window::sort_chronological;

use crate::artifacts::ArtifactStore;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::random_forest::RandomForest;
use crate::models::sequence::SequencePredictor;
use crate::models::statistical::StatisticalBackend;
use crate::registry::ModelGeneration;

pub struct TrainedPipeline {
    pub version: String,
    pub sequence: TrainedSequenceModel,
    pub sequence_report: SequenceReport,
    pub forest: Option<RandomForest>,
    pub history_len: usize,
}

/// Train both predictors on the full history. The two fits run in parallel.
pub fn train_pipeline(history: &[Draw], config: &PipelineConfig) -> Result<TrainedPipeline> {
    let mut sorted = history.to_vec();
    sort_chronological(&mut sorted);

    let (sequence, forest) = rayon::join(
        || train_sequence_model(&sorted, &config.sequence),
        || {
            if config.use_forest {
                RandomForest::train(&sorted, &config.forest).map(Some)
            } else {
                Ok(None)
            }
        },
    );
    let (sequence, sequence_report) = sequence?;
    let forest = forest?;

    Ok(TrainedPipeline {
        version: config.version.clone(),
        sequence,
        sequence_report,
        forest,
        history_len: sorted.len(),
    })
}

impl TrainedPipeline {
    /// Write the artifacts; without a forest only the sequence file is written.
    pub fn persist(&self, store: &ArtifactStore) -> Result<Vec<PathBuf>> {
        let mut written = vec![store.save_sequence(&self.version, &self.sequence)?];
        if let Some(forest) = &self.forest {
            written.push(store.save_forest(&self.version, forest)?);
        }
        Ok(written)
    }

    pub fn into_generation(self) -> ModelGeneration {
        ModelGeneration {
            version: Some(self.version),
            sequence: Some(SequencePredictor::new(self.sequence)),
            statistical: self
                .forest
                .map_or(StatisticalBackend::Heuristic, StatisticalBackend::Forest),
        }
    }
}
