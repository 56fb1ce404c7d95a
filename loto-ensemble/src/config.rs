use serde::{Deserialize, Serialize};

use loto_seq::config::SequenceConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Most recent draws used as walk-forward targets.
    pub training_draws: usize,
    pub seed: Option<u64>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 5,
            min_samples_split: 4,
            training_draws: 200,
            seed: None,
        }
    }
}

/// Everything `train` needs, loadable from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub version: String,
    pub sequence: SequenceConfig,
    pub forest: ForestConfig,
    /// When false only the heuristic backs the statistical side.
    pub use_forest: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: "latest".to_string(),
            sequence: SequenceConfig::default(),
            forest: ForestConfig::default(),
            use_forest: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_partial_json() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{"version": "v2", "sequence": {"window_length": 8}, "forest": {"n_trees": 10}}"#,
        )
        .unwrap();
        assert_eq!(config.version, "v2");
        assert_eq!(config.sequence.window_length, 8);
        assert_eq!(config.sequence.min_training_draws, 15);
        assert_eq!(config.forest.n_trees, 10);
        assert_eq!(config.forest.max_depth, 5);
        assert!(config.use_forest);
    }

    #[test]
    fn test_empty_json_is_default() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.version, "latest");
        assert_eq!(config.forest.training_draws, 200);
    }
}
