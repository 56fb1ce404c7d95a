use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use loto_seq::training::TrainedSequenceModel;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::models::random_forest::RandomForest;

const SEQUENCE_PREFIX: &str = "sequence-";
const STATISTICAL_PREFIX: &str = "statistical-";

/// Versioned model files in one directory:
/// `sequence-<version>.json` and `statistical-<version>.json`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sequence_path(&self, version: &str) -> PathBuf {
        self.root.join(format!("{SEQUENCE_PREFIX}{version}.json"))
    }

    pub fn statistical_path(&self, version: &str) -> PathBuf {
        self.root.join(format!("{STATISTICAL_PREFIX}{version}.json"))
    }

    pub fn save_sequence(&self, version: &str, model: &TrainedSequenceModel) -> Result<PathBuf> {
        let path = self.sequence_path(version);
        save_json(&path, model)?;
        Ok(path)
    }

    pub fn save_forest(&self, version: &str, forest: &RandomForest) -> Result<PathBuf> {
        let path = self.statistical_path(version);
        save_json(&path, forest)?;
        Ok(path)
    }

    pub fn load_sequence(&self, version: &str) -> Result<TrainedSequenceModel> {
        load_json(&self.sequence_path(version), "sequence")
    }

    pub fn load_forest(&self, version: &str) -> Result<RandomForest> {
        load_json(&self.statistical_path(version), "statistical")
    }

    /// Versions that have a sequence artifact, sorted.
    pub fn versions(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.root).map_err(|e| {
            PipelineError::Artifact(format!("cannot list {}: {e}", self.root.display()))
        })?;

        let mut versions: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                name.strip_prefix(SEQUENCE_PREFIX)?
                    .strip_suffix(".json")
                    .map(str::to_string)
            })
            .collect();
        versions.sort();
        Ok(versions)
    }
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| PipelineError::Artifact(format!("cannot create {}: {e}", dir.display())))?;
    }
    // Write then rename, so a concurrent reload never reads a half-written file.
    let tmp = path.with_extension("json.tmp");
    let file = fs::File::create(&tmp)
        .map_err(|e| PipelineError::Artifact(format!("cannot create {}: {e}", tmp.display())))?;
    serde_json::to_writer(BufWriter::new(file), value)
        .map_err(|e| PipelineError::Artifact(format!("cannot serialize {}: {e}", path.display())))?;
    fs::rename(&tmp, path)
        .map_err(|e| PipelineError::Artifact(format!("cannot write {}: {e}", path.display())))?;
    log::debug!("Saved artifact {}", path.display());
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path, kind: &'static str) -> Result<T> {
    if !path.exists() {
        return Err(PipelineError::MissingArtifact { kind, path: path.to_path_buf() });
    }
    let file = fs::File::open(path)
        .map_err(|e| PipelineError::Artifact(format!("cannot open {}: {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        PipelineError::Artifact(format!("invalid {kind} artifact {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForestConfig;
    use crate::models::{make_test_draws, Predictor};
    use loto_seq::config::SequenceConfig;
    use loto_seq::training::train_sequence_model;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("loto_artifacts_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn bits(scores: Vec<f64>) -> Vec<u64> {
        scores.into_iter().map(f64::to_bits).collect()
    }

    #[test]
    fn test_roundtrip_both_artifacts() {
        let dir = scratch_dir("roundtrip");
        let store = ArtifactStore::new(&dir);
        let draws = make_test_draws(40);

        let config = SequenceConfig {
            window_length: 6,
            reservoir_size: 16,
            epochs: 3,
            seed: Some(5),
            ..SequenceConfig::default()
        };
        let (model, _) = train_sequence_model(&draws, &config).unwrap();
        let forest_config = ForestConfig { n_trees: 4, seed: Some(5), ..ForestConfig::default() };
        let forest = RandomForest::train(&draws, &forest_config).unwrap();

        store.save_sequence("v1", &model).unwrap();
        store.save_forest("v1", &forest).unwrap();

        let model_back = store.load_sequence("v1").unwrap();
        assert_eq!(model_back.seed, 5);
        assert_eq!(model_back.reservoir.w_in, model.reservoir.w_in);
        assert_eq!(
            bits(model_back.predict_next(&draws).unwrap()),
            bits(model.predict_next(&draws).unwrap())
        );

        let forest_back = store.load_forest("v1").unwrap();
        assert_eq!(forest_back.n_trees(), 4);
        assert_eq!(
            bits(forest_back.predict(&draws).unwrap()),
            bits(forest.predict(&draws).unwrap())
        );

        assert_eq!(store.versions().unwrap(), vec!["v1".to_string()]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_default_sequence_model_reloads_bit_exact() {
        let dir = scratch_dir("bit_exact");
        let store = ArtifactStore::new(&dir);
        let draws = make_test_draws(60);
        let config = SequenceConfig { seed: Some(11), epochs: 2, ..SequenceConfig::default() };
        let (model, _) = train_sequence_model(&draws, &config).unwrap();

        store.save_sequence("exact", &model).unwrap();
        let back = store.load_sequence("exact").unwrap();

        let differing = back
            .reservoir
            .w_in
            .iter()
            .zip(model.reservoir.w_in.iter())
            .filter(|(a, b)| a.to_bits() != b.to_bits())
            .count();
        assert_eq!(differing, 0);
        assert_eq!(
            bits(back.predict_next(&draws).unwrap()),
            bits(model.predict_next(&draws).unwrap())
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_artifact() {
        let store = ArtifactStore::new(scratch_dir("missing"));
        match store.load_sequence("nope") {
            Err(PipelineError::MissingArtifact { kind, path }) => {
                assert_eq!(kind, "sequence");
                assert!(path.ends_with("sequence-nope.json"));
            }
            other => panic!("expected MissingArtifact, got {other:?}"),
        }
        assert!(store.versions().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_artifact() {
        let dir = scratch_dir("corrupt");
        fs::create_dir_all(&dir).unwrap();
        let store = ArtifactStore::new(&dir);
        fs::write(store.statistical_path("bad"), "{not json").unwrap();
        assert!(matches!(store.load_forest("bad"), Err(PipelineError::Artifact(_))));
        let _ = fs::remove_dir_all(&dir);
    }
}
