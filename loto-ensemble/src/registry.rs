use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::artifacts::ArtifactStore;
use crate::error::{PipelineError, Result};
use crate::models::sequence::SequencePredictor;
use crate::models::statistical::StatisticalBackend;

/// One consistent set of loaded predictors.
pub struct ModelGeneration {
    pub version: Option<String>,
    pub sequence: Option<SequencePredictor>,
    pub statistical: StatisticalBackend,
}

impl ModelGeneration {
    /// No sequence model, heuristic statistics.
    pub fn empty() -> Self {
        Self { version: None, sequence: None, statistical: StatisticalBackend::Heuristic }
    }

    pub fn status(&self) -> RegistryStatus {
        RegistryStatus {
            version: self.version.clone(),
            sequence: if self.sequence.is_some() {
                Availability::Loaded
            } else {
                Availability::Unavailable
            },
            statistical: if self.statistical.is_forest() {
                Availability::Loaded
            } else {
                Availability::Fallback
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Loaded,
    /// Substitute in use (heuristic instead of forest).
    Fallback,
    Unavailable,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Availability::Loaded => "loaded",
            Availability::Fallback => "fallback",
            Availability::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStatus {
    pub version: Option<String>,
    pub sequence: Availability,
    pub statistical: Availability,
}

/// Owns the current `ModelGeneration`. Readers take an `Arc` snapshot;
/// `reload` swaps the whole generation at once.
pub struct ModelRegistry {
    store: ArtifactStore,
    current: RwLock<Arc<ModelGeneration>>,
}

impl ModelRegistry {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store, current: RwLock::new(Arc::new(ModelGeneration::empty())) }
    }

    /// Read `version` from the store without touching the current generation.
    ///
    /// A missing sequence artifact leaves the sequence predictor unavailable
    /// and a missing forest falls back to the heuristic. Unreadable artifacts
    /// are errors.
    pub fn load_generation(&self, version: &str) -> Result<ModelGeneration> {
        let sequence = match self.store.load_sequence(version) {
            Ok(model) => Some(SequencePredictor::new(model)),
            Err(PipelineError::MissingArtifact { path, .. }) => {
                log::warn!(
                    "No sequence model at {}; sequence predictor unavailable",
                    path.display()
                );
                None
            }
            Err(e) => return Err(e),
        };

        let statistical = match self.store.load_forest(version) {
            Ok(forest) => StatisticalBackend::Forest(forest),
            Err(PipelineError::MissingArtifact { path, .. }) => {
                log::info!("No forest at {}; using heuristic statistics", path.display());
                StatisticalBackend::Heuristic
            }
            Err(e) => return Err(e),
        };

        Ok(ModelGeneration { version: Some(version.to_string()), sequence, statistical })
    }

    /// Load `version` and make it current. On error the previous generation stays.
    pub fn reload(&self, version: &str) -> Result<RegistryStatus> {
        let generation = self.load_generation(version)?;
        let status = generation.status();
        self.install(generation);
        log::info!(
            "Model generation {version} active (sequence: {}, statistical: {})",
            status.sequence,
            status.statistical
        );
        Ok(status)
    }

    pub fn install(&self, generation: ModelGeneration) {
        *self.current.write() = Arc::new(generation);
    }

    pub fn snapshot(&self) -> Arc<ModelGeneration> {
        Arc::clone(&self.current.read())
    }

    pub fn status(&self) -> RegistryStatus {
        self.snapshot().status()
    }
}
