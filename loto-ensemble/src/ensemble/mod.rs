use std::collections::BTreeMap;

use loto_db::models::Pool;
use serde::{Deserialize, Serialize};

pub const SEQUENCE_WEIGHT: f64 = 0.6;
pub const STATISTICAL_WEIGHT: f64 = 0.4;
/// Statistical scores are halved before weighting.
pub const STATISTICAL_COMPRESSION: f64 = 2.0;
pub const SCORE_BOOST: f64 = 100.0;

/// Number -> fused score. Serializes as `{"1": .., "49": ..}`.
///
/// An empty map means "no usable prediction".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreMap(BTreeMap<u8, f64>);

impl ScoreMap {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, number: u8) -> Option<f64> {
        self.0.get(&number).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.0.iter().map(|(&n, &s)| (n, s))
    }

    /// The `k` best numbers, highest score first; ties favour the lower number.
    pub fn top(&self, k: usize) -> Vec<(u8, f64)> {
        let mut entries: Vec<(u8, f64)> = self.iter().collect();
        entries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        entries.truncate(k);
        entries
    }
}

/// `(seq * 0.6 + (stat / 2) * 0.4) * 100` per number.
///
/// Returns the empty map if either side is missing or does not hold exactly
/// one score per ball. Non-finite or negative results become 0.
pub fn fuse(sequence: Option<&[f64]>, statistical: Option<&[f64]>) -> ScoreMap {
    let (Some(seq), Some(stat)) = (sequence, statistical) else {
        log::warn!(
            "Fusion skipped: sequence {}, statistical {}",
            if sequence.is_some() { "present" } else { "missing" },
            if statistical.is_some() { "present" } else { "missing" },
        );
        return ScoreMap::empty();
    };

    let size = Pool::Balls.size();
    if seq.len() != size || stat.len() != size {
        log::warn!(
            "Fusion skipped: expected {size} scores, got sequence={} statistical={}",
            seq.len(),
            stat.len()
        );
        return ScoreMap::empty();
    }

    let scores = seq
        .iter()
        .zip(stat)
        .enumerate()
        .map(|(i, (&s, &t))| {
            let fused = (s * SEQUENCE_WEIGHT
                + (t / STATISTICAL_COMPRESSION) * STATISTICAL_WEIGHT)
                * SCORE_BOOST;
            let fused = if fused.is_finite() { fused.max(0.0) } else { 0.0 };
            ((i + 1) as u8, fused)
        })
        .collect();
    ScoreMap(scores)
}
