use std::collections::HashSet;

use serde::Serialize;

use crate::error::{Result, SimilarityError};
use crate::play::{Play, PlayId};
use crate::similarity::PairDistance;

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPair {
    pub play_id: PlayId,
    pub reason: SimilarityError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPlay {
    pub rank: usize,
    pub distance: f64,
    pub play: Play,
}

impl RankedPlay {
    /// `1 - distance`, only meaningful when the distance already lies in
    /// [0, 1].
    pub fn similarity_score(&self) -> Option<f64> {
        (0.0..=1.0)
            .contains(&self.distance)
            .then(|| 1.0 - self.distance)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    pub target: PlayId,
    pub top_n: usize,
    pub entries: Vec<RankedPlay>,
    #[serde(skip)]
    pub skipped: Vec<SkippedPair>,
}

impl SimilarityResult {
    pub fn ids(&self) -> Vec<&PlayId> {
        self.entries.iter().map(|e| &e.play.id).collect()
    }
}

/// Orders distances ascending with ties broken by the other play's id, keeps
/// the best entry per id and truncates to `n`.
pub fn rank_top_n(mut distances: Vec<PairDistance>, n: usize) -> Result<Vec<PairDistance>> {
    if n == 0 {
        return Err(SimilarityError::InvalidTopN(n));
    }
    distances.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.other.cmp(&b.other))
    });
    let mut seen: HashSet<PlayId> = HashSet::new();
    distances.retain(|d| seen.insert(d.other.clone()));
    distances.truncate(n);
    Ok(distances)
}
