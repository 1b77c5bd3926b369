use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SimilarityConfig;
use crate::dtw::Aligner;
use crate::error::{Result, SimilarityError};
use crate::partition::{ComparisonWindow, partition};
use crate::play::{Corpus, Play, PlayId};
use crate::ranking::{RankedPlay, SimilarityResult, SkippedPair, rank_top_n};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairDistance {
    pub target: PlayId,
    pub other: PlayId,
    /// Minimum normalised DTW cost over all comparison windows.
    pub distance: f64,
    pub windows: usize,
    /// Window of the long trajectory that produced `distance`.
    pub best_window: ComparisonWindow,
    pub swapped: bool,
}

/// Cheapest window alignment between two plays. Earlier windows win ties.
pub fn pair_distance(target: &Play, other: &Play, cfg: &SimilarityConfig) -> Result<PairDistance> {
    let part = partition(&target.trajectory, &other.trajectory)?;
    let aligner = Aligner::new(cfg.metric, cfg.include_z);
    let short = part.short.points();

    let mut best: Option<(f64, ComparisonWindow)> = None;
    for (window, points) in part.window_points() {
        let Some(cost) = aligner.cost(short, points) else {
            continue;
        };
        match best {
            Some((best_cost, _)) if best_cost <= cost => {}
            _ => best = Some((cost, window)),
        }
    }
    let Some((distance, best_window)) = best else {
        return Err(SimilarityError::NonComparablePair);
    };

    Ok(PairDistance {
        target: target.id.clone(),
        other: other.id.clone(),
        distance,
        windows: part.windows.len(),
        best_window,
        swapped: part.swapped,
    })
}

/// Top-`n` plays of `corpus` closest to `target_id`.
///
/// Plays that cannot be compared with the target are listed in
/// `SimilarityResult::skipped`; fewer than `n` comparable plays is not an
/// error. Builds a worker pool per call; use [`ComparePool`] when running
/// many searches.
pub fn compute_top_similar(
    target_id: &PlayId,
    corpus: &Corpus,
    n: usize,
    cfg: &SimilarityConfig,
) -> Result<SimilarityResult> {
    ComparePool::new(cfg.parallelism).top_similar(target_id, corpus, n, cfg)
}

/// Fails with `SimilarityError::DeadlineExceeded` once `deadline` passes.
pub fn compute_top_similar_within(
    target_id: &PlayId,
    corpus: &Corpus,
    n: usize,
    cfg: &SimilarityConfig,
    deadline: Instant,
) -> Result<SimilarityResult> {
    ComparePool::new(cfg.parallelism).top_similar_within(target_id, corpus, n, cfg, deadline)
}

/// Runs the top-`n` search for every play of one match, in play id order.
pub fn compute_top_similar_for_match(
    match_id: u64,
    corpus: &Corpus,
    n: usize,
    cfg: &SimilarityConfig,
) -> Result<Vec<SimilarityResult>> {
    if n == 0 {
        return Err(SimilarityError::InvalidTopN(n));
    }
    let pool = ComparePool::new(cfg.parallelism);
    let targets: Vec<&PlayId> = corpus.match_plays(match_id).map(|p| &p.id).collect();
    if targets.is_empty() {
        info!(match_id, "no plays for match in corpus");
    }
    targets
        .into_iter()
        .map(|id| pool.top_similar(id, corpus, n, cfg))
        .collect()
}

pub struct ComparePool {
    pool: Option<rayon::ThreadPool>,
}

impl ComparePool {
    pub fn new(threads: usize) -> Self {
        Self {
            pool: build_compare_pool(threads),
        }
    }

    pub fn top_similar(
        &self,
        target_id: &PlayId,
        corpus: &Corpus,
        n: usize,
        cfg: &SimilarityConfig,
    ) -> Result<SimilarityResult> {
        search(&self.pool, target_id, corpus, n, cfg, None)
    }

    pub fn top_similar_within(
        &self,
        target_id: &PlayId,
        corpus: &Corpus,
        n: usize,
        cfg: &SimilarityConfig,
        deadline: Instant,
    ) -> Result<SimilarityResult> {
        search(&self.pool, target_id, corpus, n, cfg, Some(deadline))
    }
}

fn search(
    pool: &Option<rayon::ThreadPool>,
    target_id: &PlayId,
    corpus: &Corpus,
    n: usize,
    cfg: &SimilarityConfig,
    deadline: Option<Instant>,
) -> Result<SimilarityResult> {
    if n == 0 {
        return Err(SimilarityError::InvalidTopN(n));
    }
    let target = corpus
        .get(target_id)
        .ok_or_else(|| SimilarityError::UnknownTarget(target_id.clone()))?;

    let others: Vec<&Play> = corpus.plays().filter(|p| p.id != target.id).collect();
    let outcomes = with_compare_pool(pool, || {
        others
            .par_iter()
            .map(|other| {
                if let Some(deadline) = deadline
                    && Instant::now() >= deadline
                {
                    return Err(SimilarityError::DeadlineExceeded);
                }
                Ok((other.id.clone(), pair_distance(target, other, cfg)))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let mut distances = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    for (play_id, outcome) in outcomes {
        match outcome {
            Ok(d) => distances.push(d),
            Err(reason) => {
                debug!(target = %target.id, other = %play_id, %reason, "pair skipped");
                skipped.push(SkippedPair { play_id, reason });
            }
        }
    }
    let compared = distances.len();

    let entries: Vec<RankedPlay> = rank_top_n(distances, n)?
        .into_iter()
        .filter_map(|d| corpus.get(&d.other).map(|play| (d.distance, play.clone())))
        .enumerate()
        .map(|(idx, (distance, play))| RankedPlay {
            rank: idx + 1,
            distance,
            play,
        })
        .collect();

    info!(
        target = %target.id,
        compared,
        skipped = skipped.len(),
        returned = entries.len(),
        "similarity search finished"
    );

    Ok(SimilarityResult {
        target: target.id.clone(),
        top_n: n,
        entries,
        skipped,
    })
}

fn build_compare_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .ok()
}

fn with_compare_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}
