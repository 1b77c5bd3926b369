use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SimilarityConfig;
use crate::error::Result;
use crate::play::{Corpus, Play, PlayId, Position, Trajectory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackingSide {
    LeftToRight,
    RightToLeft,
}

impl AttackingSide {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "left_to_right" => Some(Self::LeftToRight),
            "right_to_left" => Some(Self::RightToLeft),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawBall {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PossessionEvent {
    pub timestamp_secs: f64,
    pub ball: Option<RawBall>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPlay {
    pub id: PlayId,
    pub events: Vec<PossessionEvent>,
    pub duration_secs: Option<f64>,
    pub team_id: Option<u64>,
    pub video_ref: Option<String>,
    pub attacking_side: Option<AttackingSide>,
}

impl RawPlay {
    pub fn new(id: PlayId, events: Vec<PossessionEvent>) -> Self {
        Self {
            id,
            events,
            duration_secs: None,
            team_id: None,
            video_ref: None,
            attacking_side: None,
        }
    }
}

fn ball_position(ball: &RawBall) -> Option<Position> {
    Position {
        x: ball.x?,
        y: ball.y?,
        z: ball.z,
    }
    .on_pitch()
}

/// One position per event in chronological order. Events without a usable
/// ball position are dropped, never filled in.
pub fn extract_trajectory(events: &[PossessionEvent]) -> Result<Trajectory> {
    let mut timed: Vec<(f64, Position)> = events
        .iter()
        .filter(|ev| ev.timestamp_secs.is_finite())
        .filter_map(|ev| {
            let pos = ev.ball.as_ref().and_then(ball_position)?;
            Some((ev.timestamp_secs, pos))
        })
        .collect();
    // Stable, so events sharing a timestamp keep their delivered order.
    timed.sort_by(|a, b| a.0.total_cmp(&b.0));
    Trajectory::new(timed.into_iter().map(|(_, pos)| pos).collect())
}

fn event_span_secs(events: &[PossessionEvent]) -> f64 {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for ev in events.iter().filter(|ev| ev.timestamp_secs.is_finite()) {
        lo = lo.min(ev.timestamp_secs);
        hi = hi.max(ev.timestamp_secs);
    }
    if hi >= lo {
        round_tenths(hi - lo)
    } else {
        0.0
    }
}

pub(crate) fn round_tenths(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub fn extract_play(raw: RawPlay, cfg: &SimilarityConfig) -> Result<Play> {
    let trajectory = extract_trajectory(&raw.events)?;

    let flip = cfg.normalize_direction && raw.attacking_side == Some(AttackingSide::RightToLeft);
    if cfg.normalize_direction && raw.attacking_side.is_none() {
        debug!(play = %raw.id, "no attacking side, orientation left as delivered");
    }
    let trajectory = if flip {
        Trajectory::new(trajectory.points().iter().map(|p| p.mirrored()).collect())?
    } else {
        trajectory
    };

    let duration_secs = raw
        .duration_secs
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or_else(|| event_span_secs(&raw.events));

    Ok(Play {
        id: raw.id,
        trajectory,
        duration_secs,
        team_id: raw.team_id,
        video_ref: raw.video_ref,
        direction_normalized: flip,
    })
}

/// Plays that fail extraction or repeat an id land in `Corpus::excluded`.
pub fn build_corpus(raws: impl IntoIterator<Item = RawPlay>, cfg: &SimilarityConfig) -> Corpus {
    let mut corpus = Corpus::new();
    let mut flipped = 0usize;
    for raw in raws {
        let id = raw.id.clone();
        let outcome = extract_play(raw, cfg).and_then(|play| {
            let was_flipped = play.direction_normalized;
            corpus.insert(play)?;
            Ok(was_flipped)
        });
        match outcome {
            Ok(true) => flipped += 1,
            Ok(false) => {}
            Err(reason) => {
                debug!(play = %id, %reason, "play excluded from corpus");
                corpus.exclude(id, reason);
            }
        }
    }
    info!(
        plays = corpus.len(),
        excluded = corpus.excluded().len(),
        flipped,
        "corpus built"
    );
    corpus
}
