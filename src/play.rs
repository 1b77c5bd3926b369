use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimilarityError};

/// Coordinates beyond this magnitude are tracking sentinels, not ball
/// positions.
pub const MAX_ABS_COORD_M: f64 = 150.0;

// Pitch coordinates in meters, origin at the centre spot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// `None` when x or y is non-finite or off the pitch bound. A
    /// non-finite height is cleared rather than rejecting the point.
    pub fn on_pitch(self) -> Option<Self> {
        let valid = |c: f64| c.is_finite() && c.abs() <= MAX_ABS_COORD_M;
        if !valid(self.x) || !valid(self.y) {
            return None;
        }
        Some(Self {
            z: self.z.filter(|z| z.is_finite()),
            ..self
        })
    }

    pub fn mirrored(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: self.z,
        }
    }
}

/// Ordered, non-empty sequence of on-pitch ball positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Position>", into = "Vec<Position>")]
pub struct Trajectory(Vec<Position>);

impl Trajectory {
    /// Points failing [`Position::on_pitch`] are dropped; nothing left is
    /// `EmptyTrajectory`.
    pub fn new(points: Vec<Position>) -> Result<Self> {
        let points: Vec<Position> = points.into_iter().filter_map(Position::on_pitch).collect();
        if points.is_empty() {
            return Err(SimilarityError::EmptyTrajectory);
        }
        Ok(Self(points))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> &[Position] {
        &self.0
    }
}

impl TryFrom<Vec<Position>> for Trajectory {
    type Error = SimilarityError;

    fn try_from(points: Vec<Position>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<Trajectory> for Vec<Position> {
    fn from(t: Trajectory) -> Self {
        t.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayId {
    pub match_id: u64,
    pub sequence_id: String,
}

impl PlayId {
    pub fn new(match_id: u64, sequence_id: impl Into<String>) -> Self {
        Self {
            match_id,
            sequence_id: sequence_id.into(),
        }
    }
}

impl fmt::Display for PlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.match_id, self.sequence_id)
    }
}

impl FromStr for PlayId {
    type Err = anyhow::Error;

    // Everything after the first underscore is the sequence id.
    fn from_str(raw: &str) -> anyhow::Result<Self> {
        let raw = raw.trim();
        let (match_part, seq_part) = raw
            .split_once('_')
            .ok_or_else(|| anyhow!("play id {raw:?} is not <match_id>_<sequence_id>"))?;
        let match_id = match_part
            .parse::<u64>()
            .with_context(|| format!("invalid match id in play id {raw:?}"))?;
        if seq_part.is_empty() {
            return Err(anyhow!("play id {raw:?} has an empty sequence id"));
        }
        Ok(Self::new(match_id, seq_part))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Play {
    pub id: PlayId,
    pub trajectory: Trajectory,
    pub duration_secs: f64,
    #[serde(default)]
    pub team_id: Option<u64>,
    #[serde(default)]
    pub video_ref: Option<String>,
    /// True when positions were mirrored so the play attacks toward +x.
    #[serde(default)]
    pub direction_normalized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedPlay {
    pub id: PlayId,
    pub reason: SimilarityError,
}

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    plays: BTreeMap<PlayId, Play>,
    excluded: Vec<ExcludedPlay>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a play. A second play with an existing id is rejected and the
    /// stored one is kept.
    pub fn insert(&mut self, play: Play) -> Result<()> {
        if self.plays.contains_key(&play.id) {
            return Err(SimilarityError::DuplicatePlay(play.id));
        }
        self.plays.insert(play.id.clone(), play);
        Ok(())
    }

    pub fn exclude(&mut self, id: PlayId, reason: SimilarityError) {
        self.excluded.push(ExcludedPlay { id, reason });
    }

    pub fn get(&self, id: &PlayId) -> Option<&Play> {
        self.plays.get(id)
    }

    pub fn len(&self) -> usize {
        self.plays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    pub fn plays(&self) -> impl Iterator<Item = &Play> {
        self.plays.values()
    }

    pub fn match_plays(&self, match_id: u64) -> impl Iterator<Item = &Play> {
        self.plays.values().filter(move |p| p.id.match_id == match_id)
    }

    pub fn excluded(&self) -> &[ExcludedPlay] {
        &self.excluded
    }
}
