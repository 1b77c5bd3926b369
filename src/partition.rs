use serde::{Deserialize, Serialize};

use crate::error::{Result, SimilarityError};
use crate::play::{Position, Trajectory};

pub const MIN_ALIGN_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonWindow {
    pub start: usize,
    pub len: usize,
}

impl ComparisonWindow {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn slice<'a>(&self, points: &'a [Position]) -> &'a [Position] {
        &points[self.start..self.end()]
    }
}

#[derive(Debug, Clone)]
pub struct Partition<'a> {
    pub short: &'a Trajectory,
    pub long: &'a Trajectory,
    pub swapped: bool,
    pub windows: Vec<ComparisonWindow>,
    /// Trailing points of the long trajectory left out of every window.
    pub remainder: usize,
}

impl Partition<'_> {
    pub fn window_points(&self) -> impl Iterator<Item = (ComparisonWindow, &[Position])> + '_ {
        self.windows
            .iter()
            .map(|w| (*w, w.slice(self.long.points())))
    }
}

/// Cuts the longer trajectory into non-overlapping windows of the shorter
/// one's length, in order, discarding any partial tail. `first` is the
/// nominal short side; roles swap when `second` is shorter.
pub fn partition<'a>(first: &'a Trajectory, second: &'a Trajectory) -> Result<Partition<'a>> {
    let swapped = second.len() < first.len();
    let (short, long) = if swapped { (second, first) } else { (first, second) };

    if short.len() < MIN_ALIGN_LEN {
        return Err(SimilarityError::InsufficientLength {
            len: short.len(),
            min: MIN_ALIGN_LEN,
        });
    }

    let win_len = short.len();
    let count = long.len() / win_len;
    if count == 0 {
        return Err(SimilarityError::NonComparablePair);
    }

    let windows = (0..count)
        .map(|k| ComparisonWindow {
            start: k * win_len,
            len: win_len,
        })
        .collect();

    Ok(Partition {
        short,
        long,
        swapped,
        windows,
        remainder: long.len() % win_len,
    })
}
