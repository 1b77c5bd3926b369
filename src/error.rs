use thiserror::Error;

use crate::play::PlayId;

pub type Result<T> = std::result::Result<T, SimilarityError>;

/// Only `InvalidTopN`, `UnknownTarget` and `DeadlineExceeded` fail a whole
/// search; the rest end up as exclusion or skip records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    #[error("empty trajectory: no valid ball positions")]
    EmptyTrajectory,

    #[error("insufficient length: trajectory has {len} position(s), at least {min} required")]
    InsufficientLength { len: usize, min: usize },

    #[error("non-comparable pair: partitioning produced no comparison window")]
    NonComparablePair,

    #[error("invalid top-n {0}: must be a positive integer")]
    InvalidTopN(usize),

    #[error("unknown target play {0}")]
    UnknownTarget(PlayId),

    #[error("duplicate play {0}")]
    DuplicatePlay(PlayId),

    #[error("deadline exceeded before all comparisons finished")]
    DeadlineExceeded,
}
