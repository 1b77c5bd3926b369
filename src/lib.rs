pub mod config;
pub mod dtw;
pub mod error;
pub mod extract;
pub mod partition;
pub mod play;
pub mod positions_file;
pub mod ranking;
pub mod similarity;

pub use error::SimilarityError;
pub use play::{Corpus, Play, PlayId, Position, Trajectory};
pub use ranking::{RankedPlay, SimilarityResult};
pub use similarity::{ComparePool, PairDistance, compute_top_similar};
