//! First-order (bigram) HMM: count tables, log-probability model and sparse Viterbi.

pub mod lattice;
pub mod model;
pub mod tagger;
pub mod trainer;

/// Sentinel start-state preceding the first tag of every sentence.
pub const START: &str = "#";

/// Id of [`START`] in every tag table.
pub const START_ID: usize = 0;

/// Emission log score for a token never observed under a tag.
pub const UNSEEN_SCORE: f64 = -100.0;
