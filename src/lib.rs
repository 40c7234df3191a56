//! Hidden Markov Model part-of-speech tagger.
//!
//! Training counts tag bigrams and tag/token pairs from a line-aligned corpus,
//! the counts are frozen into natural-log probabilities, and decoding runs
//! Viterbi over the sparse lattice of transitions actually observed in training.
//!
//! ```
//! use hmm_tagger::{Model, Tagger, Trainer};
//!
//! let mut trainer = Trainer::new();
//! trainer.append(&["the", "dog", "runs"], &["DET", "NOUN", "VERB"]).unwrap();
//! let model = trainer.finish();
//! let tags = model.tagger().tag(&["the", "dog", "runs"]).unwrap();
//! assert_eq!(tags, ["DET", "NOUN", "VERB"]);
//! ```

pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod hmm;
pub mod quark;

pub use dataset::{Corpus, Sentence};
pub use error::{Error, Result};
pub use evaluation::{compare, Evaluation, Score};
pub use hmm::{
    bigram::{
        model::HmmModel,
        tagger::{format_pairs, HmmTagger},
        trainer::{CountTables, Trainer},
        START, UNSEEN_SCORE,
    },
    model::Model,
    tagger::Tagger,
};
