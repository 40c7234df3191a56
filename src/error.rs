use thiserror::Error;

/// Errors raised while reading a corpus, training, decoding or evaluating.
#[derive(Debug, Error)]
pub enum Error {
    /// A training line whose token count and tag count disagree.
    #[error("malformed corpus at line {line}: {tokens} tokens but {tags} tags")]
    MalformedCorpus {
        /// 1-based line index in both sources.
        line: usize,
        tokens: usize,
        tags: usize,
    },

    /// A training tag that collides with the reserved start-of-sentence tag.
    #[error("reserved tag {tag:?} used at line {line}")]
    ReservedTag { line: usize, tag: String },

    /// One of the two line sources ended before the other.
    #[error("corpus sources are not line-aligned: line {line} has no counterpart")]
    UnevenCorpus { line: usize },

    /// The underlying line source could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The lattice frontier emptied before the whole sentence was consumed.
    #[error("no tag path reaches position {position}")]
    DeadEnd { position: usize },

    /// Predicted and gold tag sequences differ in length.
    #[error("length mismatch: {predicted} predicted tags vs {gold} gold tags")]
    LengthMismatch { predicted: usize, gold: usize },

    /// A persisted model that cannot be turned back into count tables.
    #[error("invalid model: {0}")]
    InvalidModel(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidModel(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
