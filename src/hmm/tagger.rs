use crate::error::Result;

pub trait Tagger {
    /// Most likely tag ids for `tokens`, one per token.
    fn viterbi<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<usize>>;
    /// Most likely tags for `tokens`, one per token.
    fn tag<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<String>>;
    /// Log score of a given tag path, `None` when the path uses a transition never observed.
    fn score<S: AsRef<str>, T: AsRef<str>>(&self, tokens: &[S], tags: &[T]) -> Option<f64>;
}
