use crate::{
    dataset::{normalize, tokenize},
    error::Result,
    hmm::tagger::Tagger,
};

use super::{lattice::Lattice, model::HmmModel, START_ID, UNSEEN_SCORE};

/// Viterbi decoder over a shared, read-only [`HmmModel`].
#[derive(Debug, Clone, Copy)]
pub struct HmmTagger<'a> {
    model: &'a HmmModel,
    unseen_score: f64,
}

impl<'a> HmmTagger<'a> {
    pub fn new(model: &'a HmmModel) -> Self {
        Self::with_unseen_score(model, UNSEEN_SCORE)
    }

    pub fn with_unseen_score(model: &'a HmmModel, unseen_score: f64) -> Self {
        Self { model, unseen_score }
    }

    /// Normalizes and tokenizes a free-text line, then tags it.
    pub fn tag_line(&self, line: &str) -> Result<Vec<(String, String)>> {
        let tokens = tokenize(&normalize(line));
        let tags = self.tag(&tokens)?;
        Ok(tokens.into_iter().zip(tags).collect())
    }

    fn tag_names(&self, ids: &[usize]) -> Vec<String> {
        ids.iter().map(|&i| self.model.tag_name(i).unwrap_or_default().to_string()).collect()
    }
}

impl<'a> Tagger for HmmTagger<'a> {
    fn viterbi<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<usize>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let mut lattice = Lattice::new();
        for token in tokens {
            let token = self.model.token_id(token.as_ref());
            lattice.advance(self.model, token, self.unseen_score)?;
        }
        match lattice.best() {
            Some((last, score)) => {
                log::debug!("viterbi: {} positions, best score {score}", lattice.len());
                Ok(lattice.backtrack(last))
            }
            // advance() never leaves an empty frontier behind
            None => Ok(Vec::new()),
        }
    }

    fn tag<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<String>> {
        let ids = self.viterbi(tokens)?;
        Ok(self.tag_names(&ids))
    }

    fn score<S: AsRef<str>, T: AsRef<str>>(&self, tokens: &[S], tags: &[T]) -> Option<f64> {
        if tokens.len() != tags.len() {
            return None;
        }
        let mut prev = START_ID;
        let mut r = 0.0;
        for (token, tag) in tokens.iter().zip(tags) {
            let curr = self.model.tag_id(tag.as_ref())?;
            r += self.model.transition_log_prob(prev, curr)?;
            r += self.model.emission_score(curr, self.model.token_id(token.as_ref()), self.unseen_score);
            prev = curr;
        }
        Some(r)
    }
}

/// Joins each token with its tag by `separator`, pairs separated by spaces.
pub fn format_pairs(pairs: &[(String, String)], separator: &str) -> String {
    pairs.iter().map(|(token, tag)| format!("{token}{separator}{tag}")).collect::<Vec<_>>().join(" ")
}
