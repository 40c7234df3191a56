use std::{
    collections::HashMap,
    io::{Read, Write},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    hmm::model::Model,
    quark::{Quark, StringTable},
};

use super::{tagger::HmmTagger, trainer::CountTables, START, START_ID, UNSEEN_SCORE};

/// Immutable log-probability tables derived from [`CountTables`].
///
/// `transitions[(s, t)] = ln(count(s, t)) - ln(total(s))` and
/// `emissions[(t, w)] = ln(count(t, w)) - ln(total(t))`, keyed exactly like the
/// count tables they come from. Decoding only ever reads from it, so a single
/// model can be shared by any number of taggers.
#[derive(Debug, Clone)]
pub struct HmmModel {
    counts: CountTables,
    transitions: HashMap<(usize, usize), f64>,
    emissions: HashMap<(usize, usize), f64>,
    /// Observed successors of each tag id, sorted by destination id.
    successors: Vec<Vec<(usize, f64)>>,
}

fn log_prob(count: usize, total: usize) -> f64 {
    (count as f64).ln() - (total as f64).ln()
}

impl HmmModel {
    pub fn from_counts(counts: CountTables) -> Self {
        let transitions: HashMap<_, _> = counts
            .transitions()
            .map(|((s, t), n)| ((s, t), log_prob(n, counts.transition_total_by_id(s))))
            .collect();
        let emissions: HashMap<_, _> = counts
            .emissions()
            .map(|((t, w), n)| ((t, w), log_prob(n, counts.emission_total_by_id(t))))
            .collect();

        let mut successors = vec![Vec::new(); counts.tags().len()];
        for (&(s, t), &p) in &transitions {
            successors[s].push((t, p));
        }
        for edges in &mut successors {
            edges.sort_by_key(|&(t, _)| t);
        }

        log::info!(
            "derived model (tags: {}, vocabulary: {}, transitions: {}, emissions: {})",
            counts.tags().len() - 1,
            counts.tokens().len(),
            transitions.len(),
            emissions.len()
        );
        Self { counts, transitions, emissions, successors }
    }

    pub fn counts(&self) -> &CountTables {
        &self.counts
    }

    /// Number of tags, the sentinel included.
    pub fn num_tags(&self) -> usize {
        self.successors.len()
    }

    pub fn tag_name(&self, id: usize) -> Option<&str> {
        self.counts.tags().to_str(id)
    }

    pub fn tag_id(&self, tag: &str) -> Option<usize> {
        self.counts.tags().to_id(tag)
    }

    pub fn token_id(&self, token: &str) -> Option<usize> {
        self.counts.tokens().to_id(token)
    }

    pub fn transition_log_prob(&self, src: usize, dst: usize) -> Option<f64> {
        self.transitions.get(&(src, dst)).copied()
    }

    pub fn emission_log_prob(&self, tag: usize, token: usize) -> Option<f64> {
        self.emissions.get(&(tag, token)).copied()
    }

    /// Emission score used in decoding: the table value, or `unseen` when the
    /// token was never observed under `tag` (or is out of vocabulary).
    #[inline]
    pub fn emission_score(&self, tag: usize, token: Option<usize>, unseen: f64) -> f64 {
        token.and_then(|w| self.emission_log_prob(tag, w)).unwrap_or(unseen)
    }

    /// Destinations reachable from `src`, in ascending id order.
    #[inline]
    pub fn successors(&self, src: usize) -> &[(usize, f64)] {
        self.successors.get(src).map(Vec::as_slice).unwrap_or_default()
    }

    /// All transition log-probabilities keyed by `(source id, destination id)`.
    pub fn transition_log_probs(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.transitions.iter().map(|(&k, &v)| (k, v))
    }

    /// All emission log-probabilities keyed by `(tag id, token id)`.
    pub fn emission_log_probs(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.emissions.iter().map(|(&k, &v)| (k, v))
    }

    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let mut transitions: Vec<_> = self.counts.transitions().map(|((s, t), n)| (s, t, n)).collect();
        let mut emissions: Vec<_> = self.counts.emissions().map(|((t, w), n)| (t, w, n)).collect();
        transitions.sort_unstable();
        emissions.sort_unstable();
        let file = ModelFile {
            tags: self.counts.tags().clone(),
            tokens: self.counts.tokens().clone(),
            transitions,
            emissions,
        };
        serde_json::to_writer(writer, &file)?;
        Ok(())
    }

    pub fn load<R: Read>(reader: R) -> Result<Self> {
        let file: ModelFile = serde_json::from_reader(reader)?;
        Ok(Self::from_counts(file.into_counts()?))
    }
}

impl Model for HmmModel {
    fn tagger(&self) -> impl crate::hmm::tagger::Tagger {
        HmmTagger::with_unseen_score(self, UNSEEN_SCORE)
    }

    fn labels(&self) -> &Quark {
        self.counts.tags()
    }

    fn vocabulary(&self) -> &Quark {
        self.counts.tokens()
    }

    fn dump<W: Write>(&self, writer: W) -> Result<()> {
        self.save(writer)
    }
}

/// On-disk form: interned strings plus raw counts. Probabilities are re-derived on load.
#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    tags: Quark,
    tokens: Quark,
    transitions: Vec<(usize, usize, usize)>,
    emissions: Vec<(usize, usize, usize)>,
}

impl ModelFile {
    fn into_counts(self) -> Result<CountTables> {
        if self.tags.to_str(START_ID) != Some(START) {
            return Err(Error::InvalidModel(format!("first tag must be {START:?}")));
        }
        if !self.tags.is_consistent() || !self.tokens.is_consistent() {
            return Err(Error::InvalidModel("duplicate tag or token".into()));
        }
        let (n_tags, n_tokens) = (self.tags.len(), self.tokens.len());
        let mut counts = CountTables::with_strings(self.tags, self.tokens);
        for (s, t, n) in self.transitions {
            if s >= n_tags || t >= n_tags || t == START_ID || n == 0 {
                return Err(Error::InvalidModel(format!("bad transition entry ({s}, {t}, {n})")));
            }
            counts.add_transition(s, t, n);
        }
        for (t, w, n) in self.emissions {
            if t >= n_tags || w >= n_tokens || t == START_ID || n == 0 {
                return Err(Error::InvalidModel(format!("bad emission entry ({t}, {w}, {n})")));
            }
            counts.add_emission(t, w, n);
        }
        Ok(counts)
    }
}
