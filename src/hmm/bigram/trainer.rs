use std::collections::HashMap;

use crate::{
    dataset::Sentence,
    error::{Error, Result},
    quark::{Quark, StringTable, TextVectorizer},
};

use super::{model::HmmModel, START, START_ID};

/// Raw transition and emission counts.
///
/// Both tables are flat maps keyed by interned id pairs: `(source, destination)`
/// for transitions and `(tag, token)` for emissions. Per-key totals are kept
/// alongside so that the sum of a source's (or tag's) entries always equals its
/// recorded total.
#[derive(Debug, Clone)]
pub struct CountTables {
    pub(crate) tags: Quark,
    pub(crate) tokens: Quark,
    transitions: HashMap<(usize, usize), usize>,
    transition_totals: HashMap<usize, usize>,
    emissions: HashMap<(usize, usize), usize>,
    emission_totals: HashMap<usize, usize>,
}

impl Default for CountTables {
    fn default() -> Self {
        let mut tags = Quark::default();
        tags.find_or_insert(START);
        Self {
            tags,
            tokens: Quark::default(),
            transitions: HashMap::new(),
            transition_totals: HashMap::new(),
            emissions: HashMap::new(),
            emission_totals: HashMap::new(),
        }
    }
}

impl CountTables {
    /// Empty tables over already interned strings.
    pub(crate) fn with_strings(tags: Quark, tokens: Quark) -> Self {
        Self { tags, tokens, ..Default::default() }
    }

    pub(crate) fn add_transition(&mut self, src: usize, dst: usize, n: usize) {
        *self.transitions.entry((src, dst)).or_default() += n;
        *self.transition_totals.entry(src).or_default() += n;
    }

    pub(crate) fn add_emission(&mut self, tag: usize, token: usize, n: usize) {
        *self.emissions.entry((tag, token)).or_default() += n;
        *self.emission_totals.entry(tag).or_default() += n;
    }

    pub fn tags(&self) -> &Quark {
        &self.tags
    }

    pub fn tokens(&self) -> &Quark {
        &self.tokens
    }

    pub fn transition_count(&self, src: &str, dst: &str) -> usize {
        match (self.tags.to_id(src), self.tags.to_id(dst)) {
            (Some(s), Some(d)) => self.transitions.get(&(s, d)).copied().unwrap_or_default(),
            _ => 0,
        }
    }

    pub fn emission_count(&self, tag: &str, token: &str) -> usize {
        match (self.tags.to_id(tag), self.tokens.to_id(token)) {
            (Some(t), Some(w)) => self.emissions.get(&(t, w)).copied().unwrap_or_default(),
            _ => 0,
        }
    }

    /// Total number of transitions recorded out of `src`.
    pub fn transition_total(&self, src: &str) -> usize {
        self.tags.to_id(src).and_then(|s| self.transition_totals.get(&s).copied()).unwrap_or_default()
    }

    /// Total number of tokens recorded under `tag`.
    pub fn emission_total(&self, tag: &str) -> usize {
        self.tags.to_id(tag).and_then(|t| self.emission_totals.get(&t).copied()).unwrap_or_default()
    }

    /// `((source id, destination id), count)` entries in unspecified order.
    pub fn transitions(&self) -> impl Iterator<Item = ((usize, usize), usize)> + '_ {
        self.transitions.iter().map(|(&k, &v)| (k, v))
    }

    /// `((tag id, token id), count)` entries in unspecified order.
    pub fn emissions(&self) -> impl Iterator<Item = ((usize, usize), usize)> + '_ {
        self.emissions.iter().map(|(&k, &v)| (k, v))
    }

    pub(crate) fn transition_total_by_id(&self, src: usize) -> usize {
        self.transition_totals.get(&src).copied().unwrap_or_default()
    }

    pub(crate) fn emission_total_by_id(&self, tag: usize) -> usize {
        self.emission_totals.get(&tag).copied().unwrap_or_default()
    }

    /// Checks that every per-key total equals the sum of that key's entries.
    pub fn is_consistent(&self) -> bool {
        fn sums(entries: &HashMap<(usize, usize), usize>) -> HashMap<usize, usize> {
            let mut m = HashMap::new();
            for (&(k, _), &n) in entries {
                *m.entry(k).or_default() += n;
            }
            m
        }
        sums(&self.transitions) == self.transition_totals && sums(&self.emissions) == self.emission_totals
    }
}

/// Accumulates counts from aligned token/tag sequences in a single streaming pass.
#[derive(Debug, Default)]
pub struct Trainer {
    counts: CountTables,
    num_lines: usize,
    num_sentences: usize,
    num_tokens: usize,
}

impl Trainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one sentence. Tokens are taken as given, so they must already be
    /// normalized the way decoding input will be.
    ///
    /// A length mismatch is reported with the 1-based index of this call and
    /// leaves every table untouched, as does a tag equal to [`START`]. An empty
    /// sentence counts nothing.
    pub fn append<S: AsRef<str>, T: AsRef<str>>(&mut self, tokens: &[S], tags: &[T]) -> Result<()> {
        self.num_lines += 1;
        if tokens.len() != tags.len() {
            return Err(Error::MalformedCorpus { line: self.num_lines, tokens: tokens.len(), tags: tags.len() });
        }
        if let Some(tag) = tags.iter().find(|t| t.as_ref() == START) {
            return Err(Error::ReservedTag { line: self.num_lines, tag: tag.as_ref().to_string() });
        }
        if tokens.is_empty() {
            return Ok(());
        }

        let mut prev = START_ID;
        for (token, tag) in tokens.iter().zip(tags) {
            let curr = self.counts.tags.find_or_insert(tag.as_ref());
            let word = self.counts.tokens.find_or_insert(token.as_ref());
            self.counts.add_transition(prev, curr, 1);
            self.counts.add_emission(curr, word, 1);
            prev = curr;
        }
        self.num_sentences += 1;
        self.num_tokens += tokens.len();
        Ok(())
    }

    /// Counts every sentence of `corpus`, stopping at the first error.
    ///
    /// Returns the number of non-empty sentences counted by this call.
    pub fn train<I: IntoIterator<Item = Result<Sentence>>>(&mut self, corpus: I) -> Result<usize> {
        let before = self.num_sentences;
        for sentence in corpus {
            let sentence = sentence?;
            self.append(&sentence.tokens, &sentence.tags)?;
        }
        let n = self.num_sentences - before;
        log::info!(
            "counted {n} sentences (total sentences: {}, tokens: {}, tags: {}, vocabulary: {})",
            self.num_sentences,
            self.num_tokens,
            self.counts.tags.len() - 1,
            self.counts.tokens.len()
        );
        Ok(n)
    }

    pub fn counts(&self) -> &CountTables {
        &self.counts
    }

    pub fn num_sentences(&self) -> usize {
        self.num_sentences
    }

    /// Freezes the counts into a log-probability model.
    pub fn finish(self) -> HmmModel {
        HmmModel::from_counts(self.counts)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::dataset::Corpus;

    #[test]
    fn counts_transitions_and_emissions() {
        let mut trainer = Trainer::new();
        trainer.append(&["the", "dog", "runs"], &["DET", "NOUN", "VERB"]).unwrap();
        trainer.append(&["the", "cat"], &["DET", "NOUN"]).unwrap();
        let c = trainer.counts();

        assert_eq!(c.transition_count(START, "DET"), 2);
        assert_eq!(c.transition_count("DET", "NOUN"), 2);
        assert_eq!(c.transition_count("NOUN", "VERB"), 1);
        assert_eq!(c.transition_count("VERB", "DET"), 0);
        assert_eq!(c.transition_total(START), 2);
        assert_eq!(c.transition_total("NOUN"), 1);
        assert_eq!(c.transition_total("VERB"), 0);

        assert_eq!(c.emission_count("DET", "the"), 2);
        assert_eq!(c.emission_count("NOUN", "dog"), 1);
        assert_eq!(c.emission_total("NOUN"), 2);
        assert!(c.is_consistent());
    }

    #[test]
    fn tags_keep_first_seen_order() {
        let mut trainer = Trainer::new();
        trainer.append(&["run", "fast"], &["VERB", "ADV"]).unwrap();
        trainer.append(&["the"], &["DET"]).unwrap();
        let tags: Vec<_> = trainer.counts().tags().iter().collect();
        assert_eq!(tags, vec![START, "VERB", "ADV", "DET"]);
    }

    #[test]
    fn malformed_sentence_leaves_counts_untouched() {
        let mut trainer = Trainer::new();
        trainer.append(&["the", "dog"], &["DET", "NOUN"]).unwrap();
        match trainer.append(&["a", "b", "c"], &["X", "Y"]) {
            Err(Error::MalformedCorpus { line: 2, tokens: 3, tags: 2 }) => {}
            other => panic!("unexpected: {:?}", other),
        }
        let c = trainer.counts();
        assert_eq!(c.tags().len(), 3);
        assert_eq!(c.tokens().len(), 2);
        assert_eq!(c.transition_total(START), 1);
        assert_eq!(trainer.num_sentences(), 1);
    }

    #[test]
    fn start_tag_is_rejected_in_corpus() {
        let mut trainer = Trainer::new();
        trainer.append(&["the", "dog"], &["DET", "NOUN"]).unwrap();
        match trainer.append(&["#", "5"], &[START, "CD"]) {
            Err(Error::ReservedTag { line: 2, tag }) => assert_eq!(tag, START),
            other => panic!("unexpected: {:?}", other),
        }
        let c = trainer.counts();
        assert_eq!(c.tags().len(), 3);
        assert_eq!(c.tokens().len(), 2);
        assert_eq!(c.emission_total(START), 0);
        assert_eq!(trainer.num_sentences(), 1);

        // "#" stays a valid token
        trainer.append(&["#", "5"], &["SYM", "CD"]).unwrap();
        let m = trainer.finish();
        let mut buf = Vec::new();
        m.save(&mut buf).unwrap();
        assert!(HmmModel::load(buf.as_slice()).is_ok());
    }

    #[test]
    fn empty_sentence_counts_nothing() {
        let mut trainer = Trainer::new();
        trainer.append::<&str, &str>(&[], &[]).unwrap();
        assert_eq!(trainer.counts().transition_total(START), 0);
        assert_eq!(trainer.num_sentences(), 0);
    }

    #[test]
    fn order_does_not_change_counts() {
        let lines = [("the dog runs", "DET NOUN VERB"), ("dogs run", "NOUN VERB"), ("the cat", "DET NOUN")];
        let mut forward = Trainer::new();
        let mut backward = Trainer::new();
        for (s, t) in lines {
            forward.train([Sentence::parse(s, t, 1)]).unwrap();
        }
        for (s, t) in lines.iter().rev() {
            backward.train([Sentence::parse(s, t, 1)]).unwrap();
        }
        for (src, dst) in [(START, "DET"), (START, "NOUN"), ("DET", "NOUN"), ("NOUN", "VERB")] {
            assert_eq!(forward.counts().transition_count(src, dst), backward.counts().transition_count(src, dst));
        }
        for (tag, token) in [("DET", "the"), ("NOUN", "dog"), ("NOUN", "dogs"), ("VERB", "run")] {
            assert_eq!(forward.counts().emission_count(tag, token), backward.counts().emission_count(tag, token));
        }
    }

    #[test]
    fn train_stops_at_first_error() {
        let sentences = Cursor::new("the dog\nthe\nthe cat\n");
        let tags = Cursor::new("DET NOUN\nDET NOUN\nDET NOUN\n");
        let mut trainer = Trainer::new();
        match trainer.train(Corpus::new(sentences, tags)) {
            Err(Error::MalformedCorpus { line: 2, .. }) => {}
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(trainer.num_sentences(), 1);
        assert_eq!(trainer.counts().emission_count("NOUN", "cat"), 0);
    }
}
