use std::io::{BufRead, Lines};

use crate::error::{Error, Result};

/// Splits a line on runs of whitespace. A blank line has no tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Case normalization shared by training and decoding.
pub fn normalize(line: &str) -> String {
    line.to_lowercase()
}

/// One aligned training line: tokens and their gold tags.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Sentence {
    pub tokens: Vec<String>,
    pub tags: Vec<String>,
}

impl Sentence {
    /// Builds a sentence from a raw token line and tag line, checking alignment.
    ///
    /// `line` is the 1-based index reported on mismatch.
    pub fn parse(tokens: &str, tags: &str, line: usize) -> Result<Self> {
        let tokens = tokenize(&normalize(tokens));
        let tags = tokenize(tags);
        if tokens.len() != tags.len() {
            return Err(Error::MalformedCorpus { line, tokens: tokens.len(), tags: tags.len() });
        }
        Ok(Self { tokens, tags })
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}

/// Streams [`Sentence`]s from two line-aligned sources without buffering the corpus.
pub struct Corpus<S, T> {
    sentences: Lines<S>,
    tags: Lines<T>,
    line: usize,
    done: bool,
}

impl<S: BufRead, T: BufRead> Corpus<S, T> {
    pub fn new(sentences: S, tags: T) -> Self {
        Self { sentences: sentences.lines(), tags: tags.lines(), line: 0, done: false }
    }

    fn fail(&mut self, e: Error) -> Option<Result<Sentence>> {
        self.done = true;
        Some(Err(e))
    }
}

impl<S: BufRead, T: BufRead> Iterator for Corpus<S, T> {
    type Item = Result<Sentence>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.line += 1;
        match (self.sentences.next(), self.tags.next()) {
            (None, None) => {
                self.done = true;
                None
            }
            (Some(Err(e)), _) | (_, Some(Err(e))) => self.fail(Error::Io(e)),
            (Some(Ok(_)), None) | (None, Some(Ok(_))) => {
                let line = self.line;
                self.fail(Error::UnevenCorpus { line })
            }
            (Some(Ok(s)), Some(Ok(t))) => match Sentence::parse(&s, &t, self.line) {
                Ok(sentence) => Some(Ok(sentence)),
                Err(e) => self.fail(e),
            },
        }
    }
}

/// Reads every line of `reader` as a whitespace-tokenized sequence.
pub fn read_lines<R: BufRead>(reader: R) -> Result<Vec<Vec<String>>> {
    reader.lines().map(|line| Ok(tokenize(&line?))).collect()
}

/// Like [`read_lines`], with tokens normalized for decoding.
pub fn read_sentences<R: BufRead>(reader: R) -> Result<Vec<Vec<String>>> {
    reader.lines().map(|line| Ok(tokenize(&normalize(&line?)))).collect()
}
