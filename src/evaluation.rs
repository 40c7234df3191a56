use std::{collections::BTreeMap, fmt::Display, iter::zip};

use crate::error::{Error, Result};

/// Item-level tally: exact index-wise matches against the gold sequence.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub incorrect: usize,
    pub total: usize,
}

impl Score {
    #[inline]
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Number of tags correct: {}", self.correct)?;
        writeln!(f, "Number of tags incorrect: {}", self.incorrect)?;
        write!(f, "Total number of tags: {}", self.total)
    }
}

/// Compares a predicted tag sequence with the gold one.
pub fn compare<P: AsRef<str>, G: AsRef<str>>(predicted: &[P], gold: &[G]) -> Result<Score> {
    if predicted.len() != gold.len() {
        return Err(Error::LengthMismatch { predicted: predicted.len(), gold: gold.len() });
    }
    let correct = zip(predicted, gold).filter(|&(p, g)| p.as_ref() == g.as_ref()).count();
    Ok(Score { correct, incorrect: gold.len() - correct, total: gold.len() })
}

/// Label-wise performance values.
#[derive(Debug, Default, Clone)]
struct LabelMeasure {
    /// Number of correct predictions.
    num_correct: usize,
    /// Number of occurrences of the label in the gold-standard data.
    num_observation: usize,
    /// Number of predictions.
    num_prediction: usize,
}

impl LabelMeasure {
    fn precision(&self) -> f64 {
        if self.num_prediction == 0 {
            return 0.0;
        }
        self.num_correct as f64 / self.num_prediction as f64
    }

    fn recall(&self) -> f64 {
        if self.num_observation == 0 {
            return 0.0;
        }
        self.num_correct as f64 / self.num_observation as f64
    }

    fn fmeasure(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r > 0.0 {
            p * r * 2.0 / (p + r)
        } else {
            0.0
        }
    }
}

/// Macro-averaged precision and recall over the labels present in the gold data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimation {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

/// Accumulated performance over many sentences.
#[derive(Debug, Default, Clone)]
pub struct Evaluation {
    tbl: BTreeMap<String, LabelMeasure>,
    score: Score,
    /// Number of sentences whose prediction matched the gold sequence entirely.
    inst_total_correct: usize,
    /// Number of sentences seen, failed ones included.
    inst_total_num: usize,
    /// Number of sentences that could not be decoded.
    inst_failed: usize,
}

impl Evaluation {
    /// Adds one sentence. Nothing is recorded when the lengths differ.
    pub fn accumulate<G: AsRef<str>, P: AsRef<str>>(&mut self, gold: &[G], predicted: &[P]) -> Result<Score> {
        let score = compare(predicted, gold)?;
        for (g, p) in zip(gold, predicted) {
            let (g, p) = (g.as_ref(), p.as_ref());
            self.tbl.entry(g.to_string()).or_default().num_observation += 1;
            self.tbl.entry(p.to_string()).or_default().num_prediction += 1;
            if g == p {
                self.tbl.entry(g.to_string()).or_default().num_correct += 1;
            }
        }
        self.add(score);
        if score.incorrect == 0 {
            self.inst_total_correct += 1;
        }
        self.inst_total_num += 1;
        Ok(score)
    }

    /// Records a sentence that could not be decoded: every gold tag counts as incorrect.
    ///
    /// The gold line must still align with the sentence's tokens; nothing is
    /// recorded when the lengths differ.
    pub fn record_failure<S: AsRef<str>, G: AsRef<str>>(&mut self, tokens: &[S], gold: &[G]) -> Result<()> {
        if tokens.len() != gold.len() {
            return Err(Error::LengthMismatch { predicted: tokens.len(), gold: gold.len() });
        }
        for g in gold {
            self.tbl.entry(g.as_ref().to_string()).or_default().num_observation += 1;
        }
        self.add(Score { correct: 0, incorrect: gold.len(), total: gold.len() });
        self.inst_total_num += 1;
        self.inst_failed += 1;
        Ok(())
    }

    fn add(&mut self, s: Score) {
        self.score.correct += s.correct;
        self.score.incorrect += s.incorrect;
        self.score.total += s.total;
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn num_failed(&self) -> usize {
        self.inst_failed
    }

    pub fn sequence_accuracy(&self) -> f64 {
        if self.inst_total_num == 0 {
            return 0.0;
        }
        self.inst_total_correct as f64 / self.inst_total_num as f64
    }

    pub fn evaluate(&self) -> Estimation {
        let observed: Vec<_> = self.tbl.values().filter(|m| m.num_observation > 0).collect();
        if observed.is_empty() {
            return Estimation { precision: 0.0, recall: 0.0, fmeasure: 0.0 };
        }
        let n = observed.len() as f64;
        Estimation {
            precision: observed.iter().map(|m| m.precision()).sum::<f64>() / n,
            recall: observed.iter().map(|m| m.recall()).sum::<f64>() / n,
            fmeasure: observed.iter().map(|m| m.fmeasure()).sum::<f64>() / n,
        }
    }
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Performance by label (#match, #model, #ref) (precision, recall, F1):")?;
        for (label, lev) in &self.tbl {
            if lev.num_observation == 0 {
                writeln!(f, "\t{}: ({}, {}, {}) (******, ******, ******)", label, lev.num_correct, lev.num_prediction, lev.num_observation)?;
            } else {
                writeln!(
                    f,
                    "\t{}: ({}, {}, {}) ({:.4}, {:.4}, {:.4})",
                    label,
                    lev.num_correct,
                    lev.num_prediction,
                    lev.num_observation,
                    lev.precision(),
                    lev.recall(),
                    lev.fmeasure()
                )?;
            }
        }
        let est = self.evaluate();
        writeln!(f, "Macro-average precision, recall, F1: ({:.6}, {:.6}, {:.6})", est.precision, est.recall, est.fmeasure)?;
        writeln!(f, "Item accuracy: {}/{} => {:.4}", self.score.correct, self.score.total, self.score.accuracy())?;
        writeln!(f, "Sequence accuracy: {}/{} => {:.4}", self.inst_total_correct, self.inst_total_num, self.sequence_accuracy())?;
        if self.inst_failed > 0 {
            writeln!(f, "Undecodable sentences: {}", self.inst_failed)?;
        }
        write!(f, "{}", self.score)
    }
}
