use std::collections::{btree_map::Entry, BTreeMap, HashMap};

use crate::error::{Error, Result};

use super::{model::HmmModel, START_ID};

/// Per-sentence Viterbi state over the sparse lattice.
///
/// Only tags actually reachable at the current position are held in the
/// frontier; a tag with no observed successor simply drops out.
#[derive(Debug)]
pub(crate) struct Lattice {
    /// Best cumulative log score of each reachable tag id at the current position.
    frontier: BTreeMap<usize, f64>,
    /// `(tag id, position) -> predecessor tag id`.
    backpointers: HashMap<(usize, usize), usize>,
    /// Number of positions consumed so far.
    num_items: usize,
}

impl Lattice {
    pub fn new() -> Self {
        Self { frontier: BTreeMap::from([(START_ID, 0.0)]), backpointers: HashMap::new(), num_items: 0 }
    }

    /// Extends every frontier tag by one position, emitting `token`.
    ///
    /// Sources are visited in ascending id order and a candidate only replaces
    /// the current best on a strictly greater score, so ties go to the source
    /// seen earliest in training.
    pub fn advance(&mut self, model: &HmmModel, token: Option<usize>, unseen: f64) -> Result<()> {
        let t = self.num_items;
        let mut next: BTreeMap<usize, f64> = BTreeMap::new();
        for (&src, &score) in &self.frontier {
            for &(dst, trans) in model.successors(src) {
                let candidate = score + trans + model.emission_score(dst, token, unseen);
                match next.entry(dst) {
                    Entry::Vacant(e) => {
                        e.insert(candidate);
                        self.backpointers.insert((dst, t), src);
                    }
                    Entry::Occupied(mut e) => {
                        if candidate > *e.get() {
                            e.insert(candidate);
                            self.backpointers.insert((dst, t), src);
                        }
                    }
                }
            }
        }
        if next.is_empty() {
            return Err(Error::DeadEnd { position: t });
        }
        self.frontier = next;
        self.num_items += 1;
        Ok(())
    }

    /// Highest scoring tag of the current frontier, lowest id on ties.
    pub fn best(&self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (&tag, &score) in &self.frontier {
            match best {
                Some((_, s)) if s >= score => {}
                _ => best = Some((tag, score)),
            }
        }
        best
    }

    /// Follows backpointers from `last` at the final position back to position 0.
    pub fn backtrack(&self, last: usize) -> Vec<usize> {
        let mut path = vec![last; self.num_items];
        for t in (1..self.num_items).rev() {
            // every frontier entry at t was inserted together with its backpointer
            path[t - 1] = self.backpointers[&(path[t], t)];
        }
        path
    }

    pub fn len(&self) -> usize {
        self.num_items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::bigram::{trainer::Trainer, UNSEEN_SCORE};

    #[test]
    fn init() {
        let lattice = Lattice::new();
        assert_eq!(lattice.len(), 0);
        assert_eq!(lattice.best(), Some((START_ID, 0.0)));
    }

    #[test]
    fn ties_go_to_earliest_source() {
        // "a" under X and Y with identical statistics; both then go to Z.
        let mut trainer = Trainer::new();
        trainer.append(&["a", "b"], &["X", "Z"]).unwrap();
        trainer.append(&["a", "b"], &["Y", "Z"]).unwrap();
        let model = trainer.finish();
        let (x, y, z) = (model.tag_id("X").unwrap(), model.tag_id("Y").unwrap(), model.tag_id("Z").unwrap());

        let mut lattice = Lattice::new();
        lattice.advance(&model, model.token_id("a"), UNSEEN_SCORE).unwrap();
        assert_eq!(lattice.best().map(|(t, _)| t), Some(x));
        lattice.advance(&model, model.token_id("b"), UNSEEN_SCORE).unwrap();
        assert_eq!(lattice.best().map(|(t, _)| t), Some(z));
        assert_eq!(lattice.backtrack(z), vec![x, z]);
        assert!(x < y);
    }

    #[test]
    fn dead_end_is_reported_with_position() {
        let mut trainer = Trainer::new();
        trainer.append(&["stop"], &["END"]).unwrap();
        let model = trainer.finish();

        let mut lattice = Lattice::new();
        lattice.advance(&model, model.token_id("stop"), UNSEEN_SCORE).unwrap();
        match lattice.advance(&model, model.token_id("stop"), UNSEEN_SCORE) {
            Err(Error::DeadEnd { position: 1 }) => {}
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(lattice.len(), 1);
    }
}
