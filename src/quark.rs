use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub trait StringTable {
    fn to_str(&self, id: usize) -> Option<&str>;
    fn to_id(&self, s: &str) -> Option<usize>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait TextVectorizer {
    fn find_or_insert(&mut self, key: &str) -> usize;
}

/// Bidirectional string <-> id table. Ids are dense and follow insertion order.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Quark {
    v: Vec<String>,
    m: HashMap<String, usize>,
}

impl From<Vec<String>> for Quark {
    fn from(value: Vec<String>) -> Self {
        let m = value.iter().enumerate().map(|(i, s)| (s.to_string(), i)).collect();
        Self { v: value, m }
    }
}

impl From<Quark> for Vec<String> {
    fn from(value: Quark) -> Self {
        value.v
    }
}

impl StringTable for Quark {
    fn to_str(&self, id: usize) -> Option<&str> {
        self.v.get(id).map(|x| x.as_str())
    }

    fn to_id(&self, s: &str) -> Option<usize> {
        self.m.get(s).copied()
    }

    fn len(&self) -> usize {
        self.v.len()
    }
}

impl TextVectorizer for Quark {
    fn find_or_insert(&mut self, key: &str) -> usize {
        if let Some(&id) = self.m.get(key) {
            return id;
        }
        let idx = self.v.len();
        self.m.insert(key.to_string(), idx);
        self.v.push(key.to_string());
        idx
    }
}

impl Quark {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.v.iter().map(String::as_str)
    }

    /// Distinct entries, i.e. the loaded list had no duplicates.
    pub(crate) fn is_consistent(&self) -> bool {
        self.m.len() == self.v.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_by_str() {
        let mut quark = Quark::default();
        for (s, id) in [("#", 0), ("DET", 1), ("NOUN", 2), ("VERB", 3), ("NOUN", 2), ("DET", 1), ("#", 0), ("ADJ", 4)] {
            assert_eq!(id, quark.find_or_insert(s), "{} != {}", s, id);
        }
        assert_eq!(quark.len(), 5);
    }

    #[test]
    fn find_by_id() {
        let mut quark = Quark::default();
        quark.find_or_insert("the");
        quark.find_or_insert("dog");
        assert_eq!(quark.to_str(0), Some("the"));
        assert_eq!(quark.to_str(1), Some("dog"));
        assert_eq!(quark.to_str(2), None);
        assert_eq!(quark.to_id("dog"), Some(1));
        assert_eq!(quark.to_id("cat"), None);
    }

    #[test]
    fn serializes_as_ordered_list() {
        let mut quark = Quark::default();
        quark.find_or_insert("#");
        quark.find_or_insert("N");
        let json = serde_json::to_string(&quark).unwrap();
        assert_eq!(json, r###"["#","N"]"###);

        let back: Quark = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_id("N"), Some(1));
        assert!(back.is_consistent());

        let dup: Quark = serde_json::from_str(r#"["N","N"]"#).unwrap();
        assert!(!dup.is_consistent());
    }
}
