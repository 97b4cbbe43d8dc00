//! DifficultyIndex: ordered secondary index keyed by (difficulty, key).
//!
//! A hash map cannot answer "all words at level d" in sublinear time, so
//! level membership lives in a balanced ordered set where a level query
//! is a bounded prefix range scan. `RecordKey` orders by word first, so
//! a scan already comes out in lexicographic word order.

use std::collections::BTreeSet;
use std::ops::Bound;

use crate::error::SchedulerError;
use crate::types::{validate_difficulty, RecordKey};

#[derive(Debug, Default)]
pub struct DifficultyIndex {
    entries: BTreeSet<(u8, RecordKey)>,
}

impl DifficultyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &RecordKey, difficulty: u8) -> bool {
        self.entries.contains(&(difficulty, key.clone()))
    }

    pub fn insert(&mut self, key: RecordKey, difficulty: u8) -> Result<(), SchedulerError> {
        validate_difficulty(difficulty)?;
        if !self.entries.insert((difficulty, key.clone())) {
            return Err(SchedulerError::AlreadyExists(format!(
                "key already indexed at level {difficulty}: {key}"
            )));
        }
        Ok(())
    }

    /// True if the entry was present.
    pub fn remove(&mut self, key: &RecordKey, difficulty: u8) -> bool {
        self.entries.remove(&(difficulty, key.clone()))
    }

    /// Remove + insert under the new level.
    pub fn update_difficulty(
        &mut self,
        key: &RecordKey,
        old_difficulty: u8,
        new_difficulty: u8,
    ) -> Result<(), SchedulerError> {
        validate_difficulty(new_difficulty)?;
        if !self.remove(key, old_difficulty) {
            return Err(SchedulerError::NotFound(format!(
                "key not indexed at level {old_difficulty}: {key}"
            )));
        }
        self.insert(key.clone(), new_difficulty)
    }

    /// Every indexed key at the given level, in key (word-first) order.
    pub fn keys_at(&self, difficulty: u8) -> Result<Vec<&RecordKey>, SchedulerError> {
        validate_difficulty(difficulty)?;
        let range = self.level_range(difficulty);
        Ok(range.map(|(_, key)| key).collect())
    }

    /// Distinct words at the given level, lexicographically ordered.
    /// Invalid levels are a validation error, not an empty result.
    pub fn words_at(&self, difficulty: u8) -> Result<Vec<String>, SchedulerError> {
        validate_difficulty(difficulty)?;
        let mut words: Vec<String> = Vec::new();
        for (_, key) in self.level_range(difficulty) {
            // Entries arrive word-ordered, so duplicates are adjacent.
            if words.last().map(String::as_str) != Some(key.word.as_str()) {
                words.push(key.word.clone());
            }
        }
        Ok(words)
    }

    fn level_range(&self, difficulty: u8) -> impl Iterator<Item = &(u8, RecordKey)> {
        // Empty strings sort before every real key, so (d, empty) is a
        // lower bound for the whole level-d prefix.
        let lower = (
            difficulty,
            RecordKey {
                learner_id: String::new(),
                word: String::new(),
                language: String::new(),
            },
        );
        self.entries
            .range((Bound::Included(lower), Bound::Unbounded))
            .take_while(move |(level, _)| *level == difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(learner: &str, word: &str) -> RecordKey {
        RecordKey::new(learner, word, "en").unwrap()
    }

    #[test]
    fn words_come_back_sorted() {
        let mut index = DifficultyIndex::new();
        index.insert(key("u1", "zebra"), 3).unwrap();
        index.insert(key("u1", "apple"), 3).unwrap();
        index.insert(key("u1", "mango"), 3).unwrap();
        index.insert(key("u1", "other"), 2).unwrap();

        assert_eq!(index.words_at(3).unwrap(), vec!["apple", "mango", "zebra"]);
        assert_eq!(index.words_at(2).unwrap(), vec!["other"]);
        assert!(index.words_at(4).unwrap().is_empty());
    }

    #[test]
    fn same_word_across_learners_dedupes() {
        let mut index = DifficultyIndex::new();
        index.insert(key("u1", "cat"), 2).unwrap();
        index.insert(key("u2", "cat"), 2).unwrap();

        assert_eq!(index.words_at(2).unwrap(), vec!["cat"]);
        assert_eq!(index.keys_at(2).unwrap().len(), 2);
    }

    #[test]
    fn invalid_level_is_an_error() {
        let index = DifficultyIndex::new();
        assert!(matches!(index.words_at(0), Err(SchedulerError::Validation(_))));
        assert!(matches!(index.words_at(6), Err(SchedulerError::Validation(_))));

        let mut index = DifficultyIndex::new();
        assert!(index.insert(key("u1", "cat"), 0).is_err());
    }

    #[test]
    fn update_moves_between_levels() {
        let mut index = DifficultyIndex::new();
        let k = key("u1", "cat");
        index.insert(k.clone(), 2).unwrap();

        index.update_difficulty(&k, 2, 5).unwrap();
        assert!(index.words_at(2).unwrap().is_empty());
        assert_eq!(index.words_at(5).unwrap(), vec!["cat"]);

        assert!(matches!(
            index.update_difficulty(&k, 2, 3),
            Err(SchedulerError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_insert_rejected() {
        let mut index = DifficultyIndex::new();
        let k = key("u1", "cat");
        index.insert(k.clone(), 2).unwrap();
        assert!(matches!(
            index.insert(k, 2),
            Err(SchedulerError::AlreadyExists(_))
        ));
    }
}
