//! RecordStore: the authoritative hash-indexed map of learning records.
//!
//! The due queue and difficulty index hold [`RecordKey`]s into this map,
//! never copies of the record.

use std::collections::HashMap;

use crate::error::SchedulerError;
use crate::types::{RecordKey, WordRecord, WordStatus};

#[derive(Debug, Default)]
pub struct RecordStore {
    records: HashMap<RecordKey, WordRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct insert; `upsert` semantics live in the engine, which
    /// checks `get` first so re-processing a word never resets progress.
    pub fn insert_new(&mut self, record: WordRecord) -> Result<(), SchedulerError> {
        let key = record.key();
        if self.records.contains_key(&key) {
            return Err(SchedulerError::AlreadyExists(format!(
                "record already exists: {key}"
            )));
        }
        self.records.insert(key, record);
        Ok(())
    }

    pub fn get(&self, key: &RecordKey) -> Option<&WordRecord> {
        self.records.get(key)
    }

    pub fn get_mut(&mut self, key: &RecordKey) -> Option<&mut WordRecord> {
        self.records.get_mut(key)
    }

    pub fn remove(&mut self, key: &RecordKey) -> Option<WordRecord> {
        self.records.remove(key)
    }

    /// Remove every record for a learner, returning the removed records
    /// so the caller can unhook them from the other structures.
    pub fn remove_learner(&mut self, learner_id: &str) -> Vec<WordRecord> {
        let keys: Vec<RecordKey> = self
            .records
            .keys()
            .filter(|key| key.learner_id == learner_id)
            .cloned()
            .collect();
        keys.iter()
            .filter_map(|key| self.records.remove(key))
            .collect()
    }

    /// Records for one learner with the given status, ordered by word
    /// for deterministic listings.
    pub fn list_by_status(&self, learner_id: &str, status: WordStatus) -> Vec<&WordRecord> {
        let mut out: Vec<&WordRecord> = self
            .records
            .values()
            .filter(|r| r.learner_id == learner_id && r.status == status)
            .collect();
        out.sort_by(|a, b| a.word.cmp(&b.word).then_with(|| a.language.cmp(&b.language)));
        out
    }

    /// All of a learner's records, ordered by word.
    pub fn list_for_learner(&self, learner_id: &str) -> Vec<&WordRecord> {
        let mut out: Vec<&WordRecord> = self
            .records
            .values()
            .filter(|r| r.learner_id == learner_id)
            .collect();
        out.sort_by(|a, b| a.word.cmp(&b.word).then_with(|| a.language.cmp(&b.language)));
        out
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RecordKey, &WordRecord)> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(learner: &str, word: &str) -> WordRecord {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let key = RecordKey::new(learner, word, "en").unwrap();
        WordRecord::new(key, 3, 1.0, now)
    }

    #[test]
    fn insert_then_get() {
        let mut store = RecordStore::new();
        store.insert_new(record("u1", "cat")).unwrap();

        let key = RecordKey::new("u1", "cat", "en").unwrap();
        assert_eq!(store.get(&key).unwrap().word, "cat");
        assert!(store.get(&RecordKey::new("u1", "dog", "en").unwrap()).is_none());
    }

    #[test]
    fn duplicate_insert_rejected() {
        let mut store = RecordStore::new();
        store.insert_new(record("u1", "cat")).unwrap();
        let err = store.insert_new(record("u1", "cat")).unwrap_err();
        assert!(matches!(err, SchedulerError::AlreadyExists(_)));
    }

    #[test]
    fn remove_learner_is_scoped() {
        let mut store = RecordStore::new();
        for word in ["a", "b", "c"] {
            store.insert_new(record("u1", word)).unwrap();
        }
        store.insert_new(record("u2", "a")).unwrap();

        let removed = store.remove_learner("u1");
        assert_eq!(removed.len(), 3);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn listing_is_word_ordered() {
        let mut store = RecordStore::new();
        for word in ["banana", "apple", "cherry"] {
            store.insert_new(record("u1", word)).unwrap();
        }
        let words: Vec<&str> = store
            .list_by_status("u1", WordStatus::UnderReview)
            .iter()
            .map(|r| r.word.as_str())
            .collect();
        assert_eq!(words, vec!["apple", "banana", "cherry"]);
    }
}
