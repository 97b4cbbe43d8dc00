//! Scheduler: the facade the embedding service calls.
//!
//! Owns the three structures (record store, due queue, difficulty index)
//! behind one `RwLock` and updates them as a single logical unit per
//! write, so a query never observes a half-applied answer. Reads from
//! different learners run concurrently under the shared lock; nothing in
//! here suspends or performs I/O, so no lock is held across an await.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::index::DifficultyIndex;
use crate::policy::apply_review;
use crate::queue::DueQueue;
use crate::store::RecordStore;
use crate::types::{validate_difficulty, LearnerStats, RecordKey, WordRecord, WordStatus};

#[derive(Debug, Default)]
struct CoreState {
    store: RecordStore,
    queue: DueQueue,
    index: DifficultyIndex,
}

#[derive(Debug)]
pub struct Scheduler {
    config: SchedulerConfig,
    core: RwLock<CoreState>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
            core: RwLock::new(CoreState::default()),
        }
    }

    /// Fails on out-of-range policy tunables.
    pub fn with_config(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.policy.validate()?;
        Ok(Self {
            config,
            core: RwLock::new(CoreState::default()),
        })
    }

    pub fn from_env() -> Result<Self, SchedulerError> {
        Self::with_config(SchedulerConfig::from_env())
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Create the record if absent; an existing record is returned
    /// unchanged, so re-processing the same word never resets progress.
    pub fn upsert(
        &self,
        learner_id: &str,
        word: &str,
        language: &str,
        difficulty: u8,
        now: DateTime<Utc>,
    ) -> Result<WordRecord, SchedulerError> {
        validate_difficulty(difficulty)?;
        let key = RecordKey::new(learner_id, word, language)?;

        let mut core = self.core.write();
        if let Some(existing) = core.store.get(&key) {
            tracing::debug!(key = %key, "upsert found existing record");
            return Ok(existing.clone());
        }

        let record = WordRecord::new(
            key.clone(),
            difficulty,
            self.config.policy.base_interval_days,
            now,
        );
        core.store.insert_new(record.clone())?;
        core.queue.insert(key.clone(), record.next_due_at)?;
        core.index.insert(key.clone(), difficulty)?;
        tracing::debug!(key = %key, difficulty, "record created");
        Ok(record)
    }

    pub fn get(
        &self,
        learner_id: &str,
        word: &str,
        language: &str,
    ) -> Result<Option<WordRecord>, SchedulerError> {
        let key = RecordKey::new(learner_id, word, language)?;
        Ok(self.core.read().store.get(&key).cloned())
    }

    /// Apply one answer: mutate confidence/interval/status per policy and
    /// reschedule the record in the due queue.
    pub fn record_answer(
        &self,
        learner_id: &str,
        word: &str,
        language: &str,
        correct: bool,
        now: DateTime<Utc>,
    ) -> Result<WordRecord, SchedulerError> {
        let key = RecordKey::new(learner_id, word, language)?;

        let mut core = self.core.write();
        let record = core
            .store
            .get_mut(&key)
            .ok_or_else(|| SchedulerError::NotFound(format!("no record for {key}")))?;

        apply_review(record, correct, now, &self.config.policy);
        let updated = record.clone();

        // A record popped via `pop_due` is legitimately absent from the
        // queue until it is answered; re-enqueue it here.
        let result = if core.queue.contains(&key) {
            core.queue.reposition(&key, updated.next_due_at)
        } else {
            core.queue.insert(key.clone(), updated.next_due_at)
        };
        if let Err(err) = result {
            tracing::error!(key = %key, error = %err, "due queue desync on reschedule");
            return Err(SchedulerError::Invariant(format!(
                "due queue desync for {key}: {err}"
            )));
        }

        tracing::debug!(
            key = %key,
            correct,
            confidence = updated.confidence,
            interval_days = updated.interval_days,
            status = %updated.status,
            "answer recorded"
        );
        Ok(updated)
    }

    /// Correct a word's difficulty classification and move it between
    /// levels in the difficulty index.
    pub fn set_difficulty(
        &self,
        learner_id: &str,
        word: &str,
        language: &str,
        difficulty: u8,
    ) -> Result<WordRecord, SchedulerError> {
        validate_difficulty(difficulty)?;
        let key = RecordKey::new(learner_id, word, language)?;

        let mut core = self.core.write();
        let old_difficulty = core
            .store
            .get(&key)
            .map(|r| r.difficulty)
            .ok_or_else(|| SchedulerError::NotFound(format!("no record for {key}")))?;

        if old_difficulty != difficulty {
            if let Err(err) = core.index.update_difficulty(&key, old_difficulty, difficulty) {
                tracing::error!(key = %key, error = %err, "difficulty index desync");
                return Err(SchedulerError::Invariant(format!(
                    "difficulty index desync for {key}: {err}"
                )));
            }
            let record = core.store.get_mut(&key).ok_or_else(|| {
                SchedulerError::Invariant(format!("record vanished during update: {key}"))
            })?;
            record.difficulty = difficulty;
            tracing::debug!(key = %key, old_difficulty, difficulty, "difficulty updated");
        }
        core.store.get(&key).cloned().ok_or_else(|| {
            SchedulerError::Invariant(format!("record vanished during update: {key}"))
        })
    }

    /// Words with the given status for one learner, ordered by word.
    pub fn list_by_status(&self, learner_id: &str, status: WordStatus) -> Vec<String> {
        self.core
            .read()
            .store
            .list_by_status(learner_id, status)
            .into_iter()
            .map(|record| record.word.clone())
            .collect()
    }

    /// Every tracked word for one learner, ordered by word. Callers use
    /// this as the fallback view when nothing is currently due.
    pub fn list_words(&self, learner_id: &str) -> Vec<String> {
        self.core
            .read()
            .store
            .list_for_learner(learner_id)
            .into_iter()
            .map(|record| record.word.clone())
            .collect()
    }

    /// Distinct words at a difficulty level, across learners, in
    /// lexicographic order. Levels outside [1,5] are a validation error.
    pub fn range_by_difficulty(&self, difficulty: u8) -> Result<Vec<String>, SchedulerError> {
        self.core.read().index.words_at(difficulty)
    }

    /// Records due at `now`, soonest first, without consuming them.
    pub fn peek_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<WordRecord>, SchedulerError> {
        let core = self.core.read();
        Self::resolve_due(&core, core.queue.peek_due(now, limit))
    }

    /// Due records for a single learner, soonest first.
    pub fn peek_due_for(
        &self,
        learner_id: &str,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<WordRecord>, SchedulerError> {
        let core = self.core.read();
        let entries = core
            .queue
            .peek_due(now, usize::MAX)
            .into_iter()
            .filter(|(key, _)| key.learner_id == learner_id)
            .take(limit)
            .collect();
        Self::resolve_due(&core, entries)
    }

    /// Strict pull mode: remove and return the earliest due record. The
    /// record stays in the store and re-enters the queue on the next
    /// `record_answer` for it.
    pub fn pop_due(&self, now: DateTime<Utc>) -> Result<Option<WordRecord>, SchedulerError> {
        let mut core = self.core.write();
        let Some((key, _)) = core.queue.pop_due(now) else {
            return Ok(None);
        };
        let record = core.store.get(&key).cloned().ok_or_else(|| {
            tracing::error!(key = %key, "popped key missing from record store");
            SchedulerError::Invariant(format!("popped key missing from store: {key}"))
        })?;
        tracing::debug!(key = %key, "record popped for review");
        Ok(Some(record))
    }

    /// Remove a single record from all three structures. `Ok(false)` for
    /// normal absence; errors are reserved for bad input and desyncs.
    pub fn delete(
        &self,
        learner_id: &str,
        word: &str,
        language: &str,
    ) -> Result<bool, SchedulerError> {
        let key = RecordKey::new(learner_id, word, language)?;

        let mut core = self.core.write();
        let Some(record) = core.store.remove(&key) else {
            return Ok(false);
        };
        // The record may be mid-pop, so a missing queue entry is fine.
        core.queue.remove(&key);
        if !core.index.remove(&key, record.difficulty) {
            tracing::error!(key = %key, "difficulty index desync on delete");
            return Err(SchedulerError::Invariant(format!(
                "difficulty index desync on delete: {key}"
            )));
        }
        tracing::debug!(key = %key, "record deleted");
        Ok(true)
    }

    /// Remove every record for a learner; returns the count removed.
    /// Other learners' records are untouched.
    pub fn delete_all(&self, learner_id: &str) -> Result<usize, SchedulerError> {
        let mut core = self.core.write();
        let removed = core.store.remove_learner(learner_id);
        for record in &removed {
            let key = record.key();
            // As in `delete`: a mid-pop record may be absent from the
            // queue, but the index must hold every stored record.
            core.queue.remove(&key);
            if !core.index.remove(&key, record.difficulty) {
                tracing::error!(key = %key, "difficulty index desync on bulk delete");
                return Err(SchedulerError::Invariant(format!(
                    "difficulty index desync on bulk delete: {key}"
                )));
            }
        }
        tracing::info!(learner_id, count = removed.len(), "learner records purged");
        Ok(removed.len())
    }

    /// Aggregate progress counts for one learner.
    pub fn stats(&self, learner_id: &str, now: DateTime<Utc>) -> LearnerStats {
        let core = self.core.read();
        let mut stats = LearnerStats::default();
        for (_, record) in core.store.iter() {
            if record.learner_id != learner_id {
                continue;
            }
            stats.total_words += 1;
            match record.status {
                WordStatus::UnderReview => stats.under_review += 1,
                WordStatus::Completed => stats.completed += 1,
            }
            if record.is_due(now) {
                stats.due_now += 1;
            }
        }
        stats
    }

    /// Cross-structure consistency: every stored record appears exactly
    /// once in the due queue (with its current due time) and exactly once
    /// in the difficulty index (under its current level). Only valid
    /// outside a pop/answer window; a failure indicates a bug.
    pub fn check_consistency(&self) -> Result<(), SchedulerError> {
        let core = self.core.read();
        core.queue.verify()?;

        if core.queue.len() != core.store.len() {
            return Err(SchedulerError::Invariant(format!(
                "queue has {} entries for {} records",
                core.queue.len(),
                core.store.len()
            )));
        }
        if core.index.len() != core.store.len() {
            return Err(SchedulerError::Invariant(format!(
                "index has {} entries for {} records",
                core.index.len(),
                core.store.len()
            )));
        }
        for (key, record) in core.store.iter() {
            match core.queue.due_of(key) {
                Some(due) if due == record.next_due_at => {}
                Some(due) => {
                    return Err(SchedulerError::Invariant(format!(
                        "queued due {due} != record due {} for {key}",
                        record.next_due_at
                    )));
                }
                None => {
                    return Err(SchedulerError::Invariant(format!(
                        "record missing from due queue: {key}"
                    )));
                }
            }
            if !core.index.contains(key, record.difficulty) {
                return Err(SchedulerError::Invariant(format!(
                    "record missing from difficulty index: {key}"
                )));
            }
        }
        Ok(())
    }

    fn resolve_due(
        core: &CoreState,
        entries: Vec<(RecordKey, DateTime<Utc>)>,
    ) -> Result<Vec<WordRecord>, SchedulerError> {
        entries
            .into_iter()
            .map(|(key, _)| {
                core.store.get(&key).cloned().ok_or_else(|| {
                    tracing::error!(key = %key, "queued key missing from record store");
                    SchedulerError::Invariant(format!("queued key missing from store: {key}"))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn upsert_is_idempotent() {
        let scheduler = Scheduler::new();
        let first = scheduler.upsert("u1", "cat", "en", 2, t0()).unwrap();
        let answered = scheduler
            .record_answer("u1", "cat", "en", true, t0())
            .unwrap();
        assert!(answered.confidence > first.confidence);

        // Re-processing the word keeps the progress.
        let again = scheduler.upsert("u1", "cat", "en", 4, t0()).unwrap();
        assert_eq!(again.confidence, answered.confidence);
        assert_eq!(again.difficulty, 2);
        scheduler.check_consistency().unwrap();
    }

    #[test]
    fn record_answer_requires_existing_record() {
        let scheduler = Scheduler::new();
        let err = scheduler
            .record_answer("u1", "ghost", "en", true, t0())
            .unwrap_err();
        assert!(matches!(err, SchedulerError::NotFound(_)));
    }

    #[test]
    fn pop_then_answer_requeues() {
        let scheduler = Scheduler::new();
        scheduler.upsert("u1", "cat", "en", 2, t0()).unwrap();

        let popped = scheduler.pop_due(t0()).unwrap().unwrap();
        assert_eq!(popped.word, "cat");
        assert!(scheduler.pop_due(t0()).unwrap().is_none());

        scheduler
            .record_answer("u1", "cat", "en", true, t0())
            .unwrap();
        scheduler.check_consistency().unwrap();
    }

    #[test]
    fn delete_all_tolerates_popped_records() {
        let scheduler = Scheduler::new();
        scheduler.upsert("u1", "cat", "en", 2, t0()).unwrap();
        scheduler.upsert("u1", "dog", "en", 3, t0()).unwrap();

        // "cat" is mid-pop and thus legitimately absent from the queue.
        let popped = scheduler.pop_due(t0()).unwrap().unwrap();
        assert_eq!(popped.word, "cat");

        assert_eq!(scheduler.delete_all("u1").unwrap(), 2);
        scheduler.check_consistency().unwrap();
    }

    #[test]
    fn invalid_input_is_rejected_up_front() {
        let scheduler = Scheduler::new();
        assert!(scheduler.upsert("u1", "cat", "en", 0, t0()).is_err());
        assert!(scheduler.upsert("u1", "", "en", 3, t0()).is_err());
        assert!(scheduler.upsert("u1", "cat", "not a tag", 3, t0()).is_err());
        assert!(scheduler.range_by_difficulty(6).is_err());
    }
}
