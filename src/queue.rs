//! DueQueue: an indexable binary min-heap over review due times.
//!
//! A plain binary heap only supports push/pop, but every answer changes
//! a record's priority, so the heap keeps a reverse index from record
//! key to slot and updates it through every sift. That makes
//! `reposition` and `remove` O(log n) instead of a linear scan.
//!
//! Ordering is `(next_due_at, key)`; `RecordKey` orders by word first,
//! which is the lexicographic tie-break the deterministic due listings
//! rely on.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::SchedulerError;
use crate::types::RecordKey;

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeapEntry {
    due: DateTime<Utc>,
    key: RecordKey,
}

impl HeapEntry {
    fn rank(&self) -> (DateTime<Utc>, &RecordKey) {
        (self.due, &self.key)
    }
}

#[derive(Debug, Default)]
pub struct DueQueue {
    heap: Vec<HeapEntry>,
    // Reverse index: record key -> current heap slot. Kept in lockstep
    // with every swap.
    slots: HashMap<RecordKey, usize>,
}

impl DueQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.slots.contains_key(key)
    }

    /// Queued due time for a key, if present.
    pub fn due_of(&self, key: &RecordKey) -> Option<DateTime<Utc>> {
        self.slots.get(key).map(|&slot| self.heap[slot].due)
    }

    /// O(log n). A key already queued must use `reposition` instead.
    pub fn insert(&mut self, key: RecordKey, due: DateTime<Utc>) -> Result<(), SchedulerError> {
        if self.slots.contains_key(&key) {
            return Err(SchedulerError::AlreadyExists(format!(
                "key already queued: {key}"
            )));
        }
        let slot = self.heap.len();
        self.slots.insert(key.clone(), slot);
        self.heap.push(HeapEntry { due, key });
        self.sift_up(slot);
        Ok(())
    }

    /// Update the priority of an existing entry in O(log n).
    pub fn reposition(&mut self, key: &RecordKey, due: DateTime<Utc>) -> Result<(), SchedulerError> {
        let slot = *self
            .slots
            .get(key)
            .ok_or_else(|| SchedulerError::NotFound(format!("key not queued: {key}")))?;
        self.heap[slot].due = due;
        let slot = self.sift_up(slot);
        self.sift_down(slot);
        Ok(())
    }

    /// O(log n); true if the key was present.
    pub fn remove(&mut self, key: &RecordKey) -> bool {
        let Some(slot) = self.slots.remove(key) else {
            return false;
        };
        let last = self.heap.len() - 1;
        if slot != last {
            self.heap.swap(slot, last);
            self.slots.insert(self.heap[slot].key.clone(), slot);
        }
        self.heap.pop();
        if slot < self.heap.len() {
            let slot = self.sift_up(slot);
            self.sift_down(slot);
        }
        true
    }

    /// Earliest entry without removing it.
    pub fn peek(&self) -> Option<(&RecordKey, DateTime<Utc>)> {
        self.heap.first().map(|entry| (&entry.key, entry.due))
    }

    /// Up to `limit` entries with `due <= now`, soonest first, without
    /// consuming them: listing a review session must not advance the
    /// schedule.
    pub fn peek_due(&self, now: DateTime<Utc>, limit: usize) -> Vec<(RecordKey, DateTime<Utc>)> {
        let mut due: Vec<&HeapEntry> = self.heap.iter().filter(|e| e.due <= now).collect();
        due.sort_by(|a, b| a.rank().cmp(&b.rank()));
        due.into_iter()
            .take(limit)
            .map(|e| (e.key.clone(), e.due))
            .collect()
    }

    /// Remove and return the single earliest entry if it is due.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<(RecordKey, DateTime<Utc>)> {
        let first = self.heap.first()?;
        if first.due > now {
            return None;
        }
        let key = first.key.clone();
        let due = first.due;
        self.remove(&key);
        Some((key, due))
    }

    fn sift_up(&mut self, mut slot: usize) -> usize {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.heap[slot].rank() >= self.heap[parent].rank() {
                break;
            }
            self.swap_slots(slot, parent);
            slot = parent;
        }
        slot
    }

    fn sift_down(&mut self, mut slot: usize) {
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut smallest = slot;
            if left < self.heap.len() && self.heap[left].rank() < self.heap[smallest].rank() {
                smallest = left;
            }
            if right < self.heap.len() && self.heap[right].rank() < self.heap[smallest].rank() {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap_slots(slot, smallest);
            slot = smallest;
        }
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.slots.insert(self.heap[a].key.clone(), a);
        self.slots.insert(self.heap[b].key.clone(), b);
    }

    /// Heap order and reverse-index agreement; used by the engine's
    /// consistency check and the tests.
    pub fn verify(&self) -> Result<(), SchedulerError> {
        if self.slots.len() != self.heap.len() {
            return Err(SchedulerError::Invariant(format!(
                "slot index size {} != heap size {}",
                self.slots.len(),
                self.heap.len()
            )));
        }
        for (slot, entry) in self.heap.iter().enumerate() {
            if self.slots.get(&entry.key) != Some(&slot) {
                return Err(SchedulerError::Invariant(format!(
                    "slot index out of sync for {}",
                    entry.key
                )));
            }
            if slot > 0 {
                let parent = (slot - 1) / 2;
                if self.heap[parent].rank() > entry.rank() {
                    return Err(SchedulerError::Invariant(format!(
                        "heap order violated at slot {slot}"
                    )));
                }
            }
        }
        Ok(())
    }
}
