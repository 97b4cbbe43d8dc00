//! Shared types for the scheduling core.
//!
//! One `WordRecord` per (learner, word, language); the three index
//! structures hold `RecordKey`s into the store rather than copies of the
//! record, so scheduling state never diverges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

// ==================== Constants ====================

/// Lowest difficulty level
pub const DIFFICULTY_MIN: u8 = 1;

/// Highest difficulty level
pub const DIFFICULTY_MAX: u8 = 5;

/// Longest accepted language subtag (BCP 47 primary subtags are 2-8 chars)
const LANGUAGE_SUBTAG_MAX: usize = 8;

/// Reject difficulty values outside [1,5] instead of clamping.
pub fn validate_difficulty(difficulty: u8) -> Result<(), SchedulerError> {
    if !(DIFFICULTY_MIN..=DIFFICULTY_MAX).contains(&difficulty) {
        return Err(SchedulerError::Validation(format!(
            "difficulty must be between {DIFFICULTY_MIN} and {DIFFICULTY_MAX}, got {difficulty}"
        )));
    }
    Ok(())
}

// ==================== Record identity ====================

/// Identity of one learning record: (learner, word, language).
///
/// Construction normalizes the parts (trim, case-fold word and language)
/// so lookups are insensitive to input casing. Ordering is by word first,
/// which gives every key-ordered structure the word tie-break the
/// deterministic listings rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordKey {
    pub learner_id: String,
    pub word: String,
    pub language: String,
}

impl RecordKey {
    pub fn new(learner_id: &str, word: &str, language: &str) -> Result<Self, SchedulerError> {
        let learner_id = learner_id.trim();
        if learner_id.is_empty() {
            return Err(SchedulerError::Validation(
                "learner id must not be empty".to_string(),
            ));
        }
        let word = word.trim().to_lowercase();
        if word.is_empty() {
            return Err(SchedulerError::Validation(
                "word must not be empty".to_string(),
            ));
        }
        let language = normalize_language_tag(language)?;

        Ok(Self {
            learner_id: learner_id.to_string(),
            word,
            language,
        })
    }
}

impl Ord for RecordKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.word
            .cmp(&other.word)
            .then_with(|| self.learner_id.cmp(&other.learner_id))
            .then_with(|| self.language.cmp(&other.language))
    }
}

impl PartialOrd for RecordKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.learner_id, self.word, self.language)
    }
}

/// ISO-like tag: 2-8 letter primary subtag, optional alphanumeric
/// subtags separated by `-` (accepts `en`, `pt-BR`, `zh-Hans`).
/// Lowercased so the tag takes part in key identity.
fn normalize_language_tag(language: &str) -> Result<String, SchedulerError> {
    let tag = language.trim();
    let malformed = || SchedulerError::Validation(format!("malformed language tag: {language:?}"));

    let mut parts = tag.split('-');
    let primary = parts.next().unwrap_or("");
    if !(2..=LANGUAGE_SUBTAG_MAX).contains(&primary.len())
        || !primary.chars().all(|c| c.is_ascii_alphabetic())
    {
        return Err(malformed());
    }
    for part in parts {
        if part.is_empty()
            || part.len() > LANGUAGE_SUBTAG_MAX
            || !part.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(malformed());
        }
    }
    Ok(tag.to_lowercase())
}

// ==================== Status ====================

/// Review lifecycle of a word. `Completed` is reversible: an incorrect
/// answer on a completed word demotes it back to `UnderReview`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WordStatus {
    UnderReview,
    Completed,
}

impl WordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnderReview => "UNDER_REVIEW",
            Self::Completed => "COMPLETED",
        }
    }
}

impl std::str::FromStr for WordStatus {
    type Err = SchedulerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "UNDER_REVIEW" | "under_review" | "underReview" => Ok(Self::UnderReview),
            "COMPLETED" | "completed" => Ok(Self::Completed),
            other => Err(SchedulerError::Validation(format!(
                "unknown status: {other:?}"
            ))),
        }
    }
}

impl std::fmt::Display for WordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Record ====================

/// Authoritative learning state for one (learner, word, language).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRecord {
    pub learner_id: String,
    pub word: String,
    pub language: String,
    /// Intrinsic complexity of the word, 1-5, independent of confidence.
    pub difficulty: u8,
    /// Mastery estimate in [0,1]; starts at 0.
    pub confidence: f64,
    /// Waiting period before the next review, in days.
    pub interval_days: f64,
    /// None until the first answer is recorded.
    pub last_review_at: Option<DateTime<Utc>>,
    /// `last_review_at + interval`, or creation time if never reviewed.
    pub next_due_at: DateTime<Utc>,
    pub status: WordStatus,
    pub review_count: u32,
    pub correct_count: u32,
}

impl WordRecord {
    /// Fresh record: zero confidence, due immediately.
    pub fn new(key: RecordKey, difficulty: u8, base_interval_days: f64, now: DateTime<Utc>) -> Self {
        Self {
            learner_id: key.learner_id,
            word: key.word,
            language: key.language,
            difficulty,
            confidence: 0.0,
            interval_days: base_interval_days,
            last_review_at: None,
            next_due_at: now,
            status: WordStatus::UnderReview,
            review_count: 0,
            correct_count: 0,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            learner_id: self.learner_id.clone(),
            word: self.word.clone(),
            language: self.language.clone(),
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_due_at <= now
    }
}

// ==================== Stats ====================

/// Per-learner aggregate counts for progress views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerStats {
    pub total_words: usize,
    pub under_review: usize,
    pub completed: usize,
    pub due_now: usize,
}
