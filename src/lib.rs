//! # wordpace - spaced-repetition scheduling core
//!
//! In-memory scheduling engine for vocabulary review. Given words a
//! learner has studied, it tracks difficulty, confidence and recency and
//! decides which words are due for review versus mastered. It answers
//! three query shapes efficiently:
//!
//! - point lookup/update of a word's learning record (hash-indexed
//!   [`store::RecordStore`], O(1) average);
//! - "next items due for review" ([`queue::DueQueue`], an indexable
//!   binary heap with O(log n) reschedule after every answer);
//! - "all words at difficulty level N" ([`index::DifficultyIndex`], an
//!   ordered (difficulty, key) index with bounded range scans).
//!
//! Word content (definitions, translations, audio scoring) and the
//! surrounding HTTP/auth layers are collaborators that call
//! [`Scheduler`]; this crate only ever reasons about scheduling state.
//!
//! ## Modules
//!
//! - [`types`] - record identity, status enum, the canonical `WordRecord`
//! - [`config`] - tunable review policy (`Default` + env overrides)
//! - [`policy`] - the confidence/interval transition applied per answer
//! - [`store`] - authoritative record map
//! - [`queue`] - due-time priority structure with key update
//! - [`index`] - difficulty-ordered secondary index
//! - [`engine`] - the `Scheduler` facade with the write-lock boundary
//! - [`error`] - error kinds surfaced to callers
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use wordpace::{Scheduler, WordStatus};
//!
//! let scheduler = Scheduler::new();
//! let now = Utc::now();
//!
//! scheduler.upsert("learner-1", "ephemeral", "en", 3, now)?;
//! let record = scheduler.record_answer("learner-1", "ephemeral", "en", true, now)?;
//! assert_eq!(record.status, WordStatus::UnderReview);
//!
//! let due = scheduler.peek_due(now, 10)?;
//! assert!(due.is_empty()); // just answered, nothing due yet
//! # Ok::<(), wordpace::SchedulerError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod policy;
pub mod queue;
pub mod store;
pub mod types;

pub use config::{ReviewPolicy, SchedulerConfig};
pub use engine::Scheduler;
pub use error::SchedulerError;
pub use index::DifficultyIndex;
pub use queue::DueQueue;
pub use store::RecordStore;
pub use types::{
    validate_difficulty, LearnerStats, RecordKey, WordRecord, WordStatus, DIFFICULTY_MAX,
    DIFFICULTY_MIN,
};
