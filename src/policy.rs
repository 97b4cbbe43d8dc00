//! Review policy: the state transition applied to a record on every
//! answer. Pure functions over [`ReviewPolicy`] so the transition is
//! testable without the engine.

use chrono::{DateTime, Duration, Utc};

use crate::config::ReviewPolicy;
use crate::types::{WordRecord, WordStatus};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Convert a fractional day count into a chrono duration.
pub fn interval_duration(days: f64) -> Duration {
    Duration::milliseconds((days * MS_PER_DAY).round() as i64)
}

/// Apply one answer to a record.
///
/// Correct: confidence grows by `correct_increment` (capped at 1.0) and
/// the interval multiplies by `growth_factor` up to `max_interval_days`.
/// Incorrect: confidence drops by `incorrect_penalty` (floored at 0.0)
/// and the interval resets to `base_interval_days`; status is forced
/// back to `UnderReview` even for a previously completed word; the
/// demotion path is what keeps the schedule adaptive.
pub fn apply_review(
    record: &mut WordRecord,
    correct: bool,
    now: DateTime<Utc>,
    policy: &ReviewPolicy,
) {
    record.review_count = record.review_count.saturating_add(1);

    if correct {
        record.correct_count = record.correct_count.saturating_add(1);
        record.confidence = (record.confidence + policy.correct_increment).min(1.0);
        record.interval_days =
            (record.interval_days * policy.growth_factor).min(policy.max_interval_days);
        record.status = completion_status(record, policy);
    } else {
        record.confidence = (record.confidence - policy.incorrect_penalty).max(0.0);
        record.interval_days = policy.base_interval_days;
        record.status = WordStatus::UnderReview;
    }

    record.last_review_at = Some(now);
    record.next_due_at = now + interval_duration(record.interval_days);
}

/// Completed requires the threshold confidence plus at least one
/// successful review; zero-review records can never be completed.
pub fn completion_status(record: &WordRecord, policy: &ReviewPolicy) -> WordStatus {
    if record.correct_count > 0 && record.confidence >= policy.completion_threshold {
        WordStatus::Completed
    } else {
        WordStatus::UnderReview
    }
}
