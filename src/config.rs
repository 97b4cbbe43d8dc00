//! Tunable scheduling policy.
//!
//! The confidence increments, interval growth and completion threshold
//! are policy, not contract: defaults follow the shipped behavior, and
//! each value can be overridden from the environment at startup.

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Spaced-repetition policy parameters applied on every answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPolicy {
    /// Added to confidence on a correct answer.
    pub correct_increment: f64,
    /// Subtracted from confidence on an incorrect answer.
    pub incorrect_penalty: f64,
    /// Interval multiplier on a correct answer.
    pub growth_factor: f64,
    /// Interval a record starts at and resets to on a miss, in days.
    pub base_interval_days: f64,
    /// Interval cap, in days.
    pub max_interval_days: f64,
    /// Confidence at or above which a reviewed word counts as completed.
    pub completion_threshold: f64,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            correct_increment: 0.15,
            incorrect_penalty: 0.25,
            growth_factor: 2.0,
            base_interval_days: 1.0,
            max_interval_days: 90.0,
            completion_threshold: 0.9,
        }
    }
}

impl ReviewPolicy {
    /// Out-of-range tunables are rejected, not clamped.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        let checks: [(&str, f64, bool); 6] = [
            (
                "correct_increment",
                self.correct_increment,
                (0.0..=1.0).contains(&self.correct_increment),
            ),
            (
                "incorrect_penalty",
                self.incorrect_penalty,
                (0.0..=1.0).contains(&self.incorrect_penalty),
            ),
            (
                "growth_factor",
                self.growth_factor,
                self.growth_factor >= 1.0 && self.growth_factor.is_finite(),
            ),
            (
                "base_interval_days",
                self.base_interval_days,
                self.base_interval_days > 0.0 && self.base_interval_days.is_finite(),
            ),
            (
                "max_interval_days",
                self.max_interval_days,
                self.max_interval_days >= self.base_interval_days
                    && self.max_interval_days.is_finite(),
            ),
            (
                "completion_threshold",
                self.completion_threshold,
                (0.0..=1.0).contains(&self.completion_threshold),
            ),
        ];
        for (name, value, ok) in checks {
            if !ok {
                return Err(SchedulerError::Validation(format!(
                    "invalid policy value {name}={value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub policy: ReviewPolicy,
}

impl SchedulerConfig {
    /// Defaults overridden by `WORDPACE_*` environment variables.
    /// Unparseable values keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        let p = &mut config.policy;

        if let Some(val) = env_f64("WORDPACE_CORRECT_INCREMENT") {
            p.correct_increment = val;
        }
        if let Some(val) = env_f64("WORDPACE_INCORRECT_PENALTY") {
            p.incorrect_penalty = val;
        }
        if let Some(val) = env_f64("WORDPACE_GROWTH_FACTOR") {
            p.growth_factor = val;
        }
        if let Some(val) = env_f64("WORDPACE_BASE_INTERVAL_DAYS") {
            p.base_interval_days = val;
        }
        if let Some(val) = env_f64("WORDPACE_MAX_INTERVAL_DAYS") {
            p.max_interval_days = val;
        }
        if let Some(val) = env_f64("WORDPACE_COMPLETION_THRESHOLD") {
            p.completion_threshold = val;
        }

        config
    }
}

fn env_f64(name: &str) -> Option<f64> {
    std::env::var(name).ok().and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ReviewPolicy::default().validate().is_ok());
    }

    // Single test for all env handling: parallel test threads share the
    // process environment.
    #[test]
    fn from_env_overrides_and_falls_back() {
        std::env::set_var("WORDPACE_GROWTH_FACTOR", "3.5");
        std::env::set_var("WORDPACE_BASE_INTERVAL_DAYS", "not-a-number");

        let config = SchedulerConfig::from_env();
        assert!((config.policy.growth_factor - 3.5).abs() < 1e-9);
        // Unparseable value keeps the default.
        assert!(
            (config.policy.base_interval_days - ReviewPolicy::default().base_interval_days).abs()
                < 1e-9
        );
        // Untouched variables keep their defaults too.
        assert!(
            (config.policy.completion_threshold - ReviewPolicy::default().completion_threshold)
                .abs()
                < 1e-9
        );

        std::env::remove_var("WORDPACE_GROWTH_FACTOR");
        std::env::remove_var("WORDPACE_BASE_INTERVAL_DAYS");

        let config = SchedulerConfig::from_env();
        assert!((config.policy.growth_factor - ReviewPolicy::default().growth_factor).abs() < 1e-9);
    }

    #[test]
    fn rejects_out_of_range() {
        let mut policy = ReviewPolicy::default();
        policy.completion_threshold = 1.5;
        assert!(policy.validate().is_err());

        let mut policy = ReviewPolicy::default();
        policy.growth_factor = 0.5;
        assert!(policy.validate().is_err());

        let mut policy = ReviewPolicy::default();
        policy.max_interval_days = 0.5; // below base interval
        assert!(policy.validate().is_err());
    }
}
