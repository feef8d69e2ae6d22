// ABOUTME: Crate-wide constants and environment-derived defaults
// ABOUTME: Contains validation limits, exercise-type vocabulary, and service identity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitledger Project

//! # Constants Module
//!
//! Validation limits, the exercise-type vocabulary used by goal matching,
//! and environment-based defaults.

/// Service identity
pub mod service {
    /// Service name used in logs
    pub const SERVICE_NAME: &str = "fitledger";

    /// Service version from Cargo.toml
    pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Validation limits
pub mod limits {
    /// Upper bound on a single activity duration (24 hours)
    pub const MAX_DURATION_MINUTES: f64 = 1440.0;

    /// Maximum length of an exercise-type label
    pub const MAX_EXERCISE_TYPE_CHARS: usize = 100;

    /// Maximum length of a free-text note
    pub const MAX_NOTES_CHARS: usize = 1000;

    /// Maximum goal window span
    pub const MAX_GOAL_SPAN_DAYS: i64 = 365;

    /// Lower bound for intensity / recovery-quality scores
    pub const SCORE_MIN: f64 = 0.0;

    /// Upper bound for intensity / recovery-quality scores
    pub const SCORE_MAX: f64 = 10.0;

    /// Minimum username length at registration
    pub const MIN_USERNAME_CHARS: usize = 3;

    /// Minimum password length at registration
    pub const MIN_PASSWORD_CHARS: usize = 6;
}

/// Environment-based defaults
pub mod defaults {
    use std::env;

    /// Default database file when no URL is configured
    pub const DATABASE_FILE: &str = "fitledger.db";

    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Get the database URL from the environment or the default file
    #[must_use]
    pub fn database_url() -> String {
        env::var("FITLEDGER_DATABASE_URL").unwrap_or_else(|_| format!("sqlite:{DATABASE_FILE}"))
    }
}

/// Exercise-type vocabulary used by goal matching. Record labels are free
/// text; matching is case-insensitive on the trimmed label.
pub mod exercise_types {
    /// The run label matched by run-count and run-distance goals
    pub const RUN: &str = "run";

    /// General strength-training label
    pub const STRENGTH: &str = "strength";

    /// Weightlifting label
    pub const WEIGHTLIFTING: &str = "weightlifting";

    /// Pushup-session label
    pub const PUSHUP: &str = "pushup";

    /// Squat-session label
    pub const SQUAT: &str = "squat";

    /// All labels counted as strength sessions
    pub const STRENGTH_TYPES: [&str; 4] = [STRENGTH, WEIGHTLIFTING, PUSHUP, SQUAT];

    /// Whether a record label counts as a run
    #[must_use]
    pub fn is_run(label: &str) -> bool {
        label.trim().eq_ignore_ascii_case(RUN)
    }

    /// Whether a record label counts as a strength session
    #[must_use]
    pub fn is_strength(label: &str) -> bool {
        let trimmed = label.trim();
        STRENGTH_TYPES
            .iter()
            .any(|t| trimmed.eq_ignore_ascii_case(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exercise_type_matching_is_case_insensitive() {
        assert!(exercise_types::is_run("Run"));
        assert!(exercise_types::is_run("  RUN  "));
        assert!(!exercise_types::is_run("running"));
        assert!(exercise_types::is_strength("Weightlifting"));
        assert!(exercise_types::is_strength("squat"));
        assert!(!exercise_types::is_strength("swim"));
    }

    #[test]
    fn test_default_database_url_points_at_sqlite() {
        assert!(defaults::DATABASE_FILE.ends_with(".db"));
    }
}
