// ABOUTME: Domain models for accounts, profiles, fitness records, goals, and metrics
// ABOUTME: Defines the typed structures persisted by the database layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitledger Project

//! # Data Models
//!
//! Typed domain structures shared across the store, reconciliation, and
//! metrics layers. Calendar dates are [`NaiveDate`] values persisted as
//! ISO-8601 text; instants are [`DateTime<Utc>`] persisted as RFC 3339 text.
//! Optional numeric fields are real `Option`s, never sentinel values.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::exercise_types;
use crate::errors::AppError;

/// A registered account. Owns exactly one [`UserProfile`] plus any number of
/// records and goals. Usernames are stored lowercase and are
/// case-insensitively unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Database row id
    pub id: i64,
    /// Normalized (lowercase) username
    pub username: String,
    /// Bcrypt password hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Account creation time
    pub created_at: DateTime<Utc>,
}

/// Self-reported fitness level stored on the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitnessLevel {
    /// New to regular exercise
    #[default]
    Beginner,
    /// Exercises regularly
    Intermediate,
    /// Trains with structured plans
    Advanced,
    /// Competes or coaches
    Professional,
}

impl FitnessLevel {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Professional => "professional",
        }
    }

    /// Parse from database string representation, defaulting unknown labels
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "intermediate" => Self::Intermediate,
            "advanced" => Self::Advanced,
            "professional" => Self::Professional,
            _ => Self::Beginner,
        }
    }
}

/// Per-account mutable profile attributes. Created with defaults at account
/// creation; updated only via full replace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Database row id
    pub id: i64,
    /// Owning account
    pub account_id: i64,
    /// Display name shown by presentation collaborators
    pub display_name: String,
    /// Optional student id
    pub student_id: Option<String>,
    /// Optional age in years
    pub age: Option<i64>,
    /// Optional height in centimeters
    pub height_cm: Option<f64>,
    /// Optional weight in kilograms
    pub weight_kg: Option<f64>,
    /// Self-reported fitness level
    pub fitness_level: FitnessLevel,
    /// Preferred exercise-type labels, ordered
    pub preferred_exercises: Vec<String>,
}

impl UserProfile {
    /// Encode the preference list as the normalized comma-joined storage form
    #[must_use]
    pub fn encode_preferences(preferences: &[String]) -> String {
        preferences
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Decode the comma-joined storage form back into a preference list
    #[must_use]
    pub fn parse_preferences(encoded: &str) -> Vec<String> {
        encoded
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }
}

/// A persisted exercise activity. Immutable once written, except for the
/// annotation fields (`is_checkin`, `intensity`, `recovery_quality`, `notes`)
/// which are editable via [`RecordAnnotations`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessRecord {
    /// Database row id
    pub id: i64,
    /// Owning account
    pub account_id: i64,
    /// Activity date
    pub date: NaiveDate,
    /// Free-form exercise-type label (trimmed, non-empty)
    pub exercise_type: String,
    /// Duration in minutes, always > 0
    pub duration_minutes: f64,
    /// Optional distance in kilometers
    pub distance_km: Option<f64>,
    /// Optional energy expenditure
    pub calories: Option<i64>,
    /// Verified/sanctioned record, as opposed to self-reported
    pub is_official: bool,
    /// Explicitly marked as a completed daily activity
    pub is_checkin: bool,
    /// Optional perceived intensity score, 0-10
    pub intensity: Option<f64>,
    /// Optional recovery-quality score, 0-10
    pub recovery_quality: Option<f64>,
    /// Optional free-text note
    pub notes: Option<String>,
}

impl FitnessRecord {
    /// Whether the record is a run
    #[must_use]
    pub fn is_run(&self) -> bool {
        exercise_types::is_run(&self.exercise_type)
    }

    /// Whether the record is a strength session
    #[must_use]
    pub fn is_strength(&self) -> bool {
        exercise_types::is_strength(&self.exercise_type)
    }
}

/// Input for the record insert path. Annotation fields are absent here: a new
/// record starts un-checked-in with no scores, and gains them only through
/// the explicit annotation edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFitnessRecord {
    /// Owning account
    pub account_id: i64,
    /// Activity date (must not be in the future)
    pub date: NaiveDate,
    /// Exercise-type label
    pub exercise_type: String,
    /// Duration in minutes
    pub duration_minutes: f64,
    /// Optional distance in kilometers
    pub distance_km: Option<f64>,
    /// Optional energy expenditure
    pub calories: Option<i64>,
    /// Verified/sanctioned record
    pub is_official: bool,
    /// Optional free-text note
    pub notes: Option<String>,
}

/// Partial update for the four editable record fields. A `None` field is left
/// unchanged; at least one field must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordAnnotations {
    /// Mark (or unmark) the record as a daily check-in
    pub is_checkin: Option<bool>,
    /// Perceived intensity score, 0-10
    pub intensity: Option<f64>,
    /// Recovery-quality score, 0-10
    pub recovery_quality: Option<f64>,
    /// Replace the free-text note
    pub notes: Option<String>,
}

impl RecordAnnotations {
    /// True when no field is set
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.is_checkin.is_none()
            && self.intensity.is_none()
            && self.recovery_quality.is_none()
            && self.notes.is_none()
    }
}

/// Closed vocabulary of goal types. Each variant carries exactly one
/// aggregation rule in the reconciliation engine, so adding a variant without
/// a handler is a compile error there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    /// Number of runs inside the goal window
    WeeklyRunCount,
    /// Total exercise minutes inside the goal window, any type
    WeeklyTotalDuration,
    /// Total run distance (km) inside the goal window
    MonthlyRunDistance,
    /// Number of strength sessions inside the goal window
    StrengthSessionCount,
}

impl GoalType {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WeeklyRunCount => "weekly_run_count",
            Self::WeeklyTotalDuration => "weekly_total_duration",
            Self::MonthlyRunDistance => "monthly_run_distance",
            Self::StrengthSessionCount => "strength_session_count",
        }
    }

    /// All known goal types
    pub const ALL: [Self; 4] = [
        Self::WeeklyRunCount,
        Self::WeeklyTotalDuration,
        Self::MonthlyRunDistance,
        Self::StrengthSessionCount,
    ];
}

impl std::str::FromStr for GoalType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly_run_count" => Ok(Self::WeeklyRunCount),
            "weekly_total_duration" => Ok(Self::WeeklyTotalDuration),
            "monthly_run_distance" => Ok(Self::MonthlyRunDistance),
            "strength_session_count" => Ok(Self::StrengthSessionCount),
            other => Err(AppError::invalid_input(format!(
                "unknown goal type: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for GoalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted fitness goal. `current_value` is clamped to
/// `[0, target_value]`; `is_completed` latches true when the clamped value
/// reaches the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessGoal {
    /// Database row id
    pub id: i64,
    /// Owning account
    pub account_id: i64,
    /// Goal type from the closed vocabulary
    pub goal_type: GoalType,
    /// Target value, always > 0
    pub target_value: f64,
    /// Current progress, clamped to the target
    pub current_value: f64,
    /// Window start (inclusive)
    pub start_date: NaiveDate,
    /// Window end (inclusive), after the start
    pub end_date: NaiveDate,
    /// Completion flag
    pub is_completed: bool,
}

/// Input for goal creation. Progress starts at zero, not completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFitnessGoal {
    /// Owning account
    pub account_id: i64,
    /// Goal type from the closed vocabulary
    pub goal_type: GoalType,
    /// Target value, must be > 0
    pub target_value: f64,
    /// Window start (inclusive)
    pub start_date: NaiveDate,
    /// Window end (inclusive), must be after the start
    pub end_date: NaiveDate,
}

/// Derived check-in metrics computed straight from the record set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreMetrics {
    /// Count of checked-in records carrying both scores
    pub total_checkin_days: u64,
    /// Mean intensity over the counted records, one decimal
    pub avg_intensity: f64,
    /// Mean recovery quality over the counted records, one decimal
    pub avg_recovery_quality: f64,
    /// Counted records as a percentage of all records, one decimal
    pub checkin_rate_percent: f64,
}

/// One activity row of a trailing [`SummaryPeriod`] window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyActivity {
    /// Activity date
    pub date: NaiveDate,
    /// Exercise-type label
    pub exercise_type: String,
    /// Duration in minutes
    pub duration_minutes: f64,
    /// Optional distance in kilometers
    pub distance_km: Option<f64>,
    /// Optional energy expenditure
    pub calories: Option<i64>,
}

/// Trailing window for activity summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPeriod {
    /// Trailing 7 days
    Week,
    /// Trailing 30 days
    Month,
    /// Trailing 365 days
    Year,
}

impl SummaryPeriod {
    /// Window length in days
    #[must_use]
    pub const fn days(&self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
        }
    }
}
