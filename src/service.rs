// ABOUTME: Service facade over the database, reconciliation, and metrics layers
// ABOUTME: Owns business-rule validation and the insert-then-reconcile sequencing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitledger Project

//! # Fitness Service
//!
//! The single in-process entry point for collaborators. Presentation code
//! calls these methods instead of the database layer directly, so every
//! write passes the business-rule validation here.
//!
//! A record insert and its follow-up goal reconciliation are deliberately
//! NOT one transaction: the record is the durable fact, and a reconciliation
//! failure leaves goal progress stale, not lost. [`FitnessService::
//! reconcile_goals`] repairs any drift on demand.

use chrono::Utc;
use tracing::warn;

use crate::constants::limits;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::metrics;
use crate::models::{
    CoreMetrics, DailyActivity, FitnessGoal, FitnessRecord, NewFitnessGoal, NewFitnessRecord,
    RecordAnnotations, SummaryPeriod, UserProfile,
};
use crate::reconciliation::{ReconciliationEngine, ReconciliationSummary, RecordEvent};

/// Service facade bundling the store components
#[derive(Clone)]
pub struct FitnessService {
    db: Database,
    reconciliation: ReconciliationEngine,
}

impl FitnessService {
    /// Create a service over the given database handle
    #[must_use]
    pub fn new(db: Database) -> Self {
        let reconciliation = ReconciliationEngine::new(db.clone());
        Self { db, reconciliation }
    }

    /// Access the underlying database handle
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    // ===== Accounts & profiles =====

    /// Register a new account with its default profile
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed username or short
    /// password, `ResourceAlreadyExists` for a taken username, or a storage
    /// error.
    pub async fn register_account(&self, username: &str, password: &str) -> AppResult<i64> {
        validate_credentials(username, password)?;
        self.db.create_account(username, password).await
    }

    /// Verify credentials, returning the account id on success
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty inputs or a storage error; a
    /// wrong username or password is `Ok(None)`, not an error.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<Option<i64>> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::missing_field("username or password"));
        }
        self.db.authenticate(username, password).await
    }

    /// Fetch the profile for an account
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive account id or a
    /// storage error.
    pub async fn profile(&self, account_id: i64) -> AppResult<Option<UserProfile>> {
        validate_account_id(account_id)?;
        self.db.get_profile(account_id).await
    }

    /// Replace the mutable profile fields (full-replace semantics)
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive account id or an empty
    /// display name, or a storage error.
    pub async fn update_profile(&self, profile: &UserProfile) -> AppResult<bool> {
        validate_account_id(profile.account_id)?;
        if profile.display_name.trim().is_empty() {
            return Err(AppError::missing_field("display_name"));
        }
        self.db.update_profile(profile).await
    }

    // ===== Records =====

    /// Add an activity record, then reconcile the goals it affects
    ///
    /// The record commit is durable before reconciliation starts; a
    /// reconciliation failure is logged and the record stands.
    ///
    /// # Errors
    ///
    /// Returns a validation error for out-of-range fields or a storage
    /// error from the insert itself.
    pub async fn add_record(&self, record: &NewFitnessRecord) -> AppResult<i64> {
        validate_record(record)?;

        let record_id = self.db.insert_record(record).await?;

        let event = RecordEvent::from(record);
        if let Err(err) = self
            .reconciliation
            .reconcile_from_new_record(record.account_id, &event)
            .await
        {
            warn!(
                record_id,
                account_id = record.account_id,
                error = %err,
                "goal reconciliation after record insert failed; run a full reconcile to repair"
            );
        }

        Ok(record_id)
    }

    /// Query activity records, newest first
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive account id or a
    /// storage error.
    pub async fn records(
        &self,
        account_id: i64,
        start_date: Option<chrono::NaiveDate>,
        end_date: Option<chrono::NaiveDate>,
        official: Option<bool>,
    ) -> AppResult<Vec<FitnessRecord>> {
        validate_account_id(account_id)?;
        self.db
            .query_records(account_id, start_date, end_date, official)
            .await
    }

    /// Edit the annotation fields of an owned record
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty update or out-of-range
    /// scores, or a storage error.
    pub async fn annotate_record(
        &self,
        record_id: i64,
        account_id: i64,
        annotations: &RecordAnnotations,
    ) -> AppResult<bool> {
        validate_account_id(account_id)?;
        self.db
            .update_record_annotations(record_id, account_id, annotations)
            .await
    }

    // ===== Goals =====

    /// Create a fitness goal
    ///
    /// # Errors
    ///
    /// Returns a validation error for out-of-range fields or a storage
    /// error.
    pub async fn add_goal(&self, goal: &NewFitnessGoal) -> AppResult<i64> {
        validate_goal(goal)?;
        self.db.insert_goal(goal).await
    }

    /// List goals, ordered by end date ascending
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive account id or a
    /// storage error.
    pub async fn goals(
        &self,
        account_id: i64,
        include_completed: bool,
    ) -> AppResult<Vec<FitnessGoal>> {
        validate_account_id(account_id)?;
        self.db.query_goals(account_id, include_completed).await
    }

    /// Fetch one owned goal
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive account id or a
    /// storage error.
    pub async fn goal(&self, goal_id: i64, account_id: i64) -> AppResult<Option<FitnessGoal>> {
        validate_account_id(account_id)?;
        self.db.get_goal(goal_id, account_id).await
    }

    /// Manually set a goal's progress (clamped, completion recomputed)
    ///
    /// # Errors
    ///
    /// Returns a validation error for a negative value or a storage error.
    pub async fn set_goal_progress(
        &self,
        goal_id: i64,
        account_id: i64,
        new_value: f64,
    ) -> AppResult<bool> {
        validate_account_id(account_id)?;
        self.db
            .set_goal_progress(goal_id, account_id, new_value)
            .await
    }

    /// Replace a goal's target value, resetting its completion flag
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive target or a storage
    /// error.
    pub async fn set_goal_target(
        &self,
        goal_id: i64,
        account_id: i64,
        new_target: f64,
    ) -> AppResult<bool> {
        validate_account_id(account_id)?;
        self.db
            .set_goal_target(goal_id, account_id, new_target)
            .await
    }

    /// Delete an owned goal
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive account id or a
    /// storage error.
    pub async fn delete_goal(&self, goal_id: i64, account_id: i64) -> AppResult<bool> {
        validate_account_id(account_id)?;
        self.db.delete_goal(goal_id, account_id).await
    }

    /// Full goal-progress recompute for the account (authoritative path)
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive account id or a
    /// storage error from the goal listing; per-goal failures are isolated
    /// into the summary.
    pub async fn reconcile_goals(&self, account_id: i64) -> AppResult<ReconciliationSummary> {
        self.reconciliation.reconcile_all(account_id).await
    }

    // ===== Metrics =====

    /// Core check-in metrics for the account
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive account id or a
    /// storage error.
    pub async fn core_metrics(&self, account_id: i64) -> AppResult<CoreMetrics> {
        metrics::compute_core_metrics(&self.db, account_id).await
    }

    /// Trailing activity summary window for presentation charts
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive account id or a
    /// storage error.
    pub async fn activity_summary(
        &self,
        account_id: i64,
        period: SummaryPeriod,
    ) -> AppResult<Vec<DailyActivity>> {
        metrics::activity_summary(&self.db, account_id, period).await
    }
}

/// Account ids are positive row ids
fn validate_account_id(account_id: i64) -> AppResult<()> {
    if account_id <= 0 {
        return Err(AppError::invalid_input("account id must be positive"));
    }
    Ok(())
}

/// Business rules for the record insert path
fn validate_record(record: &NewFitnessRecord) -> AppResult<()> {
    validate_account_id(record.account_id)?;

    let exercise_type = record.exercise_type.trim();
    if exercise_type.is_empty() {
        return Err(AppError::missing_field("exercise_type"));
    }
    if exercise_type.chars().count() > limits::MAX_EXERCISE_TYPE_CHARS {
        return Err(AppError::out_of_range(format!(
            "exercise type longer than {} characters",
            limits::MAX_EXERCISE_TYPE_CHARS
        )));
    }
    if record.duration_minutes <= 0.0 {
        return Err(AppError::out_of_range("duration must be greater than 0"));
    }
    if record.duration_minutes > limits::MAX_DURATION_MINUTES {
        return Err(AppError::out_of_range(format!(
            "duration cannot exceed {} minutes",
            limits::MAX_DURATION_MINUTES
        )));
    }
    if record.date > Utc::now().date_naive() {
        return Err(AppError::invalid_input("record date cannot be in the future"));
    }
    if let Some(distance) = record.distance_km {
        if distance < 0.0 {
            return Err(AppError::out_of_range("distance cannot be negative"));
        }
    }
    if let Some(calories) = record.calories {
        if calories < 0 {
            return Err(AppError::out_of_range("calories cannot be negative"));
        }
    }
    if let Some(notes) = &record.notes {
        if notes.chars().count() > limits::MAX_NOTES_CHARS {
            return Err(AppError::out_of_range(format!(
                "notes longer than {} characters",
                limits::MAX_NOTES_CHARS
            )));
        }
    }

    Ok(())
}

/// Business rules for goal creation
fn validate_goal(goal: &NewFitnessGoal) -> AppResult<()> {
    validate_account_id(goal.account_id)?;

    if goal.target_value <= 0.0 {
        return Err(AppError::out_of_range("target value must be greater than 0"));
    }
    if goal.end_date <= goal.start_date {
        return Err(AppError::invalid_input(
            "goal end date must be after the start date",
        ));
    }
    let span = (goal.end_date - goal.start_date).num_days();
    if span > limits::MAX_GOAL_SPAN_DAYS {
        return Err(AppError::out_of_range(format!(
            "goal window cannot exceed {} days",
            limits::MAX_GOAL_SPAN_DAYS
        )));
    }

    Ok(())
}

/// Username and password rules shared by registration
fn validate_credentials(username: &str, password: &str) -> AppResult<()> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::missing_field("username or password"));
    }
    if username.chars().count() < limits::MIN_USERNAME_CHARS {
        return Err(AppError::invalid_input(format!(
            "username must be at least {} characters",
            limits::MIN_USERNAME_CHARS
        )));
    }
    if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(AppError::invalid_input(
            "username may only contain letters, digits, and underscores",
        ));
    }
    if password.chars().count() < limits::MIN_PASSWORD_CHARS {
        return Err(AppError::invalid_input(format!(
            "password must be at least {} characters",
            limits::MIN_PASSWORD_CHARS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn valid_record() -> NewFitnessRecord {
        NewFitnessRecord {
            account_id: 1,
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            exercise_type: "run".into(),
            duration_minutes: 30.0,
            distance_km: Some(5.0),
            calories: Some(280),
            is_official: false,
            notes: None,
        }
    }

    #[test]
    fn test_validate_record_accepts_valid_input() {
        assert!(validate_record(&valid_record()).is_ok());
    }

    #[test]
    fn test_validate_record_rejects_bad_duration() {
        let mut record = valid_record();
        record.duration_minutes = 0.0;
        assert!(validate_record(&record).is_err());
        record.duration_minutes = 2000.0;
        assert!(validate_record(&record).is_err());
    }

    #[test]
    fn test_validate_record_rejects_future_date() {
        let mut record = valid_record();
        record.date = Utc::now().date_naive() + chrono::Duration::days(1);
        assert!(validate_record(&record).is_err());
    }

    #[test]
    fn test_validate_record_rejects_negative_optionals() {
        let mut record = valid_record();
        record.distance_km = Some(-1.0);
        assert!(validate_record(&record).is_err());

        let mut record = valid_record();
        record.calories = Some(-5);
        assert!(validate_record(&record).is_err());
    }

    #[test]
    fn test_validate_goal_rejects_inverted_window() {
        let goal = NewFitnessGoal {
            account_id: 1,
            goal_type: crate::models::GoalType::WeeklyRunCount,
            target_value: 3.0,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        };
        assert!(validate_goal(&goal).is_err());
    }

    #[test]
    fn test_validate_goal_rejects_oversized_window() {
        let goal = NewFitnessGoal {
            account_id: 1,
            goal_type: crate::models::GoalType::WeeklyTotalDuration,
            target_value: 300.0,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        };
        assert!(validate_goal(&goal).is_err());
    }

    #[test]
    fn test_validate_credentials() {
        assert!(validate_credentials("demo_user", "secret1").is_ok());
        assert!(validate_credentials("ab", "secret1").is_err());
        assert!(validate_credentials("demo user", "secret1").is_err());
        assert!(validate_credentials("demo_user", "short").is_err());
        assert!(validate_credentials("", "").is_err());
    }
}
