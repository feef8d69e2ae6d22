// ABOUTME: Goal-progress reconciliation engine
// ABOUTME: Derives goal progress from record history via one canonical aggregation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitledger Project

//! # Progress Reconciliation
//!
//! Goal progress must always equal the aggregate of matching records. Both
//! update paths share one canonical aggregation:
//!
//! - [`ReconciliationEngine::reconcile_from_new_record`] is the cheap path
//!   after a record insert. The record only selects WHICH incomplete goals
//!   are affected; each affected goal is then re-derived from the stored
//!   history, never delta-accumulated. Double counting cannot occur because
//!   no delta formula exists.
//! - [`ReconciliationEngine::reconcile_all`] re-derives every incomplete
//!   goal. Idempotent and authoritative; re-runnable at any time to repair
//!   drift, e.g. after a crash between a record commit and its follow-up
//!   reconciliation.
//!
//! A failure while updating one goal is isolated: it is logged, counted in
//! the summary, and the remaining goals are still processed.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::constants::exercise_types;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{FitnessGoal, FitnessRecord, GoalType, NewFitnessRecord};

/// The slice of a just-inserted record that reconciliation needs to decide
/// which goals it affects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEvent {
    /// Exercise-type label of the new record
    pub exercise_type: String,
    /// Duration in minutes
    pub duration_minutes: f64,
    /// Optional distance in kilometers
    pub distance_km: Option<f64>,
    /// Optional energy expenditure
    pub calories: Option<i64>,
}

impl From<&NewFitnessRecord> for RecordEvent {
    fn from(record: &NewFitnessRecord) -> Self {
        Self {
            exercise_type: record.exercise_type.clone(),
            duration_minutes: record.duration_minutes,
            distance_km: record.distance_km,
            calories: record.calories,
        }
    }
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Incomplete goals considered
    pub examined: usize,
    /// Goals whose progress row was written
    pub updated: usize,
    /// Goals whose update failed (logged, not fatal)
    pub failed: usize,
}

/// Reconciliation engine over a [`Database`] handle
#[derive(Clone)]
pub struct ReconciliationEngine {
    db: Database,
}

impl ReconciliationEngine {
    /// Create an engine over the given database handle
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Incremental path: reconcile the goals a freshly inserted record affects
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty exercise type or non-positive
    /// duration, or an error if the goal listing itself fails. Per-goal
    /// update failures are counted in the summary instead.
    pub async fn reconcile_from_new_record(
        &self,
        account_id: i64,
        event: &RecordEvent,
    ) -> AppResult<ReconciliationSummary> {
        if account_id <= 0 {
            return Err(AppError::invalid_input("account id must be positive"));
        }
        if event.exercise_type.trim().is_empty() {
            return Err(AppError::missing_field("exercise_type"));
        }
        if event.duration_minutes <= 0.0 {
            return Err(AppError::out_of_range("duration must be greater than 0"));
        }

        let mut goals = self.db.query_goals(account_id, false).await?;
        goals.retain(|goal| goal_affected_by(goal.goal_type, event));

        if goals.is_empty() {
            debug!(account_id, exercise_type = %event.exercise_type, "no incomplete goals affected by record");
            return Ok(ReconciliationSummary::default());
        }

        Ok(self.reconcile_goals(&goals).await)
    }

    /// Full recompute path: reconcile every incomplete goal of the account
    ///
    /// # Errors
    ///
    /// Returns an error only if the goal listing fails; per-goal update
    /// failures are counted in the summary.
    pub async fn reconcile_all(&self, account_id: i64) -> AppResult<ReconciliationSummary> {
        if account_id <= 0 {
            return Err(AppError::invalid_input("account id must be positive"));
        }

        let goals = self.db.query_goals(account_id, false).await?;
        if goals.is_empty() {
            debug!(account_id, "no incomplete goals to reconcile");
            return Ok(ReconciliationSummary::default());
        }

        Ok(self.reconcile_goals(&goals).await)
    }

    /// Reconcile a batch of goals, isolating per-goal failures
    async fn reconcile_goals(&self, goals: &[FitnessGoal]) -> ReconciliationSummary {
        let mut summary = ReconciliationSummary {
            examined: goals.len(),
            ..ReconciliationSummary::default()
        };

        for goal in goals {
            match self.reconcile_goal(goal).await {
                Ok(true) => summary.updated += 1,
                Ok(false) => {
                    // Goal deleted between listing and update
                    debug!(goal_id = goal.id, "goal vanished during reconciliation");
                }
                Err(err) => {
                    summary.failed += 1;
                    error!(
                        goal_id = goal.id,
                        account_id = goal.account_id,
                        goal_type = %goal.goal_type,
                        error = %err,
                        "failed to reconcile goal"
                    );
                }
            }
        }

        debug!(
            examined = summary.examined,
            updated = summary.updated,
            failed = summary.failed,
            "reconciliation pass finished"
        );
        summary
    }

    /// Re-derive one goal's progress from the records inside its window
    async fn reconcile_goal(&self, goal: &FitnessGoal) -> AppResult<bool> {
        let records = self
            .db
            .query_records(
                goal.account_id,
                Some(goal.start_date),
                Some(goal.end_date),
                None,
            )
            .await
            .map_err(|e| {
                AppError::reconciliation(format!(
                    "failed to load records for goal {}: {e}",
                    goal.id
                ))
            })?;

        let progress = aggregate_progress(goal.goal_type, &records);

        self.db
            .set_goal_progress(goal.id, goal.account_id, progress)
            .await
            .map_err(|e| {
                AppError::reconciliation(format!(
                    "failed to store progress for goal {}: {e}",
                    goal.id
                ))
            })
    }
}

/// Whether an incomplete goal of this type is affected by the given record
#[must_use]
pub fn goal_affected_by(goal_type: GoalType, event: &RecordEvent) -> bool {
    match goal_type {
        GoalType::WeeklyRunCount => exercise_types::is_run(&event.exercise_type),
        GoalType::WeeklyTotalDuration => true,
        GoalType::MonthlyRunDistance => {
            exercise_types::is_run(&event.exercise_type) && event.distance_km.is_some()
        }
        GoalType::StrengthSessionCount => exercise_types::is_strength(&event.exercise_type),
    }
}

/// Canonical aggregation: derive a goal's raw progress from the records in
/// its window. The records must already be limited to the goal's inclusive
/// date window; this function only applies the type-specific rule.
#[must_use]
pub fn aggregate_progress(goal_type: GoalType, records: &[FitnessRecord]) -> f64 {
    match goal_type {
        GoalType::WeeklyRunCount => records.iter().filter(|r| r.is_run()).count() as f64,
        GoalType::WeeklyTotalDuration => records.iter().map(|r| r.duration_minutes).sum(),
        GoalType::MonthlyRunDistance => records
            .iter()
            .filter(|r| r.is_run())
            .filter_map(|r| r.distance_km)
            .sum(),
        GoalType::StrengthSessionCount => records.iter().filter(|r| r.is_strength()).count() as f64,
    }
}
