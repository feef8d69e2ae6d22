// ABOUTME: Fitness goal database operations
// ABOUTME: Handles goal CRUD and the atomic progress read-modify-write
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitledger Project

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{FitnessGoal, GoalType, NewFitnessGoal};
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use tracing::{info, warn};

impl Database {
    /// Create the goals table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_goals(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS goals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL REFERENCES accounts(id),
                goal_type TEXT NOT NULL,
                target_value REAL NOT NULL,
                current_value REAL NOT NULL DEFAULT 0,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                is_completed INTEGER NOT NULL DEFAULT 0
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create goals table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_goals_account ON goals(account_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create goal index: {e}")))?;

        Ok(())
    }

    /// Insert a goal inside a single transaction
    ///
    /// Progress starts at zero, not completed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive target or an end date
    /// not after the start date, or `DatabaseError` if the insert fails.
    pub async fn insert_goal(&self, goal: &NewFitnessGoal) -> AppResult<i64> {
        if goal.account_id <= 0 {
            return Err(AppError::invalid_input("account id must be positive"));
        }
        if goal.target_value <= 0.0 {
            return Err(AppError::out_of_range("target value must be greater than 0"));
        }
        if goal.end_date <= goal.start_date {
            return Err(AppError::invalid_input(
                "goal end date must be after the start date",
            ));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let result = sqlx::query(
            r"
            INSERT INTO goals
                (account_id, goal_type, target_value, current_value,
                 start_date, end_date, is_completed)
            VALUES ($1, $2, $3, 0, $4, $5, 0)
            ",
        )
        .bind(goal.account_id)
        .bind(goal.goal_type.as_str())
        .bind(goal.target_value)
        .bind(goal.start_date.to_string())
        .bind(goal.end_date.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert goal: {e}")))?;

        let goal_id = result.last_insert_rowid();

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit goal insert: {e}")))?;

        Ok(goal_id)
    }

    /// Query goals for an account, ordered by end date ascending
    ///
    /// Rows with an unknown goal-type label or a malformed date are skipped
    /// individually with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn query_goals(
        &self,
        account_id: i64,
        include_completed: bool,
    ) -> AppResult<Vec<FitnessGoal>> {
        let mut query = String::from(
            r"
            SELECT id, account_id, goal_type, target_value, current_value,
                   start_date, end_date, is_completed
            FROM goals
            WHERE account_id = $1
            ",
        );
        if !include_completed {
            query.push_str(" AND is_completed = 0");
        }
        query.push_str(" ORDER BY end_date ASC, id ASC");

        let rows = sqlx::query(&query)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to query goals: {e}")))?;

        let mut goals = Vec::with_capacity(rows.len());
        for row in rows {
            match row_to_goal(&row) {
                Ok(goal) => goals.push(goal),
                Err(err) => {
                    let goal_id: i64 = row.get("id");
                    warn!(goal_id, error = %err, "skipping malformed goal row");
                }
            }
        }

        Ok(goals)
    }

    /// Fetch a single goal owned by the given account
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row is malformed.
    pub async fn get_goal(&self, goal_id: i64, account_id: i64) -> AppResult<Option<FitnessGoal>> {
        let row = sqlx::query(
            r"
            SELECT id, account_id, goal_type, target_value, current_value,
                   start_date, end_date, is_completed
            FROM goals
            WHERE id = $1 AND account_id = $2
            ",
        )
        .bind(goal_id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to fetch goal: {e}")))?;

        row.as_ref().map(row_to_goal).transpose()
    }

    /// Set a goal's progress with an atomic read-modify-write
    ///
    /// The target and completion flag are read inside the same transaction
    /// as the update so concurrent reconciliation calls serialize on the
    /// row instead of losing updates. The new value is clamped to
    /// `[0, target]`; the completion flag is recomputed from the clamped
    /// value.
    ///
    /// Returns false when the goal does not belong to the account.
    ///
    /// # Errors
    ///
    /// Returns `ValueOutOfRange` for a negative value, or `DatabaseError`
    /// if the transaction fails.
    pub async fn set_goal_progress(
        &self,
        goal_id: i64,
        account_id: i64,
        new_value: f64,
    ) -> AppResult<bool> {
        if new_value < 0.0 {
            return Err(AppError::out_of_range("progress cannot be negative"));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let row = sqlx::query(
            "SELECT target_value, is_completed FROM goals WHERE id = $1 AND account_id = $2",
        )
        .bind(goal_id)
        .bind(account_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to read goal for update: {e}")))?;

        let Some(row) = row else {
            return Ok(false);
        };

        let target_value: f64 = row.get("target_value");
        let was_completed: bool = row.get("is_completed");

        let clamped = new_value.min(target_value);
        let is_completed = clamped >= target_value;

        let result = sqlx::query(
            r"
            UPDATE goals
            SET current_value = $1, is_completed = $2
            WHERE id = $3 AND account_id = $4
            ",
        )
        .bind(clamped)
        .bind(is_completed)
        .bind(goal_id)
        .bind(account_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to update goal progress: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit progress update: {e}")))?;

        if is_completed && !was_completed {
            info!(goal_id, account_id, target_value, "goal completed");
        }

        Ok(result.rows_affected() > 0)
    }

    /// Replace a goal's target value
    ///
    /// The completion flag is reset unconditionally, even when the current
    /// progress already satisfies the new target; the next reconciliation
    /// pass re-completes such goals.
    ///
    /// # Errors
    ///
    /// Returns `ValueOutOfRange` for a non-positive target, or
    /// `DatabaseError` if the update fails.
    pub async fn set_goal_target(
        &self,
        goal_id: i64,
        account_id: i64,
        new_target: f64,
    ) -> AppResult<bool> {
        if new_target <= 0.0 {
            return Err(AppError::out_of_range("target value must be greater than 0"));
        }

        let result = sqlx::query(
            r"
            UPDATE goals
            SET target_value = $1, is_completed = 0
            WHERE id = $2 AND account_id = $3
            ",
        )
        .bind(new_target)
        .bind(goal_id)
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update goal target: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a goal owned by the given account
    ///
    /// Records are untouched; there is no cascading deletion in either
    /// direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_goal(&self, goal_id: i64, account_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM goals WHERE id = $1 AND account_id = $2")
            .bind(goal_id)
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete goal: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Map a database row to a [`FitnessGoal`], failing on unknown labels or
/// malformed dates
fn row_to_goal(row: &SqliteRow) -> AppResult<FitnessGoal> {
    let type_label: String = row.get("goal_type");
    let goal_type = GoalType::from_str(&type_label)?;

    let start_text: String = row.get("start_date");
    let end_text: String = row.get("end_date");
    let start_date = NaiveDate::parse_from_str(&start_text, "%Y-%m-%d").map_err(|e| {
        AppError::database(format!("stored start date {start_text:?} is malformed: {e}"))
    })?;
    let end_date = NaiveDate::parse_from_str(&end_text, "%Y-%m-%d").map_err(|e| {
        AppError::database(format!("stored end date {end_text:?} is malformed: {e}"))
    })?;

    Ok(FitnessGoal {
        id: row.get("id"),
        account_id: row.get("account_id"),
        goal_type,
        target_value: row.get("target_value"),
        current_value: row.get("current_value"),
        start_date,
        end_date,
        is_completed: row.get("is_completed"),
    })
}
