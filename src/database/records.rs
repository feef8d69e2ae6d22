// ABOUTME: Activity record database operations
// ABOUTME: Handles transactional inserts, range queries, and annotation edits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitledger Project

use super::Database;
use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use crate::models::{FitnessRecord, NewFitnessRecord, RecordAnnotations};
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::warn;

impl Database {
    /// Create the records table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_records(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL REFERENCES accounts(id),
                date TEXT NOT NULL,
                exercise_type TEXT NOT NULL,
                duration_minutes REAL NOT NULL,
                distance_km REAL,
                calories INTEGER,
                is_official INTEGER NOT NULL DEFAULT 0,
                is_checkin INTEGER NOT NULL DEFAULT 0,
                intensity REAL,
                recovery_quality REAL,
                notes TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create records table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_records_account_date ON records(account_id, date)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create record index: {e}")))?;

        Ok(())
    }

    /// Insert an activity record inside a single transaction
    ///
    /// The row is the durable fact: goal reconciliation runs after the commit
    /// and its failures never undo the insert.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid account id, empty exercise
    /// type, or non-positive duration, or `DatabaseError` if the transaction
    /// fails (nothing is written in that case).
    pub async fn insert_record(&self, record: &NewFitnessRecord) -> AppResult<i64> {
        if record.account_id <= 0 {
            return Err(AppError::invalid_input("account id must be positive"));
        }
        let exercise_type = record.exercise_type.trim();
        if exercise_type.is_empty() {
            return Err(AppError::missing_field("exercise_type"));
        }
        if record.duration_minutes <= 0.0 {
            return Err(AppError::out_of_range("duration must be greater than 0"));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let result = sqlx::query(
            r"
            INSERT INTO records
                (account_id, date, exercise_type, duration_minutes, distance_km,
                 calories, is_official, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(record.account_id)
        .bind(record.date.to_string())
        .bind(exercise_type)
        .bind(record.duration_minutes)
        .bind(record.distance_km)
        .bind(record.calories)
        .bind(record.is_official)
        .bind(&record.notes)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert record: {e}")))?;

        let record_id = result.last_insert_rowid();

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit record insert: {e}")))?;

        Ok(record_id)
    }

    /// Query activity records, newest first
    ///
    /// Both range bounds are inclusive and optional. An end date earlier than
    /// the start date is a caller error answered with an empty list, not a
    /// failure. Rows whose stored date no longer parses are skipped
    /// individually with a warning so one corrupt row cannot hide the rest of
    /// the history.
    ///
    /// # Errors
    ///
    /// Returns an error if the query itself fails.
    pub async fn query_records(
        &self,
        account_id: i64,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        official: Option<bool>,
    ) -> AppResult<Vec<FitnessRecord>> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                warn!(%start, %end, "record query with end date before start date");
                return Ok(Vec::new());
            }
        }

        let mut query = String::from(
            r"
            SELECT id, account_id, date, exercise_type, duration_minutes,
                   distance_km, calories, is_official, is_checkin, intensity,
                   recovery_quality, notes
            FROM records
            WHERE account_id = $1
            ",
        );
        let mut bind_index = 1;
        if start_date.is_some() {
            bind_index += 1;
            query.push_str(&format!(" AND date >= ${bind_index}"));
        }
        if end_date.is_some() {
            bind_index += 1;
            query.push_str(&format!(" AND date <= ${bind_index}"));
        }
        if official.is_some() {
            bind_index += 1;
            query.push_str(&format!(" AND is_official = ${bind_index}"));
        }
        query.push_str(" ORDER BY date DESC, id DESC");

        let mut q = sqlx::query(&query).bind(account_id);
        if let Some(start) = start_date {
            q = q.bind(start.to_string());
        }
        if let Some(end) = end_date {
            q = q.bind(end.to_string());
        }
        if let Some(official) = official {
            q = q.bind(official);
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to query records: {e}")))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match row_to_record(&row) {
                Ok(record) => records.push(record),
                Err(err) => {
                    let record_id: i64 = row.get("id");
                    warn!(record_id, error = %err, "skipping malformed record row");
                }
            }
        }

        Ok(records)
    }

    /// Partially update the four editable annotation fields of a record
    ///
    /// Ownership is verified inside the same transaction as the write; a
    /// record belonging to another account yields `Ok(false)`, never a write.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty update or an out-of-range
    /// score, or `DatabaseError` if the transaction fails.
    pub async fn update_record_annotations(
        &self,
        record_id: i64,
        account_id: i64,
        annotations: &RecordAnnotations,
    ) -> AppResult<bool> {
        if annotations.is_empty() {
            return Err(AppError::invalid_input(
                "at least one annotation field is required",
            ));
        }
        for score in [annotations.intensity, annotations.recovery_quality]
            .into_iter()
            .flatten()
        {
            if !(limits::SCORE_MIN..=limits::SCORE_MAX).contains(&score) {
                return Err(AppError::out_of_range(format!(
                    "score {score} outside {}..={}",
                    limits::SCORE_MIN,
                    limits::SCORE_MAX
                )));
            }
        }
        if let Some(notes) = &annotations.notes {
            if notes.chars().count() > limits::MAX_NOTES_CHARS {
                return Err(AppError::out_of_range(format!(
                    "notes longer than {} characters",
                    limits::MAX_NOTES_CHARS
                )));
            }
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let owned = sqlx::query("SELECT id FROM records WHERE id = $1 AND account_id = $2")
            .bind(record_id)
            .bind(account_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to check record ownership: {e}")))?;

        if owned.is_none() {
            return Ok(false);
        }

        let mut assignments = Vec::new();
        let mut bind_index = 0;
        if annotations.is_checkin.is_some() {
            bind_index += 1;
            assignments.push(format!("is_checkin = ${bind_index}"));
        }
        if annotations.intensity.is_some() {
            bind_index += 1;
            assignments.push(format!("intensity = ${bind_index}"));
        }
        if annotations.recovery_quality.is_some() {
            bind_index += 1;
            assignments.push(format!("recovery_quality = ${bind_index}"));
        }
        if annotations.notes.is_some() {
            bind_index += 1;
            assignments.push(format!("notes = ${bind_index}"));
        }

        let query = format!(
            "UPDATE records SET {} WHERE id = ${} AND account_id = ${}",
            assignments.join(", "),
            bind_index + 1,
            bind_index + 2
        );

        let mut q = sqlx::query(&query);
        if let Some(is_checkin) = annotations.is_checkin {
            q = q.bind(is_checkin);
        }
        if let Some(intensity) = annotations.intensity {
            q = q.bind(intensity);
        }
        if let Some(recovery_quality) = annotations.recovery_quality {
            q = q.bind(recovery_quality);
        }
        if let Some(notes) = &annotations.notes {
            q = q.bind(notes);
        }

        let result = q
            .bind(record_id)
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to update annotations: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit annotation update: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Map a database row to a [`FitnessRecord`], failing on a malformed date
fn row_to_record(row: &SqliteRow) -> AppResult<FitnessRecord> {
    let date_text: String = row.get("date");
    let date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d")
        .map_err(|e| AppError::database(format!("stored date {date_text:?} is malformed: {e}")))?;

    Ok(FitnessRecord {
        id: row.get("id"),
        account_id: row.get("account_id"),
        date,
        exercise_type: row.get("exercise_type"),
        duration_minutes: row.get("duration_minutes"),
        distance_km: row.get("distance_km"),
        calories: row.get("calories"),
        is_official: row.get("is_official"),
        is_checkin: row.get("is_checkin"),
        intensity: row.get("intensity"),
        recovery_quality: row.get("recovery_quality"),
        notes: row.get("notes"),
    })
}
