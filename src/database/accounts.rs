// ABOUTME: Account and profile database operations
// ABOUTME: Handles registration, credential verification, and profile management
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitledger Project

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{Account, FitnessLevel, UserProfile};
use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::info;

impl Database {
    /// Create accounts and profiles tables
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_accounts(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create accounts table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL UNIQUE REFERENCES accounts(id),
                display_name TEXT NOT NULL,
                student_id TEXT,
                age INTEGER,
                height_cm REAL,
                weight_kg REAL,
                fitness_level TEXT NOT NULL DEFAULT 'beginner',
                preferred_exercises TEXT NOT NULL DEFAULT ''
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create profiles table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_accounts_username ON accounts(username)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create account index: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_profiles_account ON profiles(account_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create profile index: {e}")))?;

        Ok(())
    }

    /// Create an account together with its default profile in one transaction
    ///
    /// The username is normalized to trimmed lowercase before storage, which
    /// makes the uniqueness check case-insensitive. The default profile uses
    /// the username as display name, beginner fitness level, and no
    /// preferences.
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the normalized username is taken,
    /// or `DatabaseError` if the transaction fails.
    pub async fn create_account(&self, username: &str, password: &str) -> AppResult<i64> {
        let normalized = username.trim().to_lowercase();

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let existing = sqlx::query("SELECT id FROM accounts WHERE username = $1")
            .bind(&normalized)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to check username: {e}")))?;

        if existing.is_some() {
            return Err(AppError::already_exists(format!(
                "username {normalized} is already registered"
            )));
        }

        let result = sqlx::query(
            r"
            INSERT INTO accounts (username, password_hash, created_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(&normalized)
        .bind(&password_hash)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to create account: {e}")))?;

        let account_id = result.last_insert_rowid();

        sqlx::query(
            r"
            INSERT INTO profiles (account_id, display_name, fitness_level, preferred_exercises)
            VALUES ($1, $2, $3, '')
            ",
        )
        .bind(account_id)
        .bind(&normalized)
        .bind(FitnessLevel::default().as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to create default profile: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit account creation: {e}")))?;

        info!(account_id, username = %normalized, "account created");
        Ok(account_id)
    }

    /// Verify credentials, returning the account id on success
    ///
    /// Returns `Ok(None)` for an unknown username or a wrong password; the
    /// caller cannot distinguish the two.
    ///
    /// # Errors
    ///
    /// Returns an error only when the lookup itself fails.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<Option<i64>> {
        let normalized = username.trim().to_lowercase();

        let row = sqlx::query("SELECT id, password_hash FROM accounts WHERE username = $1")
            .bind(&normalized)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to look up account: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let account_id: i64 = row.get("id");
        let password_hash: String = row.get("password_hash");

        let verified = bcrypt::verify(password, &password_hash)
            .map_err(|e| AppError::internal(format!("Failed to verify password: {e}")))?;

        Ok(verified.then_some(account_id))
    }

    /// Fetch an account by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_account(&self, account_id: i64) -> AppResult<Option<Account>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at FROM accounts WHERE id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to fetch account: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let created_at_text: String = row.get("created_at");
        let created_at = DateTime::parse_from_rfc3339(&created_at_text)
            .map_err(|e| {
                AppError::database(format!(
                    "Stored creation time for account {account_id} is malformed: {e}"
                ))
            })?
            .with_timezone(&Utc);

        Ok(Some(Account {
            id: row.get("id"),
            username: row.get("username"),
            password_hash: row.get("password_hash"),
            created_at,
        }))
    }

    /// Fetch the profile belonging to an account
    ///
    /// An unknown fitness-level label in storage falls back to the default
    /// rather than failing the read.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_profile(&self, account_id: i64) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(
            r"
            SELECT id, account_id, display_name, student_id, age, height_cm,
                   weight_kg, fitness_level, preferred_exercises
            FROM profiles
            WHERE account_id = $1
            ",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to fetch profile: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let level_label: String = row.get("fitness_level");
        let encoded_preferences: String = row.get("preferred_exercises");

        Ok(Some(UserProfile {
            id: row.get("id"),
            account_id: row.get("account_id"),
            display_name: row.get("display_name"),
            student_id: row.get("student_id"),
            age: row.get("age"),
            height_cm: row.get("height_cm"),
            weight_kg: row.get("weight_kg"),
            fitness_level: FitnessLevel::parse(&level_label),
            preferred_exercises: UserProfile::parse_preferences(&encoded_preferences),
        }))
    }

    /// Replace every mutable profile field for the profile's account
    ///
    /// Full-replace semantics: fields absent from the given profile are
    /// overwritten with their `None` form, not preserved.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_profile(&self, profile: &UserProfile) -> AppResult<bool> {
        let encoded = UserProfile::encode_preferences(&profile.preferred_exercises);

        let result = sqlx::query(
            r"
            UPDATE profiles
            SET display_name = $1, student_id = $2, age = $3, height_cm = $4,
                weight_kg = $5, fitness_level = $6, preferred_exercises = $7
            WHERE account_id = $8
            ",
        )
        .bind(&profile.display_name)
        .bind(&profile.student_id)
        .bind(profile.age)
        .bind(profile.height_cm)
        .bind(profile.weight_kg)
        .bind(profile.fitness_level.as_str())
        .bind(&encoded)
        .bind(profile.account_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update profile: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}
