// ABOUTME: Database handle and schema management for the fitness store
// ABOUTME: Owns the SQLite pool and orchestrates per-entity migrations on startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitledger Project

//! # Database Management
//!
//! One [`Database`] handle wraps a `SQLite` connection pool. Each entity gets
//! its own module (`accounts`, `records`, `goals`) with its schema slice and
//! operations; [`Database::migrate`] runs every slice's migrations on
//! startup. Every operation acquires a pooled connection for exactly one
//! logical transaction and releases it on all paths; a dropped sqlx
//! transaction rolls back.

mod accounts;
mod goals;
mod records;
pub mod test_utils;

use sqlx::{Pool, Sqlite, SqlitePool};

use crate::errors::{AppError, AppResult};

/// Database handle for the fitness store
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or a
    /// migration fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:")
            && !database_url.contains(":memory:")
            && !database_url.contains('?')
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options)
            .await
            .map_err(|e| {
                AppError::database(format!("Failed to connect to {database_url}: {e}"))
                    .with_source(e)
            })?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_accounts().await?;
        self.migrate_records().await?;
        self.migrate_goals().await?;
        Ok(())
    }
}
