// ABOUTME: Test utilities for database operations
// ABOUTME: Provides helpers for creating isolated in-memory test databases
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitledger Project

use super::Database;
use crate::errors::AppResult;

/// Create a test database instance
///
/// # Errors
///
/// Returns an error if database initialization fails
pub async fn create_test_db() -> AppResult<Database> {
    // Use a simple in-memory database - each connection gets its own isolated instance
    let database_url = "sqlite::memory:";
    Database::new(database_url).await
}
