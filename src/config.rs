// ABOUTME: Environment-driven configuration for the fitness store
// ABOUTME: Provides the typed DatabaseUrl and the FitledgerConfig loader
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitledger Project

//! # Configuration
//!
//! Configuration is environment-only: no config files. The library itself
//! never reads the environment at operation time; the embedding process loads
//! a [`FitledgerConfig`] once and passes the pieces down explicitly.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::constants::defaults;
use crate::errors::{AppError, AppResult};

/// Type-safe database location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database file
    SQLite {
        /// Path to the `SQLite` database file
        path: PathBuf,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    ///
    /// # Errors
    ///
    /// Returns an error for non-SQLite URL schemes.
    pub fn parse_url(s: &str) -> AppResult<Self> {
        if let Some(path_str) = s.strip_prefix("sqlite:") {
            if path_str == ":memory:" {
                Ok(Self::Memory)
            } else {
                Ok(Self::SQLite {
                    path: PathBuf::from(path_str),
                })
            }
        } else if s.contains("://") {
            Err(AppError::config(format!("unsupported database URL: {s}")))
        } else {
            // Bare path, treat as SQLite file
            Ok(Self::SQLite {
                path: PathBuf::from(s),
            })
        }
    }

    /// Convert to a sqlx connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".into(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

/// Top-level configuration loaded once at startup
#[derive(Debug, Clone)]
pub struct FitledgerConfig {
    /// Where the store keeps its data
    pub database_url: DatabaseUrl,
    /// Log level passed to the logging setup
    pub log_level: String,
}

impl FitledgerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `FITLEDGER_DATABASE_URL` is set to an unsupported
    /// scheme.
    pub fn from_env() -> AppResult<Self> {
        let database_url = DatabaseUrl::parse_url(&defaults::database_url())?;
        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| defaults::LOG_LEVEL.into());

        Ok(Self {
            database_url,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sqlite_file_url() {
        let url = DatabaseUrl::parse_url("sqlite:data/fitledger.db").unwrap();
        assert!(!url.is_memory());
        assert_eq!(url.to_connection_string(), "sqlite:data/fitledger.db");
    }

    #[test]
    fn test_parse_memory_url() {
        let url = DatabaseUrl::parse_url("sqlite::memory:").unwrap();
        assert!(url.is_memory());
        assert_eq!(url.to_connection_string(), "sqlite::memory:");
    }

    #[test]
    fn test_bare_path_treated_as_sqlite() {
        let url = DatabaseUrl::parse_url("fitledger.db").unwrap();
        assert_eq!(url.to_connection_string(), "sqlite:fitledger.db");
    }

    #[test]
    fn test_unsupported_scheme_rejected() {
        assert!(DatabaseUrl::parse_url("postgresql://localhost/fit").is_err());
    }
}
