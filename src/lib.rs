// ABOUTME: Main library entry point for the fitledger fitness record store
// ABOUTME: Exposes the database layer, reconciliation engine, metrics, and service facade
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitledger Project

#![deny(unsafe_code)]

//! # Fitledger
//!
//! A fitness record store and goal-progress reconciliation engine. The crate
//! persists exercise activity records transactionally in `SQLite`, keeps
//! user-defined goal progress consistent with the record history, and
//! computes derived check-in metrics on read.
//!
//! ## Architecture
//!
//! - **`database`**: the `SQLite` store, with schema migrations plus the
//!   account, record, and goal operations
//! - **`reconciliation`**: derives goal progress from the record history
//!   through one canonical aggregation shared by both update paths
//! - **`metrics`**: read-time statistics straight from the record set
//! - **`service`**: the in-process facade collaborators call; owns
//!   validation and the insert-then-reconcile sequencing
//! - **`models`**, **`errors`**, **`config`**, **`logging`**,
//!   **`constants`**: shared ambient pieces
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fitledger::database::Database;
//! use fitledger::errors::AppResult;
//! use fitledger::service::FitnessService;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let db = Database::new("sqlite:fitledger.db").await?;
//!     let service = FitnessService::new(db);
//!
//!     let account_id = service.register_account("demo_user", "secret123").await?;
//!     println!("registered account {account_id}");
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod errors;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod reconciliation;
pub mod service;

pub use database::Database;
pub use errors::{AppError, AppResult, ErrorCode};
pub use service::FitnessService;
